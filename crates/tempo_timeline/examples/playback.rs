//! Timeline Playback Demo
//!
//! Schedules a few hundred bullets over a 30 second track, plays it at
//! 60 ticks per second, scrubs back, and prints what the pool did.
//!
//! Usage: RUST_LOG=debug cargo run -p tempo_timeline --example playback

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tempo_timeline::prelude::*;
use tempo_timeline::Result;

// ============================================================================
// Level Setup
// ============================================================================

const TRACK_LENGTH: f32 = 30.0;
const TICK_RATE: f32 = 60.0;

/// Scene layers the bullets are attached under
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layer {
    Background,
    Foreground,
}

type Bullet = TransformInstance<Layer>;

fn bullet_params(rng: &mut StdRng) -> Result<ActorParams> {
    let from = Vec2::new(rng.gen_range(-8.0..8.0), 6.0);
    let to = Vec2::new(rng.gen_range(-8.0..8.0), -6.0);

    let mut params = ActorParams::new();
    params
        .position
        .add(0.0, 1.0, Keyframe::eased(from, to, BezierCurve::SINE_IN_OUT))?;
    params
        .scale
        .add(0.0, 0.2, Keyframe::eased(Vec2::ZERO, Vec2::ONE, BezierCurve::CUBIC_OUT))?;
    params
        .rotation
        .add(0.0, 1.0, Keyframe::linear(0.0, rng.gen_range(-360.0..360.0)))?;
    params.color.add(
        0.8,
        1.0,
        Keyframe::eased(Color::WHITE, Color::WHITE.with_alpha(0.0), BezierCurve::EASE_IN),
    )?;
    Ok(params)
}

fn build_level(seed: u64) -> Result<ObjectTimeline<Bullet>> {
    let pool = IndexedObjectPool::new()
        .with_prototype(Bullet::new)
        .with_prototype(Bullet::new);
    let config = TimelineConfig::default().with_prewarm(8).with_reserve(512);
    let mut timeline = ObjectTimeline::new(pool, config)?;

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..400 {
        let start = rng.gen_range(0.0..TRACK_LENGTH - 2.0);
        let length = rng.gen_range(0.5..2.0);
        let (prototype, layer) = if rng.gen_bool(0.3) {
            (1, Layer::Background)
        } else {
            (0, Layer::Foreground)
        };
        timeline.schedule(start, start + length, bullet_params(&mut rng)?, prototype, layer)?;
    }

    Ok(timeline)
}

// ============================================================================
// Playback
// ============================================================================

fn play(timeline: &mut ObjectTimeline<Bullet>, from: f32, to: f32) -> TickReport {
    let mut totals = TickReport::default();
    let mut peak = 0;

    let ticks = ((to - from) * TICK_RATE) as usize;
    for step in 0..=ticks {
        let report = timeline.tick(from + step as f32 / TICK_RATE);
        totals.time = report.time;
        totals.activated += report.activated;
        totals.deactivated += report.deactivated;
        totals.deferred += report.deferred;
        peak = peak.max(report.active);
    }

    totals.active = peak;
    totals
}

fn print_pool(timeline: &ObjectTimeline<Bullet>) {
    for prototype in 0..timeline.pool().prototype_count() {
        if let Some(stats) = timeline.pool().stats(prototype) {
            log::info!(
                "  prototype {}: {} constructed, {} idle, {} active",
                prototype,
                stats.constructed,
                stats.idle,
                stats.active
            );
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut timeline = build_level(0xb011e7)?;
    log::info!("Scheduled {} actors", timeline.scheduled_count());

    let forward = play(&mut timeline, 0.0, TRACK_LENGTH);
    log::info!(
        "Played to {:.2}s: {} activations, {} deactivations, peak {} active",
        forward.time,
        forward.activated,
        forward.deactivated,
        forward.active
    );
    print_pool(&timeline);

    // Scrub back to the middle of the track
    let report = timeline.tick(TRACK_LENGTH / 2.0);
    log::info!(
        "Seek to {:.2}s: {} active ({} activated)",
        report.time,
        report.active,
        report.activated
    );

    let replay = play(&mut timeline, TRACK_LENGTH / 2.0, TRACK_LENGTH / 2.0 + 5.0);
    log::info!("Replayed 5s with {} activations", replay.activated);
    print_pool(&timeline);

    timeline.free_all();
    Ok(())
}
