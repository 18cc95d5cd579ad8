//! End-to-end timeline scenarios: bounded pool growth over a dense level,
//! conservation of instances, deactivation lag and scrubbing.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempo_math::{BezierCurve, Color, Vec2};
use tempo_pool::{IndexedObjectPool, Prototype};
use tempo_timeline::{
    ActorId, ActorParams, Keyframe, ObjectTimeline, TimelineConfig, TransformInstance,
};

type Instance = TransformInstance<u32>;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn prototypes(count: usize) -> Vec<Box<dyn Prototype<Instance>>> {
    (0..count)
        .map(|_| Box::new(Instance::new) as Box<dyn Prototype<Instance>>)
        .collect()
}

struct Scheduled {
    id: ActorId,
    start: f32,
    end: f32,
    prototype: usize,
}

fn populate(
    timeline: &mut ObjectTimeline<Instance>,
    rng: &mut StdRng,
    actors: usize,
    span: f32,
    length: f32,
    prototypes: usize,
) -> Vec<Scheduled> {
    (0..actors)
        .map(|i| {
            let start = rng.gen_range(0.0..span - length);
            let end = start + length;
            let prototype = rng.gen_range(0..prototypes);
            let id = timeline
                .schedule(start, end, ActorParams::new(), prototype, i as u32)
                .unwrap();
            Scheduled {
                id,
                start,
                end,
                prototype,
            }
        })
        .collect()
}

#[test]
fn test_pool_growth_is_bounded_by_peak_overlap() {
    init_logging();

    const PROTOTYPES: usize = 3;
    let mut rng = StdRng::seed_from_u64(0x7e3d0);
    let mut timeline =
        ObjectTimeline::with_prototypes(prototypes(PROTOTYPES), TimelineConfig::dense().with_prewarm(0))
            .unwrap();
    let actors = populate(&mut timeline, &mut rng, 2_500, 200.0, 5.0, PROTOTYPES);

    let mut peak = [0usize; PROTOTYPES];
    for step in 0..=200 * 60 {
        let t = step as f32 / 60.0;
        timeline.tick(t);

        let mut overlap = [0usize; PROTOTYPES];
        for actor in &actors {
            if actor.start <= t && t <= actor.end {
                overlap[actor.prototype] += 1;
            }
        }
        for prototype in 0..PROTOTYPES {
            peak[prototype] = peak[prototype].max(overlap[prototype]);
        }
    }

    for prototype in 0..PROTOTYPES {
        let stats = timeline.pool().stats(prototype).unwrap();
        assert!(
            stats.constructed <= peak[prototype],
            "prototype {prototype}: {} constructed, peak overlap {}",
            stats.constructed,
            peak[prototype]
        );
        assert!(stats.constructed > 0);
    }
}

#[test]
fn test_instances_are_conserved_every_tick() {
    init_logging();

    const PROTOTYPES: usize = 2;
    let mut rng = StdRng::seed_from_u64(42);
    let mut timeline =
        ObjectTimeline::with_prototypes(prototypes(PROTOTYPES), TimelineConfig::default()).unwrap();
    let actors = populate(&mut timeline, &mut rng, 400, 50.0, 3.0, PROTOTYPES);

    for step in 0..=50 * 20 {
        let report = timeline.tick(step as f32 / 20.0);

        let mut active = [0usize; PROTOTYPES];
        for actor in &actors {
            if timeline.is_active(actor.id) {
                active[actor.prototype] += 1;
            }
        }

        for (prototype, &active) in active.iter().enumerate() {
            let stats = timeline.pool().stats(prototype).unwrap();
            assert_eq!(stats.active, active);
            assert_eq!(stats.active + stats.idle, stats.constructed);
        }
        assert_eq!(report.active, timeline.active_count());
        assert_eq!(report.deferred, 0);
    }
}

#[test]
fn test_deactivation_happens_on_the_next_tick() {
    init_logging();

    let mut timeline =
        ObjectTimeline::with_prototypes(prototypes(1), TimelineConfig::default()).unwrap();
    let id = timeline.schedule(0.0, 1.0, ActorParams::new(), 0, 0).unwrap();

    let report = timeline.tick(1.0);
    assert_eq!(report.activated, 1);
    assert!(timeline.is_active(id));

    // Last tick that returned the actor keeps it; the first that does not
    // releases it
    let report = timeline.tick(1.0 + 1.0 / 60.0);
    assert_eq!(report.deactivated, 1);
    assert_eq!(report.active, 0);
    assert!(!timeline.is_active(id));

    let report = timeline.tick(2.0);
    assert_eq!(report.deactivated, 0);
}

#[test]
fn test_scrubbing_matches_brute_force() {
    init_logging();

    let mut rng = StdRng::seed_from_u64(7);
    let mut timeline =
        ObjectTimeline::with_prototypes(prototypes(1), TimelineConfig::default()).unwrap();
    let actors = populate(&mut timeline, &mut rng, 300, 30.0, 2.0, 1);

    for _ in 0..200 {
        let t = rng.gen_range(-1.0..31.0_f32);
        timeline.tick(t);

        let expected: HashSet<ActorId> = actors
            .iter()
            .filter(|actor| actor.start <= t && t <= actor.end)
            .map(|actor| actor.id)
            .collect();
        let actual: HashSet<ActorId> = actors
            .iter()
            .filter(|actor| timeline.is_active(actor.id))
            .map(|actor| actor.id)
            .collect();

        assert_eq!(actual, expected, "active set at t = {t}");
    }
}

#[test]
fn test_capped_pool_catches_up() {
    init_logging();

    let mut pool = IndexedObjectPool::new();
    pool.add_prototype(Instance::new);
    let config = TimelineConfig::default().with_max_instances(2);
    let mut timeline = ObjectTimeline::new(pool, config).unwrap();

    let ids: Vec<ActorId> = (0..4)
        .map(|i| {
            timeline
                .schedule(i as f32, 10.0, ActorParams::new(), 0, i)
                .unwrap()
        })
        .collect();

    let report = timeline.tick(5.0);
    assert_eq!(report.active, 2);
    assert_eq!(report.deferred, 2);
    assert_eq!(timeline.pool().stats(0).unwrap().constructed, 2);

    let (live, waiting): (Vec<ActorId>, Vec<ActorId>) =
        ids.iter().copied().partition(|&id| timeline.is_active(id));
    assert_eq!(live.len(), 2);

    // The retired actors' instances are swept next tick and the deferred
    // actors pick them up in that same tick
    for id in live {
        timeline.unschedule(id).unwrap();
    }

    let report = timeline.tick(6.0);
    assert_eq!(report.deactivated, 2);
    assert_eq!(report.activated, 2);
    assert_eq!(report.deferred, 0);
    assert!(waiting.iter().all(|&id| timeline.is_active(id)));
    assert_eq!(timeline.pool().stats(0).unwrap().constructed, 2);
}

#[test]
fn test_transforms_are_evaluated_every_tick() {
    init_logging();

    let mut params = ActorParams::new();
    params
        .position
        .add(0.0, 1.0, Keyframe::linear(Vec2::ZERO, Vec2::new(100.0, 0.0)))
        .unwrap();
    params
        .color
        .add(0.5, 1.0, Keyframe::eased(Color::WHITE, Color::TRANSPARENT, BezierCurve::EASE_IN))
        .unwrap();

    let mut timeline =
        ObjectTimeline::with_prototypes(prototypes(1), TimelineConfig::default()).unwrap();
    let id = timeline.schedule(10.0, 20.0, params, 0, 0).unwrap();

    timeline.tick(12.5);
    let transform = *timeline.instance(id).unwrap().transform();
    assert_eq!(transform.position, Vec2::new(25.0, 0.0));
    assert_eq!(transform.color, Color::WHITE);

    timeline.tick(20.0);
    let transform = *timeline.instance(id).unwrap().transform();
    assert_eq!(transform.position, Vec2::new(100.0, 0.0));
    assert_eq!(transform.color, Color::TRANSPARENT);
}

#[test]
fn test_keyframe_evaluation_is_idempotent() {
    let frame = Keyframe::eased(Vec2::ZERO, Vec2::new(3.0, -7.0), BezierCurve::QUINT_IN_OUT);

    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..1_000 {
        let t: f32 = rng.gen();
        let first = frame.value_at(t);
        for _ in 0..3 {
            let again = frame.value_at(t);
            assert_eq!(again.x.to_bits(), first.x.to_bits());
            assert_eq!(again.y.to_bits(), first.y.to_bits());
        }
    }
}
