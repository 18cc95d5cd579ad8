//! Augmented AVL interval tree
//!
//! Nodes are ordered by `(start, end)` and each one caches the largest
//! `end` found in its subtree. That cached maximum lets point queries skip
//! every subtree whose intervals all finish before the queried time, so a
//! single hit costs O(log n) and collecting k hits costs O(log n + k).
//!
//! Nodes live in a slot arena owned by the tree. A child link is an arena
//! index held by exactly one parent; vacated slots are recycled through a
//! free list so a tree that churns at a steady size stops allocating.

use std::cmp::Ordering;
use std::fmt;

use crate::interval::Interval;

/// Arena index of a child, `None` for a missing subtree
type Link = Option<u32>;

/// A tree node: one interval plus its subtree bookkeeping
#[derive(Clone, Debug)]
pub struct Node<T> {
    interval: Interval<T>,
    left: Link,
    right: Link,
    height: i32,
    max: f32,
}

impl<T> Node<T> {
    fn leaf(interval: Interval<T>) -> Self {
        let max = interval.end();
        Self {
            interval,
            left: None,
            right: None,
            height: 1,
            max,
        }
    }

    #[inline]
    pub fn interval(&self) -> &Interval<T> {
        &self.interval
    }

    #[inline]
    pub fn value(&self) -> &T {
        self.interval.value()
    }

    /// Largest `end` in the subtree rooted here
    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Height of the subtree rooted here (a leaf is 1)
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }
}

/// Caller-owned memory of the last node returned by
/// [`IntervalTree::cached_search`].
///
/// A cache belongs to one tree; any mutation of that tree invalidates it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchCache {
    node: Link,
    revision: u64,
}

impl SearchCache {
    pub const fn new() -> Self {
        Self {
            node: None,
            revision: 0,
        }
    }

    /// Forget the cached node
    pub fn invalidate(&mut self) {
        self.node = None;
    }
}

/// AVL-balanced interval tree with max-end augmentation
#[derive(Clone)]
pub struct IntervalTree<T> {
    nodes: Vec<Option<Node<T>>>,
    vacant: Vec<u32>,
    root: Link,
    len: usize,
    revision: u64,
}

impl<T> IntervalTree<T> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty tree with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            vacant: Vec::new(),
            root: None,
            len: 0,
            revision: 0,
        }
    }

    /// Build a perfectly balanced tree from an unsorted list in O(n log n).
    ///
    /// Equal ranges keep their relative order from `intervals`.
    pub fn from_intervals(mut intervals: Vec<Interval<T>>) -> Self {
        intervals.sort_by(|a, b| a.cmp_range(b));

        let mut tree = Self::with_capacity(intervals.len());
        let mut items: Vec<Option<Interval<T>>> = intervals.into_iter().map(Some).collect();

        tree.len = items.len();
        tree.root = tree.build_balanced(&mut items);
        tree
    }

    /// Number of intervals stored
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the whole tree, 0 when empty
    #[inline]
    pub fn height(&self) -> i32 {
        self.height_of(self.root)
    }

    /// Remove every interval
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.vacant.clear();
        self.root = None;
        self.len = 0;
        self.revision += 1;
    }

    /// Root node, if any
    pub fn root(&self) -> Option<&Node<T>> {
        self.root.map(|i| self.node(i))
    }

    /// Left and right children of a node of this tree
    pub fn children(&self, node: &Node<T>) -> (Option<&Node<T>>, Option<&Node<T>>) {
        (
            node.left.map(|i| self.node(i)),
            node.right.map(|i| self.node(i)),
        )
    }

    /// In-order iterator, ascending by `(start, end)`
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            tree: self,
            stack: Vec::with_capacity(self.height().max(0) as usize),
            next: self.root,
        }
    }

    /// Insert an interval in O(log n).
    ///
    /// Equal ranges are all kept; a newcomer is placed after the ones
    /// already present.
    pub fn insert(&mut self, interval: Interval<T>) {
        let new = self.alloc(Node::leaf(interval));
        let root = self.insert_at(self.root, new);

        self.root = Some(root);
        self.len += 1;
        self.revision += 1;
    }

    /// Remove the node equal to `interval` (bounds and payload).
    ///
    /// Returns the removed interval, or `None` when nothing matched.
    pub fn delete(&mut self, interval: &Interval<T>) -> Option<Interval<T>>
    where
        T: PartialEq,
    {
        let (root, removed) = self.remove_at(self.root, interval);
        let removed = removed?;

        self.root = root;
        self.len -= 1;
        self.revision += 1;

        Some(self.release(removed).interval)
    }

    /// Some node whose interval contains `time`
    pub fn find_one(&self, time: f32) -> Option<&Node<T>> {
        self.find_index(time).map(|i| self.node(i))
    }

    /// Visit every node whose interval contains `time`, in ascending
    /// `(start, end)` order.
    pub fn find_all<'a, F>(&'a self, time: f32, mut visit: F)
    where
        F: FnMut(&'a Node<T>),
    {
        if let Some(root) = self.root {
            self.visit_containing(root, time, &mut visit);
        }
    }

    /// Every interval containing `time`
    pub fn query(&self, time: f32) -> Vec<&Interval<T>> {
        let mut hits = Vec::new();
        self.find_all(time, |node| hits.push(node.interval()));
        hits
    }

    /// Number of intervals containing `time`
    pub fn count_at(&self, time: f32) -> usize {
        let mut count = 0;
        self.find_all(time, |_| count += 1);
        count
    }

    /// Like [`find_one`](Self::find_one), but first re-checks the node
    /// remembered in `cache`. Pays off when successive queries move forward
    /// in small steps, as during playback.
    pub fn cached_search(&self, cache: &mut SearchCache, time: f32) -> Option<&Node<T>> {
        if cache.revision == self.revision {
            if let Some(Some(node)) = cache.node.and_then(|i| self.nodes.get(i as usize)) {
                if node.interval.contains(time) {
                    return Some(node);
                }
            }
        }

        let found = self.find_index(time);
        cache.node = found;
        cache.revision = self.revision;

        found.map(|i| self.node(i))
    }

    // ---- arena ----

    fn alloc(&mut self, node: Node<T>) -> u32 {
        if let Some(i) = self.vacant.pop() {
            self.nodes[i as usize] = Some(node);
            i
        } else {
            let i = self.nodes.len() as u32;
            self.nodes.push(Some(node));
            i
        }
    }

    fn release(&mut self, i: u32) -> Node<T> {
        match self.nodes.get_mut(i as usize).and_then(Option::take) {
            Some(node) => {
                self.vacant.push(i);
                node
            }
            None => unreachable!("released vacant interval tree slot {i}"),
        }
    }

    #[inline]
    fn node(&self, i: u32) -> &Node<T> {
        match self.nodes.get(i as usize) {
            Some(Some(node)) => node,
            _ => unreachable!("dangling interval tree link {i}"),
        }
    }

    #[inline]
    fn node_mut(&mut self, i: u32) -> &mut Node<T> {
        match self.nodes.get_mut(i as usize) {
            Some(Some(node)) => node,
            _ => unreachable!("dangling interval tree link {i}"),
        }
    }

    // ---- augmentation and balancing ----

    #[inline]
    fn height_of(&self, link: Link) -> i32 {
        link.map_or(0, |i| self.node(i).height)
    }

    #[inline]
    fn max_of(&self, link: Link) -> f32 {
        link.map_or(f32::NEG_INFINITY, |i| self.node(i).max)
    }

    #[inline]
    fn balance_factor(&self, i: u32) -> i32 {
        let node = self.node(i);
        self.height_of(node.left) - self.height_of(node.right)
    }

    /// Recompute height and max from the children
    fn update(&mut self, i: u32) {
        let node = self.node(i);
        let (left, right) = (node.left, node.right);

        let height = 1 + self.height_of(left).max(self.height_of(right));
        let max = node
            .interval
            .end()
            .max(self.max_of(left))
            .max(self.max_of(right));

        let node = self.node_mut(i);
        node.height = height;
        node.max = max;
    }

    fn rotate_right(&mut self, y: u32) -> u32 {
        let Some(x) = self.node(y).left else {
            return y;
        };

        let inner = self.node(x).right;
        self.node_mut(y).left = inner;
        self.node_mut(x).right = Some(y);

        self.update(y);
        self.update(x);
        x
    }

    fn rotate_left(&mut self, x: u32) -> u32 {
        let Some(y) = self.node(x).right else {
            return x;
        };

        let inner = self.node(y).left;
        self.node_mut(x).right = inner;
        self.node_mut(y).left = Some(x);

        self.update(x);
        self.update(y);
        y
    }

    /// Restore the AVL property at `i`, returning the subtree's new root
    fn rebalance(&mut self, i: u32) -> u32 {
        self.update(i);
        let balance = self.balance_factor(i);

        let root = if balance > 1 {
            // Left-right case turns into left-left first
            if let Some(left) = self.node(i).left {
                if self.balance_factor(left) < 0 {
                    let left = self.rotate_left(left);
                    self.node_mut(i).left = Some(left);
                }
            }
            self.rotate_right(i)
        } else if balance < -1 {
            // Right-left case turns into right-right first
            if let Some(right) = self.node(i).right {
                if self.balance_factor(right) > 0 {
                    let right = self.rotate_right(right);
                    self.node_mut(i).right = Some(right);
                }
            }
            self.rotate_left(i)
        } else {
            i
        };

        self.debug_assert_local_invariants(root);
        root
    }

    #[inline]
    fn debug_assert_local_invariants(&self, i: u32) {
        if cfg!(debug_assertions) {
            let node = self.node(i);
            let balance = self.balance_factor(i);
            debug_assert!(
                (-1..=1).contains(&balance),
                "interval tree balance factor {balance} at {}..{}",
                node.interval.start(),
                node.interval.end()
            );

            let expected = node
                .interval
                .end()
                .max(self.max_of(node.left))
                .max(self.max_of(node.right));
            debug_assert!(
                node.max == expected,
                "interval tree max {} should be {expected}",
                node.max
            );
        }
    }

    // ---- structure ----

    fn build_balanced(&mut self, items: &mut [Option<Interval<T>>]) -> Link {
        let mid = items.len() / 2;
        let (left_items, rest) = items.split_at_mut(mid);
        let (middle, right_items) = rest.split_first_mut()?;
        let interval = middle.take()?;

        let left = self.build_balanced(left_items);
        let right = self.build_balanced(right_items);

        let i = self.alloc(Node::leaf(interval));
        let node = self.node_mut(i);
        node.left = left;
        node.right = right;
        self.update(i);

        Some(i)
    }

    fn insert_at(&mut self, link: Link, new: u32) -> u32 {
        let Some(i) = link else {
            return new;
        };

        let goes_left =
            self.node(new).interval.cmp_range(&self.node(i).interval) == Ordering::Less;

        if goes_left {
            let child = self.insert_at(self.node(i).left, new);
            self.node_mut(i).left = Some(child);
        } else {
            let child = self.insert_at(self.node(i).right, new);
            self.node_mut(i).right = Some(child);
        }

        self.rebalance(i)
    }

    /// Returns the subtree's new root and the detached node, if found
    fn remove_at(&mut self, link: Link, target: &Interval<T>) -> (Link, Option<u32>)
    where
        T: PartialEq,
    {
        let Some(i) = link else {
            return (None, None);
        };

        match target.cmp_range(&self.node(i).interval) {
            Ordering::Less => self.remove_from_left(i, target),
            Ordering::Greater => self.remove_from_right(i, target),
            Ordering::Equal => {
                if self.node(i).interval.value() == target.value() {
                    return (self.unlink(i), Some(i));
                }

                // Rotations can leave equal ranges on either side
                let (root, removed) = self.remove_from_left(i, target);
                if removed.is_some() {
                    return (root, removed);
                }
                self.remove_from_right(i, target)
            }
        }
    }

    fn remove_from_left(&mut self, i: u32, target: &Interval<T>) -> (Link, Option<u32>)
    where
        T: PartialEq,
    {
        let (child, removed) = self.remove_at(self.node(i).left, target);
        if removed.is_none() {
            return (Some(i), None);
        }

        self.node_mut(i).left = child;
        (Some(self.rebalance(i)), removed)
    }

    fn remove_from_right(&mut self, i: u32, target: &Interval<T>) -> (Link, Option<u32>)
    where
        T: PartialEq,
    {
        let (child, removed) = self.remove_at(self.node(i).right, target);
        if removed.is_none() {
            return (Some(i), None);
        }

        self.node_mut(i).right = child;
        (Some(self.rebalance(i)), removed)
    }

    /// Splice `i` out of its subtree and return what takes its place
    fn unlink(&mut self, i: u32) -> Link {
        let node = self.node(i);

        match (node.left, node.right) {
            (None, None) => None,
            (Some(child), None) | (None, Some(child)) => Some(child),
            (Some(left), Some(right)) => {
                // The in-order successor takes over both subtrees
                let (rest, successor) = self.detach_min(right);
                let node = self.node_mut(successor);
                node.left = Some(left);
                node.right = rest;
                Some(self.rebalance(successor))
            }
        }
    }

    fn detach_min(&mut self, i: u32) -> (Link, u32) {
        match self.node(i).left {
            None => (self.node(i).right, i),
            Some(left) => {
                let (rest, min) = self.detach_min(left);
                self.node_mut(i).left = rest;
                (Some(self.rebalance(i)), min)
            }
        }
    }

    // ---- queries ----

    fn find_index(&self, time: f32) -> Link {
        let mut link = self.root;

        while let Some(i) = link {
            let node = self.node(i);
            if node.interval.contains(time) {
                return Some(i);
            }

            // If the left subtree reaches `time` but holds no hit, every
            // interval to the right starts after `time` as well.
            link = match node.left {
                Some(left) if self.node(left).max >= time => Some(left),
                _ if time >= node.interval.start() => node.right,
                _ => None,
            };
        }

        None
    }

    fn visit_containing<'a, F>(&'a self, i: u32, time: f32, visit: &mut F)
    where
        F: FnMut(&'a Node<T>),
    {
        let node = self.node(i);
        if node.max < time {
            return;
        }

        if let Some(left) = node.left {
            self.visit_containing(left, time, visit);
        }

        if node.interval.contains(time) {
            visit(node);
        }

        if time >= node.interval.start() {
            if let Some(right) = node.right {
                self.visit_containing(right, time, visit);
            }
        }
    }
}

impl<T> Default for IntervalTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for IntervalTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<Interval<T>> for IntervalTree<T> {
    fn from_iter<I: IntoIterator<Item = Interval<T>>>(iter: I) -> Self {
        Self::from_intervals(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a IntervalTree<T> {
    type Item = &'a Interval<T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over the intervals of a tree
pub struct Iter<'a, T> {
    tree: &'a IntervalTree<T>,
    stack: Vec<u32>,
    next: Link,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a Interval<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(i) = self.next {
            self.stack.push(i);
            self.next = self.tree.node(i).left;
        }

        let i = self.stack.pop()?;
        let node = self.tree.node(i);
        self.next = node.right;

        Some(&node.interval)
    }
}
