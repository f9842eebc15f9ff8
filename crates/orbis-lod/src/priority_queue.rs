//! Priority queue ordering patch uploads by visual importance.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::PatchKey;

/// Priority of a patch request. Higher scores are uploaded first.
///
/// Closer patches dominate; at equal distance finer levels win.
#[must_use]
pub fn compute_priority(distance: f64, level: u8) -> f64 {
    let distance_clamped = distance.max(1.0);
    let mut score = 10_000.0 / (distance_clamped * distance_clamped);
    score += 100.0 / 2f64.powi(i32::from(level));
    score
}

/// Stale heap entries tolerated before the heap is compacted.
const STALE_SLACK: usize = 64;

/// Heap entry; ordered by priority, ties going to the older request.
#[derive(Clone, Copy, Debug)]
struct QueuedUpload {
    priority: f64,
    generation: u64,
    key: PatchKey,
}

impl PartialEq for QueuedUpload {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedUpload {}

impl PartialOrd for QueuedUpload {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedUpload {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.generation.cmp(&self.generation))
    }
}

/// Pending patch uploads keyed by [`PatchKey`].
///
/// Each queued key has exactly one live heap entry, identified by its
/// generation. Re-prioritised and removed keys leave stale entries behind;
/// they are skipped on pop and swept once they outnumber the live ones.
#[derive(Debug, Default)]
pub struct UploadQueue {
    heap: BinaryHeap<QueuedUpload>,
    /// Live entry of every queued key.
    live: HashMap<PatchKey, QueuedUpload>,
    next_generation: u64,
}

impl UploadQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `key`, or move it to `priority` if already queued.
    ///
    /// Re-pushing a key at its current priority is a no-op.
    pub fn push(&mut self, key: PatchKey, priority: f64) {
        if let Some(current) = self.live.get(&key)
            && current.priority == priority
        {
            return;
        }
        let entry = QueuedUpload {
            priority,
            generation: self.next_generation,
            key,
        };
        self.next_generation += 1;
        self.live.insert(key, entry);
        self.heap.push(entry);
        self.compact_if_stale();
    }

    /// Take the highest-priority key.
    pub fn pop(&mut self) -> Option<PatchKey> {
        while let Some(entry) = self.heap.pop() {
            if self.is_live(&entry) {
                self.live.remove(&entry.key);
                return Some(entry.key);
            }
        }
        None
    }

    /// Drop `key` from the queue. Returns whether it was queued.
    pub fn remove(&mut self, key: &PatchKey) -> bool {
        let removed = self.live.remove(key).is_some();
        if removed {
            self.compact_if_stale();
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, key: &PatchKey) -> bool {
        self.live.contains_key(key)
    }

    /// Number of queued keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }

    fn is_live(&self, entry: &QueuedUpload) -> bool {
        self.live
            .get(&entry.key)
            .is_some_and(|live| live.generation == entry.generation)
    }

    fn compact_if_stale(&mut self) {
        if self.heap.len() <= 2 * self.live.len() + STALE_SLACK {
            return;
        }
        let live = &self.live;
        self.heap.retain(|entry| {
            live.get(&entry.key)
                .is_some_and(|l| l.generation == entry.generation)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_cubesphere::CubeFace;

    fn key(level: u8, x: u64) -> PatchKey {
        PatchKey {
            face: CubeFace::PosX,
            level,
            x,
            z: 0,
        }
    }

    #[test]
    fn test_closer_patch_has_higher_priority() {
        assert!(compute_priority(100.0, 0) > compute_priority(1000.0, 0));
    }

    #[test]
    fn test_finer_level_wins_at_equal_distance() {
        assert!(compute_priority(500.0, 0) > compute_priority(500.0, 4));
    }

    #[test]
    fn test_queue_returns_highest_priority_first() {
        let mut queue = UploadQueue::new();
        queue.push(key(3, 0), 10.0);
        queue.push(key(1, 0), 50.0);
        queue.push(key(1, 32), 100.0);
        assert_eq!(queue.pop(), Some(key(1, 32)));
        assert_eq!(queue.pop(), Some(key(1, 0)));
        assert_eq!(queue.pop(), Some(key(3, 0)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_repush_updates_priority() {
        let mut queue = UploadQueue::new();
        queue.push(key(0, 0), 100.0);
        queue.push(key(0, 16), 50.0);
        queue.push(key(0, 0), 30.0);
        queue.push(key(0, 16), 90.0);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(key(0, 16)));
        assert_eq!(queue.pop(), Some(key(0, 0)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_removed_key_is_skipped() {
        let mut queue = UploadQueue::new();
        queue.push(key(0, 0), 100.0);
        queue.push(key(0, 16), 50.0);
        assert!(queue.remove(&key(0, 0)));
        assert!(!queue.remove(&key(0, 0)));
        assert!(!queue.contains(&key(0, 0)));
        assert_eq!(queue.pop(), Some(key(0, 16)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_same_priority_repush_is_ignored() {
        let mut queue = UploadQueue::new();
        for _ in 0..10 {
            queue.push(key(0, 0), 42.0);
        }
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.heap.len(), 1);
    }

    #[test]
    fn test_equal_priorities_pop_oldest_first() {
        let mut queue = UploadQueue::new();
        queue.push(key(0, 0), 5.0);
        queue.push(key(0, 16), 5.0);
        queue.push(key(0, 32), 5.0);
        assert_eq!(queue.pop(), Some(key(0, 0)));
        assert_eq!(queue.pop(), Some(key(0, 16)));
        assert_eq!(queue.pop(), Some(key(0, 32)));
    }

    #[test]
    fn test_heap_stays_bounded_under_churn() {
        let mut queue = UploadQueue::new();
        for frame in 0..1000u64 {
            for x in 0..100u64 {
                queue.push(key(0, x * 16), (frame * 100 + x) as f64);
            }
            for _ in 0..8 {
                queue.pop();
            }
            for x in 0..100u64 {
                queue.remove(&key(0, x * 16));
            }
            assert!(queue.is_empty());
            assert!(queue.heap.len() <= 2 * 100 + STALE_SLACK);
        }
    }

    #[test]
    fn test_reprioritised_keys_do_not_accumulate() {
        let mut queue = UploadQueue::new();
        for frame in 0..500u64 {
            for x in 0..50u64 {
                queue.push(key(0, x * 16), (frame + x) as f64);
            }
            assert_eq!(queue.len(), 50);
            assert!(queue.heap.len() <= 2 * 50 + STALE_SLACK);
        }
        let mut popped = 0;
        while queue.pop().is_some() {
            popped += 1;
        }
        assert_eq!(popped, 50);
    }
}
