//! Online rank index over a skip list
//!
//! [`OnlineRankIndex`] positions each insertion by its predicted rank before
//! touching a single key. An ordered set of the distinct ranks currently
//! present answers "greatest rank not above r" in time logarithmic in the
//! number of distinct ranks. The most recent node inserted under that rank
//! becomes the hint for the backing skip list's exponential search, so the
//! clean comparisons charged depend only on how far the prediction was from
//! the truth.
//!
//! # Example
//!
//! ```rust
//! use prediction_heaps::rank_index::OnlineRankIndex;
//!
//! let mut queue = OnlineRankIndex::new();
//! queue.insert(30, "c", 2u32);
//! queue.insert(10, "a", 0);
//! queue.insert(20, "b", 1);
//!
//! assert_eq!(queue.extract_min(), Ok((10, "a")));
//! assert_eq!(queue.distinct_ranks(), 2);
//! ```

use crate::config::QueueConfig;
use crate::skiplist::{SkipHandle, SkipList};
use crate::traits::{ComparisonCount, PriorityQueue, QueueError};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Min-priority queue whose insertions start from a predicted rank
///
/// # Type Parameters
///
/// - `T`: The item type stored in the queue
/// - `P`: The priority type
/// - `R`: The predicted rank type; any totally ordered key works
pub struct OnlineRankIndex<T, P, R> {
    list: SkipList<T, P>,
    /// Rank to the live nodes inserted under it, keyed by insertion sequence
    ranks: BTreeMap<R, BTreeMap<u64, SkipHandle>>,
    node_rank: FxHashMap<SkipHandle, (R, u64)>,
    next_seq: u64,
}

impl<T, P: Ord, R: Ord + Copy> OnlineRankIndex<T, P, R> {
    /// Creates an empty queue with the default configuration
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Creates an empty queue whose skip list uses `config`
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            list: SkipList::with_config(config),
            ranks: BTreeMap::new(),
            node_rank: FxHashMap::default(),
            next_seq: 0,
        }
    }

    /// Returns true if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns the number of elements in the queue
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Number of distinct predicted ranks with a live element
    pub fn distinct_ranks(&self) -> usize {
        self.ranks.len()
    }

    /// Clean comparisons charged by the backing skip list
    pub fn comparisons(&self) -> u64 {
        self.list.clean_comparisons()
    }

    /// The backing skip list
    pub fn list(&self) -> &SkipList<T, P> {
        &self.list
    }

    /// Inserts an element, starting the search at the newest element whose
    /// predicted rank is the greatest one not above `predicted_rank`
    ///
    /// Falls back to the head when no such rank is present.
    pub fn insert(&mut self, priority: P, item: T, predicted_rank: R) -> SkipHandle {
        let hint = self
            .ranks
            .range(..=predicted_rank)
            .next_back()
            .and_then(|(_, handles)| handles.last_key_value().map(|(_, &h)| h));
        log::trace!(
            "rank index: {} distinct ranks, hint found: {}",
            self.ranks.len(),
            hint.is_some()
        );

        let hint = hint.unwrap_or_else(|| self.list.head());
        let handle = self.list.insert_from(hint, priority, item);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ranks.entry(predicted_rank).or_default().insert(seq, handle);
        self.node_rank.insert(handle, (predicted_rank, seq));
        handle
    }

    /// Removes and returns the minimum element, dropping its rank entry once
    /// no other element shares that rank
    ///
    /// # Errors
    /// Returns `QueueError::EmptyQueue` if the queue is empty, or
    /// `QueueError::InconsistentRankIndex` if the extracted element was never
    /// registered under a rank.
    pub fn extract_min(&mut self) -> Result<(P, T), QueueError> {
        let (handle, priority, item) = self.list.pop_front().ok_or(QueueError::EmptyQueue)?;
        let (rank, seq) = self
            .node_rank
            .remove(&handle)
            .ok_or(QueueError::InconsistentRankIndex)?;
        let handles = self
            .ranks
            .get_mut(&rank)
            .ok_or(QueueError::InconsistentRankIndex)?;
        handles
            .remove(&seq)
            .ok_or(QueueError::InconsistentRankIndex)?;
        if handles.is_empty() {
            self.ranks.remove(&rank);
        }
        Ok((priority, item))
    }
}

impl<T, P: Ord, R: Ord + Copy> Default for OnlineRankIndex<T, P, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Elements inserted without a prediction go under `R::default()`
impl<T, P: Ord, R: Ord + Copy + Default> PriorityQueue<T, P, R> for OnlineRankIndex<T, P, R> {
    fn insert(&mut self, priority: P, item: T, predicted_rank: Option<R>) {
        OnlineRankIndex::insert(self, priority, item, predicted_rank.unwrap_or_default());
    }

    fn extract_min(&mut self) -> Result<(P, T), QueueError> {
        OnlineRankIndex::extract_min(self)
    }

    fn is_empty(&self) -> bool {
        OnlineRankIndex::is_empty(self)
    }

    fn len(&self) -> usize {
        OnlineRankIndex::len(self)
    }

    fn comparison_count(&self) -> ComparisonCount {
        ComparisonCount {
            clean: self.comparisons(),
            dirty: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut queue = OnlineRankIndex::new();
        assert!(queue.is_empty());

        queue.insert(5, "e", 4u32);
        queue.insert(1, "a", 0);
        queue.insert(3, "c", 2);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.distinct_ranks(), 3);
        assert_eq!(queue.extract_min(), Ok((1, "a")));
        assert_eq!(queue.extract_min(), Ok((3, "c")));
        assert_eq!(queue.extract_min(), Ok((5, "e")));
        assert_eq!(queue.extract_min(), Err(QueueError::EmptyQueue));
        assert_eq!(queue.distinct_ranks(), 0);
    }

    #[test]
    fn test_shared_rank_removed_with_last_value() {
        let mut queue = OnlineRankIndex::new();
        queue.insert(2, (), 7i64);
        queue.insert(1, (), 7);
        queue.insert(9, (), 8);
        assert_eq!(queue.distinct_ranks(), 2);

        queue.extract_min().unwrap();
        assert_eq!(queue.distinct_ranks(), 2);
        queue.extract_min().unwrap();
        assert_eq!(queue.distinct_ranks(), 1);
    }

    #[test]
    fn test_large_shared_rank_drains_in_order() {
        let n = 50_000u64;
        let mut queue = OnlineRankIndex::new();
        for i in 0..n {
            queue.insert((i * 7919) % n, i, 0u8);
        }
        assert_eq!(queue.distinct_ranks(), 1);

        // Interleave so removals hit the middle of the rank's bag
        for i in 0..n / 2 {
            queue.insert(n + i, i, 0);
            let (p, _) = queue.extract_min().unwrap();
            assert_eq!(p, i);
        }
        let drained: Vec<u64> = std::iter::from_fn(|| queue.extract_min().ok())
            .map(|(p, _)| p)
            .collect();
        assert_eq!(drained, (n / 2..n + n / 2).collect::<Vec<_>>());
        assert_eq!(queue.distinct_ranks(), 0);
    }

    #[test]
    fn test_wrong_ranks_still_sorted() {
        let mut queue = OnlineRankIndex::new();
        // Ranks exactly reversed
        for i in 0..200u32 {
            queue.insert(i, i, 200 - i);
        }
        let drained: Vec<u32> = std::iter::from_fn(|| queue.extract_min().ok())
            .map(|(p, _)| p)
            .collect();
        assert_eq!(drained, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_exact_ranks_are_cheap() {
        let keys: Vec<u32> = (0..500).map(|i| (i * 7919) % 500).collect();

        let mut exact = OnlineRankIndex::new();
        for &k in &keys {
            exact.insert(k, (), k);
        }
        let mut blind = OnlineRankIndex::new();
        for &k in &keys {
            blind.insert(k, (), 0u32);
        }

        assert!(
            exact.comparisons() < blind.comparisons(),
            "exact {} vs blind {}",
            exact.comparisons(),
            blind.comparisons()
        );
    }

    #[test]
    fn test_missing_rank_uses_default() {
        let mut queue: OnlineRankIndex<&str, i32, u32> = OnlineRankIndex::new();
        PriorityQueue::insert(&mut queue, 4, "x", None);
        PriorityQueue::insert(&mut queue, 2, "y", Some(3));
        assert_eq!(queue.distinct_ranks(), 2);
        assert_eq!(PriorityQueue::extract_min(&mut queue), Ok((2, "y")));
    }
}
