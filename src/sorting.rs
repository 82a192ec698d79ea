//! Sorting by repeated insertion and extraction
//!
//! Sorting isolates the comparison behaviour of each queue from graph
//! structure. Every function returns the sorted values together with the
//! comparisons the backing queue charged.
//!
//! | Function                 | Queue             | Prediction used                |
//! |--------------------------|-------------------|--------------------------------|
//! | `fibonacci_sort`         | Fibonacci heap    | none                           |
//! | `binary_heap_sort_cost`  | binary heap model | none (closed form)             |
//! | `sort_with_offline_ranks`| skip list         | all ranks known up front       |
//! | `sort_with_online_ranks` | rank index        | one rank per insertion         |
//! | `sort_dirty_clean`       | skip list         | a possibly-wrong comparator    |
//!
//! # Example
//!
//! ```rust
//! use prediction_heaps::config::QueueConfig;
//! use prediction_heaps::sorting::sort_with_offline_ranks;
//!
//! let outcome = sort_with_offline_ranks(vec![(2, 30), (0, 10), (1, 20)], QueueConfig::default());
//! assert_eq!(outcome.sorted, vec![10, 20, 30]);
//! ```

use crate::config::QueueConfig;
use crate::fibonacci::FibonacciHeap;
use crate::rank_index::OnlineRankIndex;
use crate::skiplist::SkipList;
use crate::traits::{ComparisonCount, QueueError};
use std::cmp::Ordering;

pub use crate::simple_binary::sort_cost as binary_heap_sort_cost;

/// Sorted values and the comparisons it took to produce them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOutcome<V> {
    /// Values in ascending order
    pub sorted: Vec<V>,
    /// Comparisons charged by the queue
    pub comparisons: ComparisonCount,
}

/// Inserts every value into a Fibonacci heap, then extracts them all
pub fn fibonacci_sort<V: Ord>(values: impl IntoIterator<Item = V>) -> SortOutcome<V> {
    let mut heap = FibonacciHeap::new();
    for value in values {
        heap.insert(value, ());
    }
    let sorted = std::iter::from_fn(|| heap.extract_min().ok())
        .map(|(value, ())| value)
        .collect();
    SortOutcome {
        sorted,
        comparisons: ComparisonCount {
            clean: heap.comparisons(),
            dirty: 0,
        },
    }
}

/// Orders the pairs by predicted rank, then inserts each value by
/// exponential search from the previously inserted one
///
/// Ordering by rank compares ranks, not values, and is not charged.
pub fn sort_with_offline_ranks<V: Ord, R: Ord>(
    mut pairs: Vec<(R, V)>,
    config: QueueConfig,
) -> SortOutcome<V> {
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut list = SkipList::with_config(config);
    let mut hint = list.head();
    for (_, value) in pairs {
        hint = list.insert_from(hint, value, ());
    }
    drain_list(list)
}

/// Inserts the pairs in the given order into an [`OnlineRankIndex`], then
/// drains it
///
/// # Errors
/// Returns `QueueError::InconsistentRankIndex` if the index loses track of a
/// value.
pub fn sort_with_online_ranks<V: Ord, R: Ord + Copy>(
    pairs: impl IntoIterator<Item = (R, V)>,
    config: QueueConfig,
) -> Result<SortOutcome<V>, QueueError> {
    let mut queue = OnlineRankIndex::with_config(config);
    for (rank, value) in pairs {
        queue.insert(value, (), rank);
    }

    let mut sorted = Vec::with_capacity(queue.len());
    while !queue.is_empty() {
        let (value, ()) = queue.extract_min()?;
        sorted.push(value);
    }
    Ok(SortOutcome {
        sorted,
        comparisons: ComparisonCount {
            clean: queue.comparisons(),
            dirty: 0,
        },
    })
}

/// Inserts every value with the two-phase protocol under `dirty`, then
/// drains the list
///
/// `dirty(existing, probe)` may answer arbitrarily; the output is sorted
/// regardless.
pub fn sort_dirty_clean<V: Ord, F>(
    values: impl IntoIterator<Item = V>,
    mut dirty: F,
    config: QueueConfig,
) -> SortOutcome<V>
where
    F: FnMut(&V, &V) -> Ordering,
{
    let mut list = SkipList::with_dirty_fn(config, |existing, probe| dirty(existing.0, probe.0));
    for value in values {
        list.insert_dirty_clean(value, ());
    }
    drain_list(list)
}

fn drain_list<V: Ord, D: crate::skiplist::DirtyComparator<(), V>>(
    mut list: SkipList<(), V, D>,
) -> SortOutcome<V> {
    let sorted = std::iter::from_fn(|| list.extract_min().ok())
        .map(|(value, ())| value)
        .collect();
    SortOutcome {
        sorted,
        comparisons: ComparisonCount {
            clean: list.clean_comparisons(),
            dirty: list.dirty_comparisons(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn shuffled(n: u32, seed: u64) -> Vec<u32> {
        let mut values: Vec<u32> = (0..n).collect();
        values.shuffle(&mut StdRng::seed_from_u64(seed));
        values
    }

    #[test]
    fn test_fibonacci_sort() {
        let outcome = fibonacci_sort(shuffled(300, 1));
        assert_eq!(outcome.sorted, (0..300).collect::<Vec<_>>());
        assert!(outcome.comparisons.clean > 0);
        assert_eq!(outcome.comparisons.dirty, 0);
    }

    #[test]
    fn test_binary_heap_sort_cost_grows() {
        assert!(binary_heap_sort_cost(1000) > binary_heap_sort_cost(100));
    }

    #[test]
    fn test_offline_exact_ranks_are_linear() {
        let values = shuffled(500, 2);
        let pairs = values.iter().map(|&v| (v, v)).collect();
        let outcome = sort_with_offline_ranks(pairs, QueueConfig::default());
        assert_eq!(outcome.sorted, (0..500).collect::<Vec<_>>());
        // Each value lands right after its hint: one comparison with the hint
        assert!(outcome.comparisons.clean <= 500);
    }

    #[test]
    fn test_online_ranks() {
        let values = shuffled(400, 3);
        let outcome =
            sort_with_online_ranks(values.iter().map(|&v| (v / 10, v)), QueueConfig::default())
                .unwrap();
        assert_eq!(outcome.sorted, (0..400).collect::<Vec<_>>());
    }

    #[test]
    fn test_dirty_clean_with_reversed_comparator() {
        let outcome = sort_dirty_clean(shuffled(300, 4), |a, b| b.cmp(a), QueueConfig::default());
        assert_eq!(outcome.sorted, (0..300).collect::<Vec<_>>());
        assert!(outcome.comparisons.dirty > 0);
    }

    #[test]
    fn test_perfect_dirty_comparator_saves_clean_comparisons() {
        let values = shuffled(1000, 5);
        let perfect = sort_dirty_clean(values.clone(), |a, b| a.cmp(b), QueueConfig::default());
        let useless = sort_dirty_clean(values, |_, _| Ordering::Equal, QueueConfig::default());
        assert_eq!(perfect.sorted, useless.sorted);
        assert!(perfect.comparisons.clean < useless.comparisons.clean);
    }
}
