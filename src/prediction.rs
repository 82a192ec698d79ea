//! Prediction feeds for rank-aware queues
//!
//! A [`PredictionFeed`] is consulted once per queue insertion and may return a
//! predicted rank for the entry. Queues that use ranks treat the answer as a
//! placement hint; a wrong answer costs comparisons, never correctness.
//!
//! Three adapters are provided:
//!
//! - [`NoPredictions`]: blind insertion
//! - [`RankTable`]: a fixed rank per node, e.g. from the node order of an
//!   earlier run
//! - [`SortedKeys`]: a sorted list of every key the run will insert; the
//!   predicted rank of a key is its bisect-left position
//!
//! Feeds are read-only during a run, so a deterministic feed gives
//! reproducible comparison counts.

use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Source of predicted ranks for queue insertions
pub trait PredictionFeed<N, C> {
    /// Rank type handed to the queue
    type Rank: Ord + Copy + Default;

    /// Predicted rank for inserting `node` with key `key`, if any
    fn predicted_rank(&self, node: &N, key: &C) -> Option<Self::Rank>;
}

/// A feed that never predicts
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPredictions;

impl<N, C> PredictionFeed<N, C> for NoPredictions {
    type Rank = usize;

    fn predicted_rank(&self, _node: &N, _key: &C) -> Option<usize> {
        None
    }
}

/// Predicted rank per node
///
/// Ranks need not lie in `0..n`: a table over `i64` can hold the negative or
/// oversized ranks a noisy predictor produces.
#[derive(Debug, Clone)]
pub struct RankTable<N: Eq + Hash, R = usize> {
    ranks: FxHashMap<N, R>,
}

impl<N: Eq + Hash, R: Copy> RankTable<N, R> {
    /// Creates an empty table
    pub fn new() -> Self {
        Self {
            ranks: FxHashMap::default(),
        }
    }

    /// Builds a table from explicit `(node, rank)` pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (N, R)>) -> Self {
        Self {
            ranks: pairs.into_iter().collect(),
        }
    }

    /// Sets the rank of `node`
    pub fn set(&mut self, node: N, rank: R) {
        self.ranks.insert(node, rank);
    }

    /// Rank of `node`, if it has one
    pub fn get(&self, node: &N) -> Option<R> {
        self.ranks.get(node).copied()
    }

    /// Number of ranked nodes
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Returns true if no node is ranked
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

impl<N: Eq + Hash> RankTable<N> {
    /// Builds a table that ranks nodes by their position in `nodes`
    pub fn from_ranked_nodes(nodes: impl IntoIterator<Item = N>) -> Self {
        Self::from_pairs(nodes.into_iter().enumerate().map(|(rank, node)| (node, rank)))
    }
}

impl<N: Eq + Hash, R: Copy> Default for RankTable<N, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Eq + Hash, C, R: Ord + Copy + Default> PredictionFeed<N, C> for RankTable<N, R> {
    type Rank = R;

    fn predicted_rank(&self, node: &N, _key: &C) -> Option<R> {
        self.get(node)
    }
}

/// Every key a run will insert, sorted
///
/// Typically built from [`ShortestPaths::relaxed_keys`](crate::pathfinding::ShortestPaths)
/// of an earlier run over the same graph.
#[derive(Debug, Clone)]
pub struct SortedKeys<C> {
    keys: Vec<C>,
}

impl<C: Ord> SortedKeys<C> {
    /// Sorts `keys` and wraps them
    pub fn new(mut keys: Vec<C>) -> Self {
        keys.sort_unstable();
        Self { keys }
    }

    /// Number of keys strictly less than `key`
    pub fn rank_of(&self, key: &C) -> usize {
        self.keys.partition_point(|k| k < key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if there are no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<C: Ord> FromIterator<C> for SortedKeys<C> {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<N, C: Ord> PredictionFeed<N, C> for SortedKeys<C> {
    type Rank = usize;

    fn predicted_rank(&self, _node: &N, key: &C) -> Option<usize> {
        Some(self.rank_of(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_predictions() {
        assert_eq!(PredictionFeed::<char, u32>::predicted_rank(&NoPredictions, &'a', &3), None);
    }

    #[test]
    fn test_rank_table_from_ranked_nodes() {
        let table = RankTable::from_ranked_nodes(['c', 'a', 'b']);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(&'c'), Some(0));
        assert_eq!(table.get(&'b'), Some(2));
        assert_eq!(PredictionFeed::<char, u32>::predicted_rank(&table, &'z', &0), None);
    }

    #[test]
    fn test_rank_table_out_of_range_ranks() {
        let mut table = RankTable::from_pairs([('a', -1i64), ('b', 1_000_000)]);
        table.set('c', -1);
        assert_eq!(table.get(&'a'), Some(-1));
        assert_eq!(PredictionFeed::<char, u32>::predicted_rank(&table, &'b', &0), Some(1_000_000));
        assert_eq!(PredictionFeed::<char, u32>::predicted_rank(&table, &'c', &0), Some(-1));
    }

    #[test]
    fn test_sorted_keys_bisect_left() {
        let keys: SortedKeys<u32> = [5, 1, 3, 3, 9].into_iter().collect();
        assert_eq!(keys.rank_of(&0), 0);
        assert_eq!(keys.rank_of(&3), 1);
        assert_eq!(keys.rank_of(&4), 3);
        assert_eq!(keys.rank_of(&10), 5);
        assert_eq!(PredictionFeed::<(), u32>::predicted_rank(&keys, &(), &9), Some(4));
    }
}
