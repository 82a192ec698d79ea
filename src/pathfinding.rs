//! Single-source shortest paths over any queue in this crate
//!
//! This module provides a Dijkstra driver that is generic over the priority
//! queue and over the source of rank predictions. It exists to compare queues
//! by the number of key comparisons they charge on the same workload.
//!
//! # Design
//!
//! The driver never calls `decrease_key`. When relaxing an edge strictly
//! improves a node's tentative distance, the new `(distance, node)` pair is
//! inserted as a fresh entry and the outdated one stays in the queue. An entry
//! popped with a distance above the recorded best is stale and is skipped.
//! Every queue kind therefore sees the same insert/extract sequence, and the
//! skip-list queues only ever need to act as monotone extract-min queues.
//!
//! Each insertion asks the [`PredictionFeed`] for a predicted rank of the new
//! entry. [`QueueKind::OnlineRank`] uses it to place the entry, and
//! [`QueueKind::DirtyClean`] orders entries by it during the dirty phase of
//! its two-phase insertion. The heaps ignore it.
//!
//! Distances are only recorded for reachable nodes; an absent node is at
//! infinite distance.
//!
//! # Example
//!
//! ```rust
//! use prediction_heaps::pathfinding::{AdjacencyList, QueueKind, ShortestPath};
//! use prediction_heaps::prediction::NoPredictions;
//!
//! let mut graph = AdjacencyList::new();
//! graph.add_edge('A', 'B', 1u32);
//! graph.add_edge('B', 'C', 2);
//! graph.add_edge('A', 'C', 4);
//!
//! let paths = ShortestPath::new(&graph, 'A')
//!     .queue(QueueKind::Fibonacci)
//!     .run(&NoPredictions)
//!     .unwrap();
//! assert_eq!(paths.distance(&'C'), Some(3));
//! ```

use crate::config::QueueConfig;
use crate::fibonacci::FibonacciHeap;
use crate::prediction::PredictionFeed;
use crate::rank_index::OnlineRankIndex;
use crate::simple_binary::SimpleBinaryHeap;
use crate::skiplist::SkipList;
use crate::traits::{ComparisonCount, PriorityQueue, QueueError};
use rustc_hash::FxHashMap;
use std::hash::Hash;
use std::ops::Add;

/// Trait for types that can be used as edge weights and distances.
///
/// This requires the type to be orderable, copyable, and support addition.
/// `Default` must be the zero distance.
pub trait Cost: Ord + Copy + Add<Output = Self> + Default {}

impl<T> Cost for T where T: Ord + Copy + Add<Output = Self> + Default {}

/// A weighted directed graph.
///
/// Weights are assumed non-negative; a negative weight leaves the computed
/// distances unspecified.
pub trait Graph {
    /// Node identifier
    type Node: Copy + Eq + Hash;
    /// Edge weight and distance type
    type Cost: Cost;

    /// Returns true if `node` belongs to the graph
    fn contains(&self, node: Self::Node) -> bool;

    /// Returns the outgoing edges of `node` with their weights
    fn neighbors(&self, node: Self::Node) -> Vec<(Self::Node, Self::Cost)>;
}

/// Adjacency-list graph
#[derive(Debug, Clone)]
pub struct AdjacencyList<N: Eq + Hash, C> {
    edges: FxHashMap<N, Vec<(N, C)>>,
}

impl<N: Copy + Eq + Hash, C: Cost> AdjacencyList<N, C> {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self {
            edges: FxHashMap::default(),
        }
    }

    /// Adds a node with no edges; existing nodes are left untouched
    pub fn add_node(&mut self, node: N) {
        self.edges.entry(node).or_default();
    }

    /// Adds a directed edge, adding either endpoint if missing
    pub fn add_edge(&mut self, from: N, to: N, weight: C) {
        self.add_node(to);
        self.edges.entry(from).or_default().push((to, weight));
    }

    /// Iterates over every node
    pub fn nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.edges.keys().copied()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

impl<N: Copy + Eq + Hash, C: Cost> Default for AdjacencyList<N, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Copy + Eq + Hash, C: Cost> FromIterator<(N, N, C)> for AdjacencyList<N, C> {
    fn from_iter<I: IntoIterator<Item = (N, N, C)>>(iter: I) -> Self {
        let mut graph = Self::new();
        for (from, to, weight) in iter {
            graph.add_edge(from, to, weight);
        }
        graph
    }
}

impl<N: Copy + Eq + Hash, C: Cost> Graph for AdjacencyList<N, C> {
    type Node = N;
    type Cost = C;

    fn contains(&self, node: N) -> bool {
        self.edges.contains_key(&node)
    }

    fn neighbors(&self, node: N) -> Vec<(N, C)> {
        self.edges.get(&node).cloned().unwrap_or_default()
    }
}

/// Which queue drives a shortest-path run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueueKind {
    /// [`SimpleBinaryHeap`] with its modeled cost
    Binary,
    /// [`FibonacciHeap`], the prediction-free baseline
    #[default]
    Fibonacci,
    /// [`SkipList`] with dirty comparisons ordered by predicted rank
    DirtyClean,
    /// [`OnlineRankIndex`] placing entries by predicted rank
    OnlineRank,
}

impl QueueKind {
    /// Every queue kind
    pub const ALL: [QueueKind; 4] = [
        QueueKind::Binary,
        QueueKind::Fibonacci,
        QueueKind::DirtyClean,
        QueueKind::OnlineRank,
    ];
}

/// Outcome of a shortest-path run
#[derive(Debug, Clone)]
pub struct ShortestPaths<N: Eq + Hash, C> {
    distances: FxHashMap<N, C>,
    /// Comparisons charged by the queue over the whole run
    pub comparisons: ComparisonCount,
    /// Every key produced by a successful relaxation, in insertion order, if
    /// recording was requested. The source's zero is not included.
    pub relaxed_keys: Option<Vec<C>>,
    /// Entries popped after a better distance had already been recorded
    pub stale_pops: usize,
    /// Nodes settled, i.e. non-stale pops
    pub settled: usize,
}

impl<N: Copy + Eq + Hash, C: Cost> ShortestPaths<N, C> {
    /// Distance to `node`, or `None` if it is unreachable
    pub fn distance(&self, node: &N) -> Option<C> {
        self.distances.get(node).copied()
    }

    /// Distances of every reachable node
    pub fn distances(&self) -> &FxHashMap<N, C> {
        &self.distances
    }

    /// Reachable nodes sorted by distance
    pub fn ranked_nodes(&self) -> Vec<N> {
        let mut ranked: Vec<(C, N)> = self.distances.iter().map(|(&n, &d)| (d, n)).collect();
        ranked.sort_by(|a, b| a.0.cmp(&b.0));
        ranked.into_iter().map(|(_, n)| n).collect()
    }
}

/// Builder for shortest-path runs.
///
/// Provides a fluent API for choosing the queue and its configuration.
pub struct ShortestPath<'g, G: Graph> {
    graph: &'g G,
    source: G::Node,
    kind: QueueKind,
    config: QueueConfig,
    record_relaxed_keys: bool,
}

impl<'g, G: Graph> ShortestPath<'g, G> {
    /// Creates a run from `source` using the Fibonacci heap and the default
    /// configuration
    pub fn new(graph: &'g G, source: G::Node) -> Self {
        ShortestPath {
            graph,
            source,
            kind: QueueKind::default(),
            config: QueueConfig::default(),
            record_relaxed_keys: false,
        }
    }

    /// Sets the queue kind
    pub fn queue(mut self, kind: QueueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the configuration used by the skip-list queues
    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// Records every inserted key in [`ShortestPaths::relaxed_keys`]
    pub fn record_relaxed_keys(mut self, record: bool) -> Self {
        self.record_relaxed_keys = record;
        self
    }

    /// Runs Dijkstra's algorithm to exhaustion.
    ///
    /// # Errors
    /// Returns `QueueError::UnknownSource` if the source is not in the graph,
    /// or any error the queue reports during extraction.
    pub fn run<F>(&self, feed: &F) -> Result<ShortestPaths<G::Node, G::Cost>, QueueError>
    where
        F: PredictionFeed<G::Node, G::Cost>,
    {
        if !self.graph.contains(self.source) {
            return Err(QueueError::UnknownSource);
        }

        match self.kind {
            QueueKind::Binary => self.drive(SimpleBinaryHeap::new(), feed),
            QueueKind::Fibonacci => self.drive(FibonacciHeap::new(), feed),
            QueueKind::DirtyClean => {
                let queue = SkipList::with_dirty_fn(self.config, |existing, probe| {
                    let existing_rank = feed.predicted_rank(existing.1, existing.0);
                    let probe_rank = feed.predicted_rank(probe.1, probe.0);
                    existing_rank.cmp(&probe_rank)
                });
                self.drive(queue, feed)
            }
            QueueKind::OnlineRank => self.drive(OnlineRankIndex::with_config(self.config), feed),
        }
    }

    fn drive<Q, F>(
        &self,
        mut queue: Q,
        feed: &F,
    ) -> Result<ShortestPaths<G::Node, G::Cost>, QueueError>
    where
        Q: PriorityQueue<G::Node, G::Cost, F::Rank>,
        F: PredictionFeed<G::Node, G::Cost>,
    {
        let zero = G::Cost::default();
        let mut distances: FxHashMap<G::Node, G::Cost> = FxHashMap::default();
        let mut relaxed_keys = self.record_relaxed_keys.then(Vec::new);
        let mut stale_pops = 0;
        let mut settled = 0;

        distances.insert(self.source, zero);
        queue.insert(zero, self.source, feed.predicted_rank(&self.source, &zero));

        while !queue.is_empty() {
            let (distance, node) = queue.extract_min()?;

            if distances.get(&node).is_some_and(|&best| distance > best) {
                stale_pops += 1;
                continue;
            }
            settled += 1;

            for (neighbor, weight) in self.graph.neighbors(node) {
                let candidate = distance + weight;
                let improves = distances
                    .get(&neighbor)
                    .map_or(true, |&current| candidate < current);
                if !improves {
                    continue;
                }

                distances.insert(neighbor, candidate);
                if let Some(keys) = relaxed_keys.as_mut() {
                    keys.push(candidate);
                }
                let rank = feed.predicted_rank(&neighbor, &candidate);
                queue.insert(candidate, neighbor, rank);
            }
        }

        let comparisons = queue.comparison_count();
        log::debug!(
            "{:?} run: {} settled, {} stale pops, {} clean + {} dirty comparisons",
            self.kind,
            settled,
            stale_pops,
            comparisons.clean,
            comparisons.dirty
        );

        Ok(ShortestPaths {
            distances,
            comparisons,
            relaxed_keys,
            stale_pops,
            settled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::{NoPredictions, RankTable};

    fn line_graph(n: u32) -> AdjacencyList<u32, u32> {
        (0..n - 1).map(|i| (i, i + 1, 1)).collect()
    }

    #[test]
    fn test_line_graph_all_queues() {
        let graph = line_graph(50);
        for kind in QueueKind::ALL {
            let paths = ShortestPath::new(&graph, 0)
                .queue(kind)
                .run(&NoPredictions)
                .unwrap();
            for i in 0..50 {
                assert_eq!(paths.distance(&i), Some(i), "{:?} node {}", kind, i);
            }
            assert_eq!(paths.settled, 50);
            assert_eq!(paths.stale_pops, 0);
        }
    }

    #[test]
    fn test_unknown_source() {
        let graph = line_graph(3);
        let result = ShortestPath::new(&graph, 99).run(&NoPredictions);
        assert_eq!(result.err(), Some(QueueError::UnknownSource));
    }

    #[test]
    fn test_stale_entries_are_skipped() {
        // 0 -> 2 is long, 0 -> 1 -> 2 is short, so 2 is inserted twice
        let graph: AdjacencyList<u32, u32> =
            [(0, 2, 10), (0, 1, 1), (1, 2, 1)].into_iter().collect();
        let paths = ShortestPath::new(&graph, 0)
            .queue(QueueKind::Binary)
            .record_relaxed_keys(true)
            .run(&NoPredictions)
            .unwrap();
        assert_eq!(paths.distance(&2), Some(2));
        assert_eq!(paths.stale_pops, 1);
        assert_eq!(paths.relaxed_keys, Some(vec![10, 1, 2]));
    }

    #[test]
    fn test_unreachable_nodes_are_absent() {
        let mut graph = line_graph(3);
        graph.add_node(7);
        let paths = ShortestPath::new(&graph, 0).run(&NoPredictions).unwrap();
        assert_eq!(paths.distance(&7), None);
        assert_eq!(paths.distances().len(), 3);
    }

    #[test]
    fn test_ranked_nodes() {
        let graph: AdjacencyList<char, u32> =
            [('a', 'b', 5), ('a', 'c', 1), ('c', 'd', 1)].into_iter().collect();
        let paths = ShortestPath::new(&graph, 'a').run(&NoPredictions).unwrap();
        assert_eq!(paths.ranked_nodes(), vec!['a', 'c', 'd', 'b']);

        let table = RankTable::from_ranked_nodes(paths.ranked_nodes());
        let again = ShortestPath::new(&graph, 'a')
            .queue(QueueKind::OnlineRank)
            .run(&table)
            .unwrap();
        assert_eq!(again.distances(), paths.distances());
    }
}
