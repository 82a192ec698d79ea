//! Priority queues that exploit rank predictions
//!
//! This crate provides priority queues that count every key comparison they
//! make, and a shortest-path driver that runs any of them on the same
//! workload. Some queues accept a predicted rank (or a possibly-wrong
//! comparator) with each insertion and use it to start their search near the
//! right place; a bad prediction costs comparisons, never correctness.
//!
//! # Features
//!
//! - **Binary Heap**: baseline with a closed-form comparison cost model
//! - **Fibonacci Heap**: O(1) amortized insert, decrease_key, and merge; O(log n) amortized delete-min
//! - **Skip List**: predecessor search, exponential search from a hint, and a
//!   two-phase dirty/clean insertion that tolerates a wrong comparator
//! - **Online Rank Index**: a skip list positioned by the greatest predicted
//!   rank not above the new entry's
//! - **Shortest paths**: Dijkstra over any of the above, fed by a
//!   [`PredictionFeed`](prediction::PredictionFeed)
//!
//! # Example
//!
//! ```rust
//! use prediction_heaps::pathfinding::{AdjacencyList, QueueKind, ShortestPath};
//! use prediction_heaps::prediction::{NoPredictions, RankTable};
//!
//! let graph: AdjacencyList<char, u32> =
//!     [('A', 'B', 1), ('A', 'C', 4), ('B', 'C', 2), ('C', 'D', 1)].into_iter().collect();
//!
//! let baseline = ShortestPath::new(&graph, 'A').run(&NoPredictions).unwrap();
//! let ranks = RankTable::from_ranked_nodes(baseline.ranked_nodes());
//!
//! let predicted = ShortestPath::new(&graph, 'A')
//!     .queue(QueueKind::OnlineRank)
//!     .run(&ranks)
//!     .unwrap();
//! assert_eq!(predicted.distance(&'D'), Some(4));
//! ```

pub mod config;
pub mod fibonacci;
pub mod pathfinding;
pub mod prediction;
pub mod rank_index;
pub mod simple_binary;
pub mod skiplist;
pub mod sorting;
pub mod traits;

// Re-export the main trait for convenience
pub use traits::{ComparisonCount, PriorityQueue, QueueError};
