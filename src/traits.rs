//! Common traits for the priority queues in this crate
//!
//! Every queue implements [`PriorityQueue`], the capability consumed by the
//! shortest-path driver:
//!
//! - `insert` stores a `(priority, item)` pair, optionally annotated with a
//!   predicted rank
//! - `extract_min` removes and returns the minimum pair
//! - `comparison_count` reports how many key comparisons were charged
//!
//! Queues that cannot use a prediction simply ignore it. The comparison
//! counters are the metric this crate exists to measure, so every queue keeps
//! them itself and never resets them after construction.

use thiserror::Error;

/// Error type for queue operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The operation needs at least one element
    #[error("queue is empty")]
    EmptyQueue,
    /// `decrease_key` was called with a priority that is not smaller
    #[error("new priority is not less than current priority")]
    InvalidDecrease,
    /// The handle is no longer valid (element was removed or belongs to another queue)
    #[error("handle is no longer valid (element was removed)")]
    InvalidHandle,
    /// The shortest-path source is not a node of the graph
    #[error("source node is not part of the graph")]
    UnknownSource,
    /// An extracted value had no entry in the rank index
    #[error("rank index lost track of an extracted value")]
    InconsistentRankIndex,
}

/// Number of key comparisons charged by a queue
///
/// `clean` comparisons always return the true ordering. `dirty` comparisons
/// were answered by a possibly-wrong predictor and are only charged by the
/// skip-list variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparisonCount {
    /// Comparisons guaranteed to be correct
    pub clean: u64,
    /// Comparisons answered by the dirty comparator
    pub dirty: u64,
}

impl ComparisonCount {
    /// Clean plus dirty comparisons
    pub fn total(&self) -> u64 {
        self.clean + self.dirty
    }
}

/// Min-priority queue that may use a predicted rank to place new entries
///
/// `R` is the type of predicted ranks supplied by a prediction feed. Queues
/// that do not use predictions implement this trait for every `R`.
///
/// # Example
///
/// ```rust
/// use prediction_heaps::fibonacci::FibonacciHeap;
/// use prediction_heaps::PriorityQueue;
///
/// let mut heap = FibonacciHeap::new();
/// PriorityQueue::<_, _, ()>::insert(&mut heap, 3, "three", None);
/// PriorityQueue::<_, _, ()>::insert(&mut heap, 1, "one", None);
/// assert_eq!(PriorityQueue::<_, _, ()>::extract_min(&mut heap), Ok((1, "one")));
/// ```
pub trait PriorityQueue<T, P: Ord, R> {
    /// Inserts an element, using `predicted_rank` as a placement hint if the
    /// queue supports one
    fn insert(&mut self, priority: P, item: T, predicted_rank: Option<R>);

    /// Removes and returns the minimum priority and associated item
    ///
    /// # Errors
    /// Returns `QueueError::EmptyQueue` if the queue is empty.
    fn extract_min(&mut self) -> Result<(P, T), QueueError>;

    /// Returns true if the queue is empty
    fn is_empty(&self) -> bool;

    /// Returns the number of elements in the queue
    fn len(&self) -> usize;

    /// Comparisons charged since construction
    fn comparison_count(&self) -> ComparisonCount;
}
