//! Simple Binary Heap implementation
//!
//! A straightforward binary min-heap used as the prediction-free baseline.
//!
//! Unlike the other queues in this crate, the binary heap does not count the
//! comparisons its sift loops actually perform. It charges a closed-form cost
//! per operation instead:
//!
//! | Operation     | Charged comparisons                    |
//! |---------------|----------------------------------------|
//! | `push`        | `⌊log2(⌊log2(n + 2)⌋)⌋` (n before push) |
//! | `pop`         | `⌊log2(n + 1)⌋` (n after pop)           |
//!
//! The insert cost models a binary search along the root-to-leaf path; the
//! extract cost models one comparison per level of the sift-down.
//!
//! # Example
//!
//! ```rust
//! use prediction_heaps::simple_binary::SimpleBinaryHeap;
//!
//! let mut heap = SimpleBinaryHeap::new();
//! heap.push(3, "three");
//! heap.push(1, "one");
//! heap.push(2, "two");
//!
//! assert_eq!(heap.peek(), Some((&1, &"one")));
//! assert_eq!(heap.pop(), Some((1, "one")));
//! assert_eq!(heap.pop(), Some((2, "two")));
//! assert_eq!(heap.pop(), Some((3, "three")));
//! assert_eq!(heap.pop(), None);
//! ```

use crate::traits::{ComparisonCount, PriorityQueue, QueueError};

/// A simple binary min-heap with a modeled comparison count
#[derive(Debug)]
pub struct SimpleBinaryHeap<T, P: Ord> {
    /// The heap data stored as a vector of (priority, item) pairs
    data: Vec<(P, T)>,
    comparisons: u64,
}

/// Comparisons charged for a push into a heap of `len` elements
fn push_cost(len: usize) -> u64 {
    let depth = (len + 2).ilog2();
    u64::from(depth.ilog2())
}

/// Comparisons charged for a pop that leaves `len` elements behind
fn pop_cost(len: usize) -> u64 {
    u64::from((len + 1).ilog2())
}

/// Closed-form comparison count for sorting `n` values with a binary heap
///
/// Sums `log2(⌊log2(k + 1)⌋) + ⌊log2(k + 1)⌋ - 1` over `k = 1..n`.
pub fn sort_cost(n: usize) -> f64 {
    (1..n)
        .map(|k| {
            let depth = (k + 1).ilog2() as f64;
            depth.log2() + depth - 1.0
        })
        .sum()
}

impl<T, P: Ord> SimpleBinaryHeap<T, P> {
    /// Creates a new empty heap
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            comparisons: 0,
        }
    }

    /// Returns true if the heap is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of elements in the heap
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Modeled comparisons charged so far
    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    /// Inserts an element with the given priority
    pub fn push(&mut self, priority: P, item: T) {
        self.comparisons += push_cost(self.data.len());
        self.data.push((priority, item));
        self.sift_up(self.data.len() - 1);
    }

    /// Returns the minimum priority and associated item without removing it
    pub fn peek(&self) -> Option<(&P, &T)> {
        self.data.first().map(|(p, t)| (p, t))
    }

    /// Removes and returns the minimum priority and associated item
    pub fn pop(&mut self) -> Option<(P, T)> {
        if self.data.is_empty() {
            return None;
        }

        let last_idx = self.data.len() - 1;
        self.data.swap(0, last_idx);
        let result = self.data.pop();

        if !self.data.is_empty() {
            self.sift_down(0);
        }
        self.comparisons += pop_cost(self.data.len());

        result
    }

    /// Move element at index up to maintain heap property
    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.data[index].0 < self.data[parent].0 {
                self.data.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    /// Move element at index down to maintain heap property
    fn sift_down(&mut self, mut index: usize) {
        let len = self.data.len();
        loop {
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            let mut smallest = index;

            if left < len && self.data[left].0 < self.data[smallest].0 {
                smallest = left;
            }
            if right < len && self.data[right].0 < self.data[smallest].0 {
                smallest = right;
            }

            if smallest != index {
                self.data.swap(index, smallest);
                index = smallest;
            } else {
                break;
            }
        }
    }
}

impl<T, P: Ord, R> PriorityQueue<T, P, R> for SimpleBinaryHeap<T, P> {
    fn insert(&mut self, priority: P, item: T, _predicted_rank: Option<R>) {
        self.push(priority, item);
    }

    fn extract_min(&mut self) -> Result<(P, T), QueueError> {
        self.pop().ok_or(QueueError::EmptyQueue)
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn comparison_count(&self) -> ComparisonCount {
        ComparisonCount {
            clean: self.comparisons,
            dirty: 0,
        }
    }
}

impl<T, P: Ord> Default for SimpleBinaryHeap<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut heap = SimpleBinaryHeap::new();

        assert!(heap.is_empty());
        assert_eq!(heap.len(), 0);

        heap.push(3, "three");
        heap.push(1, "one");
        heap.push(2, "two");

        assert!(!heap.is_empty());
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.peek(), Some((&1, &"one")));

        assert_eq!(heap.pop(), Some((1, "one")));
        assert_eq!(heap.pop(), Some((2, "two")));
        assert_eq!(heap.pop(), Some((3, "three")));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn test_duplicate_priorities() {
        let mut heap = SimpleBinaryHeap::new();

        heap.push(1, "a");
        heap.push(1, "b");
        heap.push(1, "c");

        assert_eq!(heap.len(), 3);

        let (p1, _) = heap.pop().unwrap();
        let (p2, _) = heap.pop().unwrap();
        let (p3, _) = heap.pop().unwrap();

        assert_eq!(p1, 1);
        assert_eq!(p2, 1);
        assert_eq!(p3, 1);
    }

    #[test]
    fn test_descending_insertion() {
        let mut heap = SimpleBinaryHeap::new();

        for i in (0..100).rev() {
            heap.push(i, i);
        }

        for i in 0..100 {
            assert_eq!(heap.pop(), Some((i, i)));
        }
    }

    #[test]
    fn test_cost_model() {
        let mut heap = SimpleBinaryHeap::new();
        // n = 0: log2(log2(2)) = log2(1) = 0
        heap.push(5, ());
        assert_eq!(heap.comparisons(), 0);
        // n = 1: log2(3) = 1 -> log2(1) = 0; n = 2: log2(4) = 2 -> 1
        heap.push(4, ());
        heap.push(3, ());
        assert_eq!(heap.comparisons(), 1);
        // pop leaving 2: log2(3) = 1
        heap.pop();
        assert_eq!(heap.comparisons(), 2);
    }

    #[test]
    fn test_empty_extract_is_error() {
        let mut heap: SimpleBinaryHeap<(), i32> = SimpleBinaryHeap::new();
        assert_eq!(
            PriorityQueue::<(), i32, ()>::extract_min(&mut heap),
            Err(QueueError::EmptyQueue)
        );
    }

    #[test]
    fn test_sort_cost() {
        assert_eq!(sort_cost(1), 0.0);
        // k = 1: depth 1 -> 0 + 1 - 1 = 0; k = 2: depth 1 -> 0; k = 3: depth 2 -> 1 + 2 - 1 = 2
        assert_eq!(sort_cost(4), 2.0);
    }
}
