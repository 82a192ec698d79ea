//! Fibonacci Heap implementation
//!
//! A Fibonacci heap is a data structure for priority queue operations with:
//! - O(1) amortized insert, decrease_key, and merge
//! - O(log n) amortized extract_min and delete
//!
//! The structure consists of a collection of heap-ordered trees. Roots are linked
//! in a circular doubly linked list, and so are the children of every node. The heap
//! maintains the minimum root.
//!
//! Nodes live in a [`SlotMap`] arena and link to each other by key, so cuts and
//! consolidation never leave dangling references. A stale handle is detected by the
//! generational key and reported as [`QueueError::InvalidHandle`].
//!
//! Every true priority comparison is charged to [`FibonacciHeap::comparisons`]:
//! one per insert into a non-empty heap, one per tree union during consolidation,
//! one per root visited by the post-consolidation minimum scan, and up to three per
//! `decrease_key`.
//!
//! # Example
//!
//! ```rust
//! use prediction_heaps::fibonacci::FibonacciHeap;
//!
//! let mut heap = FibonacciHeap::new();
//! let handle = heap.insert(5, "item");
//! heap.insert(3, "other");
//! heap.decrease_key(handle, 1).unwrap();
//! assert_eq!(heap.find_min(), Ok((&1, &"item")));
//! ```

use crate::traits::{ComparisonCount, PriorityQueue, QueueError};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Handle to an element in a Fibonacci heap
    ///
    /// Handles stay valid until the element is extracted or deleted, or until the
    /// heap is merged into another heap.
    pub struct FibonacciHandle;
}

struct Node<T, P> {
    item: T,
    priority: P,
    parent: Option<FibonacciHandle>,
    child: Option<FibonacciHandle>,
    left: FibonacciHandle,
    right: FibonacciHandle,
    degree: usize,
    marked: bool,
}

/// Fibonacci Heap
pub struct FibonacciHeap<T, P: Ord> {
    nodes: SlotMap<FibonacciHandle, Node<T, P>>,
    min: Option<FibonacciHandle>,
    comparisons: u64,
}

impl<T, P: Ord> FibonacciHeap<T, P> {
    /// Creates a new empty heap
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            min: None,
            comparisons: 0,
        }
    }

    /// Returns true if the heap is empty
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    /// Returns the number of elements in the heap
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Comparisons charged since construction
    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    /// Inserts an element, returning a handle for `decrease_key` and `delete`
    pub fn insert(&mut self, priority: P, item: T) -> FibonacciHandle {
        let node = self.nodes.insert_with_key(|key| Node {
            item,
            priority,
            parent: None,
            child: None,
            left: key,
            right: key,
            degree: 0,
            marked: false,
        });

        match self.min {
            None => self.min = Some(node),
            Some(min) => {
                self.add_root(node);
                if self.less(node, min) {
                    self.min = Some(node);
                }
            }
        }
        node
    }

    /// Returns the minimum priority and associated item without removing it
    ///
    /// # Errors
    /// Returns `QueueError::EmptyQueue` if the heap is empty.
    pub fn find_min(&self) -> Result<(&P, &T), QueueError> {
        let min = self.min.ok_or(QueueError::EmptyQueue)?;
        let node = &self.nodes[min];
        Ok((&node.priority, &node.item))
    }

    /// Removes and returns the minimum priority and associated item
    ///
    /// # Errors
    /// Returns `QueueError::EmptyQueue` if the heap is empty.
    pub fn extract_min(&mut self) -> Result<(P, T), QueueError> {
        let z = self.min.ok_or(QueueError::EmptyQueue)?;

        // Promote children to the root list
        if let Some(child) = self.nodes[z].child.take() {
            for c in self.ring(child) {
                let node = &mut self.nodes[c];
                node.parent = None;
                node.marked = false;
                self.add_root(c);
            }
        }

        let right = self.nodes[z].right;
        if right == z {
            self.min = None;
        } else {
            self.unlink(z);
            self.min = Some(right);
            self.consolidate(right);
        }

        let node = self.nodes.remove(z).ok_or(QueueError::InvalidHandle)?;
        Ok((node.priority, node.item))
    }

    /// Decreases the priority of the element identified by `handle`
    ///
    /// # Errors
    /// - `QueueError::InvalidHandle` if the element is no longer in the heap
    /// - `QueueError::InvalidDecrease` if `new_priority` is not less than the
    ///   current priority
    pub fn decrease_key(
        &mut self,
        handle: FibonacciHandle,
        new_priority: P,
    ) -> Result<(), QueueError> {
        let node = self.nodes.get_mut(handle).ok_or(QueueError::InvalidHandle)?;
        self.comparisons += 1;
        if new_priority >= node.priority {
            return Err(QueueError::InvalidDecrease);
        }
        node.priority = new_priority;
        let parent = node.parent;

        if let Some(parent) = parent {
            if self.less(handle, parent) {
                self.cut(handle, parent);
                self.cascading_cut(parent);
            }
        }

        if let Some(min) = self.min {
            if min != handle && self.less(handle, min) {
                self.min = Some(handle);
            }
        }
        Ok(())
    }

    /// Removes the element identified by `handle` and returns it
    ///
    /// The node is cut to the root list as though its priority were negative
    /// infinity, then extracted.
    ///
    /// # Errors
    /// Returns `QueueError::InvalidHandle` if the element is no longer in the heap.
    pub fn delete(&mut self, handle: FibonacciHandle) -> Result<(P, T), QueueError> {
        let parent = self.nodes.get(handle).ok_or(QueueError::InvalidHandle)?.parent;
        if let Some(parent) = parent {
            self.cut(handle, parent);
            self.cascading_cut(parent);
        }
        self.min = Some(handle);
        self.extract_min()
    }

    /// Merges another heap into this one, consuming the other heap
    ///
    /// The other heap's nodes are re-homed into this heap's arena, so its handles
    /// become invalid. Its comparison count carries over.
    pub fn merge(&mut self, other: Self) {
        let FibonacciHeap {
            nodes: other_nodes,
            min: other_min,
            comparisons: other_comparisons,
        } = other;
        self.comparisons += other_comparisons;

        let Some(other_min) = other_min else {
            return;
        };

        let mut remap = SecondaryMap::with_capacity(other_nodes.len());
        let mut moved = Vec::with_capacity(other_nodes.len());
        for (old, node) in other_nodes {
            let new = self.nodes.insert(node);
            remap.insert(old, new);
            moved.push(new);
        }
        for new in moved {
            let node = &mut self.nodes[new];
            node.left = remap[node.left];
            node.right = remap[node.right];
            node.parent = node.parent.map(|p| remap[p]);
            node.child = node.child.map(|c| remap[c]);
        }
        let other_min = remap[other_min];

        match self.min {
            None => self.min = Some(other_min),
            Some(min) => {
                // Splice the two root rings together
                let min_left = self.nodes[min].left;
                let other_left = self.nodes[other_min].left;
                self.nodes[min_left].right = other_min;
                self.nodes[other_min].left = min_left;
                self.nodes[other_left].right = min;
                self.nodes[min].left = other_left;

                if self.less(other_min, min) {
                    self.min = Some(other_min);
                }
            }
        }
    }

    /// Charged comparison: is `a`'s priority strictly less than `b`'s?
    fn less(&mut self, a: FibonacciHandle, b: FibonacciHandle) -> bool {
        self.comparisons += 1;
        self.nodes[a].priority < self.nodes[b].priority
    }

    /// Collects the keys of the circular list containing `start`
    fn ring(&self, start: FibonacciHandle) -> Vec<FibonacciHandle> {
        let mut keys = vec![start];
        let mut current = self.nodes[start].right;
        while current != start {
            keys.push(current);
            current = self.nodes[current].right;
        }
        keys
    }

    /// Removes `x` from its circular list, leaving it as a singleton
    fn unlink(&mut self, x: FibonacciHandle) {
        let (left, right) = (self.nodes[x].left, self.nodes[x].right);
        self.nodes[left].right = right;
        self.nodes[right].left = left;
        self.nodes[x].left = x;
        self.nodes[x].right = x;
    }

    /// Inserts `x` into the root list next to the minimum. Does not update `min`.
    fn add_root(&mut self, x: FibonacciHandle) {
        match self.min {
            Some(min) => {
                let min_left = self.nodes[min].left;
                self.nodes[x].right = min;
                self.nodes[x].left = min_left;
                self.nodes[min_left].right = x;
                self.nodes[min].left = x;
            }
            None => {
                self.nodes[x].left = x;
                self.nodes[x].right = x;
                self.min = Some(x);
            }
        }
    }

    /// Links trees of equal degree until all root degrees are distinct, then
    /// rescans the roots for the minimum
    fn consolidate(&mut self, start: FibonacciHandle) {
        let roots = self.ring(start);
        let mut by_degree: Vec<Option<FibonacciHandle>> =
            vec![None; self.nodes.len().max(1).ilog2() as usize * 2 + 2];

        for root in &roots {
            let mut x = *root;
            let mut d = self.nodes[x].degree;
            loop {
                if d >= by_degree.len() {
                    by_degree.resize(d + 1, None);
                }
                match by_degree[d].take() {
                    None => {
                        by_degree[d] = Some(x);
                        break;
                    }
                    Some(mut y) => {
                        if self.less(y, x) {
                            std::mem::swap(&mut x, &mut y);
                        }
                        self.link(y, x);
                        d += 1;
                    }
                }
            }
        }

        let mut survivors = by_degree.into_iter().flatten();
        self.min = survivors.next();
        for root in survivors {
            if let Some(min) = self.min {
                if self.less(root, min) {
                    self.min = Some(root);
                }
            }
        }
        log::trace!(
            "consolidated {} roots over {} elements",
            roots.len(),
            self.nodes.len()
        );
    }

    /// Makes root `y` a child of root `x`
    fn link(&mut self, y: FibonacciHandle, x: FibonacciHandle) {
        self.unlink(y);
        self.nodes[y].parent = Some(x);
        self.nodes[y].marked = false;

        match self.nodes[x].child {
            Some(child) => {
                let child_left = self.nodes[child].left;
                self.nodes[y].right = child;
                self.nodes[y].left = child_left;
                self.nodes[child_left].right = y;
                self.nodes[child].left = y;
            }
            None => self.nodes[x].child = Some(y),
        }
        self.nodes[x].degree += 1;
    }

    /// Moves `x` from `parent`'s child list to the root list
    fn cut(&mut self, x: FibonacciHandle, parent: FibonacciHandle) {
        if self.nodes[parent].child == Some(x) {
            let right = self.nodes[x].right;
            self.nodes[parent].child = if right == x { None } else { Some(right) };
        }
        self.unlink(x);
        self.nodes[parent].degree -= 1;

        let node = &mut self.nodes[x];
        node.parent = None;
        node.marked = false;
        self.add_root(x);
    }

    /// Cuts marked ancestors upward, marking the first unmarked non-root one
    fn cascading_cut(&mut self, mut y: FibonacciHandle) {
        while let Some(parent) = self.nodes[y].parent {
            if !self.nodes[y].marked {
                self.nodes[y].marked = true;
                return;
            }
            self.cut(y, parent);
            y = parent;
        }
    }
}

impl<T, P: Ord> Default for FibonacciHeap<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P: Ord, R> PriorityQueue<T, P, R> for FibonacciHeap<T, P> {
    fn insert(&mut self, priority: P, item: T, _predicted_rank: Option<R>) {
        FibonacciHeap::insert(self, priority, item);
    }

    fn extract_min(&mut self) -> Result<(P, T), QueueError> {
        FibonacciHeap::extract_min(self)
    }

    fn is_empty(&self) -> bool {
        FibonacciHeap::is_empty(self)
    }

    fn len(&self) -> usize {
        FibonacciHeap::len(self)
    }

    fn comparison_count(&self) -> ComparisonCount {
        ComparisonCount {
            clean: self.comparisons,
            dirty: 0,
        }
    }
}
