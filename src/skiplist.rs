//! Skip List with dirty and clean comparisons
//!
//! A leveled linked list kept in ascending priority order. Besides the usual
//! top-down predecessor search, it supports exponential search from any node
//! already in the list, which lets a caller holding a good guess of where a new
//! key belongs pay only for the distance between the guess and the truth.
//!
//! # Comparisons
//!
//! Every key comparison goes through a single choke point that charges one of
//! two counters:
//!
//! - **clean** comparisons use `P: Ord` and are always correct
//! - **dirty** comparisons are answered by an injected [`DirtyComparator`],
//!   which may be wrong
//!
//! Comparisons against the head sentinel (negative infinity) are free.
//!
//! # Insertion protocols
//!
//! | Method                | Search                                           |
//! |-----------------------|--------------------------------------------------|
//! | `insert`              | clean top-down search from the head              |
//! | `insert_near`         | clean exponential search from a hint node        |
//! | `insert_dirty_clean`  | dirty top-down search, then clean exponential search |
//!
//! The two-phase protocol always lands the node where a fully clean search
//! would. The dirty comparator's quality only changes how many clean
//! comparisons the correction costs.
//!
//! Equal priorities are kept in insertion order: a new node goes after every
//! node whose priority is not greater.
//!
//! # Example
//!
//! ```rust
//! use prediction_heaps::skiplist::SkipList;
//!
//! let mut list = SkipList::new();
//! let five = list.insert(5, "five");
//! list.insert(1, "one");
//! list.insert_near(five, 7, "seven").unwrap();
//!
//! assert_eq!(list.extract_min(), Ok((1, "one")));
//! assert_eq!(list.extract_min(), Ok((5, "five")));
//! assert_eq!(list.extract_min(), Ok((7, "seven")));
//! ```

use crate::config::QueueConfig;
use crate::traits::{ComparisonCount, PriorityQueue, QueueError};
use rand::rngs::StdRng;
use rand::Rng;
use slotmap::{new_key_type, SlotMap};
use smallvec::{smallvec, SmallVec};
use std::cmp::Ordering;

new_key_type! {
    /// Handle to a node of a [`SkipList`]
    ///
    /// The head sentinel also has a handle; see [`SkipList::head`].
    pub struct SkipHandle;
}

/// Which comparator a search should use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Ground-truth comparison
    Clean,
    /// Possibly-wrong comparison from the dirty comparator
    Dirty,
}

/// A comparator whose answers may be wrong
///
/// `existing` is an entry already in the list and `probe` is the entry being
/// located. Closures of the matching shape implement this trait.
pub trait DirtyComparator<T, P> {
    /// Orders `existing` relative to `probe`
    fn compare(&mut self, existing: (&P, &T), probe: (&P, &T)) -> Ordering;
}

impl<T, P, F> DirtyComparator<T, P> for F
where
    F: FnMut((&P, &T), (&P, &T)) -> Ordering,
{
    fn compare(&mut self, existing: (&P, &T), probe: (&P, &T)) -> Ordering {
        self(existing, probe)
    }
}

/// Default dirty comparator: the true answer, reversed with a fixed probability
#[derive(Debug, Clone)]
pub struct DamagedComparator {
    damage_ratio: f64,
    rng: StdRng,
}

impl DamagedComparator {
    /// Builds a comparator that flips its answer with probability `damage_ratio`
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            damage_ratio: config.damage_ratio,
            rng: config.damage_rng(),
        }
    }
}

impl<T, P: Ord> DirtyComparator<T, P> for DamagedComparator {
    fn compare(&mut self, existing: (&P, &T), probe: (&P, &T)) -> Ordering {
        let truth = existing.0.cmp(probe.0);
        if self.rng.gen::<f64>() < self.damage_ratio {
            truth.reverse()
        } else {
            truth
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    next: Option<SkipHandle>,
    prev: Option<SkipHandle>,
}

struct Node<T, P> {
    /// `None` only for the head sentinel
    entry: Option<(P, T)>,
    links: SmallVec<[Link; 4]>,
}

/// Skip list ordered by priority, with a pluggable dirty comparator
///
/// # Type Parameters
///
/// - `T`: The item type stored in the list
/// - `P`: The priority type
/// - `D`: The dirty comparator, [`DamagedComparator`] by default
pub struct SkipList<T, P, D = DamagedComparator> {
    nodes: SlotMap<SkipHandle, Node<T, P>>,
    head: SkipHandle,
    config: QueueConfig,
    rng: StdRng,
    dirty: D,
    clean_comparisons: u64,
    dirty_comparisons: u64,
}

impl<T, P: Ord> SkipList<T, P, DamagedComparator> {
    /// Creates an empty list with the default configuration
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Creates an empty list whose dirty comparator is a [`DamagedComparator`]
    pub fn with_config(config: QueueConfig) -> Self {
        let dirty = DamagedComparator::new(&config);
        SkipList::with_dirty_comparator(config, dirty)
    }

    /// Creates an empty list that answers dirty comparisons with a closure
    pub fn with_dirty_fn<F>(config: QueueConfig, dirty: F) -> SkipList<T, P, F>
    where
        F: FnMut((&P, &T), (&P, &T)) -> Ordering,
    {
        SkipList::with_dirty_comparator(config, dirty)
    }
}

impl<T, P: Ord> Default for SkipList<T, P, DamagedComparator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P: Ord, D: DirtyComparator<T, P>> SkipList<T, P, D> {
    /// Creates an empty list with the given dirty comparator
    pub fn with_dirty_comparator(config: QueueConfig, dirty: D) -> Self {
        let mut nodes = SlotMap::with_key();
        let head = nodes.insert(Node {
            entry: None,
            links: smallvec![Link::default()],
        });
        Self {
            nodes,
            head,
            rng: config.height_rng(),
            config,
            dirty,
            clean_comparisons: 0,
            dirty_comparisons: 0,
        }
    }

    /// Handle of the head sentinel, usable as a search hint
    pub fn head(&self) -> SkipHandle {
        self.head
    }

    /// Returns true if the list holds no entries
    pub fn is_empty(&self) -> bool {
        self.next(self.head, 0).is_none()
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Number of levels, i.e. the tallest height ever inserted
    pub fn height(&self) -> usize {
        self.node_height(self.head)
    }

    /// Clean comparisons charged since construction
    pub fn clean_comparisons(&self) -> u64 {
        self.clean_comparisons
    }

    /// Dirty comparisons charged since construction
    pub fn dirty_comparisons(&self) -> u64 {
        self.dirty_comparisons
    }

    /// Returns true if `handle` is the head or a node still in the list
    pub fn contains(&self, handle: SkipHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    /// Priority stored at `handle`, or `None` for the head or a removed node
    pub fn priority(&self, handle: SkipHandle) -> Option<&P> {
        self.get(handle).map(|(p, _)| p)
    }

    /// Entry stored at `handle`, or `None` for the head or a removed node
    pub fn get(&self, handle: SkipHandle) -> Option<(&P, &T)> {
        self.nodes
            .get(handle)
            .and_then(|node| node.entry.as_ref())
            .map(|(p, t)| (p, t))
    }

    /// Returns the minimum entry without removing it
    ///
    /// # Errors
    /// Returns `QueueError::EmptyQueue` if the list is empty.
    pub fn find_min(&self) -> Result<(&P, &T), QueueError> {
        self.next(self.head, 0)
            .and_then(|first| self.get(first))
            .ok_or(QueueError::EmptyQueue)
    }

    /// Priorities present at level `h`, left to right
    pub fn level(&self, h: usize) -> Vec<&P> {
        let mut priorities = Vec::new();
        let mut current = self.next(self.head, h);
        while let Some(node) = current {
            if let Some(p) = self.priority(node) {
                priorities.push(p);
            }
            current = self.next(node, h);
        }
        priorities
    }

    /// Entries in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (&P, &T)> + '_ {
        let mut current = self.next(self.head, 0);
        std::iter::from_fn(move || {
            let node = current?;
            current = self.next(node, 0);
            self.get(node)
        })
    }

    /// Returns the last node whose priority is not greater than `priority`,
    /// searching top-down from the head
    ///
    /// With [`Comparison::Dirty`] the answer reflects the dirty comparator and
    /// may be wrong; `item` is passed to it alongside `priority`.
    pub fn find_predecessor(&mut self, priority: &P, item: &T, mode: Comparison) -> SkipHandle {
        let dirty = match mode {
            Comparison::Clean => None,
            Comparison::Dirty => Some(item),
        };
        let mut current = self.head;
        for h in (0..self.height()).rev() {
            while let Some(next) = self.next(current, h) {
                if self.compare(next, priority, dirty) == Ordering::Greater {
                    break;
                }
                current = next;
            }
        }
        current
    }

    /// Returns the same node as a clean [`find_predecessor`](Self::find_predecessor),
    /// searching outward from `from` instead of down from the head
    ///
    /// The cost in clean comparisons grows with the logarithm of the distance
    /// between `from` and the answer.
    ///
    /// # Errors
    /// Returns `QueueError::InvalidHandle` if `from` is not in the list.
    pub fn exponential_search(
        &mut self,
        from: SkipHandle,
        priority: &P,
    ) -> Result<SkipHandle, QueueError> {
        if !self.nodes.contains_key(from) {
            return Err(QueueError::InvalidHandle);
        }
        Ok(self.search_from(from, priority))
    }

    /// Inserts an entry using a clean top-down search
    pub fn insert(&mut self, priority: P, item: T) -> SkipHandle {
        let predecessor = self.find_predecessor(&priority, &item, Comparison::Clean);
        self.splice(predecessor, priority, item)
    }

    /// Splices a new entry directly after `predecessor` on every level of its
    /// sampled height
    ///
    /// No comparisons are made. `predecessor` must be the node returned by a
    /// clean search for `priority`, or the list loses its order.
    ///
    /// # Errors
    /// Returns `QueueError::InvalidHandle` if `predecessor` is not in the list.
    pub fn insert_after_hint(
        &mut self,
        predecessor: SkipHandle,
        priority: P,
        item: T,
    ) -> Result<SkipHandle, QueueError> {
        if !self.nodes.contains_key(predecessor) {
            return Err(QueueError::InvalidHandle);
        }
        Ok(self.splice(predecessor, priority, item))
    }

    /// Inserts an entry using a clean exponential search from `hint`
    ///
    /// # Errors
    /// Returns `QueueError::InvalidHandle` if `hint` is not in the list.
    pub fn insert_near(
        &mut self,
        hint: SkipHandle,
        priority: P,
        item: T,
    ) -> Result<SkipHandle, QueueError> {
        let predecessor = self.exponential_search(hint, &priority)?;
        Ok(self.splice(predecessor, priority, item))
    }

    /// Like [`insert_near`](Self::insert_near), but a hint that is no longer in
    /// the list falls back to the head
    pub(crate) fn insert_from(&mut self, hint: SkipHandle, priority: P, item: T) -> SkipHandle {
        let hint = if self.nodes.contains_key(hint) {
            hint
        } else {
            self.head
        };
        let predecessor = self.search_from(hint, &priority);
        self.splice(predecessor, priority, item)
    }

    /// Inserts an entry with the two-phase protocol: a dirty top-down search
    /// followed by a clean exponential search from the dirty answer
    pub fn insert_dirty_clean(&mut self, priority: P, item: T) -> SkipHandle {
        let guess = self.find_predecessor(&priority, &item, Comparison::Dirty);
        let predecessor = self.search_from(guess, &priority);
        self.splice(predecessor, priority, item)
    }

    /// Removes and returns the minimum entry
    ///
    /// # Errors
    /// Returns `QueueError::EmptyQueue` if the list is empty.
    pub fn extract_min(&mut self) -> Result<(P, T), QueueError> {
        self.pop_front()
            .map(|(_, p, t)| (p, t))
            .ok_or(QueueError::EmptyQueue)
    }

    /// Removes the entry at `handle`
    ///
    /// # Errors
    /// Returns `QueueError::InvalidHandle` for the head or a removed node.
    pub fn delete(&mut self, handle: SkipHandle) -> Result<(P, T), QueueError> {
        if handle == self.head || !self.nodes.contains_key(handle) {
            return Err(QueueError::InvalidHandle);
        }
        for h in 0..self.node_height(handle) {
            let Link { next, prev } = self.nodes[handle].links[h];
            if let Some(prev) = prev {
                self.nodes[prev].links[h].next = next;
            }
            if let Some(next) = next {
                self.nodes[next].links[h].prev = prev;
            }
        }
        self.nodes
            .remove(handle)
            .and_then(|node| node.entry)
            .ok_or(QueueError::InvalidHandle)
    }

    /// Removes the minimum entry, returning its former handle as well
    pub(crate) fn pop_front(&mut self) -> Option<(SkipHandle, P, T)> {
        let first = self.next(self.head, 0)?;
        let (p, t) = self.delete(first).ok()?;
        Some((first, p, t))
    }

    /// The single counting choke point
    ///
    /// Orders the entry at `node` relative to the probe `priority`. The dirty
    /// comparator answers when `dirty_item` carries the probe's item. The head
    /// sentinel is less than everything and costs nothing.
    fn compare(&mut self, node: SkipHandle, priority: &P, dirty_item: Option<&T>) -> Ordering {
        let Some((p, t)) = &self.nodes[node].entry else {
            return Ordering::Less;
        };
        match dirty_item {
            Some(item) => {
                self.dirty_comparisons += 1;
                self.dirty.compare((p, t), (priority, item))
            }
            None => {
                self.clean_comparisons += 1;
                p.cmp(priority)
            }
        }
    }

    fn next(&self, node: SkipHandle, h: usize) -> Option<SkipHandle> {
        self.nodes[node].links.get(h).and_then(|link| link.next)
    }

    fn prev(&self, node: SkipHandle, h: usize) -> Option<SkipHandle> {
        self.nodes[node].links.get(h).and_then(|link| link.prev)
    }

    fn node_height(&self, node: SkipHandle) -> usize {
        self.nodes[node].links.len()
    }

    fn search_from(&mut self, from: SkipHandle, priority: &P) -> SkipHandle {
        if self.compare(from, priority, None) == Ordering::Greater {
            self.search_left(from, priority)
        } else {
            self.search_right(from, priority)
        }
    }

    /// `from` is not greater than `priority`; walk right
    fn search_right(&mut self, from: SkipHandle, priority: &P) -> SkipHandle {
        let mut current = from;
        // Follow each node's top link, climbing to taller nodes as they appear
        loop {
            let top = self.node_height(current) - 1;
            let Some(next) = self.next(current, top) else {
                break;
            };
            if self.compare(next, priority, None) == Ordering::Greater {
                break;
            }
            current = next;
        }
        for h in (0..self.node_height(current) - 1).rev() {
            while let Some(next) = self.next(current, h) {
                if self.compare(next, priority, None) == Ordering::Greater {
                    break;
                }
                current = next;
            }
        }
        current
    }

    /// `from` is greater than `priority`; walk left
    fn search_left(&mut self, from: SkipHandle, priority: &P) -> SkipHandle {
        let mut current = from;
        loop {
            let top = self.node_height(current) - 1;
            let Some(prev) = self.prev(current, top) else {
                break;
            };
            if self.compare(prev, priority, None) != Ordering::Greater {
                break;
            }
            current = prev;
        }
        for h in (0..self.node_height(current) - 1).rev() {
            while let Some(prev) = self.prev(current, h) {
                if self.compare(prev, priority, None) != Ordering::Greater {
                    break;
                }
                current = prev;
            }
        }
        // `current` is the leftmost node greater than `priority`
        self.prev(current, 0).unwrap_or(self.head)
    }

    fn sample_height(&mut self) -> usize {
        let mut height = 1;
        while height < self.config.max_height
            && self.rng.gen::<f64>() < self.config.promotion_probability
        {
            height += 1;
        }
        height
    }

    fn splice(&mut self, predecessor: SkipHandle, priority: P, item: T) -> SkipHandle {
        let height = self.sample_height();
        let head = &mut self.nodes[self.head].links;
        if head.len() < height {
            head.resize(height, Link::default());
        }

        let node = self.nodes.insert(Node {
            entry: Some((priority, item)),
            links: smallvec![Link::default(); height],
        });

        let mut pred = predecessor;
        for h in 0..height {
            // Back up along level h - 1 until the predecessor reaches level h
            while self.node_height(pred) <= h {
                pred = self.prev(pred, h - 1).unwrap_or(self.head);
            }
            let succ = self.next(pred, h);
            self.nodes[pred].links[h].next = Some(node);
            self.nodes[node].links[h] = Link {
                next: succ,
                prev: Some(pred),
            };
            if let Some(succ) = succ {
                self.nodes[succ].links[h].prev = Some(node);
            }
        }
        node
    }
}

/// The dirty/clean ("DC") queue: every insertion uses the two-phase protocol
impl<T, P: Ord, R, D: DirtyComparator<T, P>> PriorityQueue<T, P, R> for SkipList<T, P, D> {
    fn insert(&mut self, priority: P, item: T, _predicted_rank: Option<R>) {
        self.insert_dirty_clean(priority, item);
    }

    fn extract_min(&mut self) -> Result<(P, T), QueueError> {
        SkipList::extract_min(self)
    }

    fn is_empty(&self) -> bool {
        SkipList::is_empty(self)
    }

    fn len(&self) -> usize {
        SkipList::len(self)
    }

    fn comparison_count(&self) -> ComparisonCount {
        ComparisonCount {
            clean: self.clean_comparisons,
            dirty: self.dirty_comparisons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_levels_sorted<T, P: Ord + std::fmt::Debug, D: DirtyComparator<T, P>>(
        list: &SkipList<T, P, D>,
    ) {
        for h in 0..list.height() {
            let level = list.level(h);
            assert!(
                level.windows(2).all(|w| w[0] <= w[1]),
                "level {} out of order: {:?}",
                h,
                level
            );
        }
    }

    #[test]
    fn test_basic_operations() {
        let mut list: SkipList<&str, i32> = SkipList::new();

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);

        list.insert(3, "three");
        list.insert(1, "one");
        list.insert(2, "two");

        assert!(!list.is_empty());
        assert_eq!(list.len(), 3);
        assert_eq!(list.find_min(), Ok((&1, &"one")));

        assert_eq!(list.extract_min(), Ok((1, "one")));
        assert_eq!(list.extract_min(), Ok((2, "two")));
        assert_eq!(list.extract_min(), Ok((3, "three")));
        assert_eq!(list.extract_min(), Err(QueueError::EmptyQueue));
    }

    #[test]
    fn test_duplicate_priorities_keep_insertion_order() {
        let mut list: SkipList<&str, i32> = SkipList::new();

        list.insert(1, "a");
        list.insert(1, "b");
        list.insert(1, "c");

        assert_eq!(list.extract_min(), Ok((1, "a")));
        assert_eq!(list.extract_min(), Ok((1, "b")));
        assert_eq!(list.extract_min(), Ok((1, "c")));
    }

    #[test]
    fn test_head_comparisons_are_free() {
        let mut list: SkipList<(), i32> =
            SkipList::with_config(QueueConfig::default().with_max_height(1));
        list.insert(10, ());
        assert_eq!(list.clean_comparisons(), 0);

        let head = list.head();
        assert_eq!(list.exponential_search(head, &5), Ok(head));
        assert_eq!(list.clean_comparisons(), 1);
    }

    #[test]
    fn test_levels_sorted_after_random_inserts() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut list = SkipList::with_config(QueueConfig::default().with_seed(11));
        for _ in 0..500 {
            list.insert(rng.gen_range(0..200), ());
        }
        assert_levels_sorted(&list);
        assert!(list.height() > 1);

        let drained: Vec<i32> = std::iter::from_fn(|| list.extract_min().ok())
            .map(|(p, _)| p)
            .collect();
        assert_eq!(drained.len(), 500);
        assert!(drained.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_exponential_search_matches_find_predecessor() {
        let mut list = SkipList::with_config(QueueConfig::default().with_seed(5));
        let mut handles = vec![list.head()];
        for i in 0..100 {
            handles.push(list.insert(i * 2, ()));
        }

        for &hint in &handles {
            for target in [-1, 0, 1, 37, 38, 120, 198, 199, 500] {
                let expected = list.find_predecessor(&target, &(), Comparison::Clean);
                assert_eq!(list.exponential_search(hint, &target), Ok(expected));
            }
        }
    }

    #[test]
    fn test_exponential_search_is_local() {
        let mut list = SkipList::with_config(QueueConfig::default().with_seed(9));
        let handles: Vec<_> = (0..1000).map(|i| list.insert(i, ())).collect();

        let before = list.clean_comparisons();
        list.insert_near(handles[500], 500, ()).unwrap();
        let near = list.clean_comparisons() - before;

        let before = list.clean_comparisons();
        list.insert(500, ());
        let blind = list.clean_comparisons() - before;

        assert!(near <= 1 + list.height() as u64);
        assert!(near < blind, "hinted {} vs blind {}", near, blind);
    }

    #[test]
    fn test_dirty_clean_with_always_wrong_comparator() {
        let config = QueueConfig::default().with_seed(1).with_damage_ratio(1.0);
        let mut list = SkipList::with_config(config);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..300 {
            list.insert_dirty_clean(rng.gen_range(0..1000), ());
        }
        assert_levels_sorted(&list);
        assert!(list.dirty_comparisons() > 0);
    }

    #[test]
    fn test_dirty_fn_comparator() {
        // A perfect dirty comparator leaves almost nothing for the clean phase
        let mut list = SkipList::with_dirty_fn(QueueConfig::default(), |a: (&i32, &()), b: (&i32, &())| {
            a.0.cmp(b.0)
        });
        for i in 0..200 {
            list.insert_dirty_clean(i, ());
        }
        assert!(list.clean_comparisons() <= 2 * 200);
        assert!(list.dirty_comparisons() > list.clean_comparisons());
    }

    #[test]
    fn test_delete() {
        let mut list: SkipList<i32, i32> = SkipList::new();
        let handles: Vec<_> = (0..10).map(|i| list.insert(i, i)).collect();

        assert_eq!(list.delete(handles[4]), Ok((4, 4)));
        assert_eq!(list.delete(handles[4]), Err(QueueError::InvalidHandle));
        assert_eq!(list.delete(list.head()), Err(QueueError::InvalidHandle));
        assert_eq!(list.len(), 9);
        assert_levels_sorted(&list);

        let remaining: Vec<i32> = list.iter().map(|(p, _)| *p).collect();
        assert_eq!(remaining, vec![0, 1, 2, 3, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_insert_after_hint_walks_back_for_tall_nodes() {
        // Force every node to full height so splices must use the head's upper links
        let config = QueueConfig::default().with_promotion_probability(0.999).with_max_height(6);
        let mut list = SkipList::with_config(config);
        let a = list.insert(1, ());
        list.insert(3, ());
        list.insert_after_hint(a, 2, ()).unwrap();
        assert_levels_sorted(&list);
        assert_eq!(list.level(0), vec![&1, &2, &3]);
    }
}
