//! The implicit array tree behind `DaryHeap`.
//!
//! All tree navigation is done through `parent` and `child` index arithmetic
//! over a single `Vec`. The heap order is restored after every mutation by
//! sifting the touched element up or down along its path.

use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;

use itertools::Itertools;

use crate::{Error, Result};

/// The branching factor used by `DaryHeap::default`.
pub const DEFAULT_ARITY: usize = 4;

/// A pair of indices where the parent element is greater than its child element.
///
/// Reported by `DaryHeap::check`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Index of the offending parent.
    pub parent: usize,
    /// Index of the child that is smaller than its parent.
    pub child: usize,
}

/// A d-ary min-heap implementation.
///
/// Stores its elements in a heap-ordered `Vec` where every element is less than
/// or equal to each of its up to `d` children. Duplicates are allowed.
///
/// The minimum element is always located at the root (index 0) and can be
/// inspected with `peek` and removed with `pop`.
///
/// The branching factor is fixed at construction, a heap with arity `1`
/// degenerates to a sorted list.
#[derive(Debug, Clone)]
pub struct DaryHeap<T>
where
    T: Ord,
{
    /// Heap-ordered storage of all elements.
    data: Vec<T>,
    /// The maximum number of children per element.
    arity: usize,
}

impl<T> Default for DaryHeap<T>
where
    T: Ord,
{
    #[inline]
    fn default() -> Self {
        DaryHeap {
            data: Vec::new(),
            arity: DEFAULT_ARITY,
        }
    }
}

impl<T> DaryHeap<T>
where
    T: Ord,
{
    /// Creates a new empty `DaryHeap` with the given branching factor.
    ///
    /// Returns `Error::InvalidBranchingFactor` if `arity` is zero.
    #[inline]
    pub fn new(arity: usize) -> Result<Self> {
        Self::with_capacity(arity, 0)
    }

    /// Creates a new empty `DaryHeap` with the given branching factor that is able
    /// to hold at least `capacity` elements without reallocating.
    ///
    /// Returns `Error::InvalidBranchingFactor` if `arity` is zero.
    pub fn with_capacity(arity: usize, capacity: usize) -> Result<Self> {
        if arity == 0 {
            return Err(Error::InvalidBranchingFactor);
        }
        Ok(DaryHeap {
            data: Vec::with_capacity(capacity),
            arity: arity,
        })
    }

    /// Creates a new `DaryHeap` with the given branching factor out of the elements of `vec`.
    pub fn from_vec(arity: usize, vec: Vec<T>) -> Result<Self> {
        let mut heap = Self::new(arity)?;
        heap.build(vec);
        Ok(heap)
    }

    /// Returns the branching factor of this `DaryHeap`.
    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Returns the number of elements stored in this `DaryHeap`.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if this `DaryHeap` is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the index of the parent of the element at `index`.
    #[inline]
    fn parent(&self, index: usize) -> usize {
        debug_assert!(index > 0, "the root has no parent");
        (index - 1) / self.arity
    }

    /// Returns the index of the child at position `pos` (starting at 1) of the element at `index`.
    ///
    /// The result may be out of bounds, it saturates instead of overflowing.
    #[inline]
    fn child(&self, index: usize, pos: usize) -> usize {
        debug_assert!(pos >= 1 && pos <= self.arity, "invalid child position");
        self.arity.saturating_mul(index).saturating_add(pos)
    }

    /// Returns the range of indices of all present children of the element at `index`.
    #[inline]
    fn children(&self, index: usize) -> Range<usize> {
        let len = self.len();
        let first = self.child(index, 1).min(len);
        let end = self.child(index, self.arity).saturating_add(1).min(len);
        first..end
    }

    /// Exchanges the elements at `i` and `j`.
    #[inline]
    fn swap(&mut self, i: usize, j: usize) {
        debug_assert!(i < self.len(), "swap index out of bounds");
        debug_assert!(j < self.len(), "swap index out of bounds");
        self.data.swap(i, j)
    }

    /// Moves the element at `index` down until it is not greater than any of its children.
    ///
    /// Requires all subtrees below `index` to be heap-ordered already.
    fn sift_down(&mut self, mut index: usize) {
        loop {
            let mut smallest = index;
            for child in self.children(index) {
                // only a strictly smaller child replaces the current minimum
                if self.data[child] < self.data[smallest] {
                    smallest = child;
                }
            }
            if smallest == index {
                return;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }

    /// Moves the element at `index` up until its parent is not greater than it.
    ///
    /// Requires the heap to be ordered everywhere except on the path from the root to `index`.
    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = self.parent(index);
            if self.data[index] >= self.data[parent] {
                return;
            }
            self.swap(index, parent);
            index = parent;
        }
    }

    /// Replaces the contents of this `DaryHeap` with the given elements.
    ///
    /// The elements are copied in as they are and then heap-ordered bottom-up,
    /// which takes linear time in the number of elements.
    pub fn build<I>(&mut self, elems: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.data.clear();
        self.data.extend(elems);
        tracing::trace!(len = self.len(), arity = self.arity, "building d-ary heap");
        if self.len() > 1 {
            let last_internal = self.parent(self.len() - 1);
            for index in (0..=last_internal).rev() {
                self.sift_down(index);
            }
        }
    }

    /// Inserts the given element into this `DaryHeap`.
    pub fn push(&mut self, elem: T) {
        self.data.push(elem);
        let last = self.len() - 1;
        self.sift_up(last);
    }

    /// Returns a reference to the current minimum element if not empty.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// Removes the minimum element from this `DaryHeap` and returns it.
    ///
    /// Returns `None` and leaves the heap untouched if it is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let last = self.len() - 1;
        self.swap(0, last);
        let min = self.data.pop();
        if !self.is_empty() {
            self.sift_down(0);
        }
        min
    }

    /// Removes all elements from this `DaryHeap`.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear()
    }

    /// Iterate over all elements that are strictly less than `threshold`.
    ///
    /// The tree is traversed breadth-first and every subtree whose root is not
    /// less than `threshold` is skipped entirely, since none of its descendants
    /// can be smaller than its root.
    pub fn smaller_than<'a>(&'a self, threshold: &'a T) -> SmallerThan<'a, T> {
        let mut pending = VecDeque::new();
        if self.peek().map_or(false, |root| root < threshold) {
            pending.push_back(0);
        }
        SmallerThan {
            heap: self,
            threshold: threshold,
            pending: pending,
        }
    }

    /// Scans the whole heap for parents that are greater than one of their children.
    ///
    /// Every violation is logged as an error and returned. Never alters the heap.
    pub fn check(&self) -> Vec<Violation>
    where
        T: fmt::Debug,
    {
        let mut violations = Vec::new();
        for parent in 0..self.len() {
            for child in self.children(parent) {
                if self.data[parent] > self.data[child] {
                    tracing::error!(
                        parent,
                        child,
                        parent_elem = ?self.data[parent],
                        child_elem = ?self.data[child],
                        "min-heap violation: parent is greater than its child"
                    );
                    violations.push(Violation { parent, child });
                }
            }
        }
        violations
    }

    /// Returns the heap-ordered storage of this `DaryHeap`.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over the values in this `DaryHeap` by reference in storage order.
    #[inline]
    pub fn values<'a>(&'a self) -> Values<'a, T> {
        Values {
            iter: self.data.iter(),
        }
    }

    /// Iterate over values stored within a `DaryHeap` in a sorted-by-min order. Drains the heap.
    #[inline]
    pub fn drain_min(self) -> DrainMin<T> {
        DrainMin { heap: self }
    }

    /// Consumes this `DaryHeap` and returns its elements in non-decreasing order.
    pub fn into_sorted_vec(self) -> Vec<T> {
        let len = self.len();
        let mut sorted = Vec::with_capacity(len);
        sorted.extend(self.drain_min());
        sorted
    }
}

impl<T> Extend<T> for DaryHeap<T>
where
    T: Ord,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        for elem in iter {
            self.push(elem);
        }
    }
}

impl<T> fmt::Display for DaryHeap<T>
where
    T: Ord + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self.data.iter().join(", "))
    }
}

/// Iterator over the elements of a `DaryHeap` that are less than a threshold.
///
/// Yields elements in breadth-first order of the implicit tree.
pub struct SmallerThan<'a, T: 'a + Ord> {
    heap: &'a DaryHeap<T>,
    threshold: &'a T,
    pending: VecDeque<usize>,
}

impl<'a, T: Ord> Iterator for SmallerThan<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let heap = self.heap;
        let index = self.pending.pop_front()?;
        for child in heap.children(index) {
            if heap.data[child] < *self.threshold {
                self.pending.push_back(child);
            }
        }
        Some(&heap.data[index])
    }
}

/// Iterator over references to values stored within a `DaryHeap`.
pub struct Values<'a, T: 'a> {
    iter: ::std::slice::Iter<'a, T>,
}

impl<'a, T> Iterator for Values<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a, T> ExactSizeIterator for Values<'a, T> {}

/// Iterator over values stored within a `DaryHeap` in a sorted-by-min order. Drains the heap.
pub struct DrainMin<T: Ord> {
    heap: DaryHeap<T>,
}

impl<T: Ord> Iterator for DrainMin<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.heap.pop()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), Some(self.heap.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The numbers 30 down to 21 followed by 1 up to 10.
    fn setup_list() -> Vec<i32> {
        (21..31).rev().chain(1..11).collect()
    }

    fn setup() -> DaryHeap<i32> {
        DaryHeap::from_vec(4, setup_list()).unwrap()
    }

    fn sorted<'a, I>(iter: I) -> Vec<i32>
    where
        I: Iterator<Item = &'a i32>,
    {
        let mut vals = iter.cloned().collect::<Vec<_>>();
        vals.sort();
        vals
    }

    #[test]
    fn index_arithmetic() {
        let heap = DaryHeap::<i32>::new(3).unwrap();
        assert_eq!(heap.parent(1), 0);
        assert_eq!(heap.parent(3), 0);
        assert_eq!(heap.parent(4), 1);
        assert_eq!(heap.parent(9), 2);
        assert_eq!(heap.child(0, 1), 1);
        assert_eq!(heap.child(0, 3), 3);
        assert_eq!(heap.child(2, 2), 8);
        assert_eq!(heap.parent(heap.child(5, 3)), 5);
    }

    #[test]
    fn children_are_clamped() {
        let heap = DaryHeap::from_vec(4, (0..7).collect()).unwrap();
        assert_eq!(heap.children(0), 1..5);
        assert_eq!(heap.children(1), 5..7);
        assert_eq!(heap.children(2), 7..7);
        assert!(heap.children(6).is_empty());
    }

    #[test]
    fn children_saturate_for_huge_arity() {
        let heap = DaryHeap::from_vec(usize::max_value(), vec![3, 1, 2]).unwrap();
        assert_eq!(heap.as_slice()[0], 1);
        assert!(heap.children(1).is_empty());
        assert!(heap.check().is_empty());
    }

    #[test]
    fn build_layout() {
        let heap = setup();
        assert_eq!(
            heap.as_slice(),
            &[1, 22, 2, 4, 8, 25, 24, 23, 29, 21, 28, 30, 3, 27, 5, 6, 7, 26, 9, 10]
        );
        assert_eq!(heap.len(), 20);
        assert_eq!(heap.peek(), Some(&1));
        assert!(heap.check().is_empty());
    }

    #[test]
    fn smaller_than() {
        let heap = setup();
        assert_eq!(sorted(heap.smaller_than(&5)), vec![1, 2, 3, 4]);
        assert_eq!(sorted(heap.smaller_than(&10)), (1..10).collect::<Vec<_>>());
    }

    #[test]
    fn smaller_than_breadth_first_order() {
        let heap = setup();
        assert_eq!(
            heap.smaller_than(&5).cloned().collect::<Vec<_>>(),
            vec![1, 2, 4, 3]
        );
        assert_eq!(
            heap.smaller_than(&10).cloned().collect::<Vec<_>>(),
            vec![1, 2, 4, 8, 3, 5, 6, 7, 9]
        );
    }

    #[test]
    fn smaller_than_edges() {
        let heap = setup();
        assert_eq!(heap.smaller_than(&1).count(), 0);
        assert_eq!(heap.smaller_than(&31).count(), 20);

        let empty = DaryHeap::<i32>::new(2).unwrap();
        assert_eq!(empty.smaller_than(&100).count(), 0);
    }

    #[test]
    fn smaller_than_keeps_duplicates() {
        let heap = DaryHeap::from_vec(2, vec![3, 1, 3, 1, 2, 5, 1]).unwrap();
        assert_eq!(sorted(heap.smaller_than(&3)), vec![1, 1, 1, 2]);
        assert_eq!(sorted(heap.smaller_than(&4)), vec![1, 1, 1, 2, 3, 3]);
    }

    #[test]
    fn pop_twice() {
        let mut heap = setup();
        assert_eq!(heap.pop(), Some(1));
        assert_eq!(heap.pop(), Some(2));
        assert_eq!(heap.len(), 18);
        assert!(heap.check().is_empty());
        assert_eq!(
            heap.as_slice(),
            &[3, 22, 9, 4, 8, 25, 24, 23, 29, 21, 28, 30, 10, 27, 5, 6, 7, 26]
        );
    }

    #[test]
    fn push_after_pop() {
        let mut heap = setup();
        heap.pop();
        heap.pop();
        for elem in 11..21 {
            heap.push(elem);
            assert!(heap.check().is_empty());
        }
        assert_eq!(
            heap.as_slice(),
            &[
                3, 14, 9, 4, 8, 15, 18, 23, 29, 21, 28, 30, 10, 27, 5, 6, 7, 26, 11, 12, 13, 25,
                22, 16, 17, 24, 19, 20
            ]
        );
    }

    #[test]
    fn drain_everything() {
        let mut heap = setup();
        heap.pop();
        heap.pop();
        heap.extend(11..21);
        let mut last = i32::min_value();
        while let Some(min) = heap.pop() {
            assert!(heap.check().is_empty());
            assert!(last <= min);
            last = min;
        }
        assert_eq!(last, 30);
    }

    #[test]
    fn empty_pop() {
        let mut heap = DaryHeap::<usize>::new(3).unwrap();
        assert_eq!(None, heap.pop());
        assert_eq!(None, heap.peek());
        assert_eq!(heap.len(), 0);
        assert!(heap.is_empty());
    }

    #[test]
    fn pop_last_element() {
        let mut heap = DaryHeap::new(2).unwrap();
        heap.push('x');
        assert_eq!(Some('x'), heap.pop());
        assert!(heap.is_empty());
        assert_eq!(None, heap.pop());
    }

    #[test]
    fn build_replaces_contents() {
        let mut heap = setup();
        heap.build(vec![7, 5, 6]);
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.peek(), Some(&5));
        assert_eq!(heap.into_sorted_vec(), vec![5, 6, 7]);
    }

    #[test]
    fn build_small_inputs() {
        let mut heap = DaryHeap::<i32>::new(4).unwrap();
        heap.build(vec![]);
        assert!(heap.is_empty());
        heap.build(vec![42]);
        assert_eq!(heap.as_slice(), &[42]);
    }

    #[test]
    fn unary_heap_is_sorted() {
        let heap = DaryHeap::from_vec(1, vec![4, 2, 5, 1, 3]).unwrap();
        assert_eq!(heap.as_slice(), &[1, 2, 3, 4, 5]);
        assert_eq!(sorted(heap.smaller_than(&3)), vec![1, 2]);
    }

    #[test]
    fn random_drain_is_sorted() {
        use rand::Rng;
        let mut rng = rand::rng();
        for arity in 1..9 {
            let len = rng.random_range(0..500);
            let list = (0..len)
                .map(|_| rng.random_range(-100..100))
                .collect::<Vec<i32>>();
            let heap = DaryHeap::from_vec(arity, list.clone()).unwrap();
            let drained = heap.drain_min().collect::<Vec<_>>();
            let mut expected = list;
            expected.sort();
            assert_eq!(drained, expected);
        }
    }

    #[test]
    fn check_reports_violations() {
        let mut heap = DaryHeap::from_vec(2, vec![1, 2, 3, 4, 5]).unwrap();
        heap.data.swap(0, 4);
        assert_eq!(heap.as_slice(), &[5, 2, 3, 4, 1]);
        assert_eq!(
            heap.check(),
            vec![
                Violation { parent: 0, child: 1 },
                Violation { parent: 0, child: 2 },
                Violation { parent: 1, child: 4 },
            ]
        );
    }

    #[test]
    fn check_is_read_only() {
        let heap = setup();
        let before = heap.as_slice().to_vec();
        assert!(heap.check().is_empty());
        assert_eq!(heap.as_slice(), &before[..]);
        assert_eq!(heap.len(), 20);
        assert_eq!(sorted(heap.smaller_than(&5)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn display() {
        let heap = DaryHeap::from_vec(2, vec![3, 1, 2]).unwrap();
        assert_eq!(heap.to_string(), "[1, 3, 2]");
        assert_eq!(DaryHeap::<i32>::default().to_string(), "[]");
    }

    #[test]
    fn default_arity() {
        let heap = DaryHeap::<i32>::default();
        assert_eq!(heap.arity(), DEFAULT_ARITY);
        assert!(heap.is_empty());
    }

    #[test]
    fn values() {
        let heap = setup();
        let values = heap.values();

        // storage order is the heap layout
        assert_eq!(values.len(), 20);
        assert_eq!(sorted(heap.values()), sorted(setup_list().iter()));
    }

    #[test]
    fn clear() {
        let mut heap = setup();
        heap.clear();
        assert!(heap.is_empty());
        heap.push(3);
        assert_eq!(heap.peek(), Some(&3));
    }
}

#[cfg(all(feature = "bench", test))]
mod bench {
    use super::*;
    use test::{black_box, Bencher};
    use std::collections::BinaryHeap;
    use std::cmp::Reverse;

    fn setup_sample() -> Vec<i64> {
        use rand::seq::SliceRandom;
        let n = 100_000;
        let mut sample = (1..n).collect::<Vec<i64>>();
        sample.shuffle(&mut rand::rng());
        sample
    }

    fn push_all(arity: usize, bencher: &mut Bencher) {
        let sample = setup_sample();
        bencher.iter(|| {
            let mut heap = DaryHeap::new(arity).unwrap();
            for &key in sample.iter() {
                black_box(heap.push(key));
            }
        });
    }

    fn pop_all(arity: usize, bencher: &mut Bencher) {
        let heap = DaryHeap::from_vec(arity, setup_sample()).unwrap();
        bencher.iter(|| {
            let mut heap = heap.clone();
            while let Some(_) = black_box(heap.pop()) {}
        });
    }

    #[bench]
    fn dary_heap_push_2(bencher: &mut Bencher) {
        push_all(2, bencher)
    }

    #[bench]
    fn dary_heap_push_4(bencher: &mut Bencher) {
        push_all(4, bencher)
    }

    #[bench]
    fn dary_heap_push_8(bencher: &mut Bencher) {
        push_all(8, bencher)
    }

    #[bench]
    fn dary_heap_pop_2(bencher: &mut Bencher) {
        pop_all(2, bencher)
    }

    #[bench]
    fn dary_heap_pop_4(bencher: &mut Bencher) {
        pop_all(4, bencher)
    }

    #[bench]
    fn dary_heap_pop_8(bencher: &mut Bencher) {
        pop_all(8, bencher)
    }

    #[bench]
    fn dary_heap_build(bencher: &mut Bencher) {
        let sample = setup_sample();
        bencher.iter(|| {
            black_box(DaryHeap::from_vec(DEFAULT_ARITY, sample.clone()).unwrap());
        });
    }

    #[bench]
    fn dary_heap_smaller_than(bencher: &mut Bencher) {
        let heap = DaryHeap::from_vec(DEFAULT_ARITY, setup_sample()).unwrap();
        bencher.iter(|| {
            black_box(heap.smaller_than(&1_000).count());
        });
    }

    #[bench]
    fn binary_heap_push(bencher: &mut Bencher) {
        let sample = setup_sample();
        bencher.iter(|| {
            let mut bh = BinaryHeap::new();
            for &key in sample.iter() {
                black_box(bh.push(Reverse(key)));
            }
        });
    }

    #[bench]
    fn binary_heap_pop(bencher: &mut Bencher) {
        let bh = setup_sample().into_iter().map(Reverse).collect::<BinaryHeap<_>>();
        bencher.iter(|| {
            let mut bh = bh.clone();
            while let Some(_) = black_box(bh.pop()) {}
        });
    }
}
