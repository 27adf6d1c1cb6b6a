#![deny(unused_imports)]
#![deny(missing_docs)]
#![cfg_attr(all(feature = "bench", test), feature(test))]

//! A d-ary min-heap implementation for Rust.
//!
//! The heap stores its elements within a single `Vec` that is interpreted as an
//! implicit tree: the element at index `i` has up to `d` children at the indices
//! `d*i + 1 ..= d*i + d` and its parent at index `(i - 1) / d`.
//! No nodes or links are allocated, the whole tree structure is index arithmetic.
//!
//! The branching factor `d` is chosen at construction and stays fixed for the
//! lifetime of the heap. Small branching factors make insertions cheap while
//! bigger ones make the tree shallower.
//!
//! Besides the usual `push` and `pop` operations the heap supports bulk
//! construction via `build` and the pruned threshold query `smaller_than` that
//! only visits subtrees whose roots are below the threshold.
//!
//! ```
//! use dary_heap::DaryHeap;
//!
//! let mut heap = DaryHeap::new(3).unwrap();
//! heap.build(vec![5, 1, 4, 2, 3]);
//! heap.push(0);
//!
//! assert_eq!(heap.peek(), Some(&0));
//! let mut small = heap.smaller_than(&3).cloned().collect::<Vec<_>>();
//! small.sort();
//! assert_eq!(small, vec![0, 1, 2]);
//! assert_eq!(heap.into_sorted_vec(), vec![0, 1, 2, 3, 4, 5]);
//! ```

#[cfg(all(feature = "bench", test))]
extern crate test;

mod dary_heap;

pub use crate::dary_heap::{DaryHeap, DrainMin, SmallerThan, Values, Violation, DEFAULT_ARITY};

use std::fmt;

/// Errors that can be caused while using `DaryHeap`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caused when constructing a `DaryHeap` with a branching factor of zero.
    InvalidBranchingFactor,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidBranchingFactor => {
                write!(f, "the branching factor of a d-ary heap must be at least 1")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Generic `Result` type for `DaryHeap` methods.
pub type Result<T> = ::std::result::Result<T, Error>;
