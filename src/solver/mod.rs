//! Wire color solver.
//!
//! Each combinator has an input side and an output side, and each side has
//! exactly one red and one green connection point. Two wires touching the same
//! side therefore need different colors. Constraints are collected while the
//! network is compiled; the assignment is read back once with
//! [`WireColorSolver::colors`].
//!
//! The problem is 2-coloring a graph whose edges are "must differ" pairs. It is
//! solved incrementally with a disjoint-set forest where every class knows its
//! opposite class:
//!
//! ```text
//! add(A, B):  class(A) ∪ opposite(B)   and   class(B) ∪ opposite(A)
//! conflict:   class(A) == class(B)
//! ```

mod colors;

pub use colors::{Color, WireColorSolver};
