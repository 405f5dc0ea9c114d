//! Lock-free double-ended queue
//!
//! ## Algorithm
//!
//! ```text
//!            Anchor { left, right, status }      <- one atomic pointer
//!              |                      |
//!              v                      v
//!   null <- [ A ] <-> [ B ] <-> [ C ] -> null
//! ```
//!
//! - **push**: link the new node's inward pointer to the current boundary,
//!   then swap in an anchor with the new boundary and a *pending* status
//! - **stabilize**: point the old boundary's outward link at the new node and
//!   swap in the same anchor marked *stable*; any thread may do this
//! - **pop**: from a stable anchor, swap in an anchor whose boundary is the
//!   popped node's inward neighbour
//!
//! A thread that finds a pending anchor repairs it before doing its own work,
//! so an interrupted push never blocks anyone.
//!
//! ## Memory reclamation
//!
//! Replaced anchors and popped nodes are retired to `crossbeam-epoch`. They
//! are freed only once every thread that might have read them has unpinned,
//! which also rules out ABA on the anchor pointer.
//!
//! ## Consistency
//!
//! | Operation | Cost | Guarantee |
//! |-----------|------|-----------|
//! | push / pop | O(1) amortized | Linearizable |
//! | peek / is_empty | O(1) | Point-in-time read |
//! | len / to_vec / iter | O(n) | Weak snapshot |

mod anchor;
pub mod lock_free;

#[cfg(feature = "serde")]
mod serde_impl;

pub use self::lock_free::{Deque, IntoIter};


#[cfg(test)]
mod proptests;
