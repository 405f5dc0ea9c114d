//! Nodes, anchors and the link-repair step of the helping protocol
//!
//! An [`Anchor`] is never written after it is built. The deque swaps whole
//! anchors, so a thread that loaded one can keep reasoning about it: if the
//! deque moved on, its compare-and-swap against that anchor simply fails.

use core::fmt;
use core::sync::atomic::Ordering;
use crossbeam_epoch::{Atomic, Guard, Shared};
use std::boxed::Box;

/// One end of the deque
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Whether an anchor still owes a link repair, and on which end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    /// Every link in the chain points back correctly
    Stable,
    /// The boundary on this side was just pushed; its inner neighbour's
    /// outward link does not point at it yet
    Pending(Side),
}

/// A deque element with its two neighbour links
///
/// The value is written once at construction. Only the links change, and only
/// through the push, repair and pop-cleanup steps.
pub(crate) struct Node<T> {
    pub(crate) value: T,
    left: Atomic<Node<T>>,
    right: Atomic<Node<T>>,
}

impl<T> Node<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            value,
            left: Atomic::null(),
            right: Atomic::null(),
        }
    }

    pub(crate) fn into_value(self: Box<Self>) -> T {
        self.value
    }

    /// The link pointing toward `side`
    #[inline]
    pub(crate) fn link(&self, side: Side) -> &Atomic<Node<T>> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node").field("value", &self.value).finish()
    }
}

/// Immutable snapshot of both boundaries plus the repair status
///
/// Compared by address, never by value: two anchors with the same fields are
/// still different generations of the deque.
pub(crate) struct Anchor<T> {
    left: *const Node<T>,
    right: *const Node<T>,
    pub(crate) status: Status,
}

impl<T> Clone for Anchor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Anchor<T> {}

impl<T> fmt::Debug for Anchor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("left", &self.left)
            .field("right", &self.right)
            .field("status", &self.status)
            .finish()
    }
}

impl<T> Anchor<T> {
    pub(crate) const fn empty() -> Self {
        Self {
            left: core::ptr::null(),
            right: core::ptr::null(),
            status: Status::Stable,
        }
    }

    pub(crate) fn single(node: *const Node<T>) -> Self {
        Self {
            left: node,
            right: node,
            status: Status::Stable,
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.left.is_null()
    }

    #[inline]
    pub(crate) fn is_single(&self) -> bool {
        !self.left.is_null() && self.left == self.right
    }

    #[inline]
    pub(crate) fn is_stable(&self) -> bool {
        self.status == Status::Stable
    }

    #[inline]
    pub(crate) fn boundary_ptr(&self, side: Side) -> *const Node<T> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// The boundary node on `side`, valid for as long as `guard` stays pinned
    /// provided this anchor was loaded under the same pin.
    #[inline]
    pub(crate) fn boundary<'g>(&self, side: Side, _guard: &'g Guard) -> Shared<'g, Node<T>> {
        Shared::from(self.boundary_ptr(side))
    }

    /// A copy of this anchor with the `side` boundary replaced
    pub(crate) fn with_boundary(&self, side: Side, node: *const Node<T>, status: Status) -> Self {
        let mut next = *self;
        match side {
            Side::Left => next.left = node,
            Side::Right => next.right = node,
        }
        next.status = status;
        next
    }

    /// Fix the link a pending anchor owes and return its stable successor
    ///
    /// Returns `None` when `current` is already stable, or when `live` moves
    /// past `current` before the link is confirmed. The outward link is
    /// reloaded and compared on every pass, and the stable successor is only
    /// returned once the link has been seen pointing at the pushed node while
    /// `current` was still live. A late helper's stale compare-and-swap can
    /// land after that, but only while the link still holds the value it
    /// expected, and the next repair on this end overwrites it. Installing
    /// the returned anchor is left to the caller.
    ///
    /// # Safety
    ///
    /// `current` must have been loaded from `live` while `guard` was pinned.
    pub(crate) unsafe fn repair<'g>(
        live: &Atomic<Anchor<T>>,
        current: Shared<'g, Anchor<T>>,
        guard: &'g Guard,
    ) -> Option<Anchor<T>> {
        let anchor = current.deref();
        let side = match anchor.status {
            Status::Stable => return None,
            Status::Pending(side) => side,
        };

        // A pending anchor always has the new boundary and its inner neighbour.
        let pushed = anchor.boundary(side, guard);
        let inner = pushed.deref().link(side.opposite()).load(Ordering::Acquire, guard);
        debug_assert!(!inner.is_null(), "pending anchor without an inner neighbour");
        let outward = inner.deref().link(side);

        loop {
            if live.load(Ordering::Acquire, guard) != current {
                return None;
            }
            let seen = outward.load(Ordering::Acquire, guard);
            if seen == pushed {
                break;
            }
            let _ = outward.compare_exchange(
                seen,
                pushed,
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            );
        }

        Some(Anchor {
            status: Status::Stable,
            ..*anchor
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_epoch::{self as epoch, Owned};

    #[test]
    fn test_with_boundary_leaves_other_side() {
        let a = 0x10 as *const Node<u32>;
        let b = 0x20 as *const Node<u32>;
        let anchor = Anchor::single(a);
        assert!(anchor.is_single());

        let pushed = anchor.with_boundary(Side::Right, b, Status::Pending(Side::Right));
        assert_eq!(pushed.boundary_ptr(Side::Left), a);
        assert_eq!(pushed.boundary_ptr(Side::Right), b);
        assert!(!pushed.is_stable());
        assert!(!pushed.is_single());
        assert!(Anchor::<u32>::empty().is_empty());
    }

    #[test]
    fn test_repair_is_idempotent() {
        let guard = &epoch::pin();
        let first = Owned::new(Node::new(1)).into_shared(guard);
        let second = Owned::new(Node::new(2)).into_shared(guard);
        unsafe { second.deref() }
            .link(Side::Left)
            .store(first, Ordering::Relaxed);

        let live = Atomic::new(Anchor {
            left: first.as_raw(),
            right: second.as_raw(),
            status: Status::Pending(Side::Right),
        });
        let pending = live.load(Ordering::Acquire, guard);

        let repaired = unsafe { Anchor::repair(&live, pending, guard) }.unwrap();
        assert!(repaired.is_stable());
        assert_eq!(
            unsafe { first.deref() }.link(Side::Right).load(Ordering::Relaxed, guard),
            second
        );

        // A late helper on the same snapshot sees the link already fixed
        let again = unsafe { Anchor::repair(&live, pending, guard) }.unwrap();
        assert!(again.is_stable());
        assert_eq!(
            unsafe { first.deref() }.link(Side::Right).load(Ordering::Relaxed, guard),
            second
        );

        unsafe {
            drop(pending.into_owned());
            drop(first.into_owned());
            drop(second.into_owned());
        }
    }

    #[test]
    fn test_repair_overwrites_stale_link() {
        let guard = &epoch::pin();
        let first = Owned::new(Node::new(1)).into_shared(guard);
        let popped = Owned::new(Node::new(2)).into_shared(guard);
        let pushed = Owned::new(Node::new(3)).into_shared(guard);

        // `first` still points at a node that is no longer in the chain
        unsafe { first.deref() }
            .link(Side::Right)
            .store(popped, Ordering::Relaxed);
        unsafe { pushed.deref() }
            .link(Side::Left)
            .store(first, Ordering::Relaxed);

        let live = Atomic::new(Anchor {
            left: first.as_raw(),
            right: pushed.as_raw(),
            status: Status::Pending(Side::Right),
        });
        let pending = live.load(Ordering::Acquire, guard);

        assert!(unsafe { Anchor::repair(&live, pending, guard) }.is_some());
        assert_eq!(
            unsafe { first.deref() }.link(Side::Right).load(Ordering::Relaxed, guard),
            pushed
        );

        unsafe {
            drop(pending.into_owned());
            drop(first.into_owned());
            drop(popped.into_owned());
            drop(pushed.into_owned());
        }
    }

    #[test]
    fn test_repair_gives_up_on_replaced_anchor() {
        let guard = &epoch::pin();
        let first = Owned::new(Node::new(1)).into_shared(guard);
        let second = Owned::new(Node::new(2)).into_shared(guard);
        unsafe { second.deref() }
            .link(Side::Left)
            .store(first, Ordering::Relaxed);

        let pending = Owned::new(Anchor {
            left: first.as_raw(),
            right: second.as_raw(),
            status: Status::Pending(Side::Right),
        })
        .into_shared(guard);
        let live = Atomic::new(Anchor::<u32>::empty());

        assert!(unsafe { Anchor::repair(&live, pending, guard) }.is_none());
        assert!(unsafe { first.deref() }
            .link(Side::Right)
            .load(Ordering::Relaxed, guard)
            .is_null());

        unsafe {
            drop(pending.into_owned());
            drop(live.into_owned());
            drop(first.into_owned());
            drop(second.into_owned());
        }
    }
}
