//! Lock-Free Deque Implementation
//!
//! A double-ended queue whose entire state is one atomic pointer to an
//! immutable [`Anchor`]. Pushes and pops each install a new anchor with a
//! single compare-and-swap; the back-link a push can not fix in that same step
//! is repaired afterwards by whichever thread gets there first.

use super::anchor::{Anchor, Node, Side, Status};
use crate::backoff::Backoff;
use crate::config::{BackoffConfig, DequeConfig};
use crate::metrics::{AtomicMetrics, MetricsCollector, PerformanceMetrics};
use crate::util::CachePadded;
use crate::Result;
use core::fmt;
use core::sync::atomic::Ordering;
use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned, Shared};
use std::collections::HashSet;
use std::vec::Vec;
use tracing::{debug, trace};

/// A lock-free double-ended queue
///
/// Any number of threads may push and pop at either end at the same time.
/// Operations on the same end behave like a stack, operations on opposite
/// ends like a queue.
///
/// Values are handed out by cloning. The stored value stays in its node until
/// the node is reclaimed, which is what lets [`peek_left`](Deque::peek_left)
/// and the snapshot methods read a node that another thread is popping at the
/// same moment. Wrap large values in `Arc` to make the clone cheap.
///
/// # Progress
///
/// Every operation is lock-free: a thread that keeps losing the anchor race
/// retries, but each loss means some other thread completed an operation.
/// Nobody waits for a particular thread; a push interrupted right after
/// installing its anchor is finished by the next thread to touch the deque.
///
/// # Examples
///
/// ```rust
/// use anchor_deque::Deque;
///
/// let deque = Deque::new();
/// assert_eq!(deque.pop_left(), None);
///
/// deque.push_right(10);
/// deque.push_right(20);
/// assert_eq!(deque.len(), 2);
/// assert_eq!(deque.peek_left(), Some(10));
/// assert_eq!(deque.peek_right(), Some(20));
///
/// assert_eq!(deque.pop_left(), Some(10));
/// assert_eq!(deque.len(), 1);
/// ```
pub struct Deque<T> {
    /// The current anchor; never null
    anchor: CachePadded<Atomic<Anchor<T>>>,
    backoff: BackoffConfig,
    metrics: AtomicMetrics,
}

// Nodes cross threads through the anchor and are read concurrently by peeks.
unsafe impl<T: Send> Send for Deque<T> {}
unsafe impl<T: Send + Sync> Sync for Deque<T> {}

impl<T> Deque<T> {
    /// Create an empty deque with the default configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anchor_deque::Deque;
    ///
    /// let deque: Deque<i32> = Deque::new();
    /// assert!(deque.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::from_config(DequeConfig::default())
    }

    /// Create an empty deque with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
    /// backoff limits are out of range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anchor_deque::{Deque, DequeConfig};
    ///
    /// let deque: Deque<u8> = Deque::with_config(DequeConfig::default().with_metrics(false))?;
    /// assert!(deque.is_empty());
    /// # Ok::<(), anchor_deque::Error>(())
    /// ```
    pub fn with_config(config: DequeConfig) -> Result<Self> {
        config.validate()?;
        if config != DequeConfig::default() {
            debug!(
                spin_limit = config.backoff.spin_limit,
                yield_limit = config.backoff.yield_limit,
                metrics = config.metrics_enabled,
                "deque created with custom config"
            );
        }
        Ok(Self::from_config(config))
    }

    fn from_config(config: DequeConfig) -> Self {
        Self {
            anchor: CachePadded::new(Atomic::new(Anchor::empty())),
            backoff: config.backoff,
            metrics: AtomicMetrics::new(config.metrics_enabled),
        }
    }

    /// The configuration this deque was built with
    pub fn config(&self) -> DequeConfig {
        DequeConfig {
            backoff: self.backoff,
            metrics_enabled: self.metrics.is_enabled(),
        }
    }

    /// Check whether the deque is empty at this instant
    ///
    /// A single atomic read; O(1).
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        let current = self.anchor.load(Ordering::Acquire, guard);
        // SAFETY: the anchor pointer is never null and we are pinned.
        unsafe { current.deref() }.is_empty()
    }

    /// Drive the anchor to a stable state and return it
    fn stable_anchor<'g>(&self, guard: &'g Guard) -> Shared<'g, Anchor<T>> {
        let mut backoff = Backoff::new(self.backoff);
        loop {
            let current = self.anchor.load(Ordering::Acquire, guard);
            // SAFETY: never null, loaded under `guard`.
            if unsafe { current.deref() }.is_stable() {
                return current;
            }
            if !self.stabilize_anchor(current, guard) {
                backoff.snooze();
            }
        }
    }

    /// Collect the nodes of a stable generation, left to right
    ///
    /// Two cursors start at the boundaries and step toward each other until
    /// they meet or become adjacent. A cursor that runs into a link cut by a
    /// concurrent pop ends the walk early, and so does one that reaches a node
    /// already collected: a pop then push on one end can re-point a link so
    /// the cursors pass each other without ever becoming adjacent.
    fn walk<'g>(&self, guard: &'g Guard) -> Vec<&'g Node<T>> {
        let current = self.stable_anchor(guard);
        // SAFETY: loaded under `guard`; every node reachable from a stable
        // anchor read while pinned stays allocated until we unpin.
        let anchor = unsafe { current.deref() };
        let mut left = anchor.boundary(Side::Left, guard);
        let mut right = anchor.boundary(Side::Right, guard);

        let mut front = Vec::new();
        let mut back = Vec::new();
        let mut visited: HashSet<*const Node<T>> = HashSet::new();
        while let (Some(l), Some(r)) = unsafe { (left.as_ref(), right.as_ref()) } {
            if !visited.insert(l as *const Node<T>) {
                break;
            }
            front.push(l);
            if core::ptr::eq(l, r) || !visited.insert(r as *const Node<T>) {
                break;
            }
            back.push(r);

            // Check adjacency from both sides: a pop followed by a push on the
            // same end re-points one of these links past the other cursor.
            let next_left = l.link(Side::Right).load(Ordering::Acquire, guard);
            let next_right = r.link(Side::Left).load(Ordering::Acquire, guard);
            if next_left.as_raw() == r as *const Node<T>
                || next_right.as_raw() == l as *const Node<T>
            {
                break;
            }
            left = next_left;
            right = next_right;
        }

        front.extend(back.into_iter().rev());
        front
    }

    /// Count the elements by walking the chain
    ///
    /// O(n), and only weakly consistent while other threads mutate the
    /// deque; see [`to_vec`](Deque::to_vec).
    pub fn len(&self) -> usize {
        let guard = &epoch::pin();
        self.walk(guard).len()
    }

    /// Try to move a pending anchor to its stable successor
    ///
    /// Returns `true` only if this call installed the stable anchor. Calling
    /// it with an anchor that is already stable, or that someone else already
    /// replaced, does nothing.
    pub(crate) fn stabilize_anchor<'g>(
        &self,
        current: Shared<'g, Anchor<T>>,
        guard: &'g Guard,
    ) -> bool {
        // SAFETY: every caller loaded `current` from `self.anchor` under `guard`.
        let Some(stable) = (unsafe { Anchor::repair(&self.anchor, current, guard) }) else {
            return false;
        };

        match self.anchor.compare_exchange(
            current,
            Owned::new(stable),
            Ordering::AcqRel,
            Ordering::Acquire,
            guard,
        ) {
            Ok(_) => {
                // SAFETY: unlinked; readers still holding it are pinned.
                unsafe { guard.defer_destroy(current) };
                true
            }
            Err(_) => false,
        }
    }

    /// Finish somebody else's push before retrying our own operation
    fn help<'g>(&self, current: Shared<'g, Anchor<T>>, guard: &'g Guard) {
        self.metrics.record_help();
        // SAFETY: loaded under `guard` by the caller.
        let status = unsafe { current.deref() }.status;
        trace!(?status, "helping pending anchor");
        self.stabilize_anchor(current, guard);
    }

    #[cfg(test)]
    pub(crate) fn current_anchor<'g>(&self, guard: &'g Guard) -> Shared<'g, Anchor<T>> {
        self.anchor.load(Ordering::Acquire, guard)
    }

    /// Complete any link repair the live anchor still owes
    ///
    /// Pushes already do this on their way out, so calling it is never needed
    /// for correctness. Returns `true` if this call did the repair.
    pub fn stabilize(&self) -> bool {
        let guard = &epoch::pin();
        let current = self.anchor.load(Ordering::Acquire, guard);
        self.stabilize_anchor(current, guard)
    }

    /// Every node of `anchor`'s generation, following the links the anchor's
    /// status guarantees to be intact
    ///
    /// # Safety
    ///
    /// No other thread may claim these nodes; the anchor must already be
    /// unreachable or the deque exclusively borrowed.
    unsafe fn chain<'g>(anchor: &Anchor<T>, guard: &'g Guard) -> Vec<Shared<'g, Node<T>>> {
        // A right push leaves the inner neighbour's right link stale but every
        // left link correct, and vice versa.
        let from = match anchor.status {
            Status::Pending(Side::Left) => Side::Left,
            _ => Side::Right,
        };
        let stop = anchor.boundary_ptr(from.opposite());

        let mut nodes = Vec::new();
        let mut cursor = anchor.boundary(from, guard);
        while let Some(node) = cursor.as_ref() {
            nodes.push(cursor);
            if cursor.as_raw() == stop {
                break;
            }
            cursor = node.link(from.opposite()).load(Ordering::Acquire, guard);
        }
        nodes
    }
}

// `'static`: retired nodes still own their values, and the epoch collector
// may drop them on any thread after this deque and any borrow in `T` are gone.
impl<T: Send + 'static> Deque<T> {
    /// Push a value onto the left end
    ///
    /// Never blocks and never fails; under contention it retries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anchor_deque::Deque;
    ///
    /// let deque = Deque::new();
    /// deque.push_left(1);
    /// deque.push_left(2);
    /// assert_eq!(deque.pop_right(), Some(1));
    /// ```
    pub fn push_left(&self, value: T) {
        self.push(Side::Left, value, true);
    }

    /// Push a value onto the right end
    ///
    /// Never blocks and never fails; under contention it retries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anchor_deque::Deque;
    ///
    /// let deque = Deque::new();
    /// deque.push_right(1);
    /// deque.push_right(2);
    /// deque.push_right(3);
    /// assert_eq!(deque.pop_right(), Some(3));
    /// assert_eq!(deque.pop_right(), Some(2));
    /// assert_eq!(deque.pop_right(), Some(1));
    /// ```
    pub fn push_right(&self, value: T) {
        self.push(Side::Right, value, true);
    }

    /// Push without repairing the link afterwards, leaving the anchor pending
    #[cfg(test)]
    pub(crate) fn push_pending(&self, side: Side, value: T) {
        self.push(side, value, false);
    }

    fn push(&self, side: Side, value: T, stabilize: bool) {
        let start = self.metrics.start();
        let guard = &epoch::pin();
        let node = Owned::new(Node::new(value)).into_shared(guard);
        // SAFETY: freshly allocated and not yet published.
        let inward = unsafe { node.deref() }.link(side.opposite());
        let mut backoff = Backoff::new(self.backoff);

        loop {
            let current = self.anchor.load(Ordering::Acquire, guard);
            // SAFETY: never null, loaded under `guard`.
            let anchor = unsafe { current.deref() };

            let next = if anchor.is_empty() {
                inward.store(Shared::null(), Ordering::Relaxed);
                Anchor::single(node.as_raw())
            } else if anchor.is_stable() {
                inward.store(anchor.boundary(side, guard), Ordering::Relaxed);
                anchor.with_boundary(side, node.as_raw(), Status::Pending(side))
            } else {
                self.help(current, guard);
                continue;
            };

            match self.anchor.compare_exchange(
                current,
                Owned::new(next),
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            ) {
                Ok(installed) => {
                    // SAFETY: replaced; late readers are pinned.
                    unsafe { guard.defer_destroy(current) };
                    if stabilize {
                        self.stabilize_anchor(installed, guard);
                    }
                    self.metrics.record_success(start);
                    return;
                }
                Err(_) => {
                    self.metrics.record_contention();
                    backoff.snooze();
                }
            }
        }
    }

    /// Remove every element
    ///
    /// Installs the empty anchor unconditionally. This is not atomic with
    /// respect to concurrent pushes: a push racing a `clear` may or may not be
    /// visible afterwards. Intended for a single writer.
    pub fn clear(&self) {
        let guard = &epoch::pin();
        let old = self
            .anchor
            .swap(Owned::new(Anchor::empty()), Ordering::AcqRel, guard);

        // SAFETY: `old` is unreachable now, so no pop can claim its nodes; a
        // pop that read it will fail its compare-and-swap.
        unsafe {
            let nodes = Self::chain(old.deref(), guard);
            trace!(removed = nodes.len(), "deque cleared");
            for node in nodes {
                guard.defer_destroy(node);
            }
            guard.defer_destroy(old);
        }
    }

    /// Remove the leftmost element without cloning it
    ///
    /// Exclusive access means no other thread can be reading the node.
    fn take_left(&mut self) -> Option<T> {
        // SAFETY: `&mut self` rules out concurrent access to this deque.
        unsafe {
            let guard = epoch::unprotected();
            let current = self.anchor.load(Ordering::Relaxed, guard);
            let mut anchor = *current.deref();
            if let Some(stable) = Anchor::repair(&self.anchor, current, guard) {
                anchor = stable;
            }
            let target = anchor.boundary(Side::Left, guard);
            if target.is_null() {
                return None;
            }

            let next = if anchor.is_single() {
                Anchor::empty()
            } else {
                let inner = target.deref().link(Side::Right).load(Ordering::Relaxed, guard);
                inner
                    .deref()
                    .link(Side::Left)
                    .store(Shared::null(), Ordering::Relaxed);
                anchor.with_boundary(Side::Left, inner.as_raw(), Status::Stable)
            };

            self.anchor.store(Owned::new(next), Ordering::Relaxed);
            drop(current.into_owned());
            Some(target.into_owned().into_box().into_value())
        }
    }
}

impl<T: Clone + Send + 'static> Deque<T> {
    /// Pop the leftmost element
    ///
    /// Returns `None` only if the deque was observed empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anchor_deque::Deque;
    ///
    /// let deque = Deque::new();
    /// deque.push_right("a");
    /// deque.push_right("b");
    /// assert_eq!(deque.pop_left(), Some("a"));
    /// assert_eq!(deque.pop_left(), Some("b"));
    /// assert_eq!(deque.pop_left(), None);
    /// ```
    pub fn pop_left(&self) -> Option<T> {
        self.pop(Side::Left)
    }

    /// Pop the rightmost element
    ///
    /// Returns `None` only if the deque was observed empty.
    pub fn pop_right(&self) -> Option<T> {
        self.pop(Side::Right)
    }

    fn pop(&self, side: Side) -> Option<T> {
        let start = self.metrics.start();
        let guard = &epoch::pin();
        let mut backoff = Backoff::new(self.backoff);

        loop {
            let current = self.anchor.load(Ordering::Acquire, guard);
            // SAFETY: never null, loaded under `guard`.
            let anchor = unsafe { current.deref() };
            let target = anchor.boundary(side, guard);
            if target.is_null() {
                self.metrics.record_failure();
                return None;
            }

            // SAFETY: boundary of an anchor loaded under `guard`.
            let node = unsafe { target.deref() };
            let (next, inner) = if anchor.is_single() {
                (Anchor::empty(), Shared::null())
            } else if anchor.is_stable() {
                let inner = node.link(side.opposite()).load(Ordering::Acquire, guard);
                (
                    anchor.with_boundary(side, inner.as_raw(), Status::Stable),
                    inner,
                )
            } else {
                self.help(current, guard);
                continue;
            };

            match self.anchor.compare_exchange(
                current,
                Owned::new(next),
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            ) {
                Ok(_) => {
                    let value = node.value.clone();
                    // Drop the new boundary's pointer to the removed node.
                    // Losing this race only leaves a stale link past the end.
                    if let Some(inner) = unsafe { inner.as_ref() } {
                        let _ = inner.link(side).compare_exchange(
                            target,
                            Shared::null(),
                            Ordering::Release,
                            Ordering::Relaxed,
                            guard,
                        );
                    }
                    // SAFETY: we won the anchor; nobody else can claim `target`.
                    unsafe {
                        guard.defer_destroy(current);
                        guard.defer_destroy(target);
                    }
                    self.metrics.record_success(start);
                    return Some(value);
                }
                Err(_) => {
                    self.metrics.record_contention();
                    backoff.snooze();
                }
            }
        }
    }

    /// Read the leftmost element without removing it
    ///
    /// A point-in-time observation; a concurrent pop may remove the element
    /// before the caller looks at the result.
    pub fn peek_left(&self) -> Option<T> {
        self.peek(Side::Left)
    }

    /// Read the rightmost element without removing it
    pub fn peek_right(&self) -> Option<T> {
        self.peek(Side::Right)
    }

    fn peek(&self, side: Side) -> Option<T> {
        let start = self.metrics.start();
        let guard = &epoch::pin();
        let current = self.anchor.load(Ordering::Acquire, guard);
        // SAFETY: the node stays allocated while we are pinned.
        let value = unsafe { current.deref().boundary(side, guard).as_ref() }
            .map(|node| node.value.clone());
        match value {
            Some(_) => self.metrics.record_success(start),
            None => self.metrics.record_failure(),
        }
        value
    }

    /// Copy the elements out, left to right
    ///
    /// First drives the deque to a stable anchor, then walks that generation
    /// from both ends until the walks meet. This is **not** linearizable with
    /// concurrent mutation: pops during the walk can cut it short and pushes
    /// can extend it, so the result is only guaranteed to reflect the deque as
    /// of the stable point it started from, minus whatever concurrent pops
    /// took away. O(n).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anchor_deque::Deque;
    ///
    /// let deque = Deque::new();
    /// deque.push_right(2);
    /// deque.push_left(1);
    /// deque.push_right(3);
    /// assert_eq!(deque.to_vec(), vec![1, 2, 3]);
    /// ```
    pub fn to_vec(&self) -> Vec<T> {
        let guard = &epoch::pin();
        self.walk(guard)
            .into_iter()
            .map(|node| node.value.clone())
            .collect()
    }

    /// Iterate over a snapshot taken by [`to_vec`](Deque::to_vec)
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.to_vec().into_iter()
    }
}

impl<T> Drop for Deque<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self`; nodes popped earlier were already handed to
        // the collector and are not part of the current chain.
        unsafe {
            let guard = epoch::unprotected();
            let current = self.anchor.load(Ordering::Relaxed, guard);
            for node in Self::chain(current.deref(), guard) {
                drop(node.into_owned());
            }
            drop(current.into_owned());
        }
    }
}

impl<T> Default for Deque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Deque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deque")
            .field("is_empty", &self.is_empty())
            .field("backoff", &self.backoff)
            .field("metrics_enabled", &self.metrics.is_enabled())
            .finish()
    }
}

impl<T: Clone + Send + 'static> Clone for Deque<T> {
    fn clone(&self) -> Self {
        let clone = Self::from_config(self.config());
        for value in self.to_vec() {
            clone.push_right(value);
        }
        clone
    }
}

impl<T: Send + 'static> FromIterator<T> for Deque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let deque = Self::new();
        for value in iter {
            deque.push_right(value);
        }
        deque
    }
}

impl<T: Send + 'static> From<Vec<T>> for Deque<T> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T: Send + 'static> Extend<T> for Deque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_right(value);
        }
    }
}

/// Owning iterator that drains a deque from the left
#[derive(Debug)]
pub struct IntoIter<T> {
    deque: Deque<T>,
}

impl<T: Send + 'static> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.deque.take_left()
    }
}

impl<T: Send + 'static> IntoIterator for Deque<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter { deque: self }
    }
}

impl<T> MetricsCollector for Deque<T> {
    fn metrics(&self) -> PerformanceMetrics {
        self.metrics.snapshot()
    }

    fn reset_metrics(&self) {
        self.metrics.reset();
    }

    fn set_metrics_enabled(&self, enabled: bool) {
        self.metrics.set_enabled(enabled);
    }

    fn is_metrics_enabled(&self) -> bool {
        self.metrics.is_enabled()
    }
}
