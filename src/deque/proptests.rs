//! Property-based tests for the deque using proptest
//!
//! Every operation sequence is replayed against `VecDeque` as a sequential
//! reference. The pending variants leave the anchor unstabilized so the next
//! operation has to go through the helping path.

use super::anchor::Side;
use super::Deque;
use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::thread;
use std::vec::Vec;

#[derive(Debug, Clone)]
enum Op {
    PushLeft(i32),
    PushRight(i32),
    PushLeftPending(i32),
    PushRightPending(i32),
    PopLeft,
    PopRight,
    PeekLeft,
    PeekRight,
    Stabilize,
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i32>().prop_map(Op::PushLeft),
        4 => any::<i32>().prop_map(Op::PushRight),
        2 => any::<i32>().prop_map(Op::PushLeftPending),
        2 => any::<i32>().prop_map(Op::PushRightPending),
        3 => Just(Op::PopLeft),
        3 => Just(Op::PopRight),
        1 => Just(Op::PeekLeft),
        1 => Just(Op::PeekRight),
        1 => Just(Op::Stabilize),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn test_matches_sequential_model(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let deque = Deque::new();
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                Op::PushLeft(v) => {
                    deque.push_left(v);
                    model.push_front(v);
                }
                Op::PushRight(v) => {
                    deque.push_right(v);
                    model.push_back(v);
                }
                Op::PushLeftPending(v) => {
                    deque.push_pending(Side::Left, v);
                    model.push_front(v);
                }
                Op::PushRightPending(v) => {
                    deque.push_pending(Side::Right, v);
                    model.push_back(v);
                }
                Op::PopLeft => prop_assert_eq!(deque.pop_left(), model.pop_front()),
                Op::PopRight => prop_assert_eq!(deque.pop_right(), model.pop_back()),
                Op::PeekLeft => prop_assert_eq!(deque.peek_left(), model.front().copied()),
                Op::PeekRight => prop_assert_eq!(deque.peek_right(), model.back().copied()),
                Op::Stabilize => {
                    deque.stabilize();
                }
                Op::Clear => {
                    deque.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(deque.is_empty(), model.is_empty());
        }

        prop_assert_eq!(deque.len(), model.len());
        prop_assert_eq!(deque.to_vec(), model.iter().copied().collect::<Vec<_>>());
        prop_assert_eq!(
            deque.into_iter().collect::<Vec<_>>(),
            model.into_iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_bulk_construction_preserves_order(values in prop::collection::vec(any::<u16>(), 0..100)) {
        let deque: Deque<u16> = values.iter().copied().collect();
        prop_assert_eq!(deque.len(), values.len());
        prop_assert_eq!(deque.to_vec(), values.clone());

        let reversed: Vec<_> = core::iter::from_fn(|| deque.pop_right()).collect();
        prop_assert_eq!(reversed, values.into_iter().rev().collect::<Vec<_>>());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_concurrent_conservation(
        threads in 2usize..5,
        per_thread in 10usize..300,
        pop_every in 1usize..4,
    ) {
        let deque = Arc::new(Deque::new());

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let deque = Arc::clone(&deque);
                thread::spawn(move || {
                    let mut popped = Vec::new();
                    for i in 0..per_thread {
                        let value = t * per_thread + i;
                        if i % 2 == 0 {
                            deque.push_left(value);
                        } else {
                            deque.push_right(value);
                        }
                        if i % pop_every == 0 {
                            let taken = if t % 2 == 0 { deque.pop_left() } else { deque.pop_right() };
                            popped.extend(taken);
                        }
                    }
                    popped
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                prop_assert!(seen.insert(value));
            }
        }

        let remaining = deque.to_vec();
        prop_assert_eq!(seen.len() + remaining.len(), threads * per_thread);
        for value in remaining {
            prop_assert!(seen.insert(value));
        }
        prop_assert_eq!(seen.len(), threads * per_thread);
    }
}
