use std::collections::VecDeque;

use proptest::prelude::*;
use ringtail::{RingBuffer, RingBufferError};

#[derive(Debug, Clone)]
enum Op {
    Push(i32),
    Pop,
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => any::<i32>().prop_map(Op::Push),
        3 => Just(Op::Pop),
        1 => Just(Op::Clear),
    ]
}

fn buffer_of(capacity: usize, values: &[i32]) -> RingBuffer<i32> {
    let mut buf = RingBuffer::new(capacity).unwrap();
    buf.extend(values.iter().copied());
    buf
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_matches_a_bounded_queue(
        capacity in 1usize..12,
        ops in prop::collection::vec(op(), 0..80),
    ) {
        let mut buf = RingBuffer::new(capacity).unwrap();
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                Op::Push(value) => {
                    buf.push_back(value);
                    if model.len() == capacity {
                        model.pop_front();
                    }
                    model.push_back(value);
                }
                Op::Pop => {
                    let expected = match model.pop_front() {
                        Some(_) => Ok(()),
                        None => Err(RingBufferError::Empty),
                    };
                    prop_assert_eq!(buf.pop_front(), expected);
                }
                Op::Clear => {
                    buf.clear();
                    model.clear();
                }
            }
            prop_assert!(buf.len() <= buf.capacity());
            prop_assert_eq!(buf.capacity(), capacity);
            prop_assert_eq!(buf.iter().copied().collect::<Vec<_>>(), Vec::from(model.clone()));
        }
    }

    #[test]
    fn prop_keeps_the_last_capacity_values(
        capacity in 1usize..16,
        values in prop::collection::vec(any::<i32>(), 0..64),
    ) {
        let buf = buffer_of(capacity, &values);
        let kept = &values[values.len().saturating_sub(capacity)..];
        prop_assert_eq!(buf.len(), kept.len());
        prop_assert_eq!(buf, kept);
    }

    #[test]
    fn prop_equality_ignores_rotation(
        capacity in 1usize..10,
        junk in prop::collection::vec(any::<i32>(), 0..20),
        values in prop::collection::vec(any::<i32>(), 0..10),
    ) {
        prop_assume!(values.len() <= capacity);
        let straight = buffer_of(capacity, &values);

        let mut rotated = buffer_of(capacity, &junk);
        rotated.extend(values.iter().copied());
        while rotated.len() > values.len() {
            rotated.pop_front().unwrap();
        }
        prop_assert_eq!(&rotated, &straight);
    }

    #[test]
    fn prop_cursor_walk_matches_indexing(
        capacity in 1usize..10,
        values in prop::collection::vec(any::<i32>(), 1..30),
    ) {
        let buf = buffer_of(capacity, &values);
        let (mut cursor, end) = (buf.begin(), buf.end());
        prop_assert_eq!(&end - &cursor, buf.len() as isize);

        let mut steps = 0;
        while cursor != end {
            prop_assert_eq!(*cursor, buf[steps]);
            prop_assert_eq!(cursor[0], buf[steps]);
            cursor += 1;
            steps += 1;
        }
        prop_assert_eq!(steps, buf.len());
        prop_assert_eq!(buf.iter().len(), buf.len());
    }

    #[test]
    fn prop_copies_are_independent(
        capacity in 1usize..10,
        values in prop::collection::vec(any::<i32>(), 0..30),
        extra in any::<i32>(),
    ) {
        let original = buffer_of(capacity, &values);
        let mut copy = original.clone();
        prop_assert_eq!(&copy, &original);

        let before: Vec<i32> = original.iter().copied().collect();
        copy.push_back(extra);
        prop_assert_eq!(original.iter().copied().collect::<Vec<_>>(), before.clone());

        let mut source = original;
        let moved = source.take();
        prop_assert_eq!(source.len(), 0);
        prop_assert_eq!(source.capacity(), 0);
        prop_assert_eq!(moved, before);
    }
}

#[test]
fn capacity_five_scenario() {
    let mut buf = RingBuffer::new(5).unwrap();
    buf.extend([1, 2, 3, 4, 5]);
    assert_eq!(buf.len(), 5);
    assert_eq!(buf.front(), Ok(&1));
    assert_eq!(buf.back(), Ok(&5));

    buf.push_back(6);
    assert_eq!(buf.len(), 5);
    assert_eq!(buf, [2, 3, 4, 5, 6]);
    assert_eq!(buf.front(), Ok(&2));
    assert_eq!(buf.back(), Ok(&6));
}

#[test]
fn empty_buffer_errors_leave_state_alone() {
    let mut buf = RingBuffer::<String>::new(3).unwrap();
    buf.push_back("gone".into());
    buf.pop_front().unwrap();

    assert_eq!(buf.front(), Err(RingBufferError::Empty));
    assert_eq!(buf.back(), Err(RingBufferError::Empty));
    assert_eq!(buf.pop_front(), Err(RingBufferError::Empty));
    assert_eq!(buf.len(), 0);
    assert_eq!(buf.capacity(), 3);
    assert_eq!(buf.begin(), buf.end());
}
