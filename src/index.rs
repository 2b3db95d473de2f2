/// Maps a logical offset from `start` to a physical slot of a store with
/// `capacity` slots.
///
/// `start` must be below `capacity` and `offset` at most `capacity`; within
/// those bounds this never overflows, even near `usize::MAX`.
#[inline]
pub fn physical(start: usize, capacity: usize, offset: usize) -> usize {
    debug_assert!(capacity > 0, "circular index into a zero-capacity store");
    debug_assert!(start < capacity);
    debug_assert!(offset <= capacity);

    let to_end = capacity - start;
    if offset < to_end {
        start + offset
    } else {
        offset - to_end
    }
}

#[cfg(test)]
mod tests {
    use super::physical;

    #[test]
    fn wraps_past_the_end() {
        assert_eq!(physical(0, 5, 0), 0);
        assert_eq!(physical(3, 5, 1), 4);
        assert_eq!(physical(3, 5, 2), 0);
        assert_eq!(physical(4, 5, 4), 3);
        assert_eq!(physical(2, 5, 5), 2);
    }

    #[test]
    fn matches_modulo_everywhere() {
        for capacity in 1..8 {
            for start in 0..capacity {
                for offset in 0..=capacity {
                    assert_eq!(physical(start, capacity, offset), (start + offset) % capacity);
                }
            }
        }
    }

    #[test]
    fn no_overflow_at_the_top() {
        let capacity = usize::MAX;
        assert_eq!(physical(capacity - 1, capacity, 1), 0);
        assert_eq!(physical(capacity - 1, capacity, 0), capacity - 1);
    }
}
