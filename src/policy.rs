//! Strategies for overwriting the oldest element of a full buffer.
//!
//! [`Reconstruct`] destroys the oldest element and constructs the new one in
//! its slot, so the allocator sees a destroy/construct pair per overwrite.
//! [`Reassign`] assigns into the oldest element in place: a copy goes through
//! [`Clone::clone_from`] and can reuse the element's resources, but a panic in
//! `clone_from` may leave that element half-updated. The buffer itself stays
//! consistent either way.

use crate::alloc::SlotAllocator;
use crate::ringbuffer::RingBuffer;

mod private {
    pub trait Sealed {}
}

/// Picked once per buffer type through its `R` parameter.
pub trait ReplacePolicy: private::Sealed + Sized {
    fn replace_oldest<T, A: SlotAllocator>(buf: &mut RingBuffer<T, A, Self>, value: T);

    fn replace_oldest_cloned<T: Clone, A: SlotAllocator>(
        buf: &mut RingBuffer<T, A, Self>,
        source: &T,
    );

    fn try_replace_oldest_with<T, A, E, F>(
        buf: &mut RingBuffer<T, A, Self>,
        make: F,
    ) -> Result<(), E>
    where
        A: SlotAllocator,
        F: FnOnce() -> Result<T, E>;
}

/// Destroy, then construct. The default.
#[derive(Debug)]
pub enum Reconstruct {}

/// Assign in place.
#[derive(Debug)]
pub enum Reassign {}

impl private::Sealed for Reconstruct {}
impl private::Sealed for Reassign {}

impl ReplacePolicy for Reconstruct {
    fn replace_oldest<T, A: SlotAllocator>(buf: &mut RingBuffer<T, A, Self>, value: T) {
        buf.evict_oldest();
        buf.push_vacant(value);
    }

    fn replace_oldest_cloned<T: Clone, A: SlotAllocator>(
        buf: &mut RingBuffer<T, A, Self>,
        source: &T,
    ) {
        buf.evict_oldest();
        buf.push_vacant(source.clone());
    }

    fn try_replace_oldest_with<T, A, E, F>(
        buf: &mut RingBuffer<T, A, Self>,
        make: F,
    ) -> Result<(), E>
    where
        A: SlotAllocator,
        F: FnOnce() -> Result<T, E>,
    {
        // The freed slot is already out of the live range when `make` runs.
        buf.evict_oldest();
        buf.push_vacant(make()?);
        Ok(())
    }
}

impl ReplacePolicy for Reassign {
    fn replace_oldest<T, A: SlotAllocator>(buf: &mut RingBuffer<T, A, Self>, value: T) {
        *buf.oldest_mut() = value;
        buf.rotate();
    }

    fn replace_oldest_cloned<T: Clone, A: SlotAllocator>(
        buf: &mut RingBuffer<T, A, Self>,
        source: &T,
    ) {
        buf.oldest_mut().clone_from(source);
        buf.rotate();
    }

    fn try_replace_oldest_with<T, A, E, F>(
        buf: &mut RingBuffer<T, A, Self>,
        make: F,
    ) -> Result<(), E>
    where
        A: SlotAllocator,
        F: FnOnce() -> Result<T, E>,
    {
        let value = make()?;
        Self::replace_oldest(buf, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use super::*;
    use crate::alloc::Heap;

    #[derive(Debug, PartialEq)]
    struct Fragile(i32);

    impl Clone for Fragile {
        fn clone(&self) -> Self {
            if self.0 < 0 {
                panic!("cannot clone {}", self.0);
            }
            Fragile(self.0)
        }

        fn clone_from(&mut self, source: &Self) {
            if source.0 < 0 {
                // Half-updated before failing.
                self.0 = 0;
                panic!("cannot assign {}", source.0);
            }
            self.0 = source.0;
        }
    }

    fn full<R: ReplacePolicy>() -> RingBuffer<Fragile, Heap, R> {
        let mut buf = RingBuffer::with_allocator(3, Heap).unwrap();
        buf.extend((1..=3).map(Fragile));
        buf
    }

    #[test]
    fn both_policies_keep_fifo_order() {
        let mut rebuilt = full::<Reconstruct>();
        let mut reassigned = full::<Reassign>();
        for i in 4..=7 {
            rebuilt.push_back_cloned(&Fragile(i));
            reassigned.push_back_cloned(&Fragile(i));
        }
        assert_eq!(rebuilt, [Fragile(5), Fragile(6), Fragile(7)]);
        assert_eq!(rebuilt, reassigned);
    }

    #[test]
    fn panicking_copy_under_reconstruct_frees_the_slot() {
        let mut buf = full::<Reconstruct>();
        let res = panic::catch_unwind(AssertUnwindSafe(|| buf.push_back_cloned(&Fragile(-1))));
        assert!(res.is_err());
        assert_eq!(buf, [Fragile(2), Fragile(3)]);
    }

    #[test]
    fn panicking_copy_under_reassign_is_only_basic_safe() {
        let mut buf = full::<Reassign>();
        let res = panic::catch_unwind(AssertUnwindSafe(|| buf.push_back_cloned(&Fragile(-1))));
        assert!(res.is_err());
        // Nothing rotated, but the oldest element was partially overwritten.
        assert_eq!(buf.len(), 3);
        assert_eq!(buf, [Fragile(0), Fragile(2), Fragile(3)]);
    }
}
