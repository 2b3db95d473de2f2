//! Backing storage for ring buffers.
//!
//! A [`SlotAllocator`] hands out blocks of uninitialized slots and constructs
//! or destroys single elements inside them. [`RawStore`] is the owned block a
//! buffer keeps; it never initializes memory on its own and never drops
//! elements implicitly, the buffer decides which slots are live.

use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use crate::error::RingBufferError;

/// Allocation and in-place construction strategy for ring buffer storage.
///
/// Every slot a buffer fills goes through [`SlotAllocator::construct`] and
/// leaves through either [`SlotAllocator::destroy`] or
/// [`SlotAllocator::take`], so implementations can account for or trace each
/// element. Relocating a whole store on reallocation is a bitwise move that
/// calls neither hook.
pub trait SlotAllocator {
    /// Obtain uninitialized storage for `capacity` slots of `T`.
    fn allocate<T>(&self, capacity: usize) -> Result<NonNull<T>, RingBufferError>;

    /// Release storage obtained from [`SlotAllocator::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate::<T>(capacity)` on an allocator that
    /// compares equivalent to this one, and must not be released twice.
    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, capacity: usize);

    /// Move `value` into the uninitialized `slot`.
    ///
    /// # Safety
    ///
    /// `slot` must be valid for writes and must not hold a live value.
    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        ptr::write(slot.as_ptr(), value);
    }

    /// Drop the value held in `slot` in place.
    ///
    /// # Safety
    ///
    /// `slot` must hold a live value, which is dead afterwards.
    unsafe fn destroy<T>(&self, slot: NonNull<T>) {
        ptr::drop_in_place(slot.as_ptr());
    }

    /// Move the value held in `slot` out to the caller. Like
    /// [`SlotAllocator::destroy`], this ends the slot's occupancy.
    ///
    /// # Safety
    ///
    /// `slot` must hold a live value, which is dead afterwards.
    unsafe fn take<T>(&self, slot: NonNull<T>) -> T {
        ptr::read(slot.as_ptr())
    }

    /// The allocator a copy of a container should use.
    fn select_on_copy(&self) -> Self
    where
        Self: Sized;
}

/// Computes the layout of a block of `capacity` slots of `T`.
pub fn slot_layout<T>(capacity: usize) -> Result<Layout, RingBufferError> {
    Layout::array::<T>(capacity).map_err(|_| RingBufferError::CapacityOverflow { capacity })
}

/// The global heap allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Heap;

impl SlotAllocator for Heap {
    fn allocate<T>(&self, capacity: usize) -> Result<NonNull<T>, RingBufferError> {
        let layout = slot_layout::<T>(capacity)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr.cast::<T>()).ok_or_else(|| {
            log::debug!("heap refused {} bytes for {capacity} slots", layout.size());
            RingBufferError::Alloc { capacity }
        })
    }

    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, capacity: usize) {
        // An allocation of this size succeeded before, so the layout is valid.
        let layout = match slot_layout::<T>(capacity) {
            Ok(layout) => layout,
            Err(_) => return,
        };
        if layout.size() != 0 {
            alloc::dealloc(ptr.as_ptr().cast::<u8>(), layout);
        }
    }

    fn select_on_copy(&self) -> Self {
        Heap
    }
}

/// An owned block of `capacity` possibly-uninitialized slots.
///
/// The store knows nothing about which slots are live. Dropping it without
/// [`RawStore::release`] leaks the block but never touches its contents.
pub(crate) struct RawStore<T> {
    ptr: NonNull<T>,
    capacity: usize,
    _owns: PhantomData<T>,
}

impl<T> RawStore<T> {
    /// The store of a moved-from or default buffer: no slots, nothing to free.
    pub(crate) const fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            _owns: PhantomData,
        }
    }

    pub(crate) fn acquire<A: SlotAllocator>(
        alloc: &A,
        capacity: usize,
    ) -> Result<Self, RingBufferError> {
        let ptr = alloc.allocate::<T>(capacity)?;
        log::trace!("acquired {capacity} slots at {ptr:p}");
        Ok(Self {
            ptr,
            capacity,
            _owns: PhantomData,
        })
    }

    /// Hands the block back to `alloc` and leaves `self` empty.
    ///
    /// # Safety
    ///
    /// Every live slot must already be destroyed or moved out, and `alloc`
    /// must be equivalent to the allocator that acquired the block.
    pub(crate) unsafe fn release<A: SlotAllocator>(&mut self, alloc: &A) {
        if self.capacity == 0 {
            return;
        }
        log::trace!("releasing {} slots at {:p}", self.capacity, self.ptr);
        alloc.deallocate(self.ptr, self.capacity);
        *self = Self::empty();
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> NonNull<T> {
        debug_assert!(index < self.capacity, "slot {index} out of {}", self.capacity);
        // SAFETY: index is inside the allocated block.
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(index)) }
    }

    /// # Safety
    ///
    /// Slot `index` must be dead.
    #[inline]
    pub(crate) unsafe fn construct_at<A: SlotAllocator>(
        &mut self,
        alloc: &A,
        index: usize,
        value: T,
    ) {
        alloc.construct(self.slot(index), value);
    }

    /// # Safety
    ///
    /// Slot `index` must be live; it is dead afterwards.
    #[inline]
    pub(crate) unsafe fn destroy_at<A: SlotAllocator>(&mut self, alloc: &A, index: usize) {
        alloc.destroy(self.slot(index));
    }

    /// Moves the value out of slot `index`, leaving the slot dead.
    ///
    /// # Safety
    ///
    /// Slot `index` must be live.
    #[inline]
    pub(crate) unsafe fn take_at<A: SlotAllocator>(&mut self, alloc: &A, index: usize) -> T {
        alloc.take(self.slot(index))
    }

    /// # Safety
    ///
    /// Slot `index` must be live.
    #[inline]
    pub(crate) unsafe fn get(&self, index: usize) -> &T {
        &*self.slot(index).as_ptr()
    }

    /// # Safety
    ///
    /// Slot `index` must be live.
    #[inline]
    pub(crate) unsafe fn get_mut(&mut self, index: usize) -> &mut T {
        &mut *self.slot(index).as_ptr()
    }
}
