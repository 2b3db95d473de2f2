//! Fixed-capacity ring buffer over allocator-managed storage.
//!
//! Pushing into a full buffer overwrites the oldest element. How the oldest
//! element is replaced is decided by the buffer's [`ReplacePolicy`].

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Index, IndexMut};
use std::ptr;

use crate::alloc::{slot_layout, Heap, RawStore, SlotAllocator};
use crate::cursor::{Access, Cursor, Exclusive, Iter, IterMut};
use crate::error::RingBufferError;
use crate::index::physical;
use crate::policy::{Reassign, Reconstruct, ReplacePolicy};

/// A circular sequence of at most `capacity` elements.
///
/// Live elements sit in physical slots `(start + i) % capacity` for
/// `i in 0..len`; every other slot is uninitialized.
pub struct RingBuffer<T, A: SlotAllocator = Heap, R = Reconstruct> {
    store: RawStore<T>,
    start: usize,
    len: usize,
    alloc: A,
    _policy: PhantomData<fn() -> R>,
}

// SAFETY: the store is exclusively owned, like a `Box<[T]>`.
unsafe impl<T: Send, A: SlotAllocator + Send, R> Send for RingBuffer<T, A, R> {}
unsafe impl<T: Sync, A: SlotAllocator + Sync, R> Sync for RingBuffer<T, A, R> {}

impl<T> RingBuffer<T> {
    /// Allocates room for `capacity` elements on the heap. Nothing is
    /// constructed until the first push.
    pub fn new(capacity: usize) -> Result<Self, RingBufferError> {
        Self::with_allocator(capacity, Heap)
    }
}

impl<T> RingBuffer<T, Heap, Reassign> {
    /// Like [`RingBuffer::new`], but overwrites the oldest element by
    /// assignment once full.
    pub fn reassigning(capacity: usize) -> Result<Self, RingBufferError> {
        Self::with_allocator(capacity, Heap)
    }
}

impl<T, A: SlotAllocator, R> RingBuffer<T, A, R> {
    pub fn with_allocator(capacity: usize, alloc: A) -> Result<Self, RingBufferError> {
        if capacity == 0 {
            return Err(RingBufferError::ZeroCapacity);
        }
        let store = RawStore::acquire(&alloc, capacity)?;
        Ok(Self {
            store,
            start: 0,
            len: 0,
            alloc,
            _policy: PhantomData,
        })
    }

    /// The empty, zero-capacity state left behind by [`RingBuffer::take`].
    pub(crate) fn unallocated(alloc: A) -> Self {
        Self {
            store: RawStore::empty(),
            start: 0,
            len: 0,
            alloc,
            _policy: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when the next push overwrites the oldest element.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    fn slot_of(&self, offset: usize) -> usize {
        physical(self.start, self.capacity(), offset)
    }

    /// The oldest element.
    pub fn front(&self) -> Result<&T, RingBufferError> {
        self.get(0).ok_or(RingBufferError::Empty)
    }

    pub fn front_mut(&mut self) -> Result<&mut T, RingBufferError> {
        self.get_mut(0).ok_or(RingBufferError::Empty)
    }

    /// The newest element.
    pub fn back(&self) -> Result<&T, RingBufferError> {
        match self.len {
            0 => Err(RingBufferError::Empty),
            len => Ok(&self[len - 1]),
        }
    }

    pub fn back_mut(&mut self) -> Result<&mut T, RingBufferError> {
        match self.len {
            0 => Err(RingBufferError::Empty),
            len => Ok(&mut self[len - 1]),
        }
    }

    /// The element `index` positions after the oldest one.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        // SAFETY: logical offsets below len map to live slots.
        Some(unsafe { self.store.get(self.slot_of(index)) })
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        let slot = self.slot_of(index);
        // SAFETY: as in `get`.
        Some(unsafe { self.store.get_mut(slot) })
    }

    /// Removes and drops the oldest element.
    pub fn pop_front(&mut self) -> Result<(), RingBufferError> {
        if self.is_empty() {
            return Err(RingBufferError::Empty);
        }
        self.evict_oldest();
        Ok(())
    }

    /// Removes the oldest element and hands it to the caller through the
    /// allocator's `take` hook.
    pub fn take_front(&mut self) -> Result<T, RingBufferError> {
        if self.is_empty() {
            return Err(RingBufferError::Empty);
        }
        let slot = self.start;
        self.start = self.slot_of(1);
        self.len -= 1;
        // SAFETY: slot held the oldest live element and is no longer counted.
        Ok(unsafe { self.store.take_at(&self.alloc, slot) })
    }

    /// Drops every element oldest first. `start` and the capacity are kept.
    pub fn clear(&mut self) {
        // A panicking destructor leaks the remaining elements instead of
        // dropping them twice.
        let len = mem::replace(&mut self.len, 0);
        for offset in 0..len {
            let slot = self.slot_of(offset);
            // SAFETY: offsets below the old len were live.
            unsafe { self.store.destroy_at(&self.alloc, slot) };
        }
    }

    /// Moves the contents into a fresh store of `new_capacity` slots.
    ///
    /// When shrinking below the current length the oldest elements are
    /// dropped first. On failure the buffer is left untouched.
    pub fn reallocate(&mut self, new_capacity: usize) -> Result<(), RingBufferError> {
        if new_capacity == 0 {
            return Err(RingBufferError::ZeroCapacity);
        }
        let mut fresh = RawStore::acquire(&self.alloc, new_capacity)?;

        while self.len > new_capacity {
            self.evict_oldest();
        }

        let len = mem::replace(&mut self.len, 0);
        for offset in 0..len {
            let from = self.store.slot(self.slot_of(offset));
            // SAFETY: the source slot is live and the destination is dead;
            // the source is forgotten below by releasing its store.
            unsafe { ptr::copy_nonoverlapping(from.as_ptr(), fresh.slot(offset).as_ptr(), 1) };
        }

        log::debug!(
            "reallocated ring buffer from {} to {new_capacity} slots, kept {len}",
            self.capacity()
        );
        mem::swap(&mut self.store, &mut fresh);
        self.start = 0;
        self.len = len;
        // SAFETY: every element of the old store was moved out above.
        unsafe { fresh.release(&self.alloc) };
        Ok(())
    }

    /// Moves the whole state out, leaving `self` empty with zero capacity.
    pub fn take(&mut self) -> Self {
        let alloc = self.alloc.select_on_copy();
        mem::replace(self, Self::unallocated(alloc))
    }

    /// Move assignment: `self` takes over `other`'s contents and `other` is
    /// left empty with zero capacity. The old contents of `self` are dropped.
    pub fn assign_from(&mut self, other: &mut Self) {
        let mut incoming = other.take();
        self.swap(&mut incoming);
    }

    /// Exchanges the full state of two buffers, allocators included.
    ///
    /// Each store stays paired with the allocator that acquired it. Never
    /// allocates.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// A cursor at the oldest element.
    pub fn begin(&self) -> Cursor<'_, T> {
        self.cursor_at(0)
    }

    /// A cursor one past the newest element.
    pub fn end(&self) -> Cursor<'_, T> {
        self.cursor_at(self.len as isize)
    }

    pub fn begin_mut(&mut self) -> Cursor<'_, T, Exclusive> {
        self.cursor_at(0)
    }

    pub fn end_mut(&mut self) -> Cursor<'_, T, Exclusive> {
        self.cursor_at(self.len as isize)
    }

    /// Exclusive cursors must only be built behind `&mut self`.
    fn cursor_at<M: Access>(&self, pos: isize) -> Cursor<'_, T, M> {
        let buffer = (self as *const Self).cast::<()>();
        Cursor::new(buffer, self.store.as_ptr(), self.start, self.capacity(), self.len, pos)
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.begin(), self.len)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let len = self.len;
        IterMut::new(self.begin_mut(), len)
    }

    /// Constructs `value` in the first free slot.
    pub(crate) fn push_vacant(&mut self, value: T) {
        debug_assert!(self.len < self.capacity());
        let slot = self.slot_of(self.len);
        // SAFETY: slots past the live range are dead.
        unsafe { self.store.construct_at(&self.alloc, slot, value) };
        self.len += 1;
    }

    /// Destroys the oldest element. The slot stops counting as live before
    /// its destructor runs.
    pub(crate) fn evict_oldest(&mut self) {
        debug_assert!(self.len > 0);
        let slot = self.start;
        self.start = self.slot_of(1);
        self.len -= 1;
        // SAFETY: slot held the oldest live element.
        unsafe { self.store.destroy_at(&self.alloc, slot) };
    }

    pub(crate) fn oldest_mut(&mut self) -> &mut T {
        debug_assert!(self.len > 0);
        // SAFETY: start is live whenever len > 0.
        unsafe { self.store.get_mut(self.start) }
    }

    /// Makes the oldest element the newest one without touching any slot.
    pub(crate) fn rotate(&mut self) {
        debug_assert!(self.is_full());
        self.start = self.slot_of(1);
    }

    fn try_clone_in(&self, alloc: A) -> Result<Self, RingBufferError>
    where
        T: Clone,
    {
        let store = match self.capacity() {
            0 => RawStore::empty(),
            capacity => RawStore::acquire(&alloc, capacity)?,
        };
        let mut copy = Self {
            store,
            start: self.start,
            len: 0,
            alloc,
            _policy: PhantomData,
        };
        for item in self.iter() {
            copy.push_vacant(item.clone());
        }
        Ok(copy)
    }

    /// Copies the buffer, reporting allocation failure instead of aborting.
    ///
    /// The copy has the same capacity and physical layout, and uses the
    /// allocator chosen by [`SlotAllocator::select_on_copy`].
    pub fn try_clone(&self) -> Result<Self, RingBufferError>
    where
        T: Clone,
    {
        self.try_clone_in(self.alloc.select_on_copy())
    }
}

impl<T, A: SlotAllocator, R: ReplacePolicy> RingBuffer<T, A, R> {
    /// Appends `value` as the newest element, overwriting the oldest one if
    /// the buffer is full.
    pub fn push_back(&mut self, value: T) {
        if self.capacity() == 0 {
            return;
        }
        if self.is_full() {
            R::replace_oldest(self, value);
        } else {
            self.push_vacant(value);
        }
    }

    /// Appends a copy of `source`. A full buffer with the [`Reassign`] policy
    /// reuses the oldest element through [`Clone::clone_from`].
    pub fn push_back_cloned(&mut self, source: &T)
    where
        T: Clone,
    {
        if self.capacity() == 0 {
            return;
        }
        if self.is_full() {
            R::replace_oldest_cloned(self, source);
        } else {
            self.push_vacant(source.clone());
        }
    }

    /// Appends an element built from `args`.
    pub fn emplace_back<Args>(&mut self, args: Args)
    where
        T: From<Args>,
    {
        self.emplace_back_with(|| T::from(args));
    }

    pub fn emplace_back_with<F>(&mut self, make: F)
    where
        F: FnOnce() -> T,
    {
        match self.try_emplace_back_with(|| Ok::<T, Infallible>(make())) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Appends the element produced by `make`, if it produces one.
    ///
    /// With the [`Reconstruct`] policy a full buffer drops its oldest element
    /// before `make` runs, so a failure leaves one element fewer than before.
    /// With [`Reassign`] a failure leaves the buffer unchanged.
    pub fn try_emplace_back_with<E, F>(&mut self, make: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if self.capacity() == 0 {
            make()?;
            return Ok(());
        }
        if self.is_full() {
            R::try_replace_oldest_with(self, make)
        } else {
            self.push_vacant(make()?);
            Ok(())
        }
    }
}

impl<T, A: SlotAllocator, R> Drop for RingBuffer<T, A, R> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: clear left no live slots.
        unsafe { self.store.release(&self.alloc) };
    }
}

fn allocation_failure<T>(err: RingBufferError) -> ! {
    match err {
        RingBufferError::Alloc { capacity } => match slot_layout::<T>(capacity) {
            Ok(layout) => std::alloc::handle_alloc_error(layout),
            Err(err) => panic!("{err}"),
        },
        err => panic!("{err}"),
    }
}

impl<T: Clone, A: SlotAllocator, R> Clone for RingBuffer<T, A, R> {
    fn clone(&self) -> Self {
        self.try_clone().unwrap_or_else(|err| allocation_failure::<T>(err))
    }

    /// Copy assignment: builds the copy first, so `self` is untouched if
    /// cloning an element panics. `self` keeps its own allocator lineage.
    fn clone_from(&mut self, source: &Self) {
        let mut copy = source
            .try_clone_in(self.alloc.select_on_copy())
            .unwrap_or_else(|err| allocation_failure::<T>(err));
        self.swap(&mut copy);
    }
}

impl<T, A: SlotAllocator + Default, R> Default for RingBuffer<T, A, R> {
    fn default() -> Self {
        Self::unallocated(A::default())
    }
}

impl<T, A: SlotAllocator, R> Index<usize> for RingBuffer<T, A, R> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        let len = self.len;
        self.get(index)
            .unwrap_or_else(|| panic!("index {index} out of range for ring buffer of length {len}"))
    }
}

impl<T, A: SlotAllocator, R> IndexMut<usize> for RingBuffer<T, A, R> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        self.get_mut(index)
            .unwrap_or_else(|| panic!("index {index} out of range for ring buffer of length {len}"))
    }
}

impl<T: fmt::Debug, A: SlotAllocator, R> fmt::Debug for RingBuffer<T, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U, A, B, R, S> PartialEq<RingBuffer<U, B, S>> for RingBuffer<T, A, R>
where
    T: PartialEq<U>,
    A: SlotAllocator,
    B: SlotAllocator,
{
    fn eq(&self, other: &RingBuffer<U, B, S>) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq, A: SlotAllocator, R> Eq for RingBuffer<T, A, R> {}

impl<T, U, A: SlotAllocator, R> PartialEq<[U]> for RingBuffer<T, A, R>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.len == other.len() && self.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl<T, U, A: SlotAllocator, R> PartialEq<&[U]> for RingBuffer<T, A, R>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &&[U]) -> bool {
        *self == **other
    }
}

impl<T, U, A: SlotAllocator, R, const N: usize> PartialEq<[U; N]> for RingBuffer<T, A, R>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        *self == other[..]
    }
}

impl<T, U, A: SlotAllocator, R> PartialEq<Vec<U>> for RingBuffer<T, A, R>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &Vec<U>) -> bool {
        *self == other[..]
    }
}

impl<T, A: SlotAllocator, R: ReplacePolicy> Extend<T> for RingBuffer<T, A, R> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<'a, T: Clone + 'a, A: SlotAllocator, R: ReplacePolicy> Extend<&'a T> for RingBuffer<T, A, R> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back_cloned(item);
        }
    }
}

impl<'a, T, A: SlotAllocator, R> IntoIterator for &'a RingBuffer<T, A, R> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A: SlotAllocator, R> IntoIterator for &'a mut RingBuffer<T, A, R> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, A: SlotAllocator, R> IntoIterator for RingBuffer<T, A, R> {
    type Item = T;
    type IntoIter = IntoIter<T, A, R>;

    fn into_iter(self) -> IntoIter<T, A, R> {
        IntoIter { buffer: self }
    }
}

/// Owning iterator, oldest to newest. Elements not yielded are dropped with
/// the iterator.
pub struct IntoIter<T, A: SlotAllocator = Heap, R = Reconstruct> {
    buffer: RingBuffer<T, A, R>,
}

impl<T, A: SlotAllocator, R> Iterator for IntoIter<T, A, R> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.buffer.take_front().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.buffer.len(), Some(self.buffer.len()))
    }
}

impl<T, A: SlotAllocator, R> ExactSizeIterator for IntoIter<T, A, R> {}

impl<T: fmt::Debug, A: SlotAllocator, R> fmt::Debug for IntoIter<T, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.buffer).finish()
    }
}
