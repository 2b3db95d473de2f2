//! Random-access cursors and iterators over a ring buffer.
//!
//! A cursor stores a logical position counted from the oldest element. The
//! position moves with plain integer arithmetic and is only mapped to a
//! physical slot when the cursor is dereferenced. Cursors borrow their buffer,
//! so any operation that would move `start`, change the length or swap the
//! store cannot run while a cursor is alive.

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Deref, DerefMut, Index, IndexMut, Sub, SubAssign};
use std::ptr;

use crate::index::physical;

mod private {
    pub trait Sealed {}
}

/// Element access mode of a [`Cursor`].
pub trait Access: private::Sealed {}

/// Read-only access. Shared cursors are `Copy`.
#[derive(Debug)]
pub enum Shared {}

/// Read-write access. Exclusive cursors cannot be duplicated.
#[derive(Debug)]
pub enum Exclusive {}

impl private::Sealed for Shared {}
impl private::Sealed for Exclusive {}
impl Access for Shared {}
impl Access for Exclusive {}

pub struct Cursor<'a, T, M: Access = Shared> {
    buffer: *const (),
    data: *mut T,
    start: usize,
    capacity: usize,
    len: usize,
    pos: isize,
    _marker: PhantomData<(&'a mut T, fn() -> M)>,
}

impl<'a, T, M: Access> Cursor<'a, T, M> {
    /// `buffer` identifies the owning buffer. Stores of zero-sized elements
    /// and unallocated stores all share one dangling `data` pointer.
    pub(crate) fn new(
        buffer: *const (),
        data: *mut T,
        start: usize,
        capacity: usize,
        len: usize,
        pos: isize,
    ) -> Self {
        Self {
            buffer,
            data,
            start,
            capacity,
            len,
            pos,
            _marker: PhantomData,
        }
    }

    /// Logical position; 0 is the oldest element.
    pub fn position(&self) -> isize {
        self.pos
    }

    /// True if the cursor points at a live element.
    pub fn is_dereferenceable(&self) -> bool {
        self.slot_ptr(0).is_some()
    }

    fn slot_ptr(&self, offset: isize) -> Option<*mut T> {
        let pos = self.pos.checked_add(offset)?;
        if self.data.is_null() || pos < 0 || pos as usize >= self.len {
            return None;
        }
        let slot = physical(self.start, self.capacity, pos as usize);
        // SAFETY: slot is below the capacity of the block behind data.
        Some(unsafe { self.data.add(slot) })
    }

    pub fn get(&self) -> Option<&T> {
        // SAFETY: slot_ptr only yields live slots of the borrowed buffer.
        self.slot_ptr(0).map(|ptr| unsafe { &*ptr })
    }

    fn at(&self, offset: isize) -> *mut T {
        match self.slot_ptr(offset) {
            Some(ptr) => ptr,
            None => panic!(
                "cursor position {} is outside the live range 0..{}",
                self.pos.saturating_add(offset),
                self.len
            ),
        }
    }
}

impl<'a, T> Cursor<'a, T, Shared> {
    /// The element under the cursor, for the full lifetime of the borrow.
    pub fn into_ref(self) -> Option<&'a T> {
        // SAFETY: shared cursors only hand out shared references.
        self.slot_ptr(0).map(|ptr| unsafe { &*ptr })
    }
}

impl<'a, T> Cursor<'a, T, Exclusive> {
    pub fn get_mut(&mut self) -> Option<&mut T> {
        // SAFETY: the exclusive cursor is the only access path to the buffer.
        self.slot_ptr(0).map(|ptr| unsafe { &mut *ptr })
    }

    pub fn into_mut(self) -> Option<&'a mut T> {
        // SAFETY: as in `get_mut`; the cursor is consumed.
        self.slot_ptr(0).map(|ptr| unsafe { &mut *ptr })
    }
}

impl<'a, T, M: Access> Default for Cursor<'a, T, M> {
    /// The null cursor. All null cursors compare equal.
    fn default() -> Self {
        Self::new(ptr::null(), ptr::null_mut(), 0, 0, 0, 0)
    }
}

impl<'a, T> Clone for Cursor<'a, T, Shared> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Cursor<'a, T, Shared> {}

impl<'a, T, M: Access> fmt::Debug for Cursor<'a, T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("buffer", &self.buffer)
            .field("pos", &self.pos)
            .field("len", &self.len)
            .finish()
    }
}

impl<'a, T, M: Access> PartialEq for Cursor<'a, T, M> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.buffer, other.buffer) && self.pos == other.pos
    }
}

impl<'a, T, M: Access> Eq for Cursor<'a, T, M> {}

impl<'a, T, M: Access> PartialOrd for Cursor<'a, T, M> {
    /// Cursors into different buffers are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if !ptr::eq(self.buffer, other.buffer) {
            return None;
        }
        Some(self.pos.cmp(&other.pos))
    }
}

impl<'a, T, M: Access> Deref for Cursor<'a, T, M> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: `at` only yields live slots.
        unsafe { &*self.at(0) }
    }
}

impl<'a, T> DerefMut for Cursor<'a, T, Exclusive> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: `at` only yields live slots; the cursor is borrowed mutably.
        unsafe { &mut *self.at(0) }
    }
}

impl<'a, T, M: Access> Index<isize> for Cursor<'a, T, M> {
    type Output = T;

    fn index(&self, offset: isize) -> &T {
        // SAFETY: as in `deref`.
        unsafe { &*self.at(offset) }
    }
}

impl<'a, T> IndexMut<isize> for Cursor<'a, T, Exclusive> {
    fn index_mut(&mut self, offset: isize) -> &mut T {
        // SAFETY: as in `deref_mut`.
        unsafe { &mut *self.at(offset) }
    }
}

impl<'a, T, M: Access> AddAssign<isize> for Cursor<'a, T, M> {
    fn add_assign(&mut self, n: isize) {
        self.pos += n;
    }
}

impl<'a, T, M: Access> SubAssign<isize> for Cursor<'a, T, M> {
    fn sub_assign(&mut self, n: isize) {
        self.pos -= n;
    }
}

impl<'a, T, M: Access> Add<isize> for Cursor<'a, T, M> {
    type Output = Self;

    fn add(mut self, n: isize) -> Self {
        self += n;
        self
    }
}

impl<'a, T, M: Access> Add<Cursor<'a, T, M>> for isize {
    type Output = Cursor<'a, T, M>;

    fn add(self, cursor: Cursor<'a, T, M>) -> Cursor<'a, T, M> {
        cursor + self
    }
}

impl<'a, T, M: Access> Sub<isize> for Cursor<'a, T, M> {
    type Output = Self;

    fn sub(mut self, n: isize) -> Self {
        self -= n;
        self
    }
}

impl<'a, 'b, T, M: Access> Sub<&'b Cursor<'a, T, M>> for &'b Cursor<'a, T, M> {
    type Output = isize;

    /// Signed distance in logical positions.
    fn sub(self, other: &'b Cursor<'a, T, M>) -> isize {
        debug_assert!(ptr::eq(self.buffer, other.buffer), "cursors into different buffers");
        self.pos - other.pos
    }
}

/// Shared iterator, oldest to newest.
pub struct Iter<'a, T> {
    cursor: Cursor<'a, T, Shared>,
    end: isize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(begin: Cursor<'a, T, Shared>, len: usize) -> Self {
        Self {
            cursor: begin,
            end: len as isize,
        }
    }
}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Self {
            cursor: self.cursor,
            end: self.end,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.cursor.pos >= self.end {
            return None;
        }
        let item = self.cursor.into_ref();
        self.cursor += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len();
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        let skip = n.min(self.len()) as isize;
        self.cursor += skip;
        self.next()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.cursor.pos >= self.end {
            return None;
        }
        self.end -= 1;
        (self.cursor + (self.end - self.cursor.pos)).into_ref()
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {
    fn len(&self) -> usize {
        (self.end - self.cursor.pos).max(0) as usize
    }
}

impl<'a, T> FusedIterator for Iter<'a, T> {}

impl<'a, T: fmt::Debug> fmt::Debug for Iter<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Mutable iterator, oldest to newest.
pub struct IterMut<'a, T> {
    cursor: Cursor<'a, T, Exclusive>,
    end: isize,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(begin: Cursor<'a, T, Exclusive>, len: usize) -> Self {
        Self {
            cursor: begin,
            end: len as isize,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.cursor.pos >= self.end {
            return None;
        }
        let ptr = self.cursor.slot_ptr(0)?;
        self.cursor += 1;
        // SAFETY: every position is yielded at most once, so the returned
        // references never alias.
        Some(unsafe { &mut *ptr })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len();
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<&'a mut T> {
        let skip = n.min(self.len()) as isize;
        self.cursor += skip;
        self.next()
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.cursor.pos >= self.end {
            return None;
        }
        self.end -= 1;
        let ptr = self.cursor.slot_ptr(self.end - self.cursor.pos)?;
        // SAFETY: as in `next`.
        Some(unsafe { &mut *ptr })
    }
}

impl<'a, T> ExactSizeIterator for IterMut<'a, T> {
    fn len(&self) -> usize {
        (self.end - self.cursor.pos).max(0) as usize
    }
}

impl<'a, T> FusedIterator for IterMut<'a, T> {}

impl<'a, T> fmt::Debug for IterMut<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("pos", &self.cursor.pos)
            .field("end", &self.end)
            .finish()
    }
}
