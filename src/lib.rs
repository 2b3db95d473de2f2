//! A fixed-capacity ring buffer that overwrites its oldest element when full,
//! plus the `ringtail` command built on it.
//!
//! ```
//! use ringtail::RingBuffer;
//!
//! let mut buf = RingBuffer::new(3)?;
//! buf.extend([1, 2, 3, 4]);
//! assert_eq!(buf, [2, 3, 4]);
//! assert_eq!(buf.front(), Ok(&2));
//! # Ok::<(), ringtail::RingBufferError>(())
//! ```

pub mod alloc;
pub mod cli;
pub mod config;
pub mod cursor;
pub mod error;
pub mod index;
pub mod log;
pub mod policy;
pub mod ringbuffer;

pub use crate::alloc::{Heap, SlotAllocator};
pub use crate::cursor::{Cursor, Exclusive, Iter, IterMut, Shared};
pub use crate::error::RingBufferError;
pub use crate::policy::{Reassign, Reconstruct, ReplacePolicy};
pub use crate::ringbuffer::{IntoIter, RingBuffer};
