//! Byte FIFO primitives for no-std embedded targets.
//!
//! # Highlights
//! - Lock-free SPSC byte ring over one contiguous power-of-two buffer.
//! - Raw transfers never block: they move what fits and report the count.
//! - Optional length-prefixed record framing on the same ring.
//! - Caller-provided storage, or a single allocation with the `alloc` feature.
//!
//! # Quick start
//! ```
//! use ph_fifo::{ByteRing, PrefixWidth};
//!
//! let mut storage = [0u8; 64];
//! let mut ring = ByteRing::new(&mut storage).unwrap();
//!
//! assert_eq!(ring.enqueue(&[4, 2, 3, 1]), 4);
//! let mut out = [0u8; 4];
//! assert_eq!(ring.dequeue(&mut out), 4);
//! assert_eq!(out, [4, 2, 3, 1]);
//!
//! ring.enqueue_record(b"ping", PrefixWidth::U8).unwrap();
//! let len = ring.peek_record_len(PrefixWidth::U8).unwrap();
//! let mut record = [0u8; 16];
//! ring.dequeue_record(&mut record[..len], PrefixWidth::U8).unwrap();
//! assert_eq!(&record[..len], b"ping");
//! ```
//!
//! # No-std
//! The crate is `#![no_std]`. The default `alloc` feature adds
//! [`ByteRing::with_capacity`] and [`ByteRing::alloc`]. Tests require `std`.
//!
//! # Safety and concurrency
//! This crate is SPSC by design. [`ByteRing::split`] borrows the ring mutably and
//! returns exactly one [`Producer`] and one [`Consumer`], which may live on different
//! threads. More than one writer or reader needs external locking around the handles.
//!
//! # Semantics
//! - Capacity is a power of two; positions are masked, never divided.
//! - Cursors are free-running `u32` counters and may wrap.
//! - `enqueue`/`dequeue`/`peek`/`skip` clamp silently to free space or stored bytes.
//! - Record operations are all-or-nothing and report a [`RecordError`] instead.
//!
//! # Features
//! - `alloc` (default): owned storage.
//! - `tracing`: internal diagnostics through the `tracing` crate.
//! - `portable-atomic*`: cursor atomics from `portable-atomic` for targets without
//!   native 32-bit atomics.
#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod error;
pub mod record;
pub mod ring;
mod trace;

pub use error::{CapacityError, RecordError};
pub use record::PrefixWidth;
pub use ring::{ByteRing, Consumer, MAX_CAPACITY, Producer};

#[cfg(test)]
extern crate std;
