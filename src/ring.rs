//! Lock-free SPSC byte ring over a single contiguous buffer.
//!
//! # Overview
//! - Fixed power-of-two capacity; slot for logical offset `k` is `k & (capacity - 1)`.
//! - Two free-running `u32` cursors: `write` counts bytes ever enqueued, `read` counts
//!   bytes ever dequeued. Occupancy is `write - read` in wrapping arithmetic, so the
//!   cursors may overflow freely.
//! - Raw transfers never block and never fail: they move as many bytes as fit and
//!   return the count.
//! - Storage is either borrowed from the caller (never freed here) or allocated by the
//!   ring itself (released on [`ByteRing::free`] or drop).
//!
//! # Memory ordering
//! The producer copies bytes into free space, then publishes the new `write` cursor
//! with `Release`. The consumer loads `write` with `Acquire` before copying out, then
//! publishes `read` with `Release`; the producer loads `read` with `Acquire` before
//! reusing that space. Each side loads its own cursor `Relaxed`.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

#[cfg(not(feature = "portable-atomic"))]
use core::sync::atomic::{AtomicU32, Ordering};
#[cfg(feature = "portable-atomic")]
use portable_atomic::{AtomicU32, Ordering};

use crossbeam_utils::CachePadded;

use crate::error::{CapacityError, RecordError};
use crate::record::PrefixWidth;
use crate::trace::{debug, trace};
#[cfg(feature = "alloc")]
use crate::trace::warn;

/// Largest supported capacity: a power of two that keeps occupancy representable in
/// the `u32` cursors and a buffer size within `isize::MAX`.
pub const MAX_CAPACITY: usize = {
    // Largest power of two not above `isize::MAX`.
    let isize_limit = ((isize::MAX as usize) >> 1) + 1;
    let cursor_limit = 1u64 << 31;
    if (isize_limit as u64) < cursor_limit {
        isize_limit
    } else {
        cursor_limit as usize
    }
};

fn check_capacity(capacity: usize) -> Result<u32, CapacityError> {
    if capacity > MAX_CAPACITY {
        return Err(CapacityError::CapacityTooLarge {
            capacity,
            max: MAX_CAPACITY,
        });
    }
    if !capacity.is_power_of_two() {
        return Err(CapacityError::InvalidCapacity { capacity });
    }
    Ok(capacity as u32)
}

/// Fixed-capacity byte FIFO for one producer and one consumer.
///
/// Methods taking `&mut self` are the single-threaded API. Use [`ByteRing::split`] to
/// hand the two roles to different threads.
pub struct ByteRing<'a> {
    buf: NonNull<u8>,
    size: u32,
    owned: bool,
    write: CachePadded<AtomicU32>,
    read: CachePadded<AtomicU32>,
    _storage: PhantomData<&'a mut [u8]>,
}

// SAFETY: the ring exclusively owns (or exclusively borrows) its storage.
unsafe impl Send for ByteRing<'_> {}
// SAFETY: every `&self` method is a read-only cursor query. Storage is only touched
// through the `unsafe` role methods, whose callers are the unique Producer/Consumer.
unsafe impl Sync for ByteRing<'_> {}

impl<'a> ByteRing<'a> {
    /// A ring with no storage. Every transfer on it is a no-op.
    pub const fn empty() -> Self {
        Self {
            buf: NonNull::dangling(),
            size: 0,
            owned: false,
            write: CachePadded::new(AtomicU32::new(0)),
            read: CachePadded::new(AtomicU32::new(0)),
            _storage: PhantomData,
        }
    }

    /// Attach caller-provided storage. Its length is the capacity and must be a
    /// non-zero power of two.
    ///
    /// The ring never frees attached storage; the borrow ends when the ring is dropped.
    pub fn new(storage: &'a mut [u8]) -> Result<Self, CapacityError> {
        let size = check_capacity(storage.len())?;
        debug!(capacity = size, "attached ring storage");
        Ok(Self {
            buf: NonNull::from(storage).cast(),
            size,
            owned: false,
            write: CachePadded::new(AtomicU32::new(0)),
            read: CachePadded::new(AtomicU32::new(0)),
            _storage: PhantomData,
        })
    }

    /// Whether backing storage is attached.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.size != 0
    }

    /// Capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.size as usize
    }

    /// Number of stored, unread bytes.
    #[inline]
    pub fn len(&self) -> usize {
        // `read` first: it can only move towards `write`, never past it.
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        write.wrapping_sub(read) as usize
    }

    /// Free space in bytes.
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Drop all contents and rewind both cursors to zero.
    pub fn reset(&mut self) {
        *self.write.get_mut() = 0;
        *self.read.get_mut() = 0;
    }

    /// Drop unread contents only; the write cursor is kept.
    pub fn reset_read(&mut self) {
        // SAFETY: `&mut self` excludes any Consumer handle.
        unsafe { self.drain() }
    }

    /// Copy as much of `src` as fits. Returns the number of bytes stored.
    pub fn enqueue(&mut self, src: &[u8]) -> usize {
        // SAFETY: `&mut self` excludes any Producer handle.
        unsafe { self.push_bytes(src) }
    }

    /// Move up to `dst.len()` bytes out. Returns the number of bytes copied.
    pub fn dequeue(&mut self, dst: &mut [u8]) -> usize {
        // SAFETY: `&mut self` excludes any Consumer handle.
        unsafe { self.pop_bytes(dst) }
    }

    /// Copy up to `dst.len()` bytes starting `offset` bytes past the read cursor,
    /// without consuming them.
    pub fn peek(&mut self, dst: &mut [u8], offset: usize) -> usize {
        // SAFETY: `&mut self` excludes any Consumer handle.
        unsafe { self.peek_bytes(dst, offset) }
    }

    /// Discard up to `len` bytes. Returns the number discarded.
    pub fn skip(&mut self, len: usize) -> usize {
        // SAFETY: `&mut self` excludes any Consumer handle.
        unsafe { self.skip_bytes(len) }
    }

    /// Store `payload` behind a length prefix, or nothing at all.
    pub fn enqueue_record(
        &mut self,
        payload: &[u8],
        width: PrefixWidth,
    ) -> Result<(), RecordError> {
        // SAFETY: `&mut self` excludes any Producer handle.
        unsafe { self.push_record(payload, width) }
    }

    /// Length stored in the next record's prefix. See [`Consumer::peek_record_len`].
    pub fn peek_record_len(&mut self, width: PrefixWidth) -> Option<usize> {
        // SAFETY: `&mut self` excludes any Consumer handle.
        unsafe { self.peek_record_len_inner(width) }
    }

    /// Consume a prefix plus exactly `dst.len()` payload bytes. See
    /// [`Consumer::dequeue_record`].
    pub fn dequeue_record(
        &mut self,
        dst: &mut [u8],
        width: PrefixWidth,
    ) -> Result<usize, RecordError> {
        // SAFETY: `&mut self` excludes any Consumer handle.
        unsafe { self.pop_record(dst, width) }
    }

    /// Consume the next record, sized from its own prefix.
    pub fn read_record(
        &mut self,
        dst: &mut [u8],
        width: PrefixWidth,
    ) -> Result<usize, RecordError> {
        // SAFETY: `&mut self` excludes any Consumer handle.
        unsafe { self.read_record_inner(dst, width) }
    }

    /// Drop the next record without copying it out.
    pub fn skip_record(&mut self, width: PrefixWidth) -> Result<usize, RecordError> {
        // SAFETY: `&mut self` excludes any Consumer handle.
        unsafe { self.skip_record_inner(width) }
    }

    /// Split into the producer and consumer roles.
    ///
    /// Both handles borrow the ring, so no other access is possible while they live.
    #[inline]
    pub fn split(&mut self) -> (Producer<'_>, Consumer<'_>) {
        let ring: &ByteRing<'_> = self;
        (Producer { ring }, Consumer { ring })
    }

    /// Release owned storage (or detach borrowed storage) and return to the
    /// zero-capacity state.
    pub fn free(&mut self) {
        self.release_owned();
        if self.is_initialized() {
            debug!(capacity = self.size, owned = self.owned, "released ring storage");
        }
        self.buf = NonNull::dangling();
        self.size = 0;
        self.owned = false;
        self.reset();
    }

    #[inline]
    fn offset(&self, pos: u32) -> usize {
        (pos & self.size.wrapping_sub(1)) as usize
    }

    /// Copy `src` into storage starting at logical position `pos`, wrapping once.
    ///
    /// # Safety
    /// Caller is the sole producer and `[pos, pos + src.len())` is free space.
    unsafe fn copy_in(&self, pos: u32, src: &[u8]) {
        if src.is_empty() {
            return;
        }
        let off = self.offset(pos);
        let first = src.len().min(self.size as usize - off);
        let base = self.buf.as_ptr();
        // SAFETY: `off + first <= size` and `src.len() - first <= off`, both in bounds;
        // the source is a caller slice, never the ring storage.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), base.add(off), first);
            ptr::copy_nonoverlapping(src.as_ptr().add(first), base, src.len() - first);
        }
    }

    /// Copy storage starting at logical position `pos` into `dst`, wrapping once.
    ///
    /// # Safety
    /// Caller is the sole consumer and `[pos, pos + dst.len())` is published data.
    unsafe fn copy_out(&self, pos: u32, dst: &mut [u8]) {
        if dst.is_empty() {
            return;
        }
        let off = self.offset(pos);
        let first = dst.len().min(self.size as usize - off);
        let base = self.buf.as_ptr();
        // SAFETY: same bounds as `copy_in`.
        unsafe {
            ptr::copy_nonoverlapping(base.add(off), dst.as_mut_ptr(), first);
            ptr::copy_nonoverlapping(base, dst.as_mut_ptr().add(first), dst.len() - first);
        }
    }

    /// Producer view: (own write cursor, free bytes).
    #[inline]
    fn producer_view(&self) -> (u32, usize) {
        let write = self.write.load(Ordering::Relaxed);
        let read = self.read.load(Ordering::Acquire);
        (write, (self.size - write.wrapping_sub(read)) as usize)
    }

    /// Consumer view: (own read cursor, stored bytes).
    #[inline]
    fn consumer_view(&self) -> (u32, usize) {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Acquire);
        (read, write.wrapping_sub(read) as usize)
    }

    /// # Safety
    /// Caller is the sole producer.
    unsafe fn push_bytes(&self, src: &[u8]) -> usize {
        let (write, free) = self.producer_view();
        let n = src.len().min(free);
        // SAFETY: `n <= free`, so the target range is unpublished space.
        unsafe { self.copy_in(write, &src[..n]) };
        self.write.store(write.wrapping_add(n as u32), Ordering::Release);
        n
    }

    /// # Safety
    /// Caller is the sole producer.
    unsafe fn push_record(
        &self,
        payload: &[u8],
        width: PrefixWidth,
    ) -> Result<(), RecordError> {
        let len = payload.len();
        if len > width.max_len() {
            trace!(len, "record too long for prefix");
            return Err(RecordError::TooLong {
                len,
                max: width.max_len(),
            });
        }
        let (write, free) = self.producer_view();
        let prefix_len = width.bytes();
        let needed = len + prefix_len;
        if needed > free {
            trace!(needed, free, "record rejected");
            return Err(RecordError::WouldNotFit {
                needed,
                available: free,
            });
        }
        let prefix = width.encode(len);
        // SAFETY: `needed <= free`, so prefix and payload land in unpublished space.
        unsafe {
            self.copy_in(write, &prefix[..prefix_len]);
            self.copy_in(write.wrapping_add(prefix_len as u32), payload);
        }
        self.write
            .store(write.wrapping_add(needed as u32), Ordering::Release);
        Ok(())
    }

    /// # Safety
    /// Caller is the sole consumer.
    unsafe fn pop_bytes(&self, dst: &mut [u8]) -> usize {
        let (read, stored) = self.consumer_view();
        let n = dst.len().min(stored);
        // SAFETY: `n <= stored`, so the source range is published data.
        unsafe { self.copy_out(read, &mut dst[..n]) };
        self.read.store(read.wrapping_add(n as u32), Ordering::Release);
        n
    }

    /// # Safety
    /// Caller is the sole consumer.
    unsafe fn peek_bytes(&self, dst: &mut [u8], offset: usize) -> usize {
        let (read, stored) = self.consumer_view();
        if offset >= stored {
            return 0;
        }
        let n = dst.len().min(stored - offset);
        // SAFETY: `offset + n <= stored`.
        unsafe { self.copy_out(read.wrapping_add(offset as u32), &mut dst[..n]) };
        n
    }

    /// # Safety
    /// Caller is the sole consumer.
    unsafe fn skip_bytes(&self, len: usize) -> usize {
        let (read, stored) = self.consumer_view();
        let n = len.min(stored);
        self.read.store(read.wrapping_add(n as u32), Ordering::Release);
        n
    }

    /// # Safety
    /// Caller is the sole consumer.
    unsafe fn drain(&self) {
        let write = self.write.load(Ordering::Acquire);
        self.read.store(write, Ordering::Release);
    }

    /// # Safety
    /// Caller is the sole consumer.
    unsafe fn peek_record_len_inner(&self, width: PrefixWidth) -> Option<usize> {
        if width == PrefixWidth::None {
            return Some(self.available());
        }
        let (read, stored) = self.consumer_view();
        let prefix_len = width.bytes();
        if stored < prefix_len {
            return None;
        }
        let mut prefix = [0u8; 2];
        // SAFETY: `prefix_len <= stored`.
        unsafe { self.copy_out(read, &mut prefix[..prefix_len]) };
        Some(width.decode(prefix))
    }

    /// # Safety
    /// Caller is the sole consumer.
    unsafe fn pop_record(
        &self,
        dst: &mut [u8],
        width: PrefixWidth,
    ) -> Result<usize, RecordError> {
        let (read, stored) = self.consumer_view();
        let prefix_len = width.bytes();
        let needed = dst.len() + prefix_len;
        if stored < needed {
            trace!(needed, stored, "record read short");
            return Err(RecordError::Underrun {
                needed,
                occupied: stored,
            });
        }
        // SAFETY: `needed <= stored`.
        unsafe { self.copy_out(read.wrapping_add(prefix_len as u32), dst) };
        self.read
            .store(read.wrapping_add(needed as u32), Ordering::Release);
        Ok(dst.len())
    }

    /// # Safety
    /// Caller is the sole consumer.
    unsafe fn read_record_inner(
        &self,
        dst: &mut [u8],
        width: PrefixWidth,
    ) -> Result<usize, RecordError> {
        // SAFETY: forwarded consumer role.
        let len = unsafe { self.next_record_len(width)? };
        if len > dst.len() {
            return Err(RecordError::BufferTooSmall {
                needed: len,
                got: dst.len(),
            });
        }
        // SAFETY: forwarded consumer role.
        unsafe { self.pop_record(&mut dst[..len], width) }
    }

    /// # Safety
    /// Caller is the sole consumer.
    unsafe fn skip_record_inner(
        &self,
        width: PrefixWidth,
    ) -> Result<usize, RecordError> {
        // SAFETY: forwarded consumer role.
        let len = unsafe { self.next_record_len(width)? };
        let (read, stored) = self.consumer_view();
        let needed = len + width.bytes();
        if stored < needed {
            return Err(RecordError::Underrun {
                needed,
                occupied: stored,
            });
        }
        self.read
            .store(read.wrapping_add(needed as u32), Ordering::Release);
        Ok(len)
    }

    /// Stored length of the next framed record. Unframed data has no stored length,
    /// so `PrefixWidth::None` means "everything currently stored".
    ///
    /// # Safety
    /// Caller is the sole consumer.
    unsafe fn next_record_len(&self, width: PrefixWidth) -> Result<usize, RecordError> {
        if width == PrefixWidth::None {
            return Ok(self.len());
        }
        // SAFETY: forwarded consumer role.
        unsafe { self.peek_record_len_inner(width) }.ok_or(RecordError::Underrun {
            needed: width.bytes(),
            occupied: self.len(),
        })
    }
}

#[cfg(feature = "alloc")]
impl ByteRing<'static> {
    /// Allocate a zeroed ring. `capacity` is rounded up to the next power of two.
    pub fn with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        let mut ring = Self::empty();
        ring.alloc(capacity)?;
        Ok(ring)
    }
}

#[cfg(feature = "alloc")]
impl ByteRing<'_> {
    fn release_owned(&mut self) {
        if self.owned {
            // SAFETY: owned storage was allocated in `alloc` with exactly this layout.
            unsafe {
                let layout = alloc::alloc::Layout::from_size_align_unchecked(self.size as usize, 1);
                alloc::alloc::dealloc(self.buf.as_ptr(), layout);
            }
        }
    }

    /// Replace the current storage with a freshly allocated buffer of at least
    /// `capacity` bytes (rounded up to a power of two).
    ///
    /// On failure the ring is left empty with zero capacity.
    pub fn alloc(&mut self, capacity: usize) -> Result<(), CapacityError> {
        self.free();
        if capacity == 0 {
            return Err(CapacityError::InvalidCapacity { capacity });
        }
        if capacity > MAX_CAPACITY {
            return Err(CapacityError::CapacityTooLarge {
                capacity,
                max: MAX_CAPACITY,
            });
        }
        let size = capacity.next_power_of_two() as u32;
        let layout = alloc::alloc::Layout::from_size_align(size as usize, 1).map_err(|_| {
            CapacityError::CapacityTooLarge {
                capacity,
                max: MAX_CAPACITY,
            }
        })?;
        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc::alloc_zeroed(layout) };
        let Some(buf) = NonNull::new(raw) else {
            warn!(capacity = size, "ring allocation failed");
            return Err(CapacityError::AllocFailed {
                capacity: size as usize,
            });
        };
        debug!(requested = capacity, capacity = size, "allocated ring storage");
        self.buf = buf;
        self.size = size;
        self.owned = true;
        Ok(())
    }
}

#[cfg(not(feature = "alloc"))]
impl ByteRing<'_> {
    #[inline]
    fn release_owned(&mut self) {}
}

impl Default for ByteRing<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for ByteRing<'_> {
    fn drop(&mut self) {
        self.free();
    }
}

impl fmt::Debug for ByteRing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteRing")
            .field("capacity", &self.size)
            .field("owned", &self.owned)
            .field("write", &self.write.load(Ordering::Relaxed))
            .field("read", &self.read.load(Ordering::Relaxed))
            .finish()
    }
}

/// Producer role of a split [`ByteRing`].
pub struct Producer<'r> {
    ring: &'r ByteRing<'r>,
}

impl Producer<'_> {
    /// Copy as much of `src` as fits. Returns the number of bytes stored.
    #[inline]
    pub fn enqueue(&mut self, src: &[u8]) -> usize {
        // SAFETY: `split` hands out exactly one Producer.
        unsafe { self.ring.push_bytes(src) }
    }

    /// Store `payload` behind a length prefix, or nothing at all.
    #[inline]
    pub fn enqueue_record(
        &mut self,
        payload: &[u8],
        width: PrefixWidth,
    ) -> Result<(), RecordError> {
        // SAFETY: `split` hands out exactly one Producer.
        unsafe { self.ring.push_record(payload, width) }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.ring.available()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }
}

/// Consumer role of a split [`ByteRing`].
pub struct Consumer<'r> {
    ring: &'r ByteRing<'r>,
}

impl Consumer<'_> {
    /// Move up to `dst.len()` bytes out. Returns the number of bytes copied.
    #[inline]
    pub fn dequeue(&mut self, dst: &mut [u8]) -> usize {
        // SAFETY: `split` hands out exactly one Consumer.
        unsafe { self.ring.pop_bytes(dst) }
    }

    /// Copy up to `dst.len()` bytes starting `offset` bytes past the read cursor,
    /// without consuming them.
    #[inline]
    pub fn peek(&mut self, dst: &mut [u8], offset: usize) -> usize {
        // SAFETY: `split` hands out exactly one Consumer.
        unsafe { self.ring.peek_bytes(dst, offset) }
    }

    /// Discard up to `len` bytes. Returns the number discarded.
    #[inline]
    pub fn skip(&mut self, len: usize) -> usize {
        // SAFETY: `split` hands out exactly one Consumer.
        unsafe { self.ring.skip_bytes(len) }
    }

    /// Discard everything published so far.
    #[inline]
    pub fn reset_read(&mut self) {
        // SAFETY: `split` hands out exactly one Consumer.
        unsafe { self.ring.drain() }
    }

    /// Payload length encoded in the next record's prefix, without consuming it.
    ///
    /// Returns `None` if fewer bytes than the prefix are stored. With
    /// `PrefixWidth::None` this reports the free space instead.
    #[inline]
    pub fn peek_record_len(&mut self, width: PrefixWidth) -> Option<usize> {
        // SAFETY: `split` hands out exactly one Consumer.
        unsafe { self.ring.peek_record_len_inner(width) }
    }

    /// Consume a prefix plus exactly `dst.len()` payload bytes.
    ///
    /// The stored prefix is not consulted: size `dst` with [`Self::peek_record_len`]
    /// first, or use [`Self::read_record`]. Fails without consuming anything if
    /// fewer than `dst.len() + width` bytes are stored.
    #[inline]
    pub fn dequeue_record(
        &mut self,
        dst: &mut [u8],
        width: PrefixWidth,
    ) -> Result<usize, RecordError> {
        // SAFETY: `split` hands out exactly one Consumer.
        unsafe { self.ring.pop_record(dst, width) }
    }

    /// Consume the next record, sized from its own prefix. Returns the payload length.
    #[inline]
    pub fn read_record(
        &mut self,
        dst: &mut [u8],
        width: PrefixWidth,
    ) -> Result<usize, RecordError> {
        // SAFETY: `split` hands out exactly one Consumer.
        unsafe { self.ring.read_record_inner(dst, width) }
    }

    /// Drop the next record. Returns its payload length.
    #[inline]
    pub fn skip_record(&mut self, width: PrefixWidth) -> Result<usize, RecordError> {
        // SAFETY: `split` hands out exactly one Consumer.
        unsafe { self.ring.skip_record_inner(width) }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.ring.available()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }
}
