//! Allocation failure through a global allocator that refuses ring-sized requests.
#![cfg(feature = "alloc")]

use ph_fifo::{ByteRing, CapacityError, PrefixWidth};
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, Ordering};

const REFUSED_SIZE: usize = 4096;

struct RefusingAlloc {
    refuse: AtomicBool,
}

unsafe impl GlobalAlloc for RefusingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if self.refuse.load(Ordering::SeqCst) && layout.size() == REFUSED_SIZE {
            return std::ptr::null_mut();
        }
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if self.refuse.load(Ordering::SeqCst) && layout.size() == REFUSED_SIZE {
            return std::ptr::null_mut();
        }
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: RefusingAlloc = RefusingAlloc {
    refuse: AtomicBool::new(false),
};

#[test]
fn failed_allocation_leaves_inert_ring() {
    let mut ring = ByteRing::with_capacity(64).unwrap();
    assert_eq!(ring.enqueue(&[1, 2, 3]), 3);

    GLOBAL.refuse.store(true, Ordering::SeqCst);
    let result = ring.alloc(3000);
    GLOBAL.refuse.store(false, Ordering::SeqCst);

    assert_eq!(result, Err(CapacityError::AllocFailed { capacity: 4096 }));
    assert!(!ring.is_initialized());
    assert_eq!(ring.capacity(), 0);
    assert_eq!(ring.len(), 0);
    assert!(ring.is_empty());

    let mut out = [0u8; 8];
    assert_eq!(ring.enqueue(&[4, 5]), 0);
    assert_eq!(ring.dequeue(&mut out), 0);
    assert_eq!(ring.peek(&mut out, 0), 0);
    assert_eq!(ring.skip(8), 0);
    ring.reset_read();
    assert!(ring.enqueue_record(&[1], PrefixWidth::U8).is_err());
    assert_eq!(ring.peek_record_len(PrefixWidth::U8), None);
    assert!(ring.dequeue_record(&mut out[..1], PrefixWidth::U8).is_err());
    assert!(ring.read_record(&mut out, PrefixWidth::U8).is_err());
    assert!(ring.skip_record(PrefixWidth::U8).is_err());

    // A later allocation recovers the ring.
    ring.alloc(3000).unwrap();
    assert_eq!(ring.capacity(), 4096);
    assert_eq!(ring.enqueue(&[9]), 1);
}
