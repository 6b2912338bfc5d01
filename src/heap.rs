use std::ptr::{self, NonNull};

use libc::{c_void, intptr_t, sbrk};
use tracing::debug;

use crate::align;

/// Source of fresh arena memory for the allocator.
///
/// # Safety
///
/// A `Some` returned by [`HeapGrowth::grow`] must be 8-byte aligned, valid
/// for reads and writes of `size` bytes, disjoint from every region returned
/// before, and must stay valid for as long as the implementor lives. Regions
/// are never handed back.
pub unsafe trait HeapGrowth {
  /// Extends the arena by `size` bytes. `None` means the request could not
  /// be satisfied.
  fn grow(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>>;
}

const SBRK_FAILED: *mut c_void = usize::MAX as *mut c_void;

/// Grows the process data segment with `sbrk(2)`.
///
/// The program break is process-wide: other code moving it between two
/// growths leaves a gap in the arena, which the allocator tolerates but never
/// reclaims.
#[derive(Debug)]
pub struct SbrkHeap {
  _private: (),
}

impl SbrkHeap {
  /// # Safety
  ///
  /// While the returned heap is alive, no other thread may move the program
  /// break. That includes other `SbrkHeap`s in use on another thread and any
  /// code calling `brk`/`sbrk` concurrently. Two threads growing the break at
  /// once receive overlapping regions.
  pub unsafe fn new() -> Self {
    Self { _private: () }
  }

  /// Current program break (`sbrk(0)`).
  pub fn program_break(&self) -> *mut u8 {
    unsafe { sbrk(0) }.cast()
  }
}

unsafe impl HeapGrowth for SbrkHeap {
  fn grow(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let increment = intptr_t::try_from(size).ok()?;

    unsafe {
      let current = sbrk(0);
      if current == SBRK_FAILED {
        return None;
      }

      let padding = align(current as usize) - current as usize;
      if padding > 0 {
        debug!(padding, "aligning program break");
        if sbrk(padding as intptr_t) == SBRK_FAILED {
          return None;
        }
      }

      let address = sbrk(increment);
      if address == SBRK_FAILED {
        return None;
      }

      NonNull::new(address.cast())
    }
  }
}

/// Fixed-capacity arena owned by the value itself.
///
/// Regions are carved off the front in request order and the heap reports
/// failure once the capacity is used up, which makes exhaustion reproducible.
pub struct FixedHeap {
  base: NonNull<u64>,
  words: usize,
  used: usize,
}

impl FixedHeap {
  /// Creates a zeroed arena of at least `capacity` bytes, rounded up to a
  /// multiple of 8.
  pub fn with_capacity(capacity: usize) -> Self {
    let words = align(capacity) / 8;
    let storage: Box<[u64]> = vec![0u64; words].into_boxed_slice();
    let base = NonNull::new(Box::into_raw(storage).cast::<u64>()).unwrap_or(NonNull::dangling());

    Self { base, words, used: 0 }
  }

  pub fn capacity(&self) -> usize {
    self.words * 8
  }

  /// Bytes handed out so far.
  pub fn used(&self) -> usize {
    self.used
  }

  /// Start of the arena.
  pub fn base(&self) -> *const u8 {
    self.base.as_ptr().cast()
  }
}

unsafe impl HeapGrowth for FixedHeap {
  fn grow(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let start = align(self.used);
    let end = start.checked_add(size)?;

    if end > self.capacity() {
      return None;
    }

    self.used = end;

    NonNull::new(unsafe { self.base.as_ptr().cast::<u8>().add(start) })
  }
}

impl Drop for FixedHeap {
  fn drop(&mut self) {
    unsafe {
      drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
        self.base.as_ptr(),
        self.words,
      )));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fixed_heap_is_contiguous() {
    let mut heap = FixedHeap::with_capacity(128);

    let first = heap.grow(40).unwrap();
    let second = heap.grow(24).unwrap();

    assert_eq!(first.as_ptr() as *const u8, heap.base());
    assert_eq!(second.as_ptr() as usize, first.as_ptr() as usize + 40);
    assert_eq!(heap.used(), 64);
  }

  #[test]
  fn test_fixed_heap_exhaustion() {
    let mut heap = FixedHeap::with_capacity(64);

    assert!(heap.grow(48).is_some());
    assert!(heap.grow(24).is_none());
    assert_eq!(heap.used(), 48);
    assert!(heap.grow(16).is_some());
    assert!(heap.grow(1).is_none());
  }

  #[test]
  fn test_fixed_heap_rounds_capacity() {
    let heap = FixedHeap::with_capacity(13);
    assert_eq!(heap.capacity(), 16);
  }

  #[test]
  fn test_sbrk_heap_rejects_oversized_request() {
    // Fails the intptr_t conversion before the program break is touched.
    let mut heap = unsafe { SbrkHeap::new() };
    assert!(heap.grow(usize::MAX).is_none());
  }
}
