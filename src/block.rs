use std::{mem, ptr::NonNull};

/// Size of the header that precedes every payload in the arena.
pub const HEADER_SIZE: usize = mem::size_of::<Block>();

const _: () = assert!(HEADER_SIZE % crate::ALIGNMENT == 0);

/// Written into every header in debug builds and checked whenever a caller
/// hands a payload pointer back.
#[cfg(debug_assertions)]
const GUARD: u32 = 0xB10C_A11C;

/// Header stored immediately before each payload.
///
/// ```text
///   ┌───────────────────────┬────────────────────────────────┐
///   │    Block Header       │         Payload                │
///   │  ┌─────────────────┐  │                                │
///   │  │ size: N         │  │  ┌──────────────────────────┐  │
///   │  │ next: null/ptr  │  │  │     N bytes usable       │  │
///   │  │ is_free         │  │  │                          │  │
///   │  └─────────────────┘  │  └──────────────────────────┘  │
///   │     HEADER_SIZE       │                                │
///   └───────────────────────┴────────────────────────────────┘
///                           ▲
///                           └── Pointer returned to user
/// ```
///
/// For every block except the last, `next` is the header located exactly at
/// the end of this block's payload.
#[repr(C, align(8))]
pub struct Block {
  pub size: usize,
  pub next: *mut Block,
  pub is_free: bool,
  #[cfg(debug_assertions)]
  guard: u32,
}

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    next: *mut Block,
  ) -> Self {
    Self {
      size,
      next,
      is_free,
      #[cfg(debug_assertions)]
      guard: GUARD,
    }
  }

  /// Writes a header at `address` and returns a pointer to it.
  ///
  /// # Safety
  ///
  /// `address` must be 8-byte aligned and valid for writes of
  /// [`HEADER_SIZE`] bytes.
  #[inline]
  pub unsafe fn write(
    address: NonNull<u8>,
    block: Block,
  ) -> NonNull<Block> {
    let header = address.cast::<Block>();
    unsafe { header.as_ptr().write(block) };
    header
  }

  /// Recovers the header of a payload pointer previously returned by the
  /// allocator.
  ///
  /// # Safety
  ///
  /// `payload` must point exactly [`HEADER_SIZE`] bytes past a live header.
  /// Anything else is undefined behaviour; debug builds catch most misuse
  /// through [`Block::check_guard`].
  #[inline]
  pub unsafe fn from_payload(payload: NonNull<u8>) -> NonNull<Block> {
    unsafe { NonNull::new_unchecked(payload.as_ptr().sub(HEADER_SIZE)).cast() }
  }

  /// Returns the first byte after the header.
  ///
  /// # Safety
  ///
  /// `block` must point to a live header.
  #[inline]
  pub unsafe fn payload_of(block: NonNull<Block>) -> NonNull<u8> {
    unsafe { NonNull::new_unchecked(block.as_ptr().cast::<u8>().add(HEADER_SIZE)) }
  }

  /// Returns the address one past the end of the block's payload, which is
  /// where the physically following header starts.
  ///
  /// # Safety
  ///
  /// `block` must point to a live header.
  #[inline]
  pub unsafe fn end_of(block: NonNull<Block>) -> *mut u8 {
    unsafe { Self::payload_of(block).as_ptr().add((*block.as_ptr()).size) }
  }

  /// Panics in debug builds if `block` does not carry the header guard.
  #[inline]
  pub fn check_guard(&self) {
    #[cfg(debug_assertions)]
    assert_eq!(
      self.guard, GUARD,
      "pointer does not belong to a block of this allocator"
    );
  }

  /// Header plus payload.
  #[inline]
  pub fn total_size(&self) -> usize {
    HEADER_SIZE + self.size
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_size_is_aligned() {
    assert_eq!(HEADER_SIZE % 8, 0);
    assert_eq!(mem::align_of::<Block>(), 8);
  }

  #[test]
  fn test_payload_round_trip() {
    let mut storage = [0u64; 8];
    let address = NonNull::new(storage.as_mut_ptr().cast::<u8>()).unwrap();

    unsafe {
      let block = Block::write(address, Block::new(32, false, std::ptr::null_mut()));
      let payload = Block::payload_of(block);

      assert_eq!(payload.as_ptr() as usize - address.as_ptr() as usize, HEADER_SIZE);
      assert_eq!(Block::from_payload(payload), block);
      assert_eq!(Block::end_of(block) as usize, payload.as_ptr() as usize + 32);
      assert_eq!(block.as_ref().total_size(), HEADER_SIZE + 32);

      block.as_ref().check_guard();
    }
  }

  #[cfg(debug_assertions)]
  #[test]
  #[should_panic(expected = "does not belong")]
  fn test_guard_rejects_garbage() {
    let mut storage = [0u64; 8];
    let payload = NonNull::new(storage[4..].as_mut_ptr().cast::<u8>()).unwrap();

    unsafe { Block::from_payload(payload).as_ref().check_guard() };
  }
}
