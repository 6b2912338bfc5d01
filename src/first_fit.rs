use std::{
  marker::PhantomData,
  ptr::{self, NonNull},
};

use tracing::{debug, trace, warn};

use crate::{
  align,
  block::{Block, HEADER_SIZE},
  config::CoalesceMode,
  error::AllocError,
  heap::{HeapGrowth, SbrkHeap},
};

/// Snapshot of one block in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// Payload address, as handed to callers.
  pub address: *mut u8,
  pub size: usize,
  pub is_free: bool,
}

/// Outcome of the first-fit scan.
enum Fit {
  Found(NonNull<Block>),
  /// Nothing fits. `tail` is the last block visited, `None` when the chain is
  /// empty.
  Missed { tail: Option<NonNull<Block>> },
}

/// First-fit allocator over a single growable arena.
///
/// Every block, used or free, sits in one address-ordered chain starting at
/// `first`. Allocation takes the first free block that is large enough,
/// splitting off the unused tail when it can hold another header. When
/// nothing fits, the arena grows and the new block is appended.
///
/// The allocator holds raw pointers and is neither `Send` nor `Sync`. That
/// keeps one allocator on one thread, but not two allocators sharing the
/// program break, which is why [`FirstFitAllocator::new`] is `unsafe`.
pub struct FirstFitAllocator<H: HeapGrowth = SbrkHeap> {
  first: *mut Block,
  heap: H,
  mode: CoalesceMode,
}

impl FirstFitAllocator<SbrkHeap> {
  /// Creates an allocator that grows the process data segment.
  ///
  /// # Safety
  ///
  /// Same contract as [`SbrkHeap::new`]: no other thread may move the
  /// program break while the allocator is alive.
  pub unsafe fn new() -> Self {
    Self::with_heap(unsafe { SbrkHeap::new() })
  }
}

impl<H: HeapGrowth> FirstFitAllocator<H> {
  /// Creates an allocator with an empty chain that grows through `heap`.
  pub fn with_heap(heap: H) -> Self {
    Self {
      first: ptr::null_mut(),
      heap,
      mode: CoalesceMode::default(),
    }
  }

  pub fn with_coalesce_mode(
    mut self,
    mode: CoalesceMode,
  ) -> Self {
    self.mode = mode;
    self
  }

  pub fn coalesce_mode(&self) -> CoalesceMode {
    self.mode
  }

  pub fn heap(&self) -> &H {
    &self.heap
  }

  /// Walks the chain in address order.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks {
      current: self.first,
      marker: PhantomData,
    }
  }

  fn find_free_block(
    &self,
    size: usize,
  ) -> Fit {
    let mut tail: Option<NonNull<Block>> = None;
    let mut current = self.first;

    unsafe {
      while let Some(block) = NonNull::new(current) {
        if (*current).is_free && (*current).size >= size {
          return Fit::Found(block);
        }
        tail = Some(block);
        current = (*current).next;
      }
    }

    Fit::Missed { tail }
  }

  /// Carves a free remainder off `block` if more than a header's worth of
  /// payload would be left over.
  ///
  /// # Safety
  ///
  /// `block` must be a free block of this chain with `size <= block.size`.
  unsafe fn split(
    block: NonNull<Block>,
    size: usize,
  ) {
    unsafe {
      let header = &mut *block.as_ptr();

      if header.size <= size + HEADER_SIZE {
        return;
      }

      let address = NonNull::new_unchecked(Block::payload_of(block).as_ptr().add(size));
      let remainder = Block::write(
        address,
        Block::new(header.size - size - HEADER_SIZE, true, header.next),
      );

      trace!(from = header.size, to = size, remainder = (*remainder.as_ptr()).size, "split block");

      header.size = size;
      header.next = remainder.as_ptr();
    }
  }

  /// Appends a fresh block of `size` payload bytes after `tail`.
  fn grow(
    &mut self,
    size: usize,
    tail: Option<NonNull<Block>>,
  ) -> Result<NonNull<u8>, AllocError> {
    let total = size + HEADER_SIZE;

    let Some(address) = self.heap.grow(total) else {
      warn!(requested = total, "heap growth failed");
      return Err(AllocError::OutOfMemory { requested: size });
    };

    debug!(requested = total, ?address, "grew arena");

    unsafe {
      let block = Block::write(address, Block::new(size, false, ptr::null_mut()));

      match tail {
        Some(tail) => (*tail.as_ptr()).next = block.as_ptr(),
        None => self.first = block.as_ptr(),
      }

      Ok(Block::payload_of(block))
    }
  }

  /// Allocates at least `size` bytes, reporting why when nothing is
  /// returned.
  pub fn try_allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size == 0 {
      return Err(AllocError::ZeroSize);
    }

    if size > isize::MAX as usize - HEADER_SIZE - crate::ALIGNMENT {
      return Err(AllocError::OutOfMemory { requested: size });
    }

    let size = align(size);

    match self.find_free_block(size) {
      Fit::Found(block) => unsafe {
        Self::split(block, size);
        (*block.as_ptr()).is_free = false;

        trace!(size, block_size = (*block.as_ptr()).size, "reused free block");

        Ok(Block::payload_of(block))
      },
      Fit::Missed { tail } => self.grow(size, tail),
    }
  }

  /// Allocates at least `size` bytes. Returns null both for `size == 0` and
  /// when the arena cannot grow; use [`Self::try_allocate`] to tell them
  /// apart.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    match self.try_allocate(size) {
      Ok(address) => address.as_ptr(),
      Err(_) => ptr::null_mut(),
    }
  }

  /// Marks the block owning `address` as free and sweeps the chain for
  /// adjacent free pairs. Null is ignored.
  ///
  /// # Safety
  ///
  /// `address` must be null or a pointer returned by this allocator that has
  /// not been released since. Debug builds panic on most violations.
  pub unsafe fn release(
    &mut self,
    address: *mut u8,
  ) {
    let Some(payload) = NonNull::new(address) else {
      return;
    };

    unsafe {
      let header = &mut *Block::from_payload(payload).as_ptr();
      header.check_guard();
      debug_assert!(!header.is_free, "double release of {:p}", address);
      header.is_free = true;
    }

    self.coalesce();
  }

  fn coalesce(&mut self) {
    let mut current = self.first;

    unsafe {
      while !current.is_null() && !(*current).next.is_null() {
        let next = (*current).next;

        if (*current).is_free
          && (*next).is_free
          && Block::end_of(NonNull::new_unchecked(current)) == next.cast::<u8>()
        {
          (*current).size += (*next).total_size();
          (*current).next = (*next).next;

          trace!(size = (*current).size, "merged free blocks");

          if self.mode == CoalesceMode::FullCollapse {
            continue;
          }
        }

        current = (*current).next;
      }
    }
  }

  /// Allocates `count * size` zeroed bytes. The product is not checked for
  /// overflow; use [`Self::try_zero_allocate`] for that.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    size: usize,
  ) -> *mut u8 {
    let total = count.wrapping_mul(size);
    let address = self.allocate(total);

    if !address.is_null() {
      unsafe { ptr::write_bytes(address, 0, total) };
    }

    address
  }

  pub fn try_zero_allocate(
    &mut self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let total = count
      .checked_mul(size)
      .ok_or(AllocError::Overflow { count, size })?;
    let address = self.try_allocate(total)?;

    unsafe { ptr::write_bytes(address.as_ptr(), 0, total) };

    Ok(address)
  }

  /// Grows the allocation at `address` to `new_size` bytes.
  ///
  /// Null behaves like [`Self::allocate`] and `new_size == 0` like
  /// [`Self::release`] followed by a null result. Requests that already fit
  /// return `address` untouched. Otherwise the payload moves to a new block;
  /// if that allocation fails, null is returned and `address` stays valid.
  ///
  /// # Safety
  ///
  /// Same contract as [`Self::release`].
  pub unsafe fn resize(
    &mut self,
    address: *mut u8,
    new_size: usize,
  ) -> *mut u8 {
    let Some(payload) = NonNull::new(address) else {
      return self.allocate(new_size);
    };

    if new_size == 0 {
      unsafe { self.release(address) };
      return ptr::null_mut();
    }

    let old_size = unsafe {
      let header = Block::from_payload(payload).as_ref();
      header.check_guard();
      debug_assert!(!header.is_free, "resize of released {:p}", address);
      header.size
    };

    if new_size <= old_size {
      return address;
    }

    let new_address = self.allocate(new_size);
    if new_address.is_null() {
      return ptr::null_mut();
    }

    unsafe {
      ptr::copy_nonoverlapping(address, new_address, old_size);
      self.release(address);
    }

    new_address
  }
}

/// Iterator returned by [`FirstFitAllocator::blocks`].
pub struct Blocks<'a> {
  current: *mut Block,
  marker: PhantomData<&'a Block>,
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    let block = NonNull::new(self.current)?;

    unsafe {
      let header = block.as_ref();
      self.current = header.next;

      Some(BlockInfo {
        address: Block::payload_of(block).as_ptr(),
        size: header.size,
        is_free: header.is_free,
      })
    }
  }
}
