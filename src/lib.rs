//! # rmalloc - A First-Fit Memory Allocator Library
//!
//! This crate provides a small `malloc`/`free`/`calloc`/`realloc` family built
//! on a single growable arena. By default the arena is the process data
//! segment, extended with the `sbrk` system call.
//!
//! ## Overview
//!
//! Every region of the arena is a block: a fixed-size header followed by the
//! payload handed to the caller. All blocks, used and free, are linked in
//! address order:
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                              ARENA                                   │
//!   │                                                                      │
//!   │   ┌───┬──────┬───┬──────────┬───┬────┬───┬──────────────┐            │
//!   │   │ H │ used │ H │   free   │ H │used│ H │     free     │            │
//!   │   └───┴──────┴───┴──────────┴───┴────┴───┴──────────────┘            │
//!   │     │        ▲ │            ▲ │      ▲                  ▲            │
//!   │     └────────┘ └────────────┘ └──────┘                  │            │
//!   │                 next links                         Program Break     │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Allocation** walks the chain and takes the first free block that is
//!   large enough (first fit). If the block is big enough to hold another
//!   header after the request, the tail is split off as a new free block.
//!   If nothing fits, the arena grows and a block is appended.
//! - **Release** flags the block free and sweeps the whole chain, merging
//!   adjacent free blocks. See [`CoalesceMode`] for how runs are handled.
//! - **Zero allocation** and **resize** are built on those two.
//!
//! Memory is never returned to the operating system.
//!
//! ## Crate Structure
//!
//! ```text
//!   rmalloc
//!   ├── align      - align() and ALIGNMENT
//!   ├── block      - Block header layout (internal)
//!   ├── heap       - HeapGrowth trait, SbrkHeap, FixedHeap
//!   ├── config     - CoalesceMode
//!   ├── error      - AllocError
//!   └── first_fit  - FirstFitAllocator implementation
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rmalloc::FirstFitAllocator;
//!
//! // Nothing else in this program moves the program break.
//! let mut allocator = unsafe { FirstFitAllocator::new() };
//!
//! let ptr = allocator.allocate(10 * std::mem::size_of::<i32>()) as *mut i32;
//! assert!(!ptr.is_null());
//!
//! unsafe {
//!     for i in 0..10 {
//!         ptr.add(i).write(i as i32);
//!     }
//!
//!     let ptr = allocator.resize(ptr as *mut u8, 20 * std::mem::size_of::<i32>());
//!     allocator.release(ptr);
//! }
//! ```
//!
//! A bounded arena makes behaviour reproducible:
//!
//! ```rust
//! use rmalloc::{AllocError, FirstFitAllocator, FixedHeap, HEADER_SIZE};
//!
//! let mut allocator = FirstFitAllocator::with_heap(FixedHeap::with_capacity(64 + HEADER_SIZE));
//!
//! let block = allocator.try_allocate(64).unwrap();
//! assert_eq!(allocator.try_allocate(8), Err(AllocError::OutOfMemory { requested: 8 }));
//! assert_eq!(allocator.try_allocate(0), Err(AllocError::ZeroSize));
//!
//! unsafe { allocator.release(block.as_ptr()) };
//! assert_eq!(allocator.allocate(8), block.as_ptr());
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **No shrinking**: Resizing to a smaller size keeps the block as is
//! - **Unix-only**: [`SbrkHeap`] requires `libc` and `sbrk` (POSIX systems)
//!
//! ## Safety
//!
//! Building an allocator over the program break is `unsafe`, because `sbrk`
//! is process-wide and two threads growing it at once get overlapping
//! memory. Over any other [`HeapGrowth`] allocation is safe to call.
//! Releasing and resizing take raw pointers and are `unsafe`: passing a
//! pointer this allocator did not hand out, or one already released, is
//! undefined behaviour. Debug builds keep a guard value
//! in each header and panic on most such misuse.

pub mod align;
mod block;
mod config;
mod error;
mod first_fit;
mod heap;

pub use align::{ALIGNMENT, align};
pub use block::HEADER_SIZE;
pub use config::CoalesceMode;
pub use error::AllocError;
pub use first_fit::{BlockInfo, Blocks, FirstFitAllocator};
pub use heap::{FixedHeap, HeapGrowth, SbrkHeap};
