use thiserror::Error;

/// Why a `try_*` allocation produced no memory.
///
/// The null-returning operations fold both variants into a null pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  #[error("zero-sized allocation request")]
  ZeroSize,

  #[error("heap growth failed for a request of {requested} bytes")]
  OutOfMemory { requested: usize },

  #[error("{count} elements of {size} bytes overflow usize")]
  Overflow { count: usize, size: usize },
}
