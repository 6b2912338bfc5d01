/// Every payload size handed out by the allocator is a multiple of this.
pub const ALIGNMENT: usize = 8;

/// Rounds `size` up to the next multiple of [`ALIGNMENT`].
///
/// # Examples
///
/// ```rust
/// use rmalloc::align;
///
/// assert_eq!(align(0), 0);
/// assert_eq!(align(13), 16);
/// assert_eq!(align(16), 16);
/// ```
#[inline]
pub const fn align(size: usize) -> usize {
  (size + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn test_align() {
    let mut alignments = Vec::new();

    for i in 0..10 {
      let sizes = (ALIGNMENT * i + 1)..=(ALIGNMENT * (i + 1));

      let expected_alignment = ALIGNMENT * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes {
        assert_eq!(expected, align(size));
      }
    }
  }

  #[test]
  fn test_align_zero() {
    assert_eq!(align(0), 0);
  }

  proptest! {
    #[test]
    fn align_rounds_up_by_less_than_alignment(n in 0usize..(usize::MAX / 2)) {
      let aligned = align(n);
      prop_assert!(aligned >= n);
      prop_assert_eq!(aligned % ALIGNMENT, 0);
      prop_assert!(aligned - n < ALIGNMENT);
    }

    #[test]
    fn align_is_idempotent(n in 0usize..(usize::MAX / 2)) {
      prop_assert_eq!(align(align(n)), align(n));
    }
  }
}
