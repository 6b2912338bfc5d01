/// How the sweep that follows every release treats runs of free blocks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CoalesceMode {
  /// Each visited block absorbs at most one free successor, then the sweep
  /// moves on. Runs of three or more free blocks may survive a release and
  /// only collapse over later sweeps.
  #[default]
  SinglePass,

  /// A block that just absorbed its successor is tested again against the
  /// new successor, so every run of adjacent free blocks collapses into one.
  FullCollapse,
}
