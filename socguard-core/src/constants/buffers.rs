//! Table Storage Limits
//!
//! Tables live in `heapless::Vec` so the estimator never allocates. These
//! capacities cover the production tables with room to spare.

/// Most breakpoints on any one table axis.
///
/// The largest production axis (Battleborn OCV SOC axis) has 18 points.
pub const MAX_AXIS_POINTS: usize = 32;

/// Most values in one 2-D table grid.
///
/// 256 × 8 bytes = 2KB per table. The largest production grid is 18 × 5.
pub const MAX_GRID_POINTS: usize = 256;
