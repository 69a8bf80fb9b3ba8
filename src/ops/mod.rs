// ============================================================================
// PIXEL OPERATIONS: everything that reads or mutates a Bitmap
// ============================================================================

pub mod boundary;
pub mod brush;
pub mod edge_coat;
pub mod fill;
