//! Scan-conversion rasterizer.
//!
//! Consumes transformed vertices (already in pixel space) and writes the
//! framebuffer. Split into point/line/circle primitives and the
//! active-edge-table polygon filler.

pub mod fill;
pub mod primitives;
