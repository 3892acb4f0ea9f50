//! # Softray
//!
//! A CPU rendering backend exposing an immediate-mode drawing API.
//! Callers push vertices, set matrices and trigger either scan-conversion
//! rasterization or offline ray tracing into a shared framebuffer.
//!
//! Two pipelines share the transform/state machinery and the color/depth
//! buffers:
//!
//! - the **rasterizer** turns points, lines, circles, ellipses, arcs and
//!   filled polygons into pixels with Bresenham, midpoint and
//!   active-edge-table scan-fill algorithms, optionally depth-tested;
//! - the **ray tracer** generates camera rays from the inverse
//!   view-projection transform and shades nearest hits with recursive
//!   Phong lighting, shadows, reflection and refraction.
//!
//! ## Quick Start
//!
//! ```
//! use softray::prelude::*;
//!
//! let mut ctx = Context::new(64, 64)?;
//! ctx.set_color(Color::WHITE);
//! ctx.begin(DrawMode::LineStrip)?;
//! ctx.vertex2(-0.5, -0.5)?;
//! ctx.vertex2(0.5, 0.5)?;
//! ctx.end()?;
//!
//! let pixels = ctx.color_data();
//! assert_eq!(pixels.len(), 64 * 64);
//! # Ok::<(), softray::Error>(())
//! ```
//!
//! ## Design
//!
//! - Contexts are explicit values owned by a [`context::ContextManager`]
//!   arena; there is no ambient current-context global.
//! - Every call returns a [`Result`]; the manager additionally offers the
//!   classic sticky first-error-wins polling surface.
//! - Primitive intersection dispatches over a closed enum, not trait
//!   objects.
//! - Everything is single-threaded and runs to completion.

#![warn(missing_docs)]
// Allow unwrap() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used))]
// Allow common patterns in graphics code
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// ============================================================================
// Core Modules
// ============================================================================

/// Color type shared by both pipelines.
pub mod color;

/// Vectors and 4x4 matrices.
pub mod math;

/// Vertices, scan-fill edges and curve parameter objects.
pub mod geometry;

/// Color and depth buffers.
pub mod framebuffer;

// ============================================================================
// Pipeline Modules
// ============================================================================

/// Per-scene transform/state core and the context arena.
pub mod context;

/// Scan-conversion rasterizer.
pub mod raster;

/// Scene model and intersection routines.
pub mod scene;

/// Recursive ray tracer.
pub mod tracer;

/// Output encoders (PNG).
pub mod output;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for softray operations.
pub mod error;

pub use error::{Error, ErrorCode, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and traits for convenient imports.
///
/// ```
/// use softray::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::Color;
    pub use crate::context::{
        AreaMode, ClearMask, Context, ContextManager, DrawMode, MatrixMode, Viewport,
    };
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::framebuffer::Framebuffer;
    pub use crate::geometry::{Arc, Circle, Ellipse, Vertex};
    pub use crate::math::{Mat4, Vec3};
    pub use crate::output::PngEncoder;
    pub use crate::scene::{Material, PointLight, Ray, Scene};
    pub use crate::tracer::RayTracer;
}
