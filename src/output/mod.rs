//! Output encoders for the rendered color buffer.

pub mod png_encoder;

pub use png_encoder::PngEncoder;
