//! Per-scene transform and state core, plus the context arena.
//!
//! A [`Context`] owns everything one scene needs: the framebuffer, the
//! named matrix slots with their bounded stacks, the draw-state
//! attributes, the vertex accumulation buffer and the ray-tracing scene
//! model. Immediate-mode drawing runs `begin(mode)` / vertex calls /
//! `end()`; whole-shape calls (circle, ellipse, arc) and the ray tracer
//! sit outside that bracketing.
//!
//! A [`ContextManager`] owns up to [`MAX_CONTEXTS`] contexts behind index
//! handles and provides the sticky first-error-wins polling surface.

use crate::color::Color;
use crate::error::{Error, ErrorCode, Result};
use crate::framebuffer::Framebuffer;
use crate::geometry::{Arc, Circle, Ellipse, Vertex};
use crate::math::{Mat4, Vec3, PI};
use crate::raster::{fill, primitives};
use crate::scene::{Material, PointLight, Scene};
use crate::tracer::RayTracer;

/// Maximum number of simultaneously live contexts.
pub const MAX_CONTEXTS: usize = 32;

/// Bounded capacity of each per-mode matrix stack.
pub const MATRIX_STACK_DEPTH: usize = 32;

/// Segment count for a full ellipse.
pub const ELLIPSE_SEGMENTS: u32 = 40;

/// Segment count for a full-circle arc sweep; partial sweeps scale down
/// proportionally.
pub const ARC_SEGMENTS: f32 = 40.0;

/// Which matrix the transform calls target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixMode {
    /// Model-view matrix.
    #[default]
    ModelView,
    /// Projection matrix.
    Projection,
}

impl TryFrom<u32> for MatrixMode {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::ModelView),
            1 => Ok(Self::Projection),
            other => Err(Error::InvalidEnum(format!("matrix mode {other}"))),
        }
    }
}

/// Element type for begin/end drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    /// Independent points.
    #[default]
    Points,
    /// Independent segment pairs.
    Lines,
    /// Connected strip.
    LineStrip,
    /// Closed strip.
    LineLoop,
    /// Closed polygon, realized per the area mode.
    Polygon,
}

impl TryFrom<u32> for DrawMode {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Points),
            1 => Ok(Self::Lines),
            2 => Ok(Self::LineStrip),
            3 => Ok(Self::LineLoop),
            4 => Ok(Self::Polygon),
            other => Err(Error::InvalidEnum(format!("draw mode {other}"))),
        }
    }
}

/// How closed primitives are realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaMode {
    /// Vertices only.
    Point,
    /// Boundary only.
    Line,
    /// Scan-filled interior.
    #[default]
    Fill,
}

impl TryFrom<u32> for AreaMode {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Point),
            1 => Ok(Self::Line),
            2 => Ok(Self::Fill),
            other => Err(Error::InvalidEnum(format!("area mode {other}"))),
        }
    }
}

/// Buffer-selection mask for [`Context::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMask(u32);

impl ClearMask {
    /// Clear the color buffer to the clear color.
    pub const COLOR: Self = Self(1);
    /// Reset the depth buffer to +infinity.
    pub const DEPTH: Self = Self(2);

    /// True when `other`'s bits are all set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ClearMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Screen-space mapping target: size plus offset, settable independently
/// of matrix state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Offset of the viewport's left edge in pixels.
    pub x: i32,
    /// Offset of the viewport's bottom edge in pixels.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// One scene's rendering state and buffers.
#[derive(Debug, Clone)]
pub struct Context {
    framebuffer: Framebuffer,
    viewport: Viewport,

    modelview: Mat4,
    projection: Mat4,
    viewport_matrix: Mat4,
    mvp: Mat4,
    mvp_dirty: bool,
    modelview_stack: Vec<Mat4>,
    projection_stack: Vec<Mat4>,
    matrix_mode: MatrixMode,

    draw_mode: DrawMode,
    area_mode: AreaMode,
    in_cycle: bool,
    depth_test: bool,
    point_size: f32,
    current_color: Color,
    clear_color: Color,

    vertices: Vec<Vertex>,
    scene: Scene,
}

impl Context {
    /// Create a context with its own framebuffer and a viewport covering
    /// it.
    ///
    /// # Errors
    ///
    /// Fails like [`Framebuffer::new`] on zero dimensions or allocation
    /// failure.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let framebuffer = Framebuffer::new(width, height)?;
        let viewport = Viewport { x: 0, y: 0, width, height };
        Ok(Self {
            framebuffer,
            viewport,
            modelview: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            viewport_matrix: Mat4::viewport_map(width as f32, height as f32, 0.0, 0.0),
            mvp: Mat4::IDENTITY,
            mvp_dirty: false,
            modelview_stack: Vec::new(),
            projection_stack: Vec::new(),
            matrix_mode: MatrixMode::default(),
            draw_mode: DrawMode::default(),
            area_mode: AreaMode::default(),
            in_cycle: false,
            depth_test: false,
            point_size: 1.0,
            current_color: Color::WHITE,
            clear_color: Color::BLACK,
            vertices: Vec::new(),
            scene: Scene::new(),
        })
    }

    // ------------------------------------------------------------------
    // Buffers and attributes
    // ------------------------------------------------------------------

    /// The framebuffer this context renders into.
    #[must_use]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Flat row-major color data, for the caller to blit or encode.
    #[must_use]
    pub fn color_data(&self) -> &[Color] {
        self.framebuffer.data()
    }

    /// Set the color used for subsequent drawing.
    pub fn set_color(&mut self, color: Color) {
        self.current_color = color;
    }

    /// Set the color [`Context::clear`] fills with; it is also the ray
    /// tracer's background.
    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// Clear the selected buffers.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] inside a begin/end cycle.
    pub fn clear(&mut self, mask: ClearMask) -> Result<()> {
        self.reject_in_cycle("clear")?;
        if mask.contains(ClearMask::COLOR) {
            self.framebuffer.clear_color(self.clear_color);
        }
        if mask.contains(ClearMask::DEPTH) {
            self.framebuffer.clear_depth();
        }
        Ok(())
    }

    /// Set the point footprint size in pixels.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] mid-primitive, [`Error::InvalidArgument`]
    /// for a non-positive size.
    pub fn set_point_size(&mut self, size: f32) -> Result<()> {
        self.reject_in_cycle("point size change")?;
        if size <= 0.0 {
            return Err(Error::InvalidArgument(format!("point size {size}")));
        }
        self.point_size = size;
        Ok(())
    }

    /// Select how closed primitives are realized.
    pub fn set_area_mode(&mut self, mode: AreaMode) {
        self.area_mode = mode;
    }

    /// Enable or disable the per-pixel depth test for filled polygons.
    pub fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    // ------------------------------------------------------------------
    // Matrix state
    // ------------------------------------------------------------------

    /// Select the matrix the transform calls target.
    pub fn set_matrix_mode(&mut self, mode: MatrixMode) {
        self.matrix_mode = mode;
    }

    /// The currently selected matrix mode.
    #[must_use]
    pub fn matrix_mode(&self) -> MatrixMode {
        self.matrix_mode
    }

    /// Replace the active matrix with the identity.
    pub fn load_identity(&mut self) {
        *self.active_matrix_mut() = Mat4::IDENTITY;
        self.mvp_dirty = true;
    }

    /// Replace the active matrix.
    pub fn load_matrix(&mut self, m: Mat4) {
        *self.active_matrix_mut() = m;
        self.mvp_dirty = true;
    }

    /// Right-multiply the active matrix.
    pub fn mult_matrix(&mut self, m: &Mat4) {
        let current = *self.active_matrix();
        *self.active_matrix_mut() = current * *m;
        self.mvp_dirty = true;
    }

    /// Right-multiply by a translation.
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.mult_matrix(&Mat4::translation(x, y, z));
    }

    /// Right-multiply by a non-uniform scale.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.mult_matrix(&Mat4::scaling(x, y, z));
    }

    /// Right-multiply by a rotation around the point (cx, cy) in the
    /// z = 0 plane.
    pub fn rotate_2d(&mut self, angle: f32, cx: f32, cy: f32) {
        let m = Mat4::translation(cx, cy, 0.0) * Mat4::rotation_z(angle) * Mat4::translation(-cx, -cy, 0.0);
        self.mult_matrix(&m);
    }

    /// Right-multiply by a rotation around the Y axis.
    pub fn rotate_y(&mut self, angle: f32) {
        self.mult_matrix(&Mat4::rotation_y(angle));
    }

    /// Right-multiply by an orthographic projection.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when a box extent is empty.
    pub fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Result<()> {
        if left == right || bottom == top || near == far {
            return Err(Error::InvalidArgument(format!(
                "degenerate ortho box {left}..{right} x {bottom}..{top} x {near}..{far}"
            )));
        }
        self.mult_matrix(&Mat4::ortho(left, right, bottom, top, near, far));
        Ok(())
    }

    /// Right-multiply by a perspective frustum.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when an extent is empty or a plane
    /// distance is not positive.
    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Result<()> {
        if left == right || bottom == top || near <= 0.0 || far <= 0.0 || near == far {
            return Err(Error::InvalidArgument(format!(
                "degenerate frustum {left}..{right} x {bottom}..{top} x {near}..{far}"
            )));
        }
        self.mult_matrix(&Mat4::frustum(left, right, bottom, top, near, far));
        Ok(())
    }

    /// Push a copy of the active matrix onto its mode's stack.
    ///
    /// # Errors
    ///
    /// [`Error::StackOverflow`] at [`MATRIX_STACK_DEPTH`] entries.
    pub fn push_matrix(&mut self) -> Result<()> {
        let top = *self.active_matrix();
        let stack = self.active_stack_mut();
        if stack.len() >= MATRIX_STACK_DEPTH {
            return Err(Error::StackOverflow);
        }
        stack.push(top);
        Ok(())
    }

    /// Pop the active mode's stack into the active matrix.
    ///
    /// # Errors
    ///
    /// [`Error::StackUnderflow`] on an empty stack.
    pub fn pop_matrix(&mut self) -> Result<()> {
        let popped = self.active_stack_mut().pop().ok_or(Error::StackUnderflow)?;
        *self.active_matrix_mut() = popped;
        self.mvp_dirty = true;
        Ok(())
    }

    /// Set the viewport and derive its pixel-mapping matrix.
    pub fn set_viewport(&mut self, width: u32, height: u32, x: i32, y: i32) {
        self.viewport = Viewport { x, y, width, height };
        self.viewport_matrix =
            Mat4::viewport_map(width as f32, height as f32, x as f32, y as f32);
    }

    /// The current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn active_matrix(&self) -> &Mat4 {
        match self.matrix_mode {
            MatrixMode::ModelView => &self.modelview,
            MatrixMode::Projection => &self.projection,
        }
    }

    fn active_matrix_mut(&mut self) -> &mut Mat4 {
        match self.matrix_mode {
            MatrixMode::ModelView => &mut self.modelview,
            MatrixMode::Projection => &mut self.projection,
        }
    }

    fn active_stack_mut(&mut self) -> &mut Vec<Mat4> {
        match self.matrix_mode {
            MatrixMode::ModelView => &mut self.modelview_stack,
            MatrixMode::Projection => &mut self.projection_stack,
        }
    }

    fn update_mvp(&mut self) {
        if self.mvp_dirty {
            self.mvp = self.projection * self.modelview;
            self.mvp_dirty = false;
        }
    }

    // ------------------------------------------------------------------
    // Immediate-mode drawing
    // ------------------------------------------------------------------

    /// Open a begin/end cycle for the given element type.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] on a nested begin.
    pub fn begin(&mut self, mode: DrawMode) -> Result<()> {
        self.reject_in_cycle("nested begin")?;
        self.draw_mode = mode;
        self.in_cycle = true;
        Ok(())
    }

    /// Submit a 2D vertex (z = 0, w = 1).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] outside a begin/end cycle.
    pub fn vertex2(&mut self, x: f32, y: f32) -> Result<()> {
        self.vertex4(x, y, 0.0, 1.0)
    }

    /// Submit a 3D vertex (w = 1).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] outside a begin/end cycle.
    pub fn vertex3(&mut self, x: f32, y: f32, z: f32) -> Result<()> {
        self.vertex4(x, y, z, 1.0)
    }

    /// Submit a homogeneous vertex.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] outside a begin/end cycle.
    pub fn vertex4(&mut self, x: f32, y: f32, z: f32, w: f32) -> Result<()> {
        if !self.in_cycle {
            return Err(Error::InvalidOperation("vertex outside begin/end".to_string()));
        }
        self.submit_vertex(Vertex::new(x, y, z, w));
        Ok(())
    }

    /// Run a vertex through MVP, perspective divide and the viewport map,
    /// then buffer it. The order is fixed; reordering breaks projective
    /// correctness.
    fn submit_vertex(&mut self, v: Vertex) {
        self.update_mvp();
        let v = v
            .transformed(&self.mvp)
            .w_normalized()
            .transformed(&self.viewport_matrix);
        self.vertices.push(v);
    }

    /// Close the cycle and rasterize the buffered vertices.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] without a matching begin.
    pub fn end(&mut self) -> Result<()> {
        if !self.in_cycle {
            return Err(Error::InvalidOperation("end without begin".to_string()));
        }

        let fb = &mut self.framebuffer;
        match self.draw_mode {
            DrawMode::Points => {
                primitives::draw_points(fb, &self.vertices, self.point_size, self.current_color);
            }
            DrawMode::Lines => primitives::draw_lines(fb, &self.vertices, self.current_color),
            DrawMode::LineStrip => {
                primitives::draw_line_strip(fb, &self.vertices, self.current_color);
            }
            DrawMode::LineLoop => {
                primitives::draw_line_loop(fb, &self.vertices, self.current_color);
            }
            DrawMode::Polygon => match self.area_mode {
                AreaMode::Fill => {
                    fill::fill_polygon(fb, &self.vertices, self.current_color, self.depth_test);
                }
                AreaMode::Line => {
                    primitives::draw_line_loop(fb, &self.vertices, self.current_color);
                }
                AreaMode::Point => {
                    primitives::draw_points(fb, &self.vertices, self.point_size, self.current_color);
                }
            },
        }

        self.vertices.clear();
        self.in_cycle = false;
        Ok(())
    }

    /// Draw a circle, filled per the area mode.
    ///
    /// The center runs through the model-view / projection / divide /
    /// viewport chain; the pixel radius scales the object-space radius by
    /// the square root of the x/y block determinant of the combined
    /// viewport and MVP transform, so uniform scaling transfers to the
    /// footprint.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] inside a begin/end cycle and
    /// [`Error::InvalidArgument`] for a negative radius.
    pub fn draw_circle(&mut self, circle: Circle) -> Result<()> {
        self.reject_in_cycle("circle inside begin/end")?;
        if circle.radius < 0.0 {
            return Err(Error::InvalidArgument(format!("circle radius {}", circle.radius)));
        }

        let center = circle
            .center
            .transformed(&self.modelview)
            .transformed(&self.projection)
            .w_normalized()
            .transformed(&self.viewport_matrix);

        self.update_mvp();
        let m = self.mvp.as_array();
        let half_w = self.viewport.width as f32 / 2.0;
        let half_h = self.viewport.height as f32 / 2.0;
        let det = (half_w * m[0] * half_h * m[5]) - (half_w * m[1] * half_h * m[4]);
        let radius = (det.max(0.0).sqrt() * circle.radius) as i32;

        let cx = center.x as i32;
        let cy = center.y as i32;
        match self.area_mode {
            AreaMode::Fill => {
                primitives::draw_circle_filled(&mut self.framebuffer, cx, cy, radius, self.current_color);
            }
            _ => {
                primitives::draw_circle_outline(&mut self.framebuffer, cx, cy, radius, self.current_color);
            }
        }
        Ok(())
    }

    /// Draw an ellipse sampled at [`ELLIPSE_SEGMENTS`] parametric steps,
    /// closed by the line loop or the polygon filler per the area mode.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] inside a begin/end cycle.
    pub fn draw_ellipse(&mut self, ellipse: Ellipse) -> Result<()> {
        self.reject_in_cycle("ellipse inside begin/end")?;

        let cx = ellipse.center.x;
        let cy = ellipse.center.y;

        let mut old = (0.0f32, 0.0f32);
        for i in 0..ELLIPSE_SEGMENTS {
            let t = (i as f32 / ELLIPSE_SEGMENTS as f32) * (2.0 * PI);
            let x = ellipse.a * t.sin();
            let y = ellipse.b * t.cos();

            if i > 0 {
                self.submit_vertex(Vertex::xy(cx + old.0, cy - old.1));
                self.submit_vertex(Vertex::xy(cx + x, cy - y));
            }
            old = (x, y);
        }

        if self.area_mode == AreaMode::Fill {
            fill::fill_polygon(&mut self.framebuffer, &self.vertices, self.current_color, self.depth_test);
        } else {
            primitives::draw_line_loop(&mut self.framebuffer, &self.vertices, self.current_color);
        }
        self.vertices.clear();
        Ok(())
    }

    /// Draw an arc as a line strip, or as a pie slice through the polygon
    /// filler when the area mode fills. The segment count scales with the
    /// angular sweep.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] inside a begin/end cycle.
    pub fn draw_arc(&mut self, arc: Arc) -> Result<()> {
        self.reject_in_cycle("arc inside begin/end")?;

        let sweep = arc.to - arc.from;
        let segments = (ARC_SEGMENTS * sweep / (2.0 * PI)).ceil();
        if segments < 1.0 {
            return Ok(());
        }
        let step = sweep / segments;

        let cx = arc.center.x;
        let cy = arc.center.y;
        let sample = |angle: f32| {
            (arc.radius * (angle - PI / 2.0).sin(), arc.radius * (angle - PI / 2.0).cos())
        };

        let mut old = sample(arc.from);
        for i in 1..segments as u32 {
            let (x, y) = sample(arc.from + i as f32 * step);
            self.submit_vertex(Vertex::xy(cx - old.0, cy + old.1));
            self.submit_vertex(Vertex::xy(cx - x, cy + y));
            old = (x, y);
        }
        let (x, y) = sample(arc.to);
        self.submit_vertex(Vertex::xy(cx - old.0, cy + old.1));
        self.submit_vertex(Vertex::xy(cx - x, cy + y));

        if self.area_mode == AreaMode::Fill {
            self.submit_vertex(Vertex::xy(cx, cy));
            fill::fill_polygon(&mut self.framebuffer, &self.vertices, self.current_color, self.depth_test);
        } else {
            primitives::draw_line_strip(&mut self.framebuffer, &self.vertices, self.current_color);
        }
        self.vertices.clear();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scene definition and ray tracing
    // ------------------------------------------------------------------

    /// The scene model.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access to the scene model for definition calls.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Set the material attached to primitives added next.
    pub fn set_material(&mut self, material: Material) {
        self.scene.set_material(material);
    }

    /// Add a sphere to the scene model.
    pub fn add_sphere(&mut self, center: Vec3, radius: f32) {
        self.scene.add_sphere(center, radius);
    }

    /// Add a triangle to the scene model.
    pub fn add_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        self.scene.add_triangle(a, b, c);
    }

    /// Add a point light to the scene model.
    pub fn add_light(&mut self, light: PointLight) {
        self.scene.add_light(light);
    }

    /// Drop the scene model's primitives and lights.
    pub fn clear_scene(&mut self) {
        self.scene.clear();
    }

    /// Ray trace the scene model into the color buffer, one camera ray
    /// per viewport pixel. The clear color doubles as the background.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] inside a begin/end cycle.
    pub fn render_scene(&mut self) -> Result<()> {
        self.reject_in_cycle("render inside begin/end")?;

        let combined = self.projection * self.modelview;
        let tracer = RayTracer::new(&self.scene, &combined, self.viewport, self.clear_color);
        tracer.render(&mut self.framebuffer);
        Ok(())
    }

    fn reject_in_cycle(&self, what: &str) -> Result<()> {
        if self.in_cycle {
            return Err(Error::InvalidOperation(what.to_string()));
        }
        Ok(())
    }
}

/// Identifies a context inside a [`ContextManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(usize);

/// Arena of contexts behind index handles, with GL-style sticky error
/// polling: the first recorded error is retained until drained and later
/// errors before the drain are dropped.
#[derive(Debug, Default)]
pub struct ContextManager {
    contexts: Vec<Option<Context>>,
    current: Option<usize>,
    sticky: Option<ErrorCode>,
}

impl ContextManager {
    /// An empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.iter().flatten().count()
    }

    /// True when no context is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a context, reusing a freed slot when one exists.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfResources`] beyond [`MAX_CONTEXTS`] live contexts;
    /// allocation failures propagate from [`Context::new`]. Failures are
    /// also recorded for sticky polling.
    pub fn create_context(&mut self, width: u32, height: u32) -> Result<ContextId> {
        if self.len() >= MAX_CONTEXTS {
            let err = Error::OutOfResources(format!("context quota of {MAX_CONTEXTS}"));
            self.record(&err);
            return Err(err);
        }

        let context = match Context::new(width, height) {
            Ok(c) => c,
            Err(err) => {
                self.record(&err);
                return Err(err);
            }
        };

        let slot = self.contexts.iter().position(Option::is_none);
        let index = match slot {
            Some(i) => {
                self.contexts[i] = Some(context);
                i
            }
            None => {
                self.contexts.push(Some(context));
                self.contexts.len() - 1
            }
        };
        Ok(ContextId(index))
    }

    /// Destroy a context, freeing its slot.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a dead or unknown handle (also
    /// recorded for sticky polling).
    pub fn destroy_context(&mut self, id: ContextId) -> Result<()> {
        match self.contexts.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                if self.current == Some(id.0) {
                    self.current = None;
                }
                Ok(())
            }
            _ => {
                let err = Error::InvalidArgument(format!("context handle {}", id.0));
                self.record(&err);
                Err(err)
            }
        }
    }

    /// Make a context current.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a dead or unknown handle (also
    /// recorded for sticky polling).
    pub fn set_current(&mut self, id: ContextId) -> Result<()> {
        match self.contexts.get(id.0) {
            Some(Some(_)) => {
                self.current = Some(id.0);
                Ok(())
            }
            _ => {
                let err = Error::InvalidArgument(format!("context handle {}", id.0));
                self.record(&err);
                Err(err)
            }
        }
    }

    /// The current context, if one is set.
    #[must_use]
    pub fn current(&self) -> Option<&Context> {
        self.contexts.get(self.current?)?.as_ref()
    }

    /// Mutable current context, if one is set.
    pub fn current_mut(&mut self) -> Option<&mut Context> {
        self.contexts.get_mut(self.current?)?.as_mut()
    }

    /// Look up a context by handle.
    #[must_use]
    pub fn get(&self, id: ContextId) -> Option<&Context> {
        self.contexts.get(id.0)?.as_ref()
    }

    /// Mutable lookup by handle.
    pub fn get_mut(&mut self, id: ContextId) -> Option<&mut Context> {
        self.contexts.get_mut(id.0)?.as_mut()
    }

    /// Record an error for sticky polling; only the first one before a
    /// drain sticks.
    pub fn record(&mut self, err: &Error) {
        if self.sticky.is_none() {
            self.sticky = Some(err.code());
        }
    }

    /// Drain the sticky error, if any.
    pub fn take_error(&mut self) -> Option<ErrorCode> {
        self.sticky.take()
    }
}
