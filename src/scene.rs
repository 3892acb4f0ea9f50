//! Scene model for the ray tracer: materials, lights, primitives and the
//! intersection routines.
//!
//! Primitives form a closed enum; intersection dispatch is an explicit
//! match, not virtual dispatch. Near-parallel and out-of-interval cases
//! report "no hit" rather than erroring.

use crate::color::Color;
use crate::math::Vec3;

/// Determinant threshold below which a ray counts as parallel to a
/// triangle's plane.
pub const INTERSECT_EPSILON: f32 = 1e-6;

/// Phong material attached to a primitive at creation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Diffuse color.
    pub color: Color,
    /// Diffuse coefficient.
    pub diffuse: f32,
    /// Specular coefficient; also scales reflected contributions.
    pub specular: f32,
    /// Shininess exponent.
    pub shine: f32,
    /// Transmittance; scales refracted contributions.
    pub transmittance: f32,
    /// Index of refraction.
    pub ior: f32,
}

impl Material {
    /// Create a material from the full coefficient set.
    #[must_use]
    pub const fn new(
        color: Color,
        diffuse: f32,
        specular: f32,
        shine: f32,
        transmittance: f32,
        ior: f32,
    ) -> Self {
        Self { color, diffuse, specular, shine, transmittance, ior }
    }

    /// Purely diffuse material of the given color.
    #[must_use]
    pub const fn diffuse(color: Color) -> Self {
        Self::new(color, 1.0, 0.0, 0.0, 0.0, 1.0)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Color::BLACK)
    }
}

/// A point light: position and color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// World-space position.
    pub position: Vec3,
    /// Emitted color.
    pub color: Color,
}

impl PointLight {
    /// Create a point light.
    #[must_use]
    pub const fn new(position: Vec3, color: Color) -> Self {
        Self { position, color }
    }
}

/// A ray with a valid parametric interval and a recursion depth counter.
///
/// Camera, shadow, reflection and refraction rays are all fresh values;
/// rays are never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin point.
    pub origin: Vec3,
    /// Direction (unit length for camera and secondary rays).
    pub direction: Vec3,
    /// Lower bound of the valid interval (exclusive).
    pub tmin: f32,
    /// Upper bound of the valid interval (exclusive).
    pub tmax: f32,
    /// Recursion depth; 0 for camera rays.
    pub depth: u32,
}

impl Ray {
    /// Camera ray over the unbounded interval at depth 0.
    #[must_use]
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction, tmin: 0.0, tmax: f32::MAX, depth: 0 }
    }

    /// Secondary ray spawned by a shading event.
    #[must_use]
    pub const fn spawned(origin: Vec3, direction: Vec3, depth: u32) -> Self {
        Self { origin, direction, tmin: 0.0, tmax: f32::MAX, depth }
    }

    /// Copy with a shortened valid interval.
    #[must_use]
    pub fn with_tmax(mut self, tmax: f32) -> Self {
        self.tmax = tmax;
        self
    }

    /// Point at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Open-interval membership test for a hit parameter.
    #[inline]
    #[must_use]
    pub fn contains(&self, t: f32) -> bool {
        t > self.tmin && t < self.tmax
    }
}

/// Nearest known intersection during one scene query.
///
/// Intersectors only lower `distance` and overwrite `normal`; the scene
/// scan records which primitive produced the winning hit.
#[derive(Debug, Clone, Copy)]
pub struct HitInfo {
    /// Distance along the ray to the nearest accepted hit.
    pub distance: f32,
    /// Shading normal at the nearest accepted hit.
    pub normal: Vec3,
    /// Index of the winning primitive, set by the scene scan.
    pub primitive: Option<usize>,
}

impl HitInfo {
    /// An empty record at infinite distance.
    #[must_use]
    pub const fn new() -> Self {
        Self { distance: f32::INFINITY, normal: Vec3::ZERO, primitive: None }
    }
}

impl Default for HitInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// A triangle with precomputed edge vectors and unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Base vertex.
    pub a: Vec3,
    /// Second vertex.
    pub b: Vec3,
    /// Third vertex.
    pub c: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    normal: Vec3,
}

impl Triangle {
    /// Build a triangle, precomputing `b - a`, `c - a` and their unit
    /// cross product.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let edge1 = b - a;
        let edge2 = c - a;
        let normal = edge1.cross(edge2).normalized();
        Self { a, b, c, edge1, edge2, normal }
    }

    /// Geometric unit normal.
    #[must_use]
    pub const fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Double-sided ray test.
    ///
    /// Rejects near-parallel rays (`|det| < INTERSECT_EPSILON`), checks the
    /// barycentric bounds u then v, and accepts a parameter strictly inside
    /// the ray's interval. On an accepted hit that improves on `hit`, writes
    /// distance and normal. Returns whether the ray hit at all, improvement
    /// or not.
    pub fn intersect(&self, ray: &Ray, hit: &mut HitInfo) -> bool {
        let pvec = ray.direction.cross(self.edge2);
        let det = self.edge1.dot(pvec);
        if det.abs() < INTERSECT_EPSILON {
            return false;
        }
        let inv_det = 1.0 / det;

        let tvec = ray.origin - self.a;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return false;
        }

        let qvec = tvec.cross(self.edge1);
        let v = ray.direction.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return false;
        }

        let t = self.edge2.dot(qvec) * inv_det;
        if !ray.contains(t) {
            return false;
        }

        if t < hit.distance {
            hit.distance = t;
            hit.normal = self.normal;
        }
        true
    }

    /// Barycentric coordinates (u, v) of a ray's plane hit, for callers
    /// that need the weights rather than the boolean test.
    #[must_use]
    pub fn barycentric(&self, ray: &Ray) -> Option<(f32, f32)> {
        let pvec = ray.direction.cross(self.edge2);
        let det = self.edge1.dot(pvec);
        if det.abs() < INTERSECT_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let tvec = ray.origin - self.a;
        let u = tvec.dot(pvec) * inv_det;
        let qvec = tvec.cross(self.edge1);
        let v = ray.direction.dot(qvec) * inv_det;
        Some((u, v))
    }
}

/// A sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center point.
    pub center: Vec3,
    /// Radius.
    pub radius: f32,
}

impl Sphere {
    /// Create a sphere.
    #[must_use]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Ray test via the quadratic in the origin-to-center offset.
    ///
    /// A non-positive discriminant is a miss. The smaller root is
    /// preferred; when it lies behind the origin the larger one is tried.
    /// Accepts a parameter strictly inside the ray's interval and updates
    /// `hit` when closer.
    pub fn intersect(&self, ray: &Ray, hit: &mut HitInfo) -> bool {
        let dst = ray.origin - self.center;
        let b = dst.dot(ray.direction);
        let c = dst.dot(dst) - self.radius * self.radius;
        let d = b * b - c;

        if d <= 0.0 {
            return false;
        }

        let sqrt_d = d.sqrt();
        let mut t = -b - sqrt_d;
        if t < 0.0 {
            t = -b + sqrt_d;
        }

        if !ray.contains(t) {
            return false;
        }

        if t < hit.distance {
            hit.distance = t;
            hit.normal = (ray.at(t) - self.center).normalized();
        }
        true
    }
}

/// Closed set of shapes the tracer knows how to intersect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Triangle variant.
    Triangle(Triangle),
    /// Sphere variant.
    Sphere(Sphere),
}

impl Shape {
    /// Dispatch the ray test to the concrete shape.
    pub fn intersect(&self, ray: &Ray, hit: &mut HitInfo) -> bool {
        match self {
            Self::Triangle(t) => t.intersect(ray, hit),
            Self::Sphere(s) => s.intersect(ray, hit),
        }
    }
}

/// A shape with its material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    /// Geometric shape.
    pub shape: Shape,
    /// Material attached at creation time.
    pub material: Material,
}

/// The scene model: primitives, lights and the material applied to
/// primitives added next.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    primitives: Vec<Primitive>,
    lights: Vec<PointLight>,
    current_material: Material,
}

impl Scene {
    /// An empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the material attached to primitives added from now on.
    pub fn set_material(&mut self, material: Material) {
        self.current_material = material;
    }

    /// Add a sphere carrying the current material.
    pub fn add_sphere(&mut self, center: Vec3, radius: f32) {
        self.add_shape(Shape::Sphere(Sphere::new(center, radius)));
    }

    /// Add a triangle carrying the current material.
    pub fn add_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        self.add_shape(Shape::Triangle(Triangle::new(a, b, c)));
    }

    /// Add a shape carrying the current material.
    pub fn add_shape(&mut self, shape: Shape) {
        self.primitives.push(Primitive { shape, material: self.current_material });
    }

    /// Add a point light.
    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    /// Drop all primitives and lights; the current material survives.
    pub fn clear(&mut self) {
        self.primitives.clear();
        self.lights.clear();
    }

    /// The primitive list.
    #[must_use]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// The light list.
    #[must_use]
    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// Scan every primitive, keeping the nearest hit and recording which
    /// primitive produced it.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> HitInfo {
        let mut hit = HitInfo::new();
        for (index, primitive) in self.primitives.iter().enumerate() {
            let before = hit.distance;
            if primitive.shape.intersect(ray, &mut hit) && hit.distance < before {
                hit.primitive = Some(index);
            }
        }
        hit
    }

    /// Any-hit test for shadow rays: true when anything lies inside the
    /// ray's interval.
    #[must_use]
    pub fn occluded(&self, ray: &Ray) -> bool {
        let mut scratch = HitInfo::new();
        self.primitives
            .iter()
            .any(|p| p.shape.intersect(ray, &mut scratch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_through_center_two_roots() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        let origin = Vec3::new(0.0, 0.0, 5.0);
        let dir = Vec3::new(0.0, 0.0, -1.0);
        let ray = Ray::new(origin, dir);

        let mut hit = HitInfo::new();
        assert!(sphere.intersect(&ray, &mut hit));
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-5); // offset - 1

        // from the center the smaller root lies behind the origin and the
        // far surface wins: offset + 1 in total
        let from_center = Ray::new(ray.at(5.0), dir);
        let mut exit = HitInfo::new();
        assert!(sphere.intersect(&from_center, &mut exit));
        assert_relative_eq!(5.0 + exit.distance, 6.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_miss_with_perpendicular_offset() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        let ray = Ray::new(Vec3::new(2.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let mut hit = HitInfo::new();
        assert!(!sphere.intersect(&ray, &mut hit));
        assert!(hit.primitive.is_none());
        assert_eq!(hit.distance, f32::INFINITY);
    }

    #[test]
    fn test_sphere_normal_points_outward() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let mut hit = HitInfo::new();
        sphere.intersect(&ray, &mut hit);
        assert_relative_eq!(hit.normal.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_triangle_centroid_hit() {
        let tri = Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let centroid = Vec3::new(0.0, -1.0 / 3.0, 0.0);
        let ray = Ray::new(Vec3::new(centroid.x, centroid.y, 3.0), Vec3::new(0.0, 0.0, -1.0));

        let mut hit = HitInfo::new();
        assert!(tri.intersect(&ray, &mut hit));
        assert_relative_eq!(hit.distance, 3.0, epsilon = 1e-5);

        let (u, v) = tri.barycentric(&ray).unwrap();
        let w = 1.0 - u - v;
        assert_relative_eq!(u + v + w, 1.0, epsilon = 1e-5);
        assert_relative_eq!(u, 1.0 / 3.0, epsilon = 1e-4);
        assert_relative_eq!(v, 1.0 / 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_triangle_miss_outside_projection() {
        let tri = Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let ray = Ray::new(Vec3::new(5.0, 5.0, 3.0), Vec3::new(0.0, 0.0, -1.0));
        let mut hit = HitInfo::new();
        assert!(!tri.intersect(&ray, &mut hit));
    }

    #[test]
    fn test_triangle_is_double_sided() {
        let tri = Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let from_behind = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::new(0.0, 0.0, 1.0));
        let mut hit = HitInfo::new();
        assert!(tri.intersect(&from_behind, &mut hit));
    }

    #[test]
    fn test_triangle_parallel_ray_is_no_hit() {
        let tri = Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let parallel = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        let mut hit = HitInfo::new();
        assert!(!tri.intersect(&parallel, &mut hit));
    }

    #[test]
    fn test_scene_scan_records_nearest_primitive() {
        let mut scene = Scene::new();
        scene.set_material(Material::diffuse(Color::RED));
        scene.add_sphere(Vec3::new(0.0, 0.0, -10.0), 1.0);
        scene.add_sphere(Vec3::new(0.0, 0.0, -5.0), 1.0);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = scene.intersect(&ray);
        assert_eq!(hit.primitive, Some(1));
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_occlusion_respects_interval() {
        let mut scene = Scene::new();
        scene.add_sphere(Vec3::new(0.0, 0.0, -5.0), 1.0);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(scene.occluded(&ray));
        // interval ends before the sphere
        assert!(!scene.occluded(&ray.with_tmax(3.0)));
    }
}
