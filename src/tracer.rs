//! Recursive Whitted-style ray tracer.
//!
//! Generates camera rays from the inverse view-projection transform,
//! intersects them against the scene model and shades hits with the Phong
//! model plus shadow, reflection and refraction rays. Owns its own
//! hidden-surface resolution via nearest-hit; the depth buffer is never
//! touched.

use crate::color::Color;
use crate::context::Viewport;
use crate::framebuffer::Framebuffer;
use crate::geometry::Vertex;
use crate::math::{Mat4, Vec3};
use crate::scene::{Material, Ray, Scene};

/// Hard recursion cutoff: rays deeper than this shade to black.
pub const MAX_RAY_DEPTH: u32 = 8;

/// Ceiling on the exponentiated specular intensity.
const SPECULAR_CEILING: f32 = 10_000.0;

/// Offset applied along a spawned ray's direction, and subtracted from a
/// shadow ray's far bound, so surfaces do not immediately re-intersect
/// themselves.
const RAY_EPSILON: f32 = 1e-4;

/// One render pass over an immutable scene.
pub struct RayTracer<'a> {
    scene: &'a Scene,
    inverse_mvp: Mat4,
    viewport: Viewport,
    background: Color,
}

impl<'a> RayTracer<'a> {
    /// Set up a pass from the composed projection x model-view transform.
    #[must_use]
    pub fn new(scene: &'a Scene, mvp: &Mat4, viewport: Viewport, background: Color) -> Self {
        Self {
            scene,
            inverse_mvp: mvp.inverse(),
            viewport,
            background,
        }
    }

    /// Build the camera ray for a pixel.
    ///
    /// The pixel center maps to normalized device coordinates in
    /// `[-1, 1]`; the near-plane and far-plane points go through the
    /// inverse transform and a perspective divide, the near point becomes
    /// the origin and the normalized far-minus-near difference the
    /// direction.
    #[must_use]
    pub fn generate_ray(&self, x: u32, y: u32) -> Ray {
        let ndc_x = 2.0 * (x as f32 + 0.5) / self.viewport.width as f32 - 1.0;
        let ndc_y = 2.0 * (y as f32 + 0.5) / self.viewport.height as f32 - 1.0;

        let near = Vertex::new(ndc_x, ndc_y, -1.0, 1.0)
            .transformed(&self.inverse_mvp)
            .w_normalized()
            .to_vec3();
        let far = Vertex::new(ndc_x, ndc_y, 1.0, 1.0)
            .transformed(&self.inverse_mvp)
            .w_normalized()
            .to_vec3();

        Ray::new(near, (far - near).normalized())
    }

    /// Trace the camera ray for a pixel.
    #[must_use]
    pub fn cast_ray(&self, x: u32, y: u32) -> Color {
        self.trace(&self.generate_ray(x, y))
    }

    /// Trace a ray to a color: background on a miss, shading on the
    /// nearest hit, black past the recursion cutoff.
    #[must_use]
    pub fn trace(&self, ray: &Ray) -> Color {
        if ray.depth > MAX_RAY_DEPTH {
            return Color::BLACK;
        }

        let hit = self.scene.intersect(ray);
        match hit.primitive {
            None => self.background,
            Some(index) => {
                let material = self.scene.primitives()[index].material;
                let point = ray.at(hit.distance);
                let normal = hit.normal;

                let mut total = Color::BLACK;
                total += self.direct_lighting(ray, point, normal, &material);
                total += self.reflected(ray, point, normal, &material);
                total += self.refracted(ray, point, normal, &material);
                total
            }
        }
    }

    /// Render every viewport pixel into the color buffer.
    pub fn render(&self, fb: &mut Framebuffer) {
        for y in 0..self.viewport.height {
            for x in 0..self.viewport.width {
                let color = self.cast_ray(x, y);
                let px = self.viewport.x + x as i32;
                let py = self.viewport.y + y as i32;
                if px >= 0 && py >= 0 {
                    fb.set_pixel(px as u32, py as u32, color);
                }
            }
        }
    }

    /// Phong diffuse and specular terms over all unoccluded lights.
    fn direct_lighting(
        &self,
        ray: &Ray,
        point: Vec3,
        normal: Vec3,
        material: &Material,
    ) -> Color {
        let mut total = Color::BLACK;

        for light in self.scene.lights() {
            let to_light = light.position - point;
            let light_dir = to_light.normalized();
            let n_dot_l = normal.dot(light_dir);
            if n_dot_l <= 0.0 {
                continue;
            }

            // shadow ray runs from the light toward the hit point, its far
            // bound pulled in so the lit surface itself is not an occluder
            let distance = to_light.length();
            let shadow = Ray::new(light.position, -light_dir).with_tmax(distance - RAY_EPSILON);
            if self.scene.occluded(&shadow) {
                continue;
            }

            total += material.color * light.color * (material.diffuse * n_dot_l);

            if material.shine > 0.0 {
                let reflect_dir = normal * (2.0 * n_dot_l) - light_dir;
                let view_dir = -ray.direction;
                let r_dot_v = reflect_dir.dot(view_dir).max(0.0);
                let intensity = r_dot_v.powf(material.shine).min(SPECULAR_CEILING);
                total += light.color * (material.specular * intensity);
            }
        }

        total
    }

    /// Mirror contribution, fired only for specular materials.
    fn reflected(
        &self,
        ray: &Ray,
        point: Vec3,
        normal: Vec3,
        material: &Material,
    ) -> Color {
        if material.specular <= 0.0 {
            return Color::BLACK;
        }

        let d = ray.direction;
        let reflect_dir = d - normal * (2.0 * d.dot(normal));
        let spawned = Ray::spawned(point + reflect_dir * RAY_EPSILON, reflect_dir, ray.depth + 1);
        self.trace(&spawned) * material.specular
    }

    /// Transmitted contribution, fired only for transmissive materials.
    /// Total internal reflection contributes nothing.
    fn refracted(
        &self,
        ray: &Ray,
        point: Vec3,
        normal: Vec3,
        material: &Material,
    ) -> Color {
        if material.transmittance <= 0.0 {
            return Color::BLACK;
        }

        match refract(ray.direction, normal, material.ior) {
            None => Color::BLACK,
            Some(refract_dir) => {
                let spawned =
                    Ray::spawned(point + refract_dir * RAY_EPSILON, refract_dir, ray.depth + 1);
                self.trace(&spawned) * material.transmittance
            }
        }
    }
}

/// Snell refraction of unit direction `d` at a surface with unit normal
/// `n` and refraction index `ior`.
///
/// The ratio flips and the normal negates depending on whether the ray is
/// entering or exiting (sign of `d . n`). Returns `None` on total
/// internal reflection.
fn refract(d: Vec3, n: Vec3, ior: f32) -> Option<Vec3> {
    let d_dot_n = d.dot(n);
    let (gamma, normal, cos_in) = if d_dot_n < 0.0 {
        (1.0 / ior, n, -d_dot_n)
    } else {
        (ior, -n, d_dot_n)
    };

    let discriminant = 1.0 - gamma * gamma * (1.0 - cos_in * cos_in);
    if discriminant < 0.0 {
        return None;
    }

    Some((d * gamma + normal * (gamma * cos_in - discriminant.sqrt())).normalized())
}
