//! End-to-end pipeline tests: immediate-mode rasterization and ray
//! tracing through the public context API.

#![allow(clippy::unwrap_used)]

use softray::prelude::*;

/// A context whose viewport matrix is the identity, so vertices arrive in
/// pixel coordinates.
fn pixel_space_context(size: u32) -> Context {
    let mut ctx = Context::new(size, size).unwrap();
    ctx.set_viewport(2, 2, -1, -1);
    ctx
}

#[test]
fn rasterizes_square_through_full_pipeline() {
    let mut ctx = Context::new(64, 64).unwrap();
    ctx.set_color(Color::WHITE);

    // unit square around the origin under an identity transform covers
    // the middle of the viewport
    ctx.begin(DrawMode::Polygon).unwrap();
    ctx.vertex2(-0.5, -0.5).unwrap();
    ctx.vertex2(0.5, -0.5).unwrap();
    ctx.vertex2(0.5, 0.5).unwrap();
    ctx.vertex2(-0.5, 0.5).unwrap();
    ctx.end().unwrap();

    let fb = ctx.framebuffer();
    assert_eq!(fb.get_pixel(32, 32), Some(Color::WHITE));
    assert_eq!(fb.get_pixel(2, 2), Some(Color::BLACK));
}

#[test]
fn matrix_transforms_compose_on_vertices() {
    let mut ctx = pixel_space_context(32);
    ctx.set_color(Color::GREEN);

    ctx.translate(10.0, 10.0, 0.0);
    ctx.scale(2.0, 2.0, 1.0);

    ctx.begin(DrawMode::Points).unwrap();
    ctx.vertex2(3.0, 0.0).unwrap(); // lands at (10 + 6, 10)
    ctx.end().unwrap();

    assert_eq!(ctx.framebuffer().get_pixel(16, 10), Some(Color::GREEN));
}

#[test]
fn depth_tested_polygons_resolve_by_z() {
    let mut ctx = pixel_space_context(32);
    ctx.set_depth_test(true);

    ctx.set_color(Color::BLUE);
    ctx.begin(DrawMode::Polygon).unwrap();
    ctx.vertex3(0.0, 0.0, 4.0).unwrap();
    ctx.vertex3(16.0, 0.0, 4.0).unwrap();
    ctx.vertex3(16.0, 16.0, 4.0).unwrap();
    ctx.vertex3(0.0, 16.0, 4.0).unwrap();
    ctx.end().unwrap();

    // nearer red square drawn second wins everywhere it overlaps
    ctx.set_color(Color::RED);
    ctx.begin(DrawMode::Polygon).unwrap();
    ctx.vertex3(4.0, 4.0, 1.0).unwrap();
    ctx.vertex3(12.0, 4.0, 1.0).unwrap();
    ctx.vertex3(12.0, 12.0, 1.0).unwrap();
    ctx.vertex3(4.0, 12.0, 1.0).unwrap();
    ctx.end().unwrap();

    let fb = ctx.framebuffer();
    assert_eq!(fb.get_pixel(8, 8), Some(Color::RED));
    assert_eq!(fb.get_pixel(2, 2), Some(Color::BLUE));
}

#[test]
fn ray_traces_diffuse_sphere_scene() {
    let mut ctx = Context::new(64, 64).unwrap();

    // camera at (0, 10, 0) looking down -Y with +Z up
    ctx.set_matrix_mode(MatrixMode::ModelView);
    ctx.load_matrix(Mat4::from_array([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, -10.0, //
        0.0, 0.0, 0.0, 1.0,
    ]));
    ctx.set_matrix_mode(MatrixMode::Projection);
    ctx.ortho(-2.0, 2.0, -2.0, 2.0, 1.0, 20.0).unwrap();

    ctx.set_material(Material::diffuse(Color::RED));
    ctx.add_sphere(Vec3::new(0.0, 0.0, 0.0), 1.0);
    ctx.add_light(PointLight::new(Vec3::new(0.0, 5.0, 0.0), Color::WHITE));

    ctx.render_scene().unwrap();

    let fb = ctx.framebuffer();
    // silhouette center is lit red
    let center = fb.get_pixel(32, 32).unwrap();
    assert!(center.r > 0.5, "center should be lit, got {center:?}");
    assert_eq!(center.g, 0.0);
    assert_eq!(center.b, 0.0);
    // background elsewhere
    assert_eq!(fb.get_pixel(1, 1), Some(Color::BLACK));
}

#[test]
fn fully_specular_floor_recursion_stays_finite() {
    let mut ctx = Context::new(32, 32).unwrap();

    ctx.set_matrix_mode(MatrixMode::ModelView);
    ctx.load_matrix(Mat4::from_array([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, -10.0, //
        0.0, 0.0, 0.0, 1.0,
    ]));
    ctx.set_matrix_mode(MatrixMode::Projection);
    ctx.ortho(-4.0, 4.0, -4.0, 4.0, 1.0, 20.0).unwrap();

    // fully specular floor square below the camera
    ctx.set_material(Material::new(Color::WHITE, 0.0, 1.0, 0.0, 0.0, 1.0));
    ctx.add_triangle(
        Vec3::new(-3.0, 0.0, -3.0),
        Vec3::new(3.0, 0.0, -3.0),
        Vec3::new(3.0, 0.0, 3.0),
    );
    ctx.add_triangle(
        Vec3::new(-3.0, 0.0, -3.0),
        Vec3::new(3.0, 0.0, 3.0),
        Vec3::new(-3.0, 0.0, 3.0),
    );
    ctx.add_light(PointLight::new(Vec3::new(0.0, 8.0, 0.0), Color::WHITE));

    ctx.render_scene().unwrap();

    // every pixel of the mirror render must stay finite
    assert!(ctx.color_data().iter().all(|c| c.is_finite()));
}

#[test]
fn sticky_error_polling_over_context_manager() {
    let mut mgr = ContextManager::new();
    let id = mgr.create_context(16, 16).unwrap();
    mgr.set_current(id).unwrap();

    let ctx = mgr.current_mut().unwrap();
    let first = ctx.pop_matrix().unwrap_err();
    mgr.record(&first);

    let ctx = mgr.current_mut().unwrap();
    let second = ctx.begin(DrawMode::Points).and_then(|()| ctx.begin(DrawMode::Points));
    mgr.record(&second.unwrap_err());

    // first error wins, a drain resets
    assert_eq!(mgr.take_error(), Some(ErrorCode::StackUnderflow));
    assert_eq!(mgr.take_error(), None);
}

#[test]
fn png_roundtrip_writes_file() {
    let mut ctx = pixel_space_context(16);
    ctx.set_color(Color::WHITE);
    ctx.begin(DrawMode::Lines).unwrap();
    ctx.vertex2(0.0, 8.0).unwrap();
    ctx.vertex2(15.0, 8.0).unwrap();
    ctx.end().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("line.png");
    PngEncoder::write_to_file(ctx.framebuffer(), &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
}
