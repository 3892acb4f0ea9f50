//! Point, line and circle rasterization.

use crate::color::Color;
use crate::framebuffer::Framebuffer;
use crate::geometry::Vertex;
use crate::raster::fill::fill_span;

/// Plot a single pixel with signed coordinates; negatives are clipped
/// here, the framebuffer clips the positive side.
#[inline]
pub(crate) fn plot(fb: &mut Framebuffer, x: i32, y: i32, color: Color) {
    if x >= 0 && y >= 0 {
        fb.set_pixel(x as u32, y as u32, color);
    }
}

/// Rasterize every vertex as a point stamp.
///
/// With `size = floor(point_size / 2)` of zero a single pixel is written.
/// Otherwise the stamp is the center plus the six offsets
/// `(+s,0) (0,+s) (+s,+s) (-s,0) (0,-s) (-s,-s)` — deliberately not a
/// full filled square.
pub fn draw_points(fb: &mut Framebuffer, vertices: &[Vertex], point_size: f32, color: Color) {
    let size = (point_size / 2.0) as i32;

    for v in vertices {
        let x = v.x as i32;
        let y = v.y as i32;

        if size == 0 {
            plot(fb, x, y, color);
        } else {
            plot(fb, x, y, color);
            plot(fb, x + size, y + size, color);
            plot(fb, x + size, y, color);
            plot(fb, x, y + size, color);
            plot(fb, x - size, y - size, color);
            plot(fb, x - size, y, color);
            plot(fb, x, y - size, color);
        }
    }
}

/// Rasterize one segment with Bresenham's algorithm.
///
/// The driving axis is whichever spans more pixels; the walk always goes
/// from the lower to the higher driving-axis coordinate and the minor
/// axis steps by one whenever twice the accumulated error reaches the
/// major delta. Both endpoints are plotted.
pub fn draw_line(fb: &mut Framebuffer, a: Vertex, b: Vertex, color: Color) {
    let steep = (b.y - a.y).abs() > (b.x - a.x).abs();

    let (mut x0, mut y0, mut x1, mut y1) = if steep {
        (a.y as i32, a.x as i32, b.y as i32, b.x as i32)
    } else {
        (a.x as i32, a.y as i32, b.x as i32, b.y as i32)
    };

    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let dx = x1 - x0;
    let dy = (y1 - y0).abs();
    let y_step = if y0 < y1 { 1 } else { -1 };

    let mut err = 0;
    let mut y = y0;
    for x in x0..=x1 {
        if steep {
            plot(fb, y, x, color);
        } else {
            plot(fb, x, y, color);
        }

        err += dy;
        if 2 * err >= dx {
            y += y_step;
            err -= dx;
        }
    }
}

/// Rasterize the vertex buffer as independent segment pairs.
pub fn draw_lines(fb: &mut Framebuffer, vertices: &[Vertex], color: Color) {
    for pair in vertices.chunks_exact(2) {
        draw_line(fb, pair[0], pair[1], color);
    }
}

/// Rasterize the vertex buffer as a connected strip.
pub fn draw_line_strip(fb: &mut Framebuffer, vertices: &[Vertex], color: Color) {
    for pair in vertices.windows(2) {
        draw_line(fb, pair[0], pair[1], color);
    }
}

/// Rasterize the vertex buffer as a closed loop (strip plus the
/// last-to-first segment).
pub fn draw_line_loop(fb: &mut Framebuffer, vertices: &[Vertex], color: Color) {
    draw_line_strip(fb, vertices, color);
    if vertices.len() > 2 {
        if let (Some(&last), Some(&first)) = (vertices.last(), vertices.first()) {
            draw_line(fb, last, first, color);
        }
    }
}

/// Rasterize a circle outline with the midpoint algorithm.
///
/// Starts at (radius, 0) with the integer decision variable `cd2` and
/// plots eight symmetric offsets per step while `x > y`, after seeding
/// the four cardinal points.
pub fn draw_circle_outline(fb: &mut Framebuffer, cx: i32, cy: i32, radius: i32, color: Color) {
    if radius <= 0 {
        if radius == 0 {
            plot(fb, cx, cy, color);
        }
        return;
    }

    plot(fb, cx - radius, cy, color);
    plot(fb, cx + radius, cy, color);
    plot(fb, cx, cy - radius, color);
    plot(fb, cx, cy + radius, color);

    let mut x = radius;
    let mut y = 0;
    let mut cd2 = 0;

    while x > y {
        x -= 1;
        y += 1;
        cd2 -= x - y;
        if cd2 < 0 {
            cd2 += x;
            x += 1;
        }

        plot(fb, cx - x, cy - y, color);
        plot(fb, cx - y, cy - x, color);
        plot(fb, cx + y, cy - x, color);
        plot(fb, cx + x, cy - y, color);
        plot(fb, cx - x, cy + y, color);
        plot(fb, cx - y, cy + x, color);
        plot(fb, cx + y, cy + x, color);
        plot(fb, cx + x, cy + y, color);
    }
}

/// Rasterize a filled circle: the same midpoint walk, filling the four
/// symmetric horizontal spans per step instead of plotting offsets.
pub fn draw_circle_filled(fb: &mut Framebuffer, cx: i32, cy: i32, radius: i32, color: Color) {
    if radius <= 0 {
        if radius == 0 {
            plot(fb, cx, cy, color);
        }
        return;
    }

    fill_span(fb, (cx - radius) as f32, (cx + radius) as f32, cy, color);

    let mut x = radius;
    let mut y = 0;
    let mut cd2 = 0;

    while x > y {
        x -= 1;
        y += 1;
        cd2 -= x - y;
        if cd2 < 0 {
            cd2 += x;
            x += 1;
        }

        fill_span(fb, (cx - x) as f32, (cx + x) as f32, cy - y, color);
        fill_span(fb, (cx - y) as f32, (cx + y) as f32, cy + x, color);
        fill_span(fb, (cx - x) as f32, (cx + x) as f32, cy + y, color);
        fill_span(fb, (cx - y) as f32, (cx + y) as f32, cy - x, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn lit_pixels(fb: &Framebuffer) -> HashSet<(i32, i32)> {
        let mut set = HashSet::new();
        for y in 0..fb.height() {
            for x in 0..fb.width() {
                if fb.get_pixel(x, y) != Some(Color::BLACK) {
                    set.insert((x as i32, y as i32));
                }
            }
        }
        set
    }

    #[test]
    fn test_horizontal_line_is_pixel_exact() {
        let mut fb = Framebuffer::new(16, 16).unwrap();
        draw_line(&mut fb, Vertex::xy(0.0, 0.0), Vertex::xy(4.0, 0.0), Color::WHITE);

        let expected: HashSet<_> = (0..=4).map(|x| (x, 0)).collect();
        assert_eq!(lit_pixels(&fb), expected);
    }

    #[test]
    fn test_diagonal_line_is_pixel_exact() {
        let mut fb = Framebuffer::new(16, 16).unwrap();
        draw_line(&mut fb, Vertex::xy(0.0, 0.0), Vertex::xy(4.0, 4.0), Color::WHITE);

        let expected: HashSet<_> = (0..=4).map(|i| (i, i)).collect();
        assert_eq!(lit_pixels(&fb), expected);
    }

    #[test]
    fn test_line_endpoint_order_is_irrelevant() {
        let mut forward = Framebuffer::new(32, 32).unwrap();
        let mut backward = Framebuffer::new(32, 32).unwrap();
        draw_line(&mut forward, Vertex::xy(2.0, 3.0), Vertex::xy(20.0, 11.0), Color::WHITE);
        draw_line(&mut backward, Vertex::xy(20.0, 11.0), Vertex::xy(2.0, 3.0), Color::WHITE);
        assert_eq!(lit_pixels(&forward), lit_pixels(&backward));
    }

    #[test]
    fn test_steep_line_walks_y() {
        let mut fb = Framebuffer::new(16, 16).unwrap();
        draw_line(&mut fb, Vertex::xy(3.0, 0.0), Vertex::xy(3.0, 6.0), Color::WHITE);

        let expected: HashSet<_> = (0..=6).map(|y| (3, y)).collect();
        assert_eq!(lit_pixels(&fb), expected);
    }

    #[test]
    fn test_point_stamp_shape() {
        let mut fb = Framebuffer::new(16, 16).unwrap();
        draw_points(&mut fb, &[Vertex::xy(8.0, 8.0)], 4.0, Color::WHITE);

        let expected: HashSet<_> = [
            (8, 8),
            (10, 10),
            (10, 8),
            (8, 10),
            (6, 6),
            (6, 8),
            (8, 6),
        ]
        .into_iter()
        .collect();
        assert_eq!(lit_pixels(&fb), expected);
    }

    #[test]
    fn test_point_size_one_is_single_pixel() {
        let mut fb = Framebuffer::new(8, 8).unwrap();
        draw_points(&mut fb, &[Vertex::xy(4.0, 4.0)], 1.0, Color::WHITE);
        assert_eq!(lit_pixels(&fb).len(), 1);
    }

    #[test]
    fn test_circle_symmetric_under_quarter_turns() {
        let mut fb = Framebuffer::new(32, 32).unwrap();
        draw_circle_outline(&mut fb, 16, 16, 5, Color::WHITE);

        let centered: HashSet<_> = lit_pixels(&fb)
            .into_iter()
            .map(|(x, y)| (x - 16, y - 16))
            .collect();
        let rotated: HashSet<_> = centered.iter().map(|&(x, y)| (-y, x)).collect();
        assert_eq!(centered, rotated);
    }

    #[test]
    fn test_filled_circle_covers_center_row() {
        let mut fb = Framebuffer::new(32, 32).unwrap();
        draw_circle_filled(&mut fb, 16, 16, 5, Color::WHITE);

        for x in 11..21 {
            assert_eq!(fb.get_pixel(x, 16), Some(Color::WHITE), "x = {x}");
        }
        assert_eq!(fb.get_pixel(16, 16), Some(Color::WHITE));
        assert_eq!(fb.get_pixel(25, 16), Some(Color::BLACK));
    }

    #[test]
    fn test_line_loop_closes() {
        let mut fb = Framebuffer::new(16, 16).unwrap();
        let verts = [Vertex::xy(1.0, 1.0), Vertex::xy(9.0, 1.0), Vertex::xy(9.0, 9.0)];
        draw_line_loop(&mut fb, &verts, Color::WHITE);

        // closing segment from (9,9) back to (1,1)
        assert_eq!(fb.get_pixel(5, 5), Some(Color::WHITE));
    }

    #[test]
    fn test_out_of_bounds_line_is_clipped() {
        let mut fb = Framebuffer::new(8, 8).unwrap();
        draw_line(&mut fb, Vertex::xy(-5.0, -5.0), Vertex::xy(12.0, 12.0), Color::WHITE);
        assert_eq!(fb.get_pixel(4, 4), Some(Color::WHITE));
    }

    proptest! {
        #[test]
        fn prop_circle_quarter_turn_invariance(radius in 1i32..24) {
            let mut fb = Framebuffer::new(64, 64).unwrap();
            draw_circle_outline(&mut fb, 32, 32, radius, Color::WHITE);

            let centered: HashSet<_> = lit_pixels(&fb)
                .into_iter()
                .map(|(x, y)| (x - 32, y - 32))
                .collect();
            let rotated: HashSet<_> = centered.iter().map(|&(x, y)| (-y, x)).collect();
            prop_assert_eq!(centered, rotated);
        }
    }
}
