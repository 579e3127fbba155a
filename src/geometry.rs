use glam::DVec2;

use crate::canvas::Canvas;

/// Draw a line using Bresenham's algorithm.
pub fn draw_line(canvas: &mut Canvas, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y, color);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a thicker line (borders stay readable over tile imagery).
pub fn draw_thick_line(canvas: &mut Canvas, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    draw_line(canvas, x0, y0, x1, y1, color);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1, color);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1, color);
}

/// Draw a polyline in screen coordinates, closing the ring when asked.
pub fn draw_polyline(canvas: &mut Canvas, points: &[DVec2], closed: bool, width: u32, color: u32) {
    if points.len() < 2 {
        if let Some(p) = points.first() {
            canvas.set_pixel_signed(p.x.round() as i32, p.y.round() as i32, color);
        }
        return;
    }
    let seg = |canvas: &mut Canvas, a: DVec2, b: DVec2| {
        let (x0, y0) = (a.x.round() as i32, a.y.round() as i32);
        let (x1, y1) = (b.x.round() as i32, b.y.round() as i32);
        if width > 1 {
            draw_thick_line(canvas, x0, y0, x1, y1, color);
        } else {
            draw_line(canvas, x0, y0, x1, y1, color);
        }
    };
    for pair in points.windows(2) {
        seg(canvas, pair[0], pair[1]);
    }
    if closed {
        seg(canvas, points[points.len() - 1], points[0]);
    }
}
