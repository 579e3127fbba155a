use std::f64::consts::{FRAC_PI_2, PI};

use glam::{DMat3, DVec2, DVec3};

use crate::canvas::Canvas;
use crate::geometry::draw_polyline;
use crate::rotation::Orientation;
use crate::theme::LayerStyle;
use crate::vector::clip::RectClipper;
use crate::vector::horizon::{horizon_point, HorizonGeometry};

/// Obliquity of the ecliptic, 23 degrees 26 minutes 21 seconds.
const AXIAL_TILT: f64 = (23.0 + 26.0 / 60.0 + 21.0 / 3600.0) * PI / 180.0;

/// Grid density for a globe radius: meridian slots per quarter turn and
/// latitude circle slots per quarter sphere.
fn circle_counts(radius: f64) -> (i32, i32) {
    if radius > 3200.0 {
        (32, 24)
    } else if radius > 1600.0 {
        (16, 12)
    } else if radius > 700.0 {
        (8, 6)
    } else if radius > 400.0 {
        (4, 3)
    } else if radius > 100.0 {
        (2, 3)
    } else {
        (2, 1)
    }
}

/// Sampling steps per circle quarter.
fn circle_precision(radius: f64) -> f64 {
    if radius > 3200.0 {
        40.0
    } else if radius > 700.0 {
        30.0
    } else if radius > 400.0 {
        20.0
    } else {
        10.0
    }
}

#[derive(Clone, Copy)]
enum Circle {
    Latitude,
    Longitude,
}

/// Paints the coordinate grid: latitude and longitude circles, the
/// equator, and past radius 400 the tropics and polar circles.
#[derive(Debug, Default)]
pub struct GraticuleRenderer {
    scratch: Vec<DVec2>,
}

impl GraticuleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the full graticule, returning how many polyline pieces
    /// reached the canvas.
    pub fn paint(
        &mut self,
        canvas: &mut Canvas,
        style: LayerStyle,
        orientation: Orientation,
        radius: f64,
    ) -> usize {
        let (lon_num, lat_num) = circle_counts(radius);
        let half = DVec2::new(canvas.width() as f64 / 2.0, canvas.height() as f64 / 2.0);
        let use_rect = radius > half.x || radius > half.y;
        let mut painter = CirclePainter {
            rect: RectClipper::new(canvas.width(), canvas.height()),
            geometry: HorizonGeometry::with_point_limit(canvas.width(), canvas.height(), radius, 0.0),
            canvas,
            matrix: orientation.to_matrix(),
            use_rect,
            half,
            radius,
            precision: circle_precision(radius),
            style,
            polyline: std::mem::take(&mut self.scratch),
            drawn: 0,
        };

        let lat_spacing = FRAC_PI_2 / f64::from(lat_num);
        for i in 1..lat_num {
            let angle = f64::from(i) * lat_spacing;
            painter.circle(Circle::Latitude, angle, 0.0);
            painter.circle(Circle::Latitude, -angle, 0.0);
        }
        // The zero and ninety degree meridians run pole over pole; the
        // in-between ones stop at the outermost latitude circle.
        painter.circle(Circle::Longitude, 0.0, 0.0);
        painter.circle(Circle::Longitude, FRAC_PI_2, 0.0);
        for i in 1..lon_num {
            let angle = f64::from(i) * FRAC_PI_2 / f64::from(lon_num);
            painter.circle(Circle::Longitude, angle, lat_spacing);
            painter.circle(Circle::Longitude, -angle, lat_spacing);
        }

        painter.circle(Circle::Latitude, 0.0, 0.0);
        if radius > 400.0 {
            for lat in [
                AXIAL_TILT,
                -AXIAL_TILT,
                FRAC_PI_2 - AXIAL_TILT,
                AXIAL_TILT - FRAC_PI_2,
            ] {
                painter.circle(Circle::Latitude, lat, 0.0);
            }
        }

        let drawn = painter.drawn;
        self.scratch = std::mem::take(&mut painter.polyline);
        drawn
    }
}

struct CirclePainter<'a> {
    canvas: &'a mut Canvas,
    matrix: DMat3,
    geometry: HorizonGeometry,
    rect: RectClipper,
    use_rect: bool,
    half: DVec2,
    radius: f64,
    precision: f64,
    style: LayerStyle,
    polyline: Vec<DVec2>,
    drawn: usize,
}

impl CirclePainter<'_> {
    /// One full circle, drawn as four quarters. `cutoff` shortens each
    /// quarter by that angle at its far end.
    fn circle(&mut self, kind: Circle, angle: f64, cutoff: f64) {
        let cut_coeff = 1.0 - cutoff / FRAC_PI_2;
        let steps = (cut_coeff * self.precision) as i32;
        for quarter in 0..4 {
            let coeff = if quarter < 2 { 1.0 } else { -1.0 };
            let offset = f64::from(quarter % 2);
            self.quarter(kind, angle, coeff, offset, cut_coeff, steps);
        }
    }

    /// A quarter that leaves the visible hemisphere is finished at the
    /// horizon and abandoned; a later quarter picks the circle up again.
    fn quarter(
        &mut self,
        kind: Circle,
        angle: f64,
        coeff: f64,
        offset: f64,
        cut_coeff: f64,
        steps: i32,
    ) {
        self.polyline.clear();
        let mut last_screen = DVec2::ZERO;
        let mut last_visible = false;
        for j in 0..=steps {
            let itval = if j != steps {
                f64::from(j) / self.precision
            } else {
                cut_coeff
            };
            let dim = coeff * (FRAC_PI_2 * (offset - itval).abs() + offset * FRAC_PI_2);
            let (lon, lat) = match kind {
                Circle::Latitude => (dim, angle),
                Circle::Longitude => (angle, dim),
            };
            // Latitude runs past the pole on the rear half of a meridian;
            // plain trig wraps it onto the opposite meridian.
            let unit = DVec3::new(lat.cos() * lon.sin(), lat.sin(), lat.cos() * lon.cos());
            let s = self.matrix * unit;
            let screen = DVec2::new(
                self.half.x + self.radius * s.x,
                self.half.y - self.radius * s.y,
            );
            let visible = s.z >= 0.0;
            if j == 0 {
                last_visible = visible;
            }
            if visible != last_visible {
                let hp = horizon_point(&self.geometry, last_screen, screen, visible);
                self.polyline.push(hp);
                if last_visible {
                    self.flush();
                    return;
                }
            }
            if visible {
                self.polyline.push(screen);
            }
            last_screen = screen;
            last_visible = visible;
        }
        self.flush();
    }

    fn flush(&mut self) {
        if self.polyline.len() >= 2 {
            if self.use_rect {
                for run in self.rect.clip_runs(&self.polyline) {
                    draw_polyline(self.canvas, &run, false, self.style.width, self.style.color);
                    self.drawn += 1;
                }
            } else {
                draw_polyline(
                    self.canvas,
                    &self.polyline,
                    false,
                    self.style.width,
                    self.style.color,
                );
                self.drawn += 1;
            }
        }
        self.polyline.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::LayerStyles;

    fn pen() -> LayerStyle {
        LayerStyles::default().graticule
    }

    #[test]
    fn test_circle_density_tiers() {
        assert_eq!(circle_counts(4000.0), (32, 24));
        assert_eq!(circle_counts(2000.0), (16, 12));
        assert_eq!(circle_counts(800.0), (8, 6));
        assert_eq!(circle_counts(500.0), (4, 3));
        assert_eq!(circle_counts(200.0), (2, 3));
        assert_eq!(circle_counts(80.0), (2, 1));
        assert_eq!(circle_precision(4000.0), 40.0);
        assert_eq!(circle_precision(800.0), 30.0);
        assert_eq!(circle_precision(500.0), 20.0);
        assert_eq!(circle_precision(80.0), 10.0);
    }

    #[test]
    fn test_equator_and_prime_meridian_cross_the_face() {
        let mut canvas = Canvas::new(300, 300);
        let mut renderer = GraticuleRenderer::new();
        let drawn = renderer.paint(&mut canvas, pen(), Orientation::IDENTITY, 100.0);
        assert!(drawn > 0);
        // Equator runs horizontally through the center row.
        assert_eq!(canvas.pixel(200, 150), pen().color);
        // Prime meridian runs vertically through the center column.
        assert_eq!(canvas.pixel(150, 100), pen().color);
    }

    #[test]
    fn test_tropics_appear_past_radius_400() {
        let mut renderer = GraticuleRenderer::new();

        let mut canvas = Canvas::new(1000, 1000);
        renderer.paint(&mut canvas, pen(), Orientation::IDENTITY, 500.0);
        let row = (500.0 - 500.0 * AXIAL_TILT.sin()).round() as usize;
        assert_eq!(canvas.pixel(510, row), pen().color);

        let mut canvas = Canvas::new(1000, 1000);
        renderer.paint(&mut canvas, pen(), Orientation::IDENTITY, 390.0);
        let row = (500.0 - 390.0 * AXIAL_TILT.sin()).round() as usize;
        assert_eq!(canvas.pixel(510, row), 0);
    }

    #[test]
    fn test_all_pixels_stay_inside_the_rim() {
        let mut canvas = Canvas::new(300, 300);
        let mut renderer = GraticuleRenderer::new();
        let orientation = Orientation::from_spherical(1.0, 0.5);
        let drawn = renderer.paint(&mut canvas, pen(), orientation, 100.0);
        assert!(drawn > 0);
        let mut set = 0;
        for y in 0..300 {
            for x in 0..300 {
                if canvas.pixel(x, y) != 0 {
                    set += 1;
                    let d = DVec2::new(x as f64 - 150.0, y as f64 - 150.0).length();
                    assert!(d < 102.0, "pixel ({x}, {y}) outside the rim, d = {d}");
                }
            }
        }
        assert!(set > 100);
    }
}
