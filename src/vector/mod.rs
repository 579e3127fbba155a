pub mod clip;
pub mod horizon;
pub mod pointmap;

pub use clip::RectClipper;
pub use horizon::{clip_polyline, HorizonGeometry};
pub use pointmap::{detail_for_radius, PointMap, PolyPoint, Polyline, DETAIL_MAX};

use glam::DVec2;

use crate::canvas::Canvas;
use crate::geometry::draw_polyline;
use crate::rotation::Orientation;
use crate::theme::{LayerStyles, VectorLayer};

/// Culling cutoffs of one vector layer.
///
/// `z_bbox` gates whole polylines by their rotated boundary points,
/// `z_point` sizes the circle where horizon crossings are placed. A
/// negative value defers entirely to the screen-derived bound.
#[derive(Debug, Clone, Copy)]
pub struct ClipLimits {
    pub z_bbox: f64,
    pub z_point: f64,
}

/// Cutoffs per layer. Lakes are small and frequent, so they are culled
/// aggressively; rivers and borders follow whatever the screen excerpt
/// allows.
pub fn layer_limits(layer: VectorLayer) -> ClipLimits {
    match layer {
        VectorLayer::Coastlines => ClipLimits {
            z_bbox: 0.4,
            z_point: 0.0,
        },
        VectorLayer::Lakes => ClipLimits {
            z_bbox: 0.95,
            z_point: 0.98,
        },
        VectorLayer::Rivers => ClipLimits {
            z_bbox: -1.0,
            z_point: -1.0,
        },
        VectorLayer::Borders => ClipLimits {
            z_bbox: -1.0,
            z_point: -1.0,
        },
    }
}

/// The screen bound only ever loosens a layer's own cutoff: when the
/// whole globe fits, even back-facing-adjacent polylines stay eligible.
fn effective_limit(given: f64, screen: f64) -> f64 {
    if given < 0.0 {
        screen
    } else {
        given.min(screen)
    }
}

/// Paints vector layers onto the canvas.
///
/// Each polyline passes four stages: a cull against the rotated boundary
/// box, a per-node detail cut, the horizon clip, and the viewport clip
/// once the globe overflows the screen.
#[derive(Debug, Default)]
pub struct VectorComposer {
    scratch: Vec<(DVec2, f64)>,
}

impl VectorComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws one layer of `map`, returning how many polyline pieces
    /// reached the canvas.
    pub fn paint_layer(
        &mut self,
        canvas: &mut Canvas,
        map: &PointMap,
        layer: VectorLayer,
        styles: &LayerStyles,
        orientation: Orientation,
        radius: f64,
    ) -> usize {
        // The vector globe sits one pixel inside the raster one, so the
        // coastline never pokes out of the texture's rim.
        let r = (radius - 1.0).max(1.0);
        let half_w = canvas.width() as f64 / 2.0;
        let half_h = canvas.height() as f64 / 2.0;
        let img_radius_sq = half_w * half_w + half_h * half_h;
        let screen_limit = if img_radius_sq < r * r {
            (1.0 - img_radius_sq / (r * r)).sqrt()
        } else {
            0.0
        };

        let limits = layer_limits(layer);
        let z_bbox = effective_limit(limits.z_bbox, screen_limit);
        let geometry =
            HorizonGeometry::with_point_limit(canvas.width(), canvas.height(), r, limits.z_point);
        let use_rect = r > half_w || r > half_h;
        let rect = RectClipper::new(canvas.width(), canvas.height());

        let matrix = orientation.to_matrix();
        let cut = detail_for_radius(r);
        let style = styles.get(layer);
        let mut drawn = 0;

        for polyline in map.polylines() {
            if !polyline.boundary().iter().any(|b| (matrix * *b).z > z_bbox) {
                continue;
            }
            self.scratch.clear();
            for point in polyline.points() {
                if point.detail < cut {
                    continue;
                }
                let s = matrix * point.unit;
                let screen = DVec2::new(half_w + r * s.x, half_h - r * s.y);
                if self.scratch.last().map(|&(p, _)| p) == Some(screen) {
                    continue;
                }
                self.scratch.push((screen, s.z));
            }
            let closed = polyline.is_closed();
            for piece in clip_polyline(&geometry, self.scratch.drain(..), closed) {
                if !use_rect {
                    draw_polyline(canvas, &piece, closed, style.width, style.color);
                    drawn += 1;
                } else if closed {
                    let ring = rect.clip_ring(&piece);
                    if !ring.is_empty() {
                        draw_polyline(canvas, &ring, true, style.width, style.color);
                        drawn += 1;
                    }
                } else {
                    for run in rect.clip_runs(&piece) {
                        draw_polyline(canvas, &run, false, style.width, style.color);
                        drawn += 1;
                    }
                }
            }
        }
        drawn
    }
}
