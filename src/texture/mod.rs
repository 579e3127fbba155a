pub mod colorize;

use std::f64::consts::{PI, TAU};

use glam::DVec3;

use crate::canvas::Canvas;
use crate::rotation::Orientation;
use crate::tile::{level_columns, level_rows, TileCache};

/// Lon/lat of the last fully projected pixel in a scanline, the left
/// endpoint for interpolated spans.
#[derive(Debug, Clone, Copy)]
struct InterpState {
    lon: f64,
    lat: f64,
}

/// Walk the n-1 interpolated pixels between two full projections, taking
/// the short way around the antimeridian when the endpoints straddle it.
/// `emit` receives (step, lon, lat) for steps 1..n.
fn for_each_interpolated<F>(prev: InterpState, lon: f64, lat: f64, n: i32, mut emit: F)
where
    F: FnMut(i32, f64, f64),
{
    let nf = f64::from(n);
    let lat_step = (lat - prev.lat) / nf;
    let dlon = lon - prev.lon;
    if dlon.abs() < PI {
        let lon_step = dlon / nf;
        for j in 1..n {
            let jf = f64::from(j);
            emit(j, prev.lon + lon_step * jf, prev.lat + lat_step * jf);
        }
        return;
    }
    // Seam crossing: the true arc is the complement of the raw delta.
    let step = (TAU - dlon.abs()) / nf;
    if prev.lon < lon {
        // Westward across the seam.
        for j in 1..n {
            let mut e = prev.lon - step * f64::from(j);
            if e <= -PI {
                e += TAU;
            }
            emit(j, e, prev.lat + lat_step * f64::from(j));
        }
    } else {
        // Eastward across the seam.
        for j in 1..n {
            let mut e = prev.lon + step * f64::from(j);
            if e > PI {
                e -= TAU;
            }
            emit(j, e, prev.lat + lat_step * f64::from(j));
        }
    }
}

/// Scanline renderer filling the visible globe disk with tile imagery.
///
/// Only every n-th pixel of a row is projected through the full inverse
/// rotation; the pixels between two such anchors interpolate lon/lat
/// linearly, which is indistinguishable at that spacing except near the
/// poles, where interpolation is disabled.
pub struct TextureMapper {
    width: usize,
    height: usize,
    /// Squared distance from the screen center to a corner.
    image_radius: f64,
    /// Stride that minimizes per-row work for this canvas width.
    n_opt: i32,
}

impl TextureMapper {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            image_radius: 0.0,
            n_opt: 2,
        }
    }

    /// Adopt a canvas size, recomputing the optimal stride.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        let half_w = (width / 2) as f64;
        let half_h = (height / 2) as f64;
        self.image_radius = half_w * half_w + half_h * half_h;

        let full = (width as i32 / 2) * 2;
        let mut n_opt = 2;
        let mut best = full;
        for it in 1..32 {
            let neval = full / it + full % it;
            if neval < best {
                best = neval;
                n_opt = it;
            }
        }
        self.n_opt = n_opt.max(2);
    }

    fn stride(&self, radius: f64) -> i32 {
        if self.image_radius < radius * radius {
            self.n_opt
        } else {
            8
        }
    }

    /// Render one frame of tile imagery. Brackets the cache's
    /// mark-and-sweep; pixels outside the globe disk are left untouched.
    pub fn map_texture(
        &mut self,
        canvas: &mut Canvas,
        cache: &mut TileCache,
        orientation: Orientation,
        radius: f64,
        interlaced: bool,
    ) {
        self.resize(canvas.width(), canvas.height());
        let level = cache.select_level(radius);
        cache.set_level(level);
        cache.reset_used_marks();

        let tile_size = i32::try_from(cache.theme().tile_size).unwrap_or(1).max(1);
        let global_w = f64::from(level_columns(level)) * f64::from(tile_size);
        let global_h = f64::from(level_rows(level)) * f64::from(tile_size);
        let rad2pix_x = global_w / TAU;
        let rad2pix_y = global_h / PI;

        let half_w = (self.width / 2) as i32;
        let half_h = (self.height / 2) as i32;
        let r = radius.max(1.0);
        let ri = r as i32;
        let n = self.stride(r);

        let rot = orientation.inverse().to_matrix();

        // Whichever pole is on the visible hemisphere breaks longitude
        // interpolation in its neighborhood.
        let np = orientation.rotate(DVec3::Y);
        let pole = if np.z >= 0.0 { np } else { -np };
        let pole_x = f64::from(half_w) + r * pole.x;
        let pole_y = f64::from(half_h) - r * pole.y;

        let sample = |cache: &mut TileCache, lon: f64, lat: f64| -> u32 {
            let gx = (global_w / 2.0 + lon * rad2pix_x).rem_euclid(global_w);
            let gy = (global_h / 2.0 - lat * rad2pix_y).clamp(0.0, global_h - 1.0);
            let gxi = gx as i32;
            let gyi = gy as i32;
            let column = gxi / tile_size;
            let row = gyi / tile_size;
            let tile = cache.load_tile(column, row);
            // Local coordinates stay inside the tile even when a file
            // deviates from the theme's declared size.
            let lx = (gxi - column * tile_size).clamp(0, tile.width as i32 - 1) as u32;
            let ly = (gyi - row * tile_size).clamp(0, tile.height as i32 - 1) as u32;
            tile.pixel(lx, ly)
        };

        let y_top = (half_h - ri).max(0);
        let y_bottom = (half_h + ri).min(self.height as i32);

        let mut y = y_top;
        while y < y_bottom {
            let dy = f64::from(half_h - y);
            let qy = dy / r;
            let qr2 = 1.0 - qy * qy;
            let rx = (r * r - dy * dy).max(0.0).sqrt();
            let x_left = ((f64::from(half_w) - rx) as i32).max(0);
            let x_right = ((f64::from(half_w) + rx) as i32).min(self.width as i32);
            if x_left >= x_right {
                y += 1;
                continue;
            }

            let full_width = x_left == 0 && x_right == self.width as i32;
            let (x_ip_left, x_ip_right) = if full_width {
                (1, n * (x_right / n - 1) + 1)
            } else {
                (n * (x_left / n + 1), n * (x_right / n - 1))
            };
            let near_pole_row = (f64::from(y) - pole_y).abs() < 0.75 * f64::from(n);

            let project = |x: i32| -> (f64, f64) {
                let qx = f64::from(x - half_w) / r;
                let qz = (qr2 - qx * qx).max(0.0).sqrt();
                let w = rot * DVec3::new(qx, qy, qz);
                (w.x.atan2(w.z), w.y.clamp(-1.0, 1.0).asin())
            };

            let mut prev: Option<InterpState> = None;
            let mut x = x_left;
            while x < x_right {
                let in_interval = x >= x_ip_left && x <= x_ip_right;
                let pole_interval = near_pole_row
                    && pole_x >= f64::from(x - 1)
                    && pole_x < f64::from(x + n);
                if in_interval && !pole_interval {
                    if let Some(state) = prev {
                        let anchor = x + n - 1;
                        let (lon, lat) = project(anchor);
                        let base_x = x - 1;
                        for_each_interpolated(state, lon, lat, n, |j, lon_j, lat_j| {
                            let color = sample(cache, lon_j, lat_j);
                            canvas.set_pixel_signed(base_x + j, y, color);
                        });
                        let color = sample(cache, lon, lat);
                        canvas.set_pixel_signed(anchor, y, color);
                        prev = Some(InterpState { lon, lat });
                        x = anchor + 1;
                        continue;
                    }
                }
                let (lon, lat) = project(x);
                let color = sample(cache, lon, lat);
                canvas.set_pixel_signed(x, y, color);
                prev = Some(InterpState { lon, lat });
                x += 1;
            }

            if interlaced && y + 1 < y_bottom {
                canvas.copy_row(y as usize, (y + 1) as usize);
                y += 2;
            } else {
                y += 1;
            }
        }

        cache.evict_unused();
    }
}

impl Default for TextureMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::GlobeTheme;
    use crate::tile::storage::{NullFetcher, ProceduralTiles};

    fn tiny_theme() -> GlobeTheme {
        let mut theme = GlobeTheme::new("texture-test", "Texture Test");
        theme.tile_size = 16;
        theme.max_tile_level = 3;
        theme
    }

    fn cache() -> TileCache {
        TileCache::new(Box::new(ProceduralTiles), Box::new(NullFetcher), &tiny_theme()).unwrap()
    }

    fn render(width: usize, height: usize, radius: f64) -> (Canvas, TileCache) {
        let mut canvas = Canvas::new(width, height);
        let mut tiles = cache();
        let mut mapper = TextureMapper::new();
        mapper.map_texture(
            &mut canvas,
            &mut tiles,
            Orientation::from_spherical(0.6, -0.2),
            radius,
            false,
        );
        (canvas, tiles)
    }

    #[test]
    fn test_interpolation_crosses_seam_without_jump() {
        let prev = InterpState {
            lon: (-179.0_f64).to_radians(),
            lat: 0.1,
        };
        let lon = 179.0_f64.to_radians();
        let mut lons = vec![prev.lon];
        for_each_interpolated(prev, lon, 0.1, 8, |_, l, _| lons.push(l));
        lons.push(lon);
        assert_eq!(lons.len(), 9);
        for pair in lons.windows(2) {
            let delta = crate::geo::normalize_lon(pair[1] - pair[0]);
            // Monotonic westward in small steps, never the long way round.
            assert!(delta < 0.0, "stepped east: {pair:?}");
            assert!(delta > -0.02, "jumped: {pair:?}");
        }
        for l in lons {
            assert!((-PI..=PI).contains(&l));
        }
    }

    #[test]
    fn test_interpolation_plain_span_is_linear() {
        let prev = InterpState { lon: 0.1, lat: 0.0 };
        let mut count = 0;
        for_each_interpolated(prev, 0.2, 0.1, 4, |j, lon, lat| {
            count += 1;
            let t = f64::from(j) / 4.0;
            assert!((lon - (0.1 + 0.1 * t)).abs() < 1e-12);
            assert!((lat - 0.1 * t).abs() < 1e-12);
        });
        assert_eq!(count, 3);
    }

    #[test]
    fn test_frame_touches_only_valid_addresses_and_is_deterministic() {
        let (canvas_a, tiles) = render(64, 48, 40.0);
        let (canvas_b, _) = render(64, 48, 40.0);
        assert!(!tiles.is_empty());
        for y in 0..48 {
            assert_eq!(canvas_a.row(y), canvas_b.row(y));
        }
    }

    #[test]
    fn test_pixels_outside_disk_untouched() {
        let (canvas, _) = render(64, 48, 10.0);
        // Corners lie far outside a radius-10 disk centered at (32, 24).
        assert_eq!(canvas.pixel(0, 0), 0);
        assert_eq!(canvas.pixel(63, 47), 0);
        // The center is inside and textured.
        assert_ne!(canvas.pixel(32, 24), 0);
    }

    #[test]
    fn test_interlaced_rows_duplicate_previous() {
        let mut canvas = Canvas::new(32, 32);
        let mut tiles = cache();
        let mut mapper = TextureMapper::new();
        mapper.map_texture(
            &mut canvas,
            &mut tiles,
            Orientation::IDENTITY,
            12.0,
            true,
        );
        // The topmost row of the span has no pixels (the disk tapers to a
        // point), so the first rendered row is one below it.
        let first_rendered = (16 - 12 + 1) as usize;
        assert!(canvas.row(first_rendered).iter().any(|&p| p != 0));
        assert_eq!(canvas.row(first_rendered), canvas.row(first_rendered + 1));
    }

    #[test]
    fn test_stride_prefers_optimum_when_globe_overflows() {
        let mut mapper = TextureMapper::new();
        mapper.resize(200, 100);
        // Image radius is 100^2 + 50^2; a larger globe radius flips to
        // the per-width optimum, a smaller one uses the coarse stride.
        assert_eq!(mapper.stride(80.0), 8);
        let fine = mapper.stride(1000.0);
        assert!(fine >= 2 && fine < 32);
    }
}
