use std::fs;
use std::path::PathBuf;

use crate::canvas::rgb;
use crate::hash::{hash2, rand_unit};
use crate::theme::GlobeTheme;
use crate::tile::{level_columns, level_rows, Tile, TileError, TileId, TilePixels};

/// Backend that resolves tile addresses to pixel data.
pub trait TileStorage {
    /// True when the tile is available locally right now.
    fn tile_exists(&self, theme: &GlobeTheme, id: TileId) -> bool;

    /// Load and decode one tile.
    fn load(&self, theme: &GlobeTheme, id: TileId) -> Result<Tile, TileError>;

    /// Highest level with any local tiles for the theme.
    fn max_level(&self, theme: &GlobeTheme) -> u32;
}

/// Fire-and-forget request channel for tiles that are not local. Delivery
/// is signaled out of band; the cache simply finds the file on a later
/// frame. There is no cancellation, abandoned tiles get swept unused.
pub trait TileFetcher {
    fn request(&self, relative_path: &str);
}

/// Fetcher for fully local setups. Requests are dropped.
pub struct NullFetcher;

impl TileFetcher for NullFetcher {
    fn request(&self, _relative_path: &str) {}
}

/// Tile directory on disk, laid out as `prefix/level/row/row_column.ext`.
pub struct FsTileStorage {
    root: PathBuf,
}

impl FsTileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn tile_path(&self, theme: &GlobeTheme, id: TileId) -> PathBuf {
        self.root.join(id.path(&theme.prefix, &theme.extension))
    }
}

impl TileStorage for FsTileStorage {
    fn tile_exists(&self, theme: &GlobeTheme, id: TileId) -> bool {
        self.tile_path(theme, id).is_file()
    }

    fn load(&self, theme: &GlobeTheme, id: TileId) -> Result<Tile, TileError> {
        let path = self.tile_path(theme, id);
        let shown = path.display().to_string();
        let bytes = fs::read(&path).map_err(|source| TileError::Io {
            path: shown.clone(),
            source,
        })?;
        let img = image::load_from_memory(&bytes).map_err(|source| TileError::Decode {
            path: shown,
            source,
        })?;
        let (width, height) = (img.width(), img.height());
        // Grayscale files carry elevation indices, everything else color.
        let pixels = match img {
            image::DynamicImage::ImageLuma8(gray) => TilePixels::Indexed(gray.into_raw()),
            other => {
                let data = other
                    .to_rgb8()
                    .pixels()
                    .map(|p| rgb(p[0], p[1], p[2]))
                    .collect();
                TilePixels::Color(data)
            }
        };
        Ok(Tile::new(id, width, height, pixels))
    }

    fn max_level(&self, theme: &GlobeTheme) -> u32 {
        let mut max = 0;
        let Ok(entries) = fs::read_dir(self.root.join(&theme.prefix)) else {
            return 0;
        };
        for entry in entries.flatten() {
            if let Some(level) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u32>().ok())
            {
                max = max.max(level);
            }
        }
        max
    }
}

// Continent noise grid, wrapped in longitude so the seam stays seamless.
const NOISE_COLS: i64 = 8;
const NOISE_ROWS: i64 = 4;
const LAND_THRESHOLD: f64 = 0.5;

/// Deterministic in-memory tile generator. Every address exists, so the
/// demo and the tests run without any assets on disk. Tiles come out at
/// the theme's declared tile size.
#[derive(Default)]
pub struct ProceduralTiles;

/// Smoothed value noise in [0, 1) over a lon-wrapped grid.
fn elevation_noise(u: f64, v: f64) -> f64 {
    let (iu, iv) = (u.floor(), v.floor());
    let (fu, fv) = (u - iu, v - iv);
    let corner = |du: i64, dv: i64| {
        let cu = (iu as i64 + du).rem_euclid(NOISE_COLS) as u64;
        let cv = (iv as i64 + dv).clamp(0, NOISE_ROWS) as u64;
        rand_unit(hash2(cu, cv))
    };
    let (su, sv) = (fu * fu * (3.0 - 2.0 * fu), fv * fv * (3.0 - 2.0 * fv));
    let top = corner(0, 0) * (1.0 - su) + corner(1, 0) * su;
    let bottom = corner(0, 1) * (1.0 - su) + corner(1, 1) * su;
    top * (1.0 - sv) + bottom * sv
}

fn shade(base: (f64, f64, f64), factor: f64) -> u32 {
    let clamp = |c: f64| (c * factor).clamp(0.0, 255.0) as u8;
    rgb(clamp(base.0), clamp(base.1), clamp(base.2))
}

impl TileStorage for ProceduralTiles {
    fn tile_exists(&self, _theme: &GlobeTheme, _id: TileId) -> bool {
        true
    }

    fn load(&self, theme: &GlobeTheme, id: TileId) -> Result<Tile, TileError> {
        let ts = theme.tile_size;
        let global_w = f64::from(level_columns(id.level) * ts);
        let global_h = f64::from(level_rows(id.level) * ts);
        // Small per-theme tint so switching themes is visible on screen.
        let tint = 0.92 + 0.16 * rand_unit(hash2(theme.id.bytes().map(u64::from).sum(), 1));

        let mut indexed = Vec::new();
        let mut color = Vec::new();
        if theme.colorize_elevation {
            indexed.reserve((ts * ts) as usize);
        } else {
            color.reserve((ts * ts) as usize);
        }

        for y in 0..ts {
            let gy = f64::from(id.row * ts + y) + 0.5;
            let lat_norm = gy / global_h;
            let lat_deg = 90.0 - 180.0 * lat_norm;
            for x in 0..ts {
                let gx = f64::from(id.column * ts + x) + 0.5;
                let lon_norm = gx / global_w;
                let e = elevation_noise(
                    lon_norm * NOISE_COLS as f64,
                    lat_norm * NOISE_ROWS as f64,
                );
                if theme.colorize_elevation {
                    indexed.push((e * 255.0) as u8);
                    continue;
                }
                let speckle =
                    0.94 + 0.12 * rand_unit(hash2(gx as u64, gy as u64));
                let base = if lat_deg.abs() > 70.0 {
                    (235.0, 240.0, 245.0)
                } else if e > LAND_THRESHOLD {
                    let t = (e - LAND_THRESHOLD) / (1.0 - LAND_THRESHOLD);
                    (70.0 + 110.0 * t, 120.0 + 30.0 * t, 60.0 + 40.0 * t)
                } else {
                    let t = e / LAND_THRESHOLD;
                    (8.0 + 22.0 * t, 44.0 + 46.0 * t, 110.0 + 70.0 * t)
                };
                color.push(shade(base, speckle * tint));
            }
        }

        let pixels = if theme.colorize_elevation {
            TilePixels::Indexed(indexed)
        } else {
            TilePixels::Color(color)
        };
        Ok(Tile::new(id, ts, ts, pixels))
    }

    fn max_level(&self, theme: &GlobeTheme) -> u32 {
        theme.max_tile_level
    }
}
