pub mod cache;
pub mod storage;

pub use cache::TileCache;
pub use storage::{FsTileStorage, NullFetcher, ProceduralTiles, TileFetcher, TileStorage};

use thiserror::Error;

/// Errors raised by tile storage and cache validation.
#[derive(Debug, Error)]
pub enum TileError {
    /// A base-level tile of the theme is absent. The base row must be
    /// complete before the theme can be activated.
    #[error("theme '{theme}' is missing base tiles (level 0 must be complete)")]
    MissingBaseTiles { theme: String },

    #[error("failed to read tile {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode tile {path}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Rows in a tile level. Level 0 is a single row.
#[inline(always)]
pub fn level_rows(level: u32) -> u32 {
    1 << level
}

/// Columns in a tile level. Twice the row count, covering 360 degrees.
#[inline(always)]
pub fn level_columns(level: u32) -> u32 {
    2 << level
}

/// Tile level for a globe radius. Doubling the radius steps one level up
/// until the theme's maximum; the smallest globes use the base level.
pub fn level_for_radius(radius: f64, tile_size: u32, max_level: u32) -> u32 {
    let base_span = f64::from(tile_size) / 2.0;
    if radius <= 0.0 || base_span <= 0.0 {
        return 0;
    }
    let raw = (radius / base_span).log2().floor() as i64 + 1;
    raw.clamp(0, i64::from(max_level)) as u32
}

/// Address of one tile within the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub level: u32,
    pub column: u32,
    pub row: u32,
}

impl TileId {
    pub fn new(level: u32, column: u32, row: u32) -> Self {
        Self { level, column, row }
    }

    /// Relative file path under a theme prefix, row and column zero-padded
    /// to four digits: `bluemarble/2/0001/0001_0003.jpg`.
    pub fn path(&self, prefix: &str, extension: &str) -> String {
        format!(
            "{}/{}/{:04}/{:04}_{:04}.{}",
            prefix, self.level, self.row, self.row, self.column, extension
        )
    }

    /// The tile one level up that contains this tile.
    pub fn parent(&self) -> Option<TileId> {
        if self.level == 0 {
            return None;
        }
        Some(TileId::new(self.level - 1, self.column / 2, self.row / 2))
    }
}

/// Pixel storage for one tile. Indexed tiles keep one elevation index per
/// pixel and get their color from the hypsometric palette later; color
/// tiles keep packed 0x00RRGGBB words.
#[derive(Debug, Clone)]
pub enum TilePixels {
    Indexed(Vec<u8>),
    Color(Vec<u32>),
}

/// One raster tile. The cache is the sole owner until eviction.
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: TileId,
    pub width: u32,
    pub height: u32,
    pub pixels: TilePixels,
    /// Touched during the current frame. Swept tiles have it unset.
    pub used: bool,
    /// Stand-in scaled up from an ancestor while the real tile is absent.
    pub fallback: bool,
}

impl Tile {
    pub fn new(id: TileId, width: u32, height: u32, pixels: TilePixels) -> Self {
        Self {
            id,
            width,
            height,
            pixels,
            used: false,
            fallback: false,
        }
    }

    /// Sample one pixel as a packed color word. Indexed tiles read as gray
    /// so untextured output stays visible before colorization.
    #[inline(always)]
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        let i = (y * self.width + x) as usize;
        match &self.pixels {
            TilePixels::Indexed(data) => {
                let v = u32::from(data[i]);
                (v << 16) | (v << 8) | v
            }
            TilePixels::Color(data) => data[i],
        }
    }

    /// Raw elevation index, 0 for color tiles.
    #[inline(always)]
    pub fn index(&self, x: u32, y: u32) -> u8 {
        match &self.pixels {
            TilePixels::Indexed(data) => data[(y * self.width + x) as usize],
            TilePixels::Color(_) => 0,
        }
    }

    pub fn byte_size(&self) -> usize {
        match &self.pixels {
            TilePixels::Indexed(data) => data.len(),
            TilePixels::Color(data) => data.len() * 4,
        }
    }

    /// Build a stand-in for `id` by scaling up the covering quadrant of an
    /// ancestor tile with nearest-neighbor sampling.
    pub fn scaled_from_ancestor(id: TileId, ancestor: &Tile) -> Tile {
        let depth = id.level - ancestor.id.level;
        let span = 1u32 << depth;
        // Position of the target tile inside the ancestor.
        let sub_x = id.column & (span - 1);
        let sub_y = id.row & (span - 1);
        let (w, h) = (ancestor.width, ancestor.height);
        let src = |x: u32, y: u32| {
            let sx = (sub_x * w + x) / span;
            let sy = (sub_y * h + y) / span;
            (sx.min(w - 1), sy.min(h - 1))
        };
        let pixels = match &ancestor.pixels {
            TilePixels::Indexed(_) => {
                let mut data = Vec::with_capacity((w * h) as usize);
                for y in 0..h {
                    for x in 0..w {
                        let (sx, sy) = src(x, y);
                        data.push(ancestor.index(sx, sy));
                    }
                }
                TilePixels::Indexed(data)
            }
            TilePixels::Color(_) => {
                let mut data = Vec::with_capacity((w * h) as usize);
                for y in 0..h {
                    for x in 0..w {
                        let (sx, sy) = src(x, y);
                        data.push(ancestor.pixel(sx, sy));
                    }
                }
                TilePixels::Color(data)
            }
        };
        let mut tile = Tile::new(id, w, h, pixels);
        tile.fallback = true;
        tile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_zero_addressing() {
        assert_eq!(level_rows(0), 1);
        assert_eq!(level_columns(0), 2);
        assert_eq!(level_rows(3), 8);
        assert_eq!(level_columns(3), 16);
    }

    #[test]
    fn test_path_format() {
        let id = TileId::new(2, 5, 2);
        assert_eq!(id.path("bluemarble", "jpg"), "bluemarble/2/0002/0002_0005.jpg");
        let base = TileId::new(0, 1, 0);
        assert_eq!(base.path("plainmap", "png"), "plainmap/0/0000/0000_0001.png");
    }

    #[test]
    fn test_level_for_radius_is_monotonic() {
        let mut last = 0;
        let mut radius = 10.0;
        while radius < 16000.0 {
            let level = level_for_radius(radius, 675, 8);
            assert!(level >= last, "level dropped at radius {radius}");
            last = level;
            radius += 12.5;
        }
    }

    #[test]
    fn test_level_for_radius_bounds() {
        assert_eq!(level_for_radius(100.0, 675, 4), 0);
        assert_eq!(level_for_radius(400.0, 675, 4), 1);
        assert_eq!(level_for_radius(800.0, 675, 4), 2);
        assert_eq!(level_for_radius(1e9, 675, 4), 4);
    }

    #[test]
    fn test_parent_chain_reaches_base() {
        let mut id = TileId::new(3, 13, 6);
        let mut hops = 0;
        while let Some(p) = id.parent() {
            assert_eq!(p.level + 1, id.level);
            assert_eq!(p.column, id.column / 2);
            assert_eq!(p.row, id.row / 2);
            id = p;
            hops += 1;
        }
        assert_eq!(hops, 3);
        assert_eq!(id.level, 0);
    }

    #[test]
    fn test_scaled_fallback_expands_quadrant() {
        // 2x2 color parent; child (1,1) at the next level sits in the
        // parent's bottom-right quadrant.
        let parent = Tile::new(
            TileId::new(0, 0, 0),
            2,
            2,
            TilePixels::Color(vec![1, 2, 3, 4]),
        );
        let child = Tile::scaled_from_ancestor(TileId::new(1, 1, 1), &parent);
        assert!(child.fallback);
        assert_eq!(child.width, 2);
        // Every child pixel samples the single source pixel 4.
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(child.pixel(x, y), 4);
            }
        }
    }

    #[test]
    fn test_indexed_pixel_reads_gray() {
        let tile = Tile::new(TileId::new(0, 0, 0), 2, 1, TilePixels::Indexed(vec![0x40, 0xff]));
        assert_eq!(tile.pixel(0, 0), 0x404040);
        assert_eq!(tile.pixel(1, 0), 0xffffff);
        assert_eq!(tile.index(1, 0), 0xff);
    }
}
