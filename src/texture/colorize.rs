use crate::canvas::{rgb, rgb_channels, Canvas};

/// Elevation index at which the ocean ramp hands over to the land ramp.
const SEA_LEVEL: usize = 128;

fn lerp_color(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> u32 {
    let mix = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * t) as u8;
    rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Maps the gray elevation indices written by indexed tiles to hypsometric
/// tints: depth blues below sea level, green over brown to summit white
/// above it.
pub struct ElevationColorizer {
    palette: [u32; 256],
}

impl Default for ElevationColorizer {
    fn default() -> Self {
        let mut palette = [0u32; 256];
        let deep = (4, 10, 36);
        let shallow = (96, 148, 210);
        let shore = (84, 136, 74);
        let highland = (150, 112, 72);
        let summit = (245, 245, 245);
        for (i, entry) in palette.iter_mut().enumerate() {
            *entry = if i < SEA_LEVEL {
                lerp_color(deep, shallow, i as f64 / (SEA_LEVEL - 1) as f64)
            } else if i < 208 {
                lerp_color(shore, highland, (i - SEA_LEVEL) as f64 / (208 - SEA_LEVEL) as f64)
            } else {
                lerp_color(highland, summit, (i - 208) as f64 / (255 - 208) as f64)
            };
        }
        Self { palette }
    }
}

impl ElevationColorizer {
    pub fn entry(&self, index: u8) -> u32 {
        self.palette[index as usize]
    }

    /// Recolor every pixel inside the globe disk through the palette. The
    /// red channel carries the elevation index, all three channels are
    /// equal after indexed texturing.
    pub fn colorize(&self, canvas: &mut Canvas, radius: f64) {
        let half_w = (canvas.width() / 2) as i32;
        let half_h = (canvas.height() / 2) as i32;
        let r = radius.max(1.0);
        let ri = r as i32;
        let y_top = (half_h - ri).max(0);
        let y_bottom = (half_h + ri).min(canvas.height() as i32);
        for y in y_top..y_bottom {
            let dy = f64::from(half_h - y);
            let rx = (r * r - dy * dy).max(0.0).sqrt();
            let x_left = ((f64::from(half_w) - rx) as i32).max(0) as usize;
            let x_right = ((f64::from(half_w) + rx) as i32).min(canvas.width() as i32) as usize;
            let row = canvas.row_mut(y as usize);
            for px in row[x_left..x_right].iter_mut() {
                let (index, _, _) = rgb_channels(*px);
                *px = self.palette[index as usize];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_endpoints() {
        let colorizer = ElevationColorizer::default();
        assert_eq!(colorizer.entry(0), rgb(4, 10, 36));
        assert_eq!(colorizer.entry(255), rgb(245, 245, 245));
        // Sea level starts the land ramp.
        assert_eq!(colorizer.entry(128), rgb(84, 136, 74));
    }

    #[test]
    fn test_colorize_maps_disk_and_spares_background() {
        let colorizer = ElevationColorizer::default();
        let mut canvas = Canvas::new(16, 16);
        // Gray value 200 inside the future disk area.
        canvas.fill(rgb(200, 200, 200));
        let outside = canvas.pixel(0, 0);
        colorizer.colorize(&mut canvas, 4.0);
        assert_eq!(canvas.pixel(8, 8), colorizer.entry(200));
        assert_eq!(canvas.pixel(0, 0), outside);
    }

    #[test]
    fn test_ocean_and_land_are_distinct_ramps() {
        let colorizer = ElevationColorizer::default();
        let (_, _, ocean_blue) = rgb_channels(colorizer.entry(90));
        let (_, land_green, _) = rgb_channels(colorizer.entry(140));
        assert!(ocean_blue > 100);
        assert!(land_green > 100);
        assert_ne!(colorizer.entry(127), colorizer.entry(128));
    }
}
