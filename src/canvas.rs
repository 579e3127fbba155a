/// Pack RGB channels into a 0x00RRGGBB pixel word.
#[inline(always)]
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Split a pixel word back into RGB channels.
#[inline(always)]
pub const fn rgb_channels(c: u32) -> (u8, u8, u8) {
    (((c >> 16) & 0xff) as u8, ((c >> 8) & 0xff) as u8, (c & 0xff) as u8)
}

/// Owned pixel buffer with row-stride access.
///
/// Pixels are 0x00RRGGBB words in row-major order. The canvas is the sole
/// owner of its storage and hands out rows as slices.
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u32; width * height],
        }
    }

    #[inline(always)]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline(always)]
    pub fn row(&self, y: usize) -> &[u32] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    #[inline(always)]
    pub fn row_mut(&mut self, y: usize) -> &mut [u32] {
        &mut self.pixels[y * self.width..(y + 1) * self.width]
    }

    /// Copy row `src` into row `dst`. Used by interlaced rendering.
    pub fn copy_row(&mut self, src: usize, dst: usize) {
        if src == dst || src >= self.height || dst >= self.height {
            return;
        }
        self.pixels
            .copy_within(src * self.width..(src + 1) * self.width, dst * self.width);
    }

    #[inline(always)]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    #[inline(always)]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    /// Set a pixel using signed coordinates, ignoring out-of-bounds hits.
    #[inline(always)]
    pub fn set_pixel_signed(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    pub fn clear(&mut self) {
        self.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_read_pixel() {
        let mut canvas = Canvas::new(4, 3);
        canvas.set_pixel(2, 1, rgb(10, 20, 30));
        assert_eq!(canvas.pixel(2, 1), 0x000a141e);
        assert_eq!(canvas.row(1)[2], 0x000a141e);
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut canvas = Canvas::new(2, 2);
        canvas.set_pixel(5, 0, 0xffffff);
        canvas.set_pixel_signed(-1, 0, 0xffffff);
        canvas.set_pixel_signed(0, -3, 0xffffff);
        assert!(canvas.row(0).iter().all(|&p| p == 0));
        assert!(canvas.row(1).iter().all(|&p| p == 0));
    }

    #[test]
    fn test_copy_row() {
        let mut canvas = Canvas::new(3, 2);
        canvas.row_mut(0).copy_from_slice(&[1, 2, 3]);
        canvas.copy_row(0, 1);
        assert_eq!(canvas.row(1), &[1, 2, 3]);
    }

    #[test]
    fn test_rgb_round_trip() {
        let c = rgb(200, 100, 50);
        assert_eq!(rgb_channels(c), (200, 100, 50));
    }
}
