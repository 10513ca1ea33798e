// SPDX-License-Identifier: GPL-3.0-only

//! CPU render target

use image::RgbaImage;

use super::layout::Rect;

/// RGBA8 pixel buffer the renderer draws into
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reallocate if the size changed; contents are undefined afterwards
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; (width as usize) * (height as usize) * 4];
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    /// Write one pixel; out-of-bounds writes are ignored
    #[inline]
    pub fn put_pixel(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[idx..idx + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        let (x0, y0, x1, y1) = rect.pixel_bounds();
        for y in y0.max(0)..y1.min(self.height as i64) {
            for x in x0.max(0)..x1.min(self.width as i64) {
                self.put_pixel(x, y, color);
            }
        }
    }

    /// Bresenham line, clipped to `clip`
    pub fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: [u8; 4], clip: Rect) {
        let (cx0, cy0, cx1, cy1) = clip.pixel_bounds();
        let (mut x, mut y) = (from.0.round() as i64, from.1.round() as i64);
        let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            if x >= cx0 && x < cx1 && y >= cy0 && y < cy1 {
                self.put_pixel(x, y, color);
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Copy into an `image` buffer for encoding
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_is_clipped() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(Rect::new(2.0, 2.0, 10.0, 10.0), [9, 9, 9, 255]);
        assert_eq!(canvas.get_pixel(3, 3), Some([9, 9, 9, 255]));
        assert_eq!(canvas.get_pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_line_endpoints() {
        let mut canvas = Canvas::new(8, 8);
        let full = Rect::new(0.0, 0.0, 8.0, 8.0);
        canvas.draw_line((1.0, 1.0), (6.0, 4.0), [255; 4], full);
        assert_eq!(canvas.get_pixel(1, 1), Some([255; 4]));
        assert_eq!(canvas.get_pixel(6, 4), Some([255; 4]));
    }

    #[test]
    fn test_resize_and_export() {
        let mut canvas = Canvas::new(2, 2);
        canvas.resize(3, 1);
        canvas.clear([1, 2, 3, 4]);
        let img = canvas.to_image().unwrap();
        assert_eq!(img.dimensions(), (3, 1));
        assert_eq!(img.get_pixel(2, 0).0, [1, 2, 3, 4]);
    }
}
