// SPDX-License-Identifier: GPL-3.0-only

//! Viewport tiling

/// Axis-aligned rectangle in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Largest rectangle of the given aspect ratio centered inside `self`
    pub fn fit_aspect(&self, content_width: f32, content_height: f32) -> Rect {
        if content_width <= 0.0 || content_height <= 0.0 || self.area() <= 0.0 {
            return Rect::new(self.x, self.y, 0.0, 0.0);
        }
        let scale = (self.width / content_width).min(self.height / content_height);
        let width = content_width * scale;
        let height = content_height * scale;
        Rect::new(
            self.x + (self.width - width) / 2.0,
            self.y + (self.height - height) / 2.0,
            width,
            height,
        )
    }

    /// Integer pixel span `[x0, x1) x [y0, y1)`
    ///
    /// Edges are rounded, so neighbouring tiles share a boundary.
    pub fn pixel_bounds(&self) -> (i64, i64, i64, i64) {
        (
            self.x.round() as i64,
            self.y.round() as i64,
            (self.x + self.width).round() as i64,
            (self.y + self.height).round() as i64,
        )
    }
}

/// Split the viewport into `count` equal tiles
///
/// Tiles run left to right when the viewport is wider than tall, top to
/// bottom otherwise.
pub fn compute_layout(count: usize, viewport_width: u32, viewport_height: u32) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let (w, h) = (viewport_width as f32, viewport_height as f32);
    let n = count as f32;

    if viewport_width > viewport_height {
        let tile = w / n;
        (0..count)
            .map(|i| Rect::new(i as f32 * tile, 0.0, tile, h))
            .collect()
    } else {
        let tile = h / n;
        (0..count)
            .map(|i| Rect::new(0.0, i as f32 * tile, w, tile))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f64) -> bool {
        (a as f64 - b).abs() < 1e-3
    }

    /// Tiles sit at their exact origins and cover the viewport end to end
    fn assert_partition(rects: &[Rect], w: u32, h: u32) {
        let n = rects.len() as f64;
        let horizontal = w > h;
        let (w, h) = (w as f64, h as f64);

        for (i, r) in rects.iter().enumerate() {
            let i = i as f64;
            let expected = if horizontal {
                (w * i / n, 0.0, w / n, h)
            } else {
                (0.0, h * i / n, w, h / n)
            };
            assert!(
                close(r.x, expected.0)
                    && close(r.y, expected.1)
                    && close(r.width, expected.2)
                    && close(r.height, expected.3),
                "tile {} is {:?}, expected {:?}",
                i,
                r,
                expected
            );
        }

        let last = rects[rects.len() - 1];
        if horizontal {
            assert!(close(last.x + last.width, w), "row ends at {}", last.x + last.width);
        } else {
            assert!(close(last.y + last.height, h), "column ends at {}", last.y + last.height);
        }
    }

    #[test]
    fn test_horizontal_when_wide() {
        let rects = compute_layout(3, 900, 300);
        assert_eq!(rects[1], Rect::new(300.0, 0.0, 300.0, 300.0));
        assert_partition(&rects, 900, 300);
    }

    #[test]
    fn test_vertical_when_tall_or_square() {
        let rects = compute_layout(2, 400, 400);
        assert_eq!(rects[1], Rect::new(0.0, 200.0, 400.0, 200.0));
        assert_partition(&rects, 400, 400);
    }

    #[test]
    fn test_partition_uneven_counts() {
        for n in 1..=7 {
            for (w, h) in [(640, 480), (333, 1000), (17, 5)] {
                assert_partition(&compute_layout(n, w, h), w, h);
            }
        }
    }

    #[test]
    fn test_zero_streams() {
        assert!(compute_layout(0, 640, 480).is_empty());
    }

    #[test]
    fn test_fit_aspect_letterboxes() {
        let tile = Rect::new(0.0, 0.0, 400.0, 400.0);
        let fitted = tile.fit_aspect(320.0, 240.0);
        assert_eq!(fitted, Rect::new(0.0, 50.0, 400.0, 300.0));
    }
}
