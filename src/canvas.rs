use crate::color::Rgba;
use crate::font;

/// Offscreen RGBA8 image with straight alpha and source-over blending.
#[derive(Clone, Debug, PartialEq, Eq)]
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
            pixels: vec![0u8; (width as usize) * (height as usize) * 4],
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

    /// Resets every pixel to transparent black.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        let (x0, x1) = span(x, x + w, self.width);
        let (y0, y1) = span(y, y + h, self.height);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color);
            }
        }
    }

    /// Horizontal stroke from `x0` to `x1` with square caps.
    pub fn stroke_hline(&mut self, x0: f32, x1: f32, y: f32, weight: f32, color: Rgba) {
        let half = weight * 0.5;
        let left = x0.min(x1) - half;
        let right = x0.max(x1) + half;
        self.fill_rect(left, y - half, right - left, weight, color);
    }

    /// Vertical stroke from `y0` to `y1` with square caps.
    pub fn stroke_vline(&mut self, x: f32, y0: f32, y1: f32, weight: f32, color: Rgba) {
        let half = weight * 0.5;
        let top = y0.min(y1) - half;
        let bottom = y0.max(y1) + half;
        self.fill_rect(x - half, top, weight, bottom - top, color);
    }

    /// Circle outline centred on `(cx, cy)`; pixels whose centre lies within
    /// `weight / 2` of the radius are painted.
    pub fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, weight: f32, color: Rgba) {
        if radius <= 0.0 || weight <= 0.0 {
            return;
        }
        let half = weight * 0.5;
        let reach = radius + half;
        let (x0, x1) = span(cx - reach - 1.0, cx + reach + 1.0, self.width);
        let (y0, y1) = span(cy - reach - 1.0, cy + reach + 1.0, self.height);
        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let distance = (dx * dx + dy * dy).sqrt();
                if (distance - radius).abs() <= half {
                    self.blend(px, py, color);
                }
            }
        }
    }

    /// Bitmap text with its top-left corner at `origin`.
    pub fn draw_text(&mut self, origin: (f32, f32), height: f32, color: Rgba, text: &str) {
        let mut cells = Vec::new();
        font::layout_text(text, origin, height, |x, y, size| cells.push((x, y, size)));
        for (x, y, size) in cells {
            self.fill_rect(x, y, size, size, color);
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgba) {
        let idx = ((y * self.width + x) * 4) as usize;
        let src_a = color[3] as f32 / 255.0;
        if src_a <= 0.0 {
            return;
        }
        let dst = &mut self.pixels[idx..idx + 4];
        if src_a >= 1.0 {
            dst.copy_from_slice(&color);
            return;
        }

        let dst_a = dst[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        for channel in 0..3 {
            let src = color[channel] as f32;
            let under = dst[channel] as f32;
            let mixed = (src * src_a + under * dst_a * (1.0 - src_a)) / out_a;
            dst[channel] = mixed.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// Pixel range `[start, end)` covered by the continuous interval, clipped to
/// `0..limit`.
fn span(from: f32, to: f32, limit: u32) -> (u32, u32) {
    let lo = from.min(to).round().max(0.0);
    let hi = from.max(to).round().min(limit as f32);
    if hi <= lo {
        return (0, 0);
    }
    (lo as u32, hi as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = [255, 0, 0, 255];

    #[test]
    fn fill_rect_is_clipped_to_bounds() {
        let mut canvas = Canvas::new(8, 8);
        canvas.fill_rect(-4.0, -4.0, 6.0, 6.0, RED);
        assert_eq!(canvas.pixel(0, 0), RED);
        assert_eq!(canvas.pixel(1, 1), RED);
        assert_eq!(canvas.pixel(2, 2), [0, 0, 0, 0]);

        canvas.fill_rect(100.0, 100.0, 5.0, 5.0, RED);
        canvas.fill_rect(6.0, 6.0, 10.0, 10.0, RED);
        assert_eq!(canvas.pixel(7, 7), RED);
    }

    #[test]
    fn translucent_fill_over_opaque_keeps_opacity() {
        let mut canvas = Canvas::new(1, 1);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0, [0, 0, 0, 255]);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0, [255, 255, 255, 51]);
        let [r, g, b, a] = canvas.pixel(0, 0);
        assert_eq!(a, 255);
        assert_eq!(r, 51);
        assert_eq!(g, b);
    }

    #[test]
    fn clear_wipes_previous_content() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, RED);
        canvas.clear();
        assert!(canvas.pixels().iter().all(|&v| v == 0));
    }

    #[test]
    fn circle_outline_leaves_centre_untouched() {
        let mut canvas = Canvas::new(64, 64);
        canvas.stroke_circle(32.0, 32.0, 20.0, 3.0, RED);
        assert_eq!(canvas.pixel(32, 32), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(52, 32), RED);
        assert_eq!(canvas.pixel(32, 12), RED);
    }

    #[test]
    fn zero_sized_canvas_ignores_drawing() {
        let mut canvas = Canvas::new(0, 0);
        canvas.clear();
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0, RED);
        canvas.stroke_circle(0.0, 0.0, 5.0, 1.0, RED);
        canvas.draw_text((0.0, 0.0), 14.0, RED, "VOID");
        assert!(canvas.pixels().is_empty());
    }

    #[test]
    fn text_paints_inside_its_box() {
        let mut canvas = Canvas::new(64, 16);
        canvas.draw_text((2.0, 2.0), 14.0, RED, "I");
        // Centre column of 'I' at scale 2 spans x = 6..8.
        assert_eq!(canvas.pixel(6, 8), RED);
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(40, 8), [0, 0, 0, 0]);
    }

    impl Canvas {
        fn pixel(&self, x: u32, y: u32) -> Rgba {
            let idx = ((y * self.width + x) * 4) as usize;
            [
                self.pixels[idx],
                self.pixels[idx + 1],
                self.pixels[idx + 2],
                self.pixels[idx + 3],
            ]
        }
    }
}
