use crate::canvas::Canvas;
use crate::color::{hsl, hsl_to_rgba};

pub const TEXTURE_COUNT: usize = 12;
pub const TEXTURE_SIZE: u32 = 256;

pub const AD_MESSAGES: [&str; 10] = [
    "NOVA", "SECTOR-7", "NEON", "00110011", "CYBER", "AR/AD", "CITY", "BUY", "SYNC", "VOID",
];
const MESSAGE_SUFFIX: &str = " ▷▹▸";

const SCANLINE_PERIOD: u32 = 4;
const BAND_SPEED: f32 = 40.0;
const BAND_HEIGHT: f32 = 20.0;
const BAND_LEAD: f32 = 40.0;
const BRACKET_MARGIN: f32 = 18.0;
const BRACKET_ARM: f32 = 30.0;
const BRACKET_WEIGHT: f32 = 4.0;
const LABEL_SPEED: f32 = 120.0;
const LABEL_RUNWAY: f32 = 200.0;
const LABEL_HEIGHT: f32 = 14.0;

pub fn primary_hue(index: usize) -> f32 {
    ((index * 37) % 360) as f32
}

pub fn secondary_hue(index: usize) -> f32 {
    (primary_hue(index) + 200.0) % 360.0
}

/// Top edge of the sweeping band. Loops with period `(height + 40) / 40`
/// seconds, starting just above the image.
pub fn band_offset(time: f32, index: usize, height: f32) -> f32 {
    (time * BAND_SPEED + index as f32 * 20.0).rem_euclid(height + BAND_LEAD) - BAND_LEAD
}

/// Left edge of the scrolling label.
pub fn label_offset(time: f32, width: f32) -> f32 {
    let runway = width + LABEL_RUNWAY;
    runway - (time * LABEL_SPEED).rem_euclid(runway) - width
}

pub fn logo_radius(time: f32, index: usize) -> f32 {
    22.0 + 6.0 * (time * 3.0 + index as f32).sin()
}

pub fn ad_message(index: usize) -> &'static str {
    AD_MESSAGES[index % AD_MESSAGES.len()]
}

/// Paints one animated advertisement into `canvas`, replacing whatever the
/// previous frame left behind. Output depends only on `time`, `index` and
/// the canvas size.
pub fn render_ad_texture(canvas: &mut Canvas, time: f32, index: usize) {
    canvas.clear();
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;
    if canvas.width() == 0 || canvas.height() == 0 {
        return;
    }

    let h1 = primary_hue(index);
    let h2 = secondary_hue(index);

    // Gradient background
    for y in 0..canvas.height() {
        let k = y as f32 / height;
        canvas.fill_rect(0.0, y as f32, width, 1.0, hsl(h1, 80.0, 20.0 + 20.0 * k));
    }

    // Scanlines
    let scanline = [255, 255, 255, 30];
    for y in (0..canvas.height()).step_by(SCANLINE_PERIOD as usize) {
        canvas.fill_rect(0.0, y as f32, width, 1.0, scanline);
    }

    let band_y = band_offset(time, index, height);
    canvas.fill_rect(0.0, band_y, width, BAND_HEIGHT, hsl_to_rgba(h2, 90.0, 60.0, 160));

    draw_brackets(canvas, hsl(h2, 100.0, 75.0));

    let label = format!("{}{}", ad_message(index), MESSAGE_SUFFIX);
    let baseline = height * 0.55;
    canvas.draw_text(
        (label_offset(time, width), baseline - LABEL_HEIGHT),
        LABEL_HEIGHT,
        [255, 255, 255, 255],
        &label,
    );

    let radius = logo_radius(time, index);
    let (cx, cy) = (width * 0.2, height * 0.35);
    canvas.stroke_circle(cx, cy, radius, 3.0, hsl(h1, 100.0, 70.0));
    canvas.stroke_circle(cx, cy, radius * 0.7, 1.0, hsl(h1, 100.0, 50.0));
}

fn draw_brackets(canvas: &mut Canvas, color: [u8; 4]) {
    let m = BRACKET_MARGIN;
    let arm = BRACKET_ARM;
    let right = canvas.width() as f32 - m;
    let bottom = canvas.height() as f32 - m;

    for (x, y, dx, dy) in [
        (m, m, 1.0, 1.0),
        (right, m, -1.0, 1.0),
        (m, bottom, 1.0, -1.0),
        (right, bottom, -1.0, -1.0),
    ] {
        canvas.stroke_hline(x, x + dx * arm, y, BRACKET_WEIGHT, color);
        canvas.stroke_vline(x, y, y + dy * arm, BRACKET_WEIGHT, color);
    }
}

/// Fixed set of offscreen ad images, rewritten in full every frame.
pub struct TexturePool {
    textures: Vec<Canvas>,
}

impl TexturePool {
    pub fn new(count: usize, size: u32) -> Self {
        assert!(count > 0, "texture pool needs at least one texture");
        Self {
            textures: (0..count).map(|_| Canvas::new(size, size)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn size(&self) -> u32 {
        self.textures[0].width()
    }

    pub fn get(&self, index: usize) -> &Canvas {
        &self.textures[index]
    }

    pub fn regenerate(&mut self, time: f32) {
        for (index, canvas) in self.textures.iter_mut().enumerate() {
            render_ad_texture(canvas, time, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hues_follow_index() {
        assert_eq!(primary_hue(0), 0.0);
        assert_eq!(primary_hue(1), 37.0);
        assert_eq!(primary_hue(10), 10.0);
        assert_eq!(secondary_hue(1), 237.0);
        assert_eq!(secondary_hue(5), 25.0);
    }

    #[test]
    fn band_loops_with_its_period() {
        let height = TEXTURE_SIZE as f32;
        let period = (height + 40.0) / 40.0;
        for index in [0, 3, 11] {
            for t in [0.0, 0.5, 1.25, 3.0, 6.9] {
                let a = band_offset(t, index, height);
                let b = band_offset(t + period, index, height);
                assert!((a - b).abs() < 1e-3, "t={t} index={index}: {a} vs {b}");
                assert!((-40.0..height).contains(&a));
            }
        }
    }

    #[test]
    fn label_scrolls_left_and_wraps() {
        let width = TEXTURE_SIZE as f32;
        assert_eq!(label_offset(0.0, width), 200.0);
        assert!(label_offset(0.5, width) < label_offset(0.25, width));
        let period = (width + 200.0) / 120.0;
        assert!((label_offset(1.0, width) - label_offset(1.0 + period, width)).abs() < 1e-3);
    }

    #[test]
    fn logo_radius_oscillates_around_22() {
        for i in 0..200 {
            let r = logo_radius(i as f32 * 0.05, i % 12);
            assert!((16.0..=28.0).contains(&r));
        }
    }

    #[test]
    fn messages_cycle_every_ten() {
        assert_eq!(ad_message(0), "NOVA");
        assert_eq!(ad_message(11), "SECTOR-7");
        assert_eq!(ad_message(9), "VOID");
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut a = Canvas::new(TEXTURE_SIZE, TEXTURE_SIZE);
        let mut b = Canvas::new(TEXTURE_SIZE, TEXTURE_SIZE);
        render_ad_texture(&mut a, 2.75, 4);
        render_ad_texture(&mut b, 2.75, 4);
        assert_eq!(a, b);
    }

    #[test]
    fn rendering_overwrites_previous_frame() {
        let mut reused = Canvas::new(64, 64);
        render_ad_texture(&mut reused, 9.0, 7);
        render_ad_texture(&mut reused, 1.0, 2);

        let mut fresh = Canvas::new(64, 64);
        render_ad_texture(&mut fresh, 1.0, 2);
        assert_eq!(reused, fresh);
    }

    #[test]
    fn output_is_opaque_and_animated() {
        let mut early = Canvas::new(TEXTURE_SIZE, TEXTURE_SIZE);
        let mut late = Canvas::new(TEXTURE_SIZE, TEXTURE_SIZE);
        render_ad_texture(&mut early, 0.0, 1);
        render_ad_texture(&mut late, 1.7, 1);
        assert!(early.pixels().chunks(4).all(|px| px[3] == 255));
        assert_ne!(early, late);
    }

    #[test]
    fn zero_sized_buffers_are_a_no_op() {
        let mut empty = Canvas::new(0, 0);
        render_ad_texture(&mut empty, 1.0, 3);
        assert!(empty.pixels().is_empty());

        let mut flat = Canvas::new(16, 0);
        render_ad_texture(&mut flat, 1.0, 3);
        assert!(flat.pixels().is_empty());
    }

    #[test]
    fn pool_regenerates_every_entry() {
        let mut pool = TexturePool::new(3, 32);
        pool.regenerate(0.5);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.size(), 32);
        for index in 0..pool.len() {
            let mut expected = Canvas::new(32, 32);
            render_ad_texture(&mut expected, 0.5, index);
            assert_eq!(pool.get(index), &expected);
        }
        assert_ne!(pool.get(0), pool.get(1));
    }

    #[test]
    #[should_panic]
    fn empty_pool_is_rejected() {
        let _ = TexturePool::new(0, 32);
    }
}
