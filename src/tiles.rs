use std::f32::consts::TAU;

use cgmath::Vector3;
use rand::{rngs::SmallRng, Rng, SeedableRng};

pub const RINGS: usize = 18;
pub const SEGMENTS: usize = 36;
pub const BASE_RADIUS: f32 = 170.0;
pub const TUBE_HALF_LENGTH: f32 = 180.0;
pub const TUBE_LIFT: f32 = 10.0;
pub const LAYOUT_SEED: u64 = 42;
pub const NOISE_SEED: u32 = 7;

const PANEL_SIZE_MIN: f32 = 28.0;
const PANEL_SIZE_MAX: f32 = 72.0;
const ANGLE_JITTER: f32 = 0.12;
const Y_JITTER: f32 = 6.0;
const NOISE_OFFSET_RANGE: f32 = 1000.0;
const GLOW_SCALE_MIN: f32 = 1.25;
const GLOW_SCALE_MAX: f32 = 1.6;

/// Dimensions of the panel cylinder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TubeShape {
    pub rings: usize,
    pub segments: usize,
    pub base_radius: f32,
    pub half_length: f32,
    pub lift: f32,
    pub layout_seed: u64,
    pub noise_seed: u32,
}

impl Default for TubeShape {
    fn default() -> Self {
        Self {
            rings: RINGS,
            segments: SEGMENTS,
            base_radius: BASE_RADIUS,
            half_length: TUBE_HALF_LENGTH,
            lift: TUBE_LIFT,
            layout_seed: LAYOUT_SEED,
            noise_seed: NOISE_SEED,
        }
    }
}

impl TubeShape {
    pub fn tile_count(&self) -> usize {
        self.rings * self.segments
    }
}

/// Static parameters of one panel. Everything that changes per frame is
/// derived from these plus the clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    pub ring: usize,
    pub segment: usize,
    pub width: f32,
    pub height: f32,
    pub angle_jitter: f32,
    pub y_jitter: f32,
    pub noise_offset: Vector3<f32>,
    pub texture_index: usize,
    pub hue: f32,
    pub flicker_phase: f32,
    pub glow_scale: f32,
}

impl Tile {
    fn sample<R: Rng>(ring: usize, segment: usize, texture_count: usize, rng: &mut R) -> Self {
        let width = rng.gen_range(PANEL_SIZE_MIN..PANEL_SIZE_MAX);
        let height = rng.gen_range(PANEL_SIZE_MIN..PANEL_SIZE_MAX);
        let angle_jitter = rng.gen_range(-ANGLE_JITTER..ANGLE_JITTER);
        let y_jitter = rng.gen_range(-Y_JITTER..Y_JITTER);
        let noise_offset = Vector3::new(
            rng.gen_range(0.0..NOISE_OFFSET_RANGE),
            rng.gen_range(0.0..NOISE_OFFSET_RANGE),
            rng.gen_range(0.0..NOISE_OFFSET_RANGE),
        );
        Self {
            ring,
            segment,
            width,
            height,
            angle_jitter,
            y_jitter,
            noise_offset,
            texture_index: rng.gen_range(0..texture_count),
            hue: rng.gen_range(0.0..360.0),
            flicker_phase: rng.gen_range(0.0..TAU),
            glow_scale: rng.gen_range(GLOW_SCALE_MIN..GLOW_SCALE_MAX),
        }
    }
}

/// Ring-major grid of tiles, built once and never resized.
pub struct TileLayout {
    rings: usize,
    segments: usize,
    tiles: Vec<Tile>,
}

impl TileLayout {
    pub fn new(shape: &TubeShape, texture_count: usize) -> Self {
        let mut rng = SmallRng::seed_from_u64(shape.layout_seed);
        Self::generate(shape, texture_count, &mut rng)
    }

    pub fn generate<R: Rng>(shape: &TubeShape, texture_count: usize, rng: &mut R) -> Self {
        assert!(shape.rings > 0 && shape.segments > 0, "tube grid must not be empty");
        assert!(texture_count > 0, "tiles need at least one texture to sample");

        let mut tiles = Vec::with_capacity(shape.tile_count());
        for ring in 0..shape.rings {
            for segment in 0..shape.segments {
                tiles.push(Tile::sample(ring, segment, texture_count, rng));
            }
        }

        Self {
            rings: shape.rings,
            segments: shape.segments,
            tiles,
        }
    }

    pub fn rings(&self) -> usize {
        self.rings
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }
}
