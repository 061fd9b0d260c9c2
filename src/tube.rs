use std::f32::consts::TAU;
use std::ops::Range;

use cgmath::{vec3, InnerSpace, Matrix4, Rad, Vector4};
use noise::{NoiseFn, Perlin};

use crate::color::{hsl_to_rgba, to_linear};
use crate::input::ToggleState;
use crate::tiles::{Tile, TileLayout, TubeShape};

const NOISE_OCTAVES: usize = 4;
const NOISE_BASE: f64 = 2.0;
const NOISE_ANGLE_SCALE: f64 = 0.008;
const NOISE_HEIGHT_SCALE: f64 = 0.008;
const NOISE_TIME_SCALE: f64 = 0.22;

pub const RADIUS_MIN_FACTOR: f32 = 0.8;
pub const RADIUS_MAX_FACTOR: f32 = 1.16;

const FLICKER_FLOOR: f32 = 0.75;
const FLICKER_SPEED: f32 = 8.0;

const GLOW_SATURATION: f32 = 80.0;
const GLOW_LIGHTNESS: f32 = 55.0;
const GLOW_ALPHA: f32 = 110.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PanelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tint: [f32; 4],
    pub layer: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelPass {
    Glow,
    Main,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelDraw {
    pub pass: PanelPass,
    pub indices: Range<u32>,
}

/// All panel quads for one frame, with draw ranges kept in submission order.
#[derive(Default)]
pub struct TubeMesh {
    pub vertices: Vec<PanelVertex>,
    pub indices: Vec<u32>,
    pub draws: Vec<PanelDraw>,
}

impl TubeMesh {
    fn push_quad(
        &mut self,
        pass: PanelPass,
        model: &Matrix4<f32>,
        size: (f32, f32),
        layer: u32,
        tint: [f32; 4],
    ) {
        let (hw, hh) = (size.0 * 0.5, size.1 * 0.5);
        let normal = (model * Vector4::new(0.0, 0.0, 1.0, 0.0)).truncate().normalize();
        let corners = [
            ([-hw, hh], [0.0, 0.0]),
            ([hw, hh], [1.0, 0.0]),
            ([hw, -hh], [1.0, 1.0]),
            ([-hw, -hh], [0.0, 1.0]),
        ];

        let base = self.vertices.len() as u32;
        for (corner, uv) in corners {
            let p = model * Vector4::new(corner[0], corner[1], 0.0, 1.0);
            self.vertices.push(PanelVertex {
                position: [p.x, p.y, p.z],
                normal: normal.into(),
                uv,
                tint,
                layer,
            });
        }

        let start = self.indices.len() as u32;
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        let end = self.indices.len() as u32;

        match self.draws.last_mut() {
            Some(last) if last.pass == pass && last.indices.end == start => last.indices.end = end,
            _ => self.draws.push(PanelDraw {
                pass,
                indices: start..end,
            }),
        }
    }
}

/// Seeded octave Perlin noise remapped to `[0, 1]`.
pub struct NoiseField {
    perlin: Perlin,
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }

    pub fn sample(&self, point: [f64; 3]) -> f32 {
        let mut total = 0.0;
        let mut norm = 0.0;
        let mut amplitude = 0.5;
        let mut frequency = 1.0;
        for _ in 0..NOISE_OCTAVES {
            let p = [point[0] * frequency, point[1] * frequency, point[2] * frequency];
            total += amplitude * (self.perlin.get(p) * 0.5 + 0.5);
            norm += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        (total / norm).clamp(0.0, 1.0) as f32
    }
}

fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + (value - in_min) / (in_max - in_min) * (out_max - out_min)
}

/// Noise sample in `[0, 1]` to a radius factor in `[0.8, 1.16]`.
pub fn radius_multiplier(noise: f32) -> f32 {
    map_range(noise.clamp(0.0, 1.0), 0.0, 1.0, RADIUS_MIN_FACTOR, RADIUS_MAX_FACTOR)
}

pub fn flicker(time: f32, phase: f32, enabled: bool) -> f32 {
    if !enabled {
        return 1.0;
    }
    FLICKER_FLOOR + (1.0 - FLICKER_FLOOR) * (time * FLICKER_SPEED + phase).sin().abs()
}

/// Ring 0 sits at `+half_length`, the last ring at `-half_length`. A single
/// ring is centred.
pub fn ring_height(ring: usize, rings: usize, half_length: f32) -> f32 {
    if rings <= 1 {
        return 0.0;
    }
    map_range(ring as f32, 0.0, (rings - 1) as f32, half_length, -half_length)
}

pub fn segment_angle(segment: usize, segments: usize) -> f32 {
    map_range(segment as f32, 0.0, segments as f32, 0.0, TAU)
}

/// Where one tile sits on the tube this frame, in tube-local cylindrical
/// coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePlacement {
    pub angle: f32,
    pub y: f32,
    pub radius: f32,
}

impl TilePlacement {
    pub fn transform(&self) -> Matrix4<f32> {
        Matrix4::from_angle_y(Rad(self.angle))
            * Matrix4::from_translation(vec3(0.0, self.y, self.radius))
    }
}

pub struct TubeRenderer {
    shape: TubeShape,
    noise: NoiseField,
}

impl TubeRenderer {
    pub fn new(shape: TubeShape) -> Self {
        Self {
            noise: NoiseField::new(shape.noise_seed),
            shape,
        }
    }

    /// Spins the tube about the vertical axis and floats it above the floor.
    pub fn tube_transform(&self, spin: Rad<f32>) -> Matrix4<f32> {
        Matrix4::from_angle_y(spin)
            * Matrix4::from_translation(vec3(0.0, self.shape.half_length + self.shape.lift, 0.0))
    }

    pub fn place(&self, tile: &Tile, time: f32) -> TilePlacement {
        let y = ring_height(tile.ring, self.shape.rings, self.shape.half_length) + tile.y_jitter;
        let angle = segment_angle(tile.segment, self.shape.segments) + tile.angle_jitter;

        let offset = tile.noise_offset;
        let n = self.noise.sample([
            NOISE_BASE + offset.x as f64 + NOISE_ANGLE_SCALE * (angle as f64).cos(),
            NOISE_BASE + offset.y as f64 + NOISE_HEIGHT_SCALE * y as f64,
            NOISE_BASE + offset.z as f64 + NOISE_TIME_SCALE * time as f64,
        ]);

        TilePlacement {
            angle,
            y,
            radius: self.shape.base_radius * radius_multiplier(n),
        }
    }

    /// Emits every tile as a main quad, preceded by its enlarged additive
    /// glow quad when glow is on.
    pub fn build_mesh(
        &self,
        layout: &TileLayout,
        time: f32,
        toggles: ToggleState,
        tube_transform: Matrix4<f32>,
        texture_count: usize,
    ) -> TubeMesh {
        let quads_per_tile = if toggles.enable_glow { 2 } else { 1 };
        let mut mesh = TubeMesh {
            vertices: Vec::with_capacity(layout.len() * quads_per_tile * 4),
            indices: Vec::with_capacity(layout.len() * quads_per_tile * 6),
            draws: Vec::new(),
        };

        for tile in layout.tiles() {
            debug_assert!(
                tile.texture_index < texture_count,
                "tile texture {} outside pool of {}",
                tile.texture_index,
                texture_count
            );
            let model = tube_transform * self.place(tile, time).transform();
            let layer = tile.texture_index as u32;
            let flicker = flicker(time, tile.flicker_phase, toggles.enable_flicker);

            if toggles.enable_glow {
                let alpha = (GLOW_ALPHA * flicker).round() as u8;
                let tint = to_linear(hsl_to_rgba(tile.hue, GLOW_SATURATION, GLOW_LIGHTNESS, alpha));
                let size = (tile.width * tile.glow_scale, tile.height * tile.glow_scale);
                mesh.push_quad(PanelPass::Glow, &model, size, layer, tint);
            }

            mesh.push_quad(
                PanelPass::Main,
                &model,
                (tile.width, tile.height),
                layer,
                [1.0, 1.0, 1.0, flicker],
            );
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;

    fn small_shape() -> TubeShape {
        TubeShape {
            rings: 3,
            segments: 4,
            ..TubeShape::default()
        }
    }

    #[test]
    fn radius_multiplier_stays_in_band() {
        assert!((radius_multiplier(0.0) - 0.8).abs() < 1e-6);
        assert!((radius_multiplier(1.0) - 1.16).abs() < 1e-6);
        for i in 0..=100 {
            let m = radius_multiplier(i as f32 / 100.0);
            assert!((0.8..=1.16).contains(&m));
        }
        assert!((radius_multiplier(-3.0) - 0.8).abs() < 1e-6);
        assert!((radius_multiplier(7.0) - 1.16).abs() < 1e-6);
    }

    #[test]
    fn flicker_stays_between_floor_and_one() {
        for step in 0..2000 {
            let time = step as f32 * 0.013;
            for phase in [0.0, 1.0, 2.5, 6.0] {
                let f = flicker(time, phase, true);
                assert!((0.75..=1.0).contains(&f), "flicker {f} at t={time}");
                assert_eq!(flicker(time, phase, false), 1.0);
            }
        }
    }

    #[test]
    fn noise_is_bounded_and_smooth() {
        let field = NoiseField::new(7);
        let mut previous = field.sample([2.0, 2.0, 2.0]);
        for step in 1..500 {
            let t = step as f64 * 0.01;
            let value = field.sample([2.5, 3.1, 2.0 + t]);
            assert!((0.0..=1.0).contains(&value));
            if step > 1 {
                assert!((value - previous).abs() < 0.1);
            }
            previous = value;
        }
        assert_eq!(field.sample([12.3, 4.5, 6.7]), NoiseField::new(7).sample([12.3, 4.5, 6.7]));
    }

    #[test]
    fn rings_span_the_tube_length() {
        assert_eq!(ring_height(0, 18, 180.0), 180.0);
        assert_eq!(ring_height(17, 18, 180.0), -180.0);
        assert_eq!(ring_height(0, 1, 180.0), 0.0);
        assert_eq!(segment_angle(0, 36), 0.0);
        assert!((segment_angle(9, 36) - TAU / 4.0).abs() < 1e-6);
        assert!(segment_angle(35, 36) < TAU);
    }

    #[test]
    fn placement_combines_grid_jitter_and_noise() {
        let shape = small_shape();
        let layout = TileLayout::new(&shape, 12);
        let tube = TubeRenderer::new(shape);
        for tile in layout.tiles() {
            let placed = tube.place(tile, 3.0);
            let expected_y = ring_height(tile.ring, 3, shape.half_length) + tile.y_jitter;
            let expected_angle = segment_angle(tile.segment, 4) + tile.angle_jitter;
            assert!((placed.y - expected_y).abs() < 1e-5);
            assert!((placed.angle - expected_angle).abs() < 1e-6);
            assert!(placed.radius >= shape.base_radius * 0.8 - 1e-3);
            assert!(placed.radius <= shape.base_radius * 1.16 + 1e-3);
        }
    }

    #[test]
    fn panel_centre_sits_on_the_perturbed_cylinder() {
        let shape = small_shape();
        let layout = TileLayout::new(&shape, 12);
        let tube = TubeRenderer::new(shape);
        let toggles = ToggleState {
            enable_glow: false,
            ..ToggleState::default()
        };
        let lift = tube.tube_transform(Rad(0.0));
        let mesh = tube.build_mesh(&layout, 1.5, toggles, lift, 12);

        for (tile, quad) in layout.tiles().iter().zip(mesh.vertices.chunks(4)) {
            let placed = tube.place(tile, 1.5);
            let centre = quad.iter().fold([0.0f32; 3], |acc, v| {
                [
                    acc[0] + v.position[0] * 0.25,
                    acc[1] + v.position[1] * 0.25,
                    acc[2] + v.position[2] * 0.25,
                ]
            });
            let axis_distance = (centre[0] * centre[0] + centre[2] * centre[2]).sqrt();
            assert!((axis_distance - placed.radius).abs() < 1e-2);
            assert!((centre[1] - (placed.y + shape.half_length + shape.lift)).abs() < 1e-2);
            assert!((centre[0] - placed.radius * placed.angle.sin()).abs() < 1e-2);
        }
    }

    #[test]
    fn glow_quads_precede_their_main_quads() {
        let shape = small_shape();
        let layout = TileLayout::new(&shape, 12);
        let tube = TubeRenderer::new(shape);
        let mesh = tube.build_mesh(&layout, 0.7, ToggleState::default(), Matrix4::from_scale(1.0), 12);

        assert_eq!(mesh.vertices.len(), layout.len() * 8);
        assert_eq!(mesh.draws.len(), layout.len() * 2);
        for (i, pair) in mesh.draws.chunks(2).enumerate() {
            assert_eq!(pair[0].pass, PanelPass::Glow);
            assert_eq!(pair[1].pass, PanelPass::Main);
            assert_eq!(pair[0].indices.end, pair[1].indices.start);

            let tile = &layout.tiles()[i];
            let glow = &mesh.vertices[i * 8..i * 8 + 4];
            let main = &mesh.vertices[i * 8 + 4..i * 8 + 8];
            let glow_width = glow[1].position_distance(&glow[0]);
            let main_width = main[1].position_distance(&main[0]);
            assert!((glow_width / main_width - tile.glow_scale).abs() < 1e-3);
        }
    }

    #[test]
    fn without_glow_everything_is_one_main_draw() {
        let shape = small_shape();
        let layout = TileLayout::new(&shape, 12);
        let tube = TubeRenderer::new(shape);
        let toggles = ToggleState {
            enable_glow: false,
            enable_flicker: false,
            ..ToggleState::default()
        };
        let mesh = tube.build_mesh(&layout, 2.0, toggles, Matrix4::from_scale(1.0), 12);

        assert_eq!(mesh.vertices.len(), layout.len() * 4);
        assert_eq!(
            mesh.draws,
            vec![PanelDraw {
                pass: PanelPass::Main,
                indices: 0..(layout.len() * 6) as u32,
            }]
        );
        assert!(mesh.vertices.iter().all(|v| v.tint == [1.0, 1.0, 1.0, 1.0]));
    }

    #[test]
    fn main_opacity_tracks_flicker() {
        let shape = small_shape();
        let layout = TileLayout::new(&shape, 12);
        let tube = TubeRenderer::new(shape);
        let toggles = ToggleState {
            enable_glow: false,
            ..ToggleState::default()
        };
        let time = 4.2;
        let mesh = tube.build_mesh(&layout, time, toggles, Matrix4::from_scale(1.0), 12);
        for (tile, quad) in layout.tiles().iter().zip(mesh.vertices.chunks(4)) {
            let expected = flicker(time, tile.flicker_phase, true);
            assert!(quad.iter().all(|v| (v.tint[3] - expected).abs() < 1e-6));
            assert!(quad.iter().all(|v| v.layer as usize == tile.texture_index));
        }
    }

    impl PanelVertex {
        fn position_distance(&self, other: &PanelVertex) -> f32 {
            let d = Vector3::from(self.position) - Vector3::from(other.position);
            d.magnitude()
        }
    }
}
