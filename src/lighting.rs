use cgmath::{InnerSpace, Vector3};

use crate::color::srgb_to_linear;

/// Ambient term plus one directional light, in linear colour space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLighting {
    pub ambient: [f32; 3],
    pub light_color: [f32; 3],
    /// Direction the light travels, normalised.
    pub direction: Vector3<f32>,
}

impl SceneLighting {
    pub fn from_rgb8(ambient: [u8; 3], light_color: [u8; 3], direction: Vector3<f32>) -> Self {
        let linear = |c: [u8; 3]| c.map(|v| srgb_to_linear(v as f32 / 255.0));
        Self {
            ambient: linear(ambient),
            light_color: linear(light_color),
            direction: direction.normalize(),
        }
    }
}

impl Default for SceneLighting {
    fn default() -> Self {
        // Dim blue ambient and a cool key light shining down and away from
        // the default camera.
        Self::from_rgb8(
            [30, 30, 40],
            [180, 180, 220],
            Vector3::new(-0.3, 0.5, -1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mirrors the panel fragment shader: two-sided Lambert plus ambient.
    impl SceneLighting {
        fn irradiance(&self, normal: Vector3<f32>) -> [f32; 3] {
            let lambert = normal.normalize().dot(-self.direction).abs();
            [
                (self.ambient[0] + self.light_color[0] * lambert).min(1.0),
                (self.ambient[1] + self.light_color[1] * lambert).min(1.0),
                (self.ambient[2] + self.light_color[2] * lambert).min(1.0),
            ]
        }
    }

    #[test]
    fn direction_is_normalised() {
        let lighting = SceneLighting::default();
        assert!((lighting.direction.magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn facing_the_light_is_brighter_than_edge_on() {
        let lighting = SceneLighting::default();
        let facing = lighting.irradiance(-lighting.direction);
        let edge_on = lighting.irradiance(lighting.direction.cross(Vector3::unit_y()));
        assert!(facing[2] > edge_on[2]);
        for channel in 0..3 {
            assert!((edge_on[channel] - lighting.ambient[channel]).abs() < 1e-4);
        }
    }

    #[test]
    fn back_faces_are_lit_like_front_faces() {
        let lighting = SceneLighting::default();
        let n = Vector3::new(0.2, 0.1, 1.0);
        assert_eq!(lighting.irradiance(n), lighting.irradiance(-n));
    }
}
