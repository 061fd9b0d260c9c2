use std::f32::consts::FRAC_PI_3;

use cgmath::{perspective, point3, vec3, InnerSpace, Matrix4, Point3, Rad, Vector3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

const ORBIT_SENSITIVITY: f32 = 0.005;
const ZOOM_SENSITIVITY: f32 = 0.2;
const ZOOM_PER_LINE: f32 = 0.5;
const PIXELS_PER_LINE: f32 = 40.0;
const MIN_DISTANCE_FACTOR: f32 = 0.1;
const MAX_DISTANCE_FACTOR: f32 = 4.0;
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Camera state the reset key returns to, derived once from the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraDefaults {
    pub distance: f32,
    pub fov_y: Rad<f32>,
}

impl CameraDefaults {
    /// Places the eye so that a plane through the origin fills the viewport
    /// height one world unit per pixel.
    pub fn for_viewport(height: u32) -> Self {
        let fov_y = Rad(FRAC_PI_3);
        Self {
            distance: (height as f32 / 2.0) / (fov_y.0 / 2.0).tan(),
            fov_y,
        }
    }

    pub fn znear(&self) -> f32 {
        self.distance / 10.0
    }

    pub fn zfar(&self) -> f32 {
        self.distance * 10.0
    }

    pub fn min_distance(&self) -> f32 {
        self.distance * MIN_DISTANCE_FACTOR
    }

    pub fn max_distance(&self) -> f32 {
        self.distance * MAX_DISTANCE_FACTOR
    }
}

/// Eye on a sphere around `target`. Yaw 0 and pitch 0 look down -Z.
pub struct OrbitCamera {
    pub target: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub distance: f32,
}

impl OrbitCamera {
    const UP: Vector3<f32> = vec3(0.0, 1.0, 0.0);

    pub fn new(defaults: &CameraDefaults) -> Self {
        Self {
            target: point3(0.0, 0.0, 0.0),
            yaw: Rad(0.0),
            pitch: Rad(0.0),
            distance: defaults.distance,
        }
    }

    pub fn eye(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        self.target + vec3(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    pub fn direction(&self) -> Vector3<f32> {
        (self.target - self.eye()).normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.direction().cross(Self::UP).normalize()
    }

    /// Screen-space up, which tilts with the pitch.
    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(self.direction())
    }

    pub fn calc_matrix(&self, projection: &Projection) -> Matrix4<f32> {
        projection.build_matrix() * Matrix4::look_at_rh(self.eye(), self.target, Self::UP)
    }

    pub fn orbit(&mut self, yaw: Rad<f32>, pitch: Rad<f32>) {
        self.yaw += yaw;
        self.pitch.0 = (self.pitch.0 + pitch.0).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Slides the target within the view plane by a world-space offset.
    pub fn pan(&mut self, right: f32, up: f32) {
        let offset = self.right() * right + self.up() * up;
        self.target += offset;
    }

    pub fn zoom(&mut self, factor: f32, min: f32, max: f32) {
        self.distance = (self.distance * factor).clamp(min, max);
    }

    pub fn reset(&mut self, defaults: &CameraDefaults) {
        *self = Self::new(defaults);
    }
}

pub struct Projection {
    aspect: f32,
    fov_y: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, defaults: &CameraDefaults) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fov_y: defaults.fov_y,
            znear: defaults.znear(),
            zfar: defaults.zfar(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn build_matrix(&self) -> Matrix4<f32> {
        perspective(self.fov_y, self.aspect, self.znear, self.zfar)
    }
}

/// Mouse orbit, pan and zoom. Events are accumulated and applied once per
/// frame in [`CameraController::update_camera`].
pub struct CameraController {
    sensitivity: f32,
    world_per_pixel: f32,
    min_distance: f32,
    max_distance: f32,
    is_orbit_pressed: bool,
    is_pan_pressed: bool,
    is_ctrl_pressed: bool,
    last_cursor: Option<(f32, f32)>,
    orbit_delta: (f32, f32),
    pan_delta: (f32, f32),
    scroll: f32,
}

impl CameraController {
    pub fn new(defaults: &CameraDefaults, viewport_height: u32) -> Self {
        let mut controller = Self {
            sensitivity: ORBIT_SENSITIVITY,
            world_per_pixel: 1.0,
            min_distance: defaults.min_distance(),
            max_distance: defaults.max_distance(),
            is_orbit_pressed: false,
            is_pan_pressed: false,
            is_ctrl_pressed: false,
            last_cursor: None,
            orbit_delta: (0.0, 0.0),
            pan_delta: (0.0, 0.0),
            scroll: 0.0,
        };
        controller.set_viewport(defaults, viewport_height);
        controller
    }

    /// World units covered by one pixel at unit distance from the eye.
    pub fn set_viewport(&mut self, defaults: &CameraDefaults, height: u32) {
        self.world_per_pixel = 2.0 * (defaults.fov_y.0 / 2.0).tan() / height.max(1) as f32;
    }

    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.is_ctrl_pressed = modifiers.state().control_key();
                false
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let is_pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.is_orbit_pressed = is_pressed,
                    MouseButton::Right => self.is_pan_pressed = is_pressed,
                    _ => return false,
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32);
                self.is_orbit_pressed || self.is_pan_pressed
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                self.scroll += lines;
                true
            }
            _ => false,
        }
    }

    fn cursor_moved(&mut self, x: f32, y: f32) {
        if let Some((last_x, last_y)) = self.last_cursor.replace((x, y)) {
            self.drag(x - last_x, y - last_y);
        }
    }

    fn drag(&mut self, dx: f32, dy: f32) {
        if self.is_pan_pressed || (self.is_orbit_pressed && self.is_ctrl_pressed) {
            self.pan_delta.0 += dx;
            self.pan_delta.1 += dy;
        } else if self.is_orbit_pressed {
            self.orbit_delta.0 += dx;
            self.orbit_delta.1 += dy;
        }
    }

    pub fn update_camera(&mut self, camera: &mut OrbitCamera) {
        let (dx, dy) = self.orbit_delta;
        if dx != 0.0 || dy != 0.0 {
            camera.orbit(Rad(-dx * self.sensitivity), Rad(dy * self.sensitivity));
        }

        let (px, py) = self.pan_delta;
        if px != 0.0 || py != 0.0 {
            let scale = camera.distance * self.world_per_pixel;
            camera.pan(-px * scale, py * scale);
        }

        if self.scroll != 0.0 {
            let factor = (-self.scroll * ZOOM_SENSITIVITY * ZOOM_PER_LINE).exp();
            camera.zoom(factor, self.min_distance, self.max_distance);
        }

        self.reset_motion();
    }

    pub fn reset_motion(&mut self) {
        self.orbit_delta = (0.0, 0.0);
        self.pan_delta = (0.0, 0.0);
        self.scroll = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use cgmath::EuclideanSpace;

    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn default_distance_matches_viewport() {
        let defaults = CameraDefaults::for_viewport(600);
        assert!(approx(defaults.distance, 300.0 / (FRAC_PI_3 / 2.0).tan()));
        assert!(approx(defaults.znear(), defaults.distance / 10.0));
        assert!(approx(defaults.zfar(), defaults.distance * 10.0));
    }

    #[test]
    fn default_eye_looks_down_negative_z() {
        let defaults = CameraDefaults::for_viewport(600);
        let camera = OrbitCamera::new(&defaults);
        let eye = camera.eye();
        assert!(approx(eye.x, 0.0) && approx(eye.y, 0.0));
        assert!(approx(eye.z, defaults.distance));
        assert!(approx(camera.direction().z, -1.0));
        assert!(approx(camera.right().x, 1.0));
        assert!(approx(camera.up().y, 1.0));
    }

    #[test]
    fn pitch_is_clamped_short_of_the_poles() {
        let mut camera = OrbitCamera::new(&CameraDefaults::for_viewport(600));
        camera.orbit(Rad(0.0), Rad(10.0));
        assert!(approx(camera.pitch.0, PITCH_LIMIT));
        camera.orbit(Rad(0.0), Rad(-20.0));
        assert!(approx(camera.pitch.0, -PITCH_LIMIT));
    }

    #[test]
    fn orbit_keeps_distance_to_target() {
        let mut camera = OrbitCamera::new(&CameraDefaults::for_viewport(600));
        camera.orbit(Rad(1.1), Rad(0.4));
        let d = (camera.eye() - camera.target).magnitude();
        assert!(approx(d, camera.distance));
    }

    #[test]
    fn pan_moves_target_across_the_view() {
        let mut camera = OrbitCamera::new(&CameraDefaults::for_viewport(600));
        camera.orbit(Rad(0.7), Rad(0.3));
        let before = camera.direction();
        camera.pan(25.0, -10.0);
        let moved = camera.target.to_vec();
        assert!(approx(moved.magnitude(), (25.0f32 * 25.0 + 100.0).sqrt()));
        assert!(approx(moved.dot(before), 0.0));
        assert!(approx(camera.direction().dot(before), 1.0));
    }

    #[test]
    fn zoom_respects_limits() {
        let defaults = CameraDefaults::for_viewport(600);
        let mut camera = OrbitCamera::new(&defaults);
        camera.zoom(0.001, defaults.min_distance(), defaults.max_distance());
        assert!(approx(camera.distance, defaults.min_distance()));
        camera.zoom(1e6, defaults.min_distance(), defaults.max_distance());
        assert!(approx(camera.distance, defaults.max_distance()));
    }

    #[test]
    fn reset_restores_defaults() {
        let defaults = CameraDefaults::for_viewport(600);
        let mut camera = OrbitCamera::new(&defaults);
        camera.orbit(Rad(2.0), Rad(0.5));
        camera.pan(40.0, 40.0);
        camera.zoom(0.5, 1.0, 1e4);
        camera.reset(&defaults);
        assert_eq!(camera.target, point3(0.0, 0.0, 0.0));
        assert_eq!(camera.yaw, Rad(0.0));
        assert_eq!(camera.pitch, Rad(0.0));
        assert_eq!(camera.distance, defaults.distance);
    }

    #[test]
    fn left_drag_orbits_and_ctrl_drag_pans() {
        let defaults = CameraDefaults::for_viewport(600);
        let mut controller = CameraController::new(&defaults, 600);
        let mut camera = OrbitCamera::new(&defaults);

        controller.is_orbit_pressed = true;
        controller.cursor_moved(100.0, 100.0);
        controller.cursor_moved(140.0, 100.0);
        controller.update_camera(&mut camera);
        assert!(approx(camera.yaw.0, -40.0 * ORBIT_SENSITIVITY));
        assert_eq!(camera.target, point3(0.0, 0.0, 0.0));

        controller.is_ctrl_pressed = true;
        let yaw = camera.yaw;
        controller.cursor_moved(150.0, 100.0);
        controller.update_camera(&mut camera);
        assert_eq!(camera.yaw, yaw);
        // One pixel is one world unit at the default distance.
        assert!(approx(camera.target.to_vec().magnitude(), 10.0));
    }

    #[test]
    fn wheel_zooms_in_and_motion_is_consumed() {
        let defaults = CameraDefaults::for_viewport(600);
        let mut controller = CameraController::new(&defaults, 600);
        let mut camera = OrbitCamera::new(&defaults);

        controller.scroll = 2.0;
        controller.update_camera(&mut camera);
        assert!(camera.distance < defaults.distance);

        let distance = camera.distance;
        controller.update_camera(&mut camera);
        assert_eq!(camera.distance, distance);
    }

    #[test]
    fn moving_without_buttons_does_nothing() {
        let defaults = CameraDefaults::for_viewport(600);
        let mut controller = CameraController::new(&defaults, 600);
        let mut camera = OrbitCamera::new(&defaults);
        controller.cursor_moved(0.0, 0.0);
        controller.cursor_moved(300.0, 200.0);
        controller.update_camera(&mut camera);
        assert_eq!(camera.yaw, Rad(0.0));
        assert_eq!(camera.target, point3(0.0, 0.0, 0.0));
    }
}
