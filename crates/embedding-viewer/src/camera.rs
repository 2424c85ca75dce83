use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Minimum / maximum orbit elevation, keeps the camera from flipping over the poles.
const ELEVATION_LIMIT_RAD: f32 = 89.0 * std::f32::consts::PI / 180.0;
const MIN_RADIUS: f32 = 0.25;
const MAX_RADIUS: f32 = 50.0;

/// The part of the camera state a selection must never change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub zoom: f32,
}

/// A ray in world space with a unit-length direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

#[derive(Debug, Clone)]
pub struct Camera {
    // --- Orbital Parameters (Primary State) ---
    /// The point the camera orbits around.
    pub target: Vec3,
    /// Distance from the camera to the target.
    pub radius: f32,
    /// Rotation around the world Y axis (radians); 0 looks down -Z.
    pub azimuth_rad: f32,
    /// Angle above the XZ plane through the target (radians).
    pub elevation_rad: f32,

    // --- Projection ---
    pub fov_y_rad: f32,
    /// Divides the field of view; 1.0 is neutral.
    pub zoom: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    // --- Derived Properties (Updated by `update()`) ---
    position: Vec3,
}

impl Camera {
    /// Creates a camera `radius` units in front of `target` along +Z.
    pub fn new(target: Vec3, radius: f32, aspect: f32) -> Self {
        let mut camera = Self {
            target,
            radius,
            azimuth_rad: 0.0,
            elevation_rad: 0.0,
            fov_y_rad: 75f32.to_radians(),
            zoom: 1.0,
            aspect,
            near: 0.1,
            far: 1000.0,
            position: Vec3::ZERO, // placeholder
        };
        camera.update();
        camera
    }

    /// Recalculates the position from the orbital parameters. Must be called
    /// after any of them change.
    pub fn update(&mut self) {
        let (sin_az, cos_az) = self.azimuth_rad.sin_cos();
        let (sin_el, cos_el) = self.elevation_rad.sin_cos();
        let offset = Vec3::new(
            self.radius * cos_el * sin_az,
            self.radius * sin_el,
            self.radius * cos_el * cos_az,
        );
        self.position = self.target + offset;
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Moves the camera to `position`, keeping the target, and re-derives the
    /// orbital parameters from it.
    pub fn set_position(&mut self, position: Vec3) {
        let offset = position - self.target;
        let radius = offset.length();
        if radius > f32::EPSILON {
            self.radius = radius;
            self.elevation_rad = (offset.y / radius).clamp(-1.0, 1.0).asin();
            self.azimuth_rad = offset.x.atan2(offset.z);
        }
        self.position = position;
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            target: self.target,
            zoom: self.zoom,
        }
    }

    pub fn set_pose(&mut self, pose: &CameraPose) {
        self.target = pose.target;
        self.zoom = pose.zoom;
        self.set_position(pose.position);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Right-handed perspective with WebGPU's `[0, 1]` depth range.
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad / self.zoom.max(1e-3), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    /// World-space ray from the eye through a point in normalized device
    /// coordinates (`x` right, `y` up, both in `[-1, 1]`).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_proj().inverse();
        let near = inv * ndc.extend(0.0).extend(1.0);
        let near = near.xyz() / near.w;
        Ray {
            origin: self.position,
            dir: (near - self.position).normalize_or_zero(),
        }
    }

    /// Camera basis for billboarding: (right, up).
    pub fn billboard_axes(&self) -> (Vec3, Vec3) {
        let view = self.view();
        let right = Vec3::new(view.x_axis.x, view.y_axis.x, view.z_axis.x);
        let up = Vec3::new(view.x_axis.y, view.y_axis.y, view.z_axis.y);
        (right, up)
    }
}

/// Converts a pixel position inside a `width` x `height` viewport to NDC.
pub fn pixel_to_ndc(px: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(
        px.x / width.max(1.0) * 2.0 - 1.0,
        -(px.y / height.max(1.0)) * 2.0 + 1.0,
    )
}

/// Left-drag orbit, wheel dolly, with exponential damping of the orbit motion.
///
/// Input only accumulates pending deltas; [`CameraController::update`] applies
/// a fraction of them each frame, so the camera keeps drifting for a few
/// frames after the pointer stops.
#[derive(Debug, Clone)]
pub struct CameraController {
    mouse_down: bool,
    last_mouse: Option<(f64, f64)>,
    enabled: bool,
    /// Fraction of the pending rotation applied per frame.
    pub damping: f32,
    /// Radians of rotation per pixel of drag.
    pub rotate_speed: f32,
    pending_azimuth: f32,
    pending_elevation: f32,
    pending_scale: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    /// Creates a new controller with default state.
    pub fn new() -> Self {
        Self {
            mouse_down: false,
            last_mouse: None,
            enabled: true,
            damping: 0.05,
            rotate_speed: 0.005,
            pending_azimuth: 0.0,
            pending_elevation: 0.0,
            pending_scale: 1.0,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Drops any motion still waiting to be applied.
    pub fn halt(&mut self) {
        self.pending_azimuth = 0.0;
        self.pending_elevation = 0.0;
        self.pending_scale = 1.0;
    }

    /// Handles window events, accumulating camera motion.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                if *button == MouseButton::Left {
                    self.on_button(*state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor((position.x, position.y));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                self.on_scroll(scroll);
            }
            _ => {}
        }
    }

    pub fn on_button(&mut self, pressed: bool) {
        self.mouse_down = pressed;
    }

    /// Accumulates orbit motion while the left button is held.
    pub fn on_cursor(&mut self, xy: (f64, f64)) {
        if let Some(last) = self.last_mouse {
            if self.mouse_down && self.enabled {
                let dx = (xy.0 - last.0) as f32 * self.rotate_speed;
                let dy = (xy.1 - last.1) as f32 * self.rotate_speed;
                self.pending_azimuth -= dx;
                self.pending_elevation += dy;
            }
        }
        self.last_mouse = Some(xy);
    }

    /// Positive delta = scroll up = move closer.
    pub fn on_scroll(&mut self, delta: f32) {
        if self.enabled {
            self.pending_scale *= 0.95_f32.powf(delta);
        }
    }

    /// Applies one frame of damped motion. Does nothing while disabled.
    pub fn update(&mut self, camera: &mut Camera) {
        if !self.enabled {
            return;
        }

        camera.azimuth_rad += self.pending_azimuth * self.damping;
        camera.elevation_rad = (camera.elevation_rad + self.pending_elevation * self.damping)
            .clamp(-ELEVATION_LIMIT_RAD, ELEVATION_LIMIT_RAD);
        camera.radius = (camera.radius * self.pending_scale).clamp(MIN_RADIUS, MAX_RADIUS);

        self.pending_azimuth *= 1.0 - self.damping;
        self.pending_elevation *= 1.0 - self.damping;
        self.pending_scale = 1.0;

        camera.update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn default_camera_sits_on_positive_z() {
        let cam = Camera::new(Vec3::ZERO, 4.0, 1.0);
        assert!(approx(cam.position(), Vec3::new(0.0, 0.0, 4.0)));
    }

    #[test]
    fn center_ray_points_at_target() {
        let cam = Camera::new(Vec3::ZERO, 4.0, 16.0 / 9.0);
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        assert!(approx(ray.origin, Vec3::new(0.0, 0.0, 4.0)));
        assert!(approx(ray.dir, Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn pose_round_trip() {
        let mut cam = Camera::new(Vec3::ZERO, 4.0, 1.0);
        let pose = CameraPose {
            position: Vec3::new(1.0, 2.0, 3.0),
            target: Vec3::new(0.5, 0.0, 0.0),
            zoom: 1.5,
        };
        cam.set_pose(&pose);
        assert_eq!(cam.pose(), pose);

        // Orbital parameters must agree with the restored position.
        cam.update();
        assert!(approx(cam.position(), pose.position));
    }

    #[test]
    fn pixel_to_ndc_corners() {
        assert_eq!(pixel_to_ndc(Vec2::new(0.0, 0.0), 200.0, 100.0), Vec2::new(-1.0, 1.0));
        assert_eq!(pixel_to_ndc(Vec2::new(200.0, 100.0), 200.0, 100.0), Vec2::new(1.0, -1.0));
        assert_eq!(pixel_to_ndc(Vec2::new(100.0, 50.0), 200.0, 100.0), Vec2::ZERO);
    }

    #[test]
    fn damping_keeps_moving_after_release() {
        let mut cam = Camera::new(Vec3::ZERO, 4.0, 1.0);
        let mut ctl = CameraController::new();
        ctl.on_cursor((0.0, 0.0));
        ctl.on_button(true);
        ctl.on_cursor((40.0, 0.0));
        ctl.on_button(false);

        let before = cam.azimuth_rad;
        ctl.update(&mut cam);
        let after_one = cam.azimuth_rad;
        ctl.update(&mut cam);
        assert!(after_one < before);
        assert!(cam.azimuth_rad < after_one);

        ctl.halt();
        let frozen = cam.azimuth_rad;
        ctl.update(&mut cam);
        assert_eq!(cam.azimuth_rad, frozen);
    }

    #[test]
    fn disabled_controller_ignores_input() {
        let mut cam = Camera::new(Vec3::ZERO, 4.0, 1.0);
        let mut ctl = CameraController::new();
        ctl.set_enabled(false);
        ctl.on_cursor((0.0, 0.0));
        ctl.on_button(true);
        ctl.on_cursor((40.0, 40.0));
        ctl.on_scroll(3.0);
        ctl.update(&mut cam);
        assert!(approx(cam.position(), Vec3::new(0.0, 0.0, 4.0)));

        // Nothing was queued while disabled.
        ctl.set_enabled(true);
        ctl.update(&mut cam);
        assert!(approx(cam.position(), Vec3::new(0.0, 0.0, 4.0)));
    }
}
