use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec2, Vec3};

use crate::render::CameraParams;
use crate::scene::CameraConfig;

const MIN_POLAR: f32 = 1e-3;
const MIN_RADIUS: f32 = 0.1;
const ZOOM_SCALE: f32 = 0.95;

/// Main view camera.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            fov: config.fov,
            aspect: aspect.max(0.01),
            near: config.near,
            far: config.far,
            position: config.position,
            target: Vec3::ZERO,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
    }

    pub fn params(&self) -> CameraParams {
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        let projection =
            Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect.max(0.01), self.near, self.far);
        CameraParams {
            view_proj: projection * view,
            position: self.position,
        }
    }
}

/// Orbits a camera around its target from pointer drags and wheel input, with optional damping.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub damping: Option<f32>,
    pub rotate_speed: f32,
    radius: f32,
    theta: f32,
    phi: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitControls {
    pub fn new(camera: &PerspectiveCamera, damping: Option<f32>) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.length().max(MIN_RADIUS);
        Self {
            damping: damping.filter(|factor| *factor > 0.0).map(|factor| factor.min(1.0)),
            rotate_speed: 1.0,
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    /// Queues a rotation for a pointer drag of `delta` pixels on a viewport `viewport_height` pixels tall.
    pub fn drag(&mut self, delta: Vec2, viewport_height: u32) {
        let height = viewport_height.max(1) as f32;
        self.delta_theta -= TAU * delta.x / height * self.rotate_speed;
        self.delta_phi -= TAU * delta.y / height * self.rotate_speed;
    }

    /// Queues a dolly: negative wheel deltas move closer, positive ones move away.
    pub fn wheel(&mut self, delta: f32) {
        if delta < 0.0 {
            self.scale *= ZOOM_SCALE;
        } else if delta > 0.0 {
            self.scale /= ZOOM_SCALE;
        }
    }

    /// Applies queued motion to `camera`. Returns whether the camera moved noticeably.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let factor = self.damping.unwrap_or(1.0);
        self.theta += self.delta_theta * factor;
        self.phi = (self.phi + self.delta_phi * factor).clamp(MIN_POLAR, PI - MIN_POLAR);
        self.radius = (self.radius * self.scale).max(MIN_RADIUS);

        let moved = self.delta_theta.abs() > 1e-6 || self.delta_phi.abs() > 1e-6 || self.scale != 1.0;
        if self.damping.is_some() {
            self.delta_theta *= 1.0 - factor;
            self.delta_phi *= 1.0 - factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;

        let sin_phi = self.phi.sin();
        let offset = Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        );
        camera.position = camera.target + offset;
        moved
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// Top-down orthographic camera used by the minimap.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    pub zoom: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl OrthographicCamera {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
            near,
            far,
            zoom: 1.0,
            position: Vec3::new(0.0, 1.0, 0.0),
            target: Vec3::ZERO,
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Frustum bounds after applying `zoom`, as `(left, right, bottom, top)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        let zoom = self.zoom.max(f32::EPSILON);
        let cx = (self.left + self.right) * 0.5;
        let cy = (self.top + self.bottom) * 0.5;
        let dx = (self.right - self.left) / (2.0 * zoom);
        let dy = (self.top - self.bottom) / (2.0 * zoom);
        (cx - dx, cx + dx, cy - dy, cy + dy)
    }

    pub fn params(&self) -> CameraParams {
        // Looking straight down, so "up" on screen is world -z.
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::NEG_Z);
        let (left, right, bottom, top) = self.bounds();
        let projection = Mat4::orthographic_rh_gl(left, right, bottom, top, self.near, self.far);
        CameraParams {
            view_proj: projection * view,
            position: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn orbit_without_input_keeps_position() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 16.0 / 9.0);
        let mut controls = OrbitControls::new(&camera, Some(0.05));
        assert!(!controls.update(&mut camera));
        assert!(approx(camera.position, Vec3::new(0.0, 1.0, 2.0)));
    }

    #[test]
    fn damped_rotation_eases_out() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        let mut controls = OrbitControls::new(&camera, Some(0.05));
        controls.drag(Vec2::new(100.0, 0.0), 600);
        controls.update(&mut camera);
        let first = camera.position;
        for _ in 0..400 {
            controls.update(&mut camera);
        }
        let settled = camera.position;
        assert!(first.distance(Vec3::new(0.0, 1.0, 2.0)) < settled.distance(Vec3::new(0.0, 1.0, 2.0)));
        assert!((settled.length() - 5.0f32.sqrt()).abs() < 1e-4);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn wheel_dollies_towards_target() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        let mut controls = OrbitControls::new(&camera, None);
        let before = controls.radius();
        controls.wheel(-120.0);
        assert!(controls.update(&mut camera));
        assert!((controls.radius() - before * ZOOM_SCALE).abs() < 1e-5);
    }

    #[test]
    fn orthographic_zoom_shrinks_bounds() {
        let mut camera = OrthographicCamera::new(-100.0, 100.0, 100.0, -100.0, 0.1, 1000.0);
        camera.zoom = 2.0;
        assert_eq!(camera.bounds(), (-50.0, 50.0, -50.0, 50.0));
    }

    #[test]
    fn orthographic_projection_maps_ground_to_clip_space() {
        let mut camera = OrthographicCamera::new(-100.0, 100.0, 100.0, -100.0, 0.1, 1000.0);
        camera.position = Vec3::new(0.0, 100.0, 0.0);
        let clip = camera.params().project(Vec3::new(100.0, 0.0, -100.0));
        assert!((clip.x - 1.0).abs() < 1e-4);
        assert!((clip.y - 1.0).abs() < 1e-4);
    }
}
