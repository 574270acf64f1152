// SPDX-License-Identifier: MIT OR Apache-2.0
//! Perspective camera and orbit controls.

use crate::config::CameraSettings;
use glam::{Mat4, Vec3};

const EPS: f32 = 1e-6;

/// Perspective camera looking at a target
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Eye position
    pub position: Vec3,
    /// Look-at point
    pub target: Vec3,
    /// Up direction
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Width over height
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default(), 1.0)
    }
}

impl PerspectiveCamera {
    /// Camera from settings with the given aspect ratio
    pub fn from_settings(settings: &CameraSettings, aspect: f32) -> Self {
        Self {
            position: Vec3::from_array(settings.position),
            target: Vec3::from_array(settings.target),
            up: Vec3::Y,
            fov: settings.fov,
            aspect,
            near: settings.near,
            far: settings.far,
        }
    }

    /// Update the aspect ratio; ignored when not positive
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Point the camera at `target`
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// World to view transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// View to clip transform
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    /// World to clip transform
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Distance from eye to target
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y
    phi: f32,
    /// Azimuth around +Y, measured from +Z
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius < EPS {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Rotates, zooms and pans a camera around its target
///
/// Input accumulates until [`OrbitControls::update`] applies it. With damping
/// enabled each update applies `damping_factor` of the pending rotation and
/// pan, so motion eases out over several frames.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    /// Orbit center
    pub target: Vec3,
    /// Ease rotation and pan over several updates
    pub enable_damping: bool,
    /// Share of the pending motion applied per update
    pub damping_factor: f32,
    /// Closest distance to the target
    pub min_distance: f32,
    /// Farthest distance from the target
    pub max_distance: f32,
    /// Lowest polar angle
    pub min_polar_angle: f32,
    /// Highest polar angle
    pub max_polar_angle: f32,
    pending: Spherical,
    scale: f32,
    pan_offset: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl OrbitControls {
    /// Controls orbiting `target`, with damping 0.05
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: std::f32::consts::PI,
            pending: Spherical::default(),
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }

    /// Controls from settings
    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self {
            enable_damping: settings.damping,
            damping_factor: settings.damping_factor,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            ..Self::new(Vec3::from_array(settings.target))
        }
    }

    /// Rotate around the up axis
    pub fn rotate_left(&mut self, angle: f32) {
        self.pending.theta -= angle;
    }

    /// Rotate towards the pole
    pub fn rotate_up(&mut self, angle: f32) {
        self.pending.phi -= angle;
    }

    /// Move closer by `factor` (> 1 zooms in)
    pub fn dolly_in(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale /= factor;
        }
    }

    /// Move away by `factor` (> 1 zooms out)
    pub fn dolly_out(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale *= factor;
        }
    }

    /// Shift the target and camera together
    pub fn pan(&mut self, offset: Vec3) {
        self.pan_offset += offset;
    }

    /// Whether rotation or pan is still pending
    pub fn is_settling(&self) -> bool {
        self.pending.theta.abs() > EPS
            || self.pending.phi.abs() > EPS
            || self.pan_offset.length_squared() > EPS * EPS
    }

    /// Apply pending input to `camera`; returns whether the camera moved
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let mut spherical = Spherical::from_offset(camera.position - self.target);

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.pending.theta * factor;
        spherical.phi += self.pending.phi * factor;

        let max_phi = self.max_polar_angle.min(std::f32::consts::PI - EPS);
        spherical.phi = spherical.phi.max(self.min_polar_angle.max(EPS)).min(max_phi);

        spherical.radius = (spherical.radius * self.scale)
            .max(self.min_distance)
            .min(self.max_distance);

        self.target += self.pan_offset * factor;

        let old_position = camera.position;
        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            self.pending.theta *= 1.0 - self.damping_factor;
            self.pending.phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.pending = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        old_position.distance_squared(camera.position) > EPS
    }

    /// Drop pending input
    pub fn reset(&mut self) {
        self.pending = Spherical::default();
        self.pan_offset = Vec3::ZERO;
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_camera_from_settings() {
        let camera = PerspectiveCamera::from_settings(&CameraSettings::default(), 16.0 / 9.0);
        assert_eq!(camera.position, Vec3::new(6.0, 4.0, 12.0));
        assert_eq!(camera.fov, 75.0);

        // target projects to the center of the screen
        let clip = camera.view_projection() * camera.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    }

    #[test]
    fn test_set_aspect_ignores_invalid() {
        let mut camera = PerspectiveCamera::default();
        camera.set_aspect(2.0);
        camera.set_aspect(0.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn test_idle_update_keeps_camera() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        let before = camera.position;
        assert!(!controls.update(&mut camera));
        assert!((camera.position - before).length() < 1e-4);
    }

    #[test]
    fn test_damping_eases_rotation() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        let start = Spherical::from_offset(camera.position);
        controls.rotate_left(0.2);

        controls.update(&mut camera);
        let first = Spherical::from_offset(camera.position);
        assert!(approx(first.theta, start.theta - 0.2 * 0.05, 1e-4));
        assert!(controls.is_settling());

        for _ in 0..400 {
            controls.update(&mut camera);
        }
        let settled = Spherical::from_offset(camera.position);
        assert!(approx(settled.theta, start.theta - 0.2, 1e-3));
        assert!(approx(settled.radius, start.radius, 1e-3));
        assert!(!controls.is_settling());
    }

    #[test]
    fn test_without_damping_applies_at_once() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.enable_damping = false;
        let start = Spherical::from_offset(camera.position);

        controls.rotate_up(0.1);
        assert!(controls.update(&mut camera));
        let moved = Spherical::from_offset(camera.position);
        assert!(approx(moved.phi, start.phi - 0.1, 1e-4));
        assert!(!controls.is_settling());
    }

    #[test]
    fn test_distance_is_clamped() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.min_distance = 5.0;
        controls.max_distance = 20.0;

        controls.dolly_in(100.0);
        controls.update(&mut camera);
        assert!(approx(camera.distance(), 5.0, 1e-4));

        controls.dolly_out(100.0);
        controls.update(&mut camera);
        assert!(approx(camera.distance(), 20.0, 1e-3));
    }

    #[test]
    fn test_polar_angle_stays_off_the_pole() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.enable_damping = false;
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        assert!(camera.position.is_finite());
        assert!(camera.position.y > 0.0);
        assert!(approx(camera.distance(), 14.0, 1e-3));
    }
}
