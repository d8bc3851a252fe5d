// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Orbit camera driven by pointer, touch and wheel input
//!
//! The camera sits on a sphere around a look-at point. Dragging rotates it,
//! pinch and wheel move a *target* distance, and every frame eases the real
//! distance toward that target.

use nalgebra::{Point2, Point3, Vector3};
use smallvec::SmallVec;
use std::f32::consts::{FRAC_PI_2, PI};

/// Tunables for the orbit controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Radians of rotation per pixel dragged
    pub rotate_speed: f32,
    pub min_phi: f32,
    pub max_phi: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub default_distance: f32,
    pub default_theta: f32,
    pub default_phi: f32,
    /// Fraction of the remaining gap closed per frame
    pub zoom_smoothing: f32,
    pub zoom_epsilon: f32,
    /// Target-distance change per wheel unit, scaled by current distance
    pub wheel_sensitivity: f32,
    /// Target-distance change per pixel of pinch spread
    pub pinch_sensitivity: f32,
    pub fov_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            rotate_speed: 0.005,
            min_phi: 0.1,
            max_phi: PI - 0.1,
            min_distance: 1.0,
            max_distance: 10.0,
            default_distance: 3.5,
            default_theta: 0.0,
            default_phi: FRAC_PI_2,
            zoom_smoothing: 0.1,
            zoom_epsilon: 1e-3,
            wheel_sensitivity: 0.001,
            pinch_sensitivity: 0.01,
            fov_degrees: 45.0,
        }
    }
}

/// Spherical camera state around a look-at point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub distance: f32,
    pub target_distance: f32,
    /// Azimuth around the vertical axis
    pub theta: f32,
    /// Polar angle from +Y
    pub phi: f32,
    pub look_at: Point3<f32>,
    /// Cartesian eye position, kept in sync with the spherical triple
    pub position: Point3<f32>,
}

impl CameraState {
    pub fn new(config: &CameraConfig) -> Self {
        let mut state = Self {
            distance: config.default_distance,
            target_distance: config.default_distance,
            theta: config.default_theta,
            phi: config.default_phi.clamp(config.min_phi, config.max_phi),
            look_at: Point3::origin(),
            position: Point3::origin(),
        };
        state.sync_position();
        state
    }

    /// Recompute the eye position from `(distance, theta, phi)`.
    pub fn sync_position(&mut self) {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.position = self.look_at
            + Vector3::new(
                self.distance * sin_phi * sin_theta,
                self.distance * cos_phi,
                self.distance * sin_phi * cos_theta,
            );
    }
}

/// A screen-space input event, coordinates in CSS pixels
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    PointerLeave,
    /// All contacts currently on the surface
    TouchStart { touches: SmallVec<[Point2<f32>; 2]> },
    TouchMove { touches: SmallVec<[Point2<f32>; 2]> },
    /// Contacts still on the surface after the release
    TouchEnd { touches: SmallVec<[Point2<f32>; 2]> },
    Wheel { delta_y: f32 },
}

/// Single-contact rotation state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { anchor: Point2<f32> },
}

/// Orbit controller: owns the camera state and the interaction modes
#[derive(Debug, Clone)]
pub struct OrbitController {
    config: CameraConfig,
    state: CameraState,
    drag: DragState,
    /// Finger spread at the previous pinch sample
    pinch: Option<f32>,
}

impl OrbitController {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            state: CameraState::new(&config),
            config,
            drag: DragState::Idle,
            pinch: None,
        }
    }

    #[inline]
    pub fn state(&self) -> &CameraState {
        &self.state
    }

    #[inline]
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    #[inline]
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    #[inline]
    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown { x, y } => self.begin_drag(Point2::new(*x, *y)),
            InputEvent::PointerMove { x, y } => self.drag_to(Point2::new(*x, *y)),
            InputEvent::PointerUp | InputEvent::PointerLeave => self.drag = DragState::Idle,
            InputEvent::TouchStart { touches } => match touches.as_slice() {
                [single] => {
                    self.pinch = None;
                    self.begin_drag(*single);
                }
                [a, b, ..] => {
                    self.drag = DragState::Idle;
                    self.pinch = Some(nalgebra::distance(a, b));
                }
                [] => {}
            },
            InputEvent::TouchMove { touches } => match touches.as_slice() {
                [single] => self.drag_to(*single),
                [a, b, ..] => self.pinch_to(nalgebra::distance(a, b)),
                [] => {}
            },
            InputEvent::TouchEnd { touches } => {
                self.pinch = None;
                self.drag = match touches.as_slice() {
                    [remaining] => DragState::Dragging { anchor: *remaining },
                    _ => DragState::Idle,
                };
            }
            InputEvent::Wheel { delta_y } => {
                let step = delta_y * self.config.wheel_sensitivity * self.state.distance;
                self.set_target_distance(self.state.target_distance + step);
            }
        }
    }

    fn begin_drag(&mut self, at: Point2<f32>) {
        self.drag = DragState::Dragging { anchor: at };
    }

    fn drag_to(&mut self, at: Point2<f32>) {
        let DragState::Dragging { anchor } = self.drag else {
            return;
        };
        let delta = at - anchor;
        self.drag = DragState::Dragging { anchor: at };
        self.rotate(delta.x, delta.y);
    }

    fn pinch_to(&mut self, spread: f32) {
        if let Some(previous) = self.pinch {
            let step = (spread - previous) * self.config.pinch_sensitivity;
            // spreading the fingers zooms in
            self.set_target_distance(self.state.target_distance - step);
        }
        self.pinch = Some(spread);
    }

    /// Rotate by a screen-space delta in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.state.theta -= dx * self.config.rotate_speed;
        self.state.phi = (self.state.phi - dy * self.config.rotate_speed)
            .clamp(self.config.min_phi, self.config.max_phi);
        self.state.sync_position();
    }

    pub fn set_target_distance(&mut self, distance: f32) {
        if distance.is_nan() {
            return;
        }
        self.state.target_distance = distance.clamp(self.config.min_distance, self.config.max_distance);
    }

    /// Ease the distance toward its target. Returns whether the camera moved.
    pub fn smooth(&mut self) -> bool {
        let gap = self.state.target_distance - self.state.distance;
        if gap.abs() <= self.config.zoom_epsilon {
            return false;
        }
        self.state.distance = (self.state.distance + gap * self.config.zoom_smoothing)
            .clamp(self.config.min_distance, self.config.max_distance);
        self.state.sync_position();
        true
    }

    /// Move the look-at point vertically, keeping the orbit around it.
    pub fn set_look_at_height(&mut self, height: f32) {
        self.state.look_at.y = height;
        self.state.sync_position();
    }

    /// Drop any in-flight drag or pinch.
    pub fn release(&mut self) {
        self.drag = DragState::Idle;
        self.pinch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use smallvec::smallvec;

    fn controller() -> OrbitController {
        OrbitController::new(CameraConfig::default())
    }

    #[test]
    fn test_default_position_is_in_front() {
        let c = controller();
        let s = c.state();
        assert_relative_eq!(s.position, Point3::new(0.0, 0.0, 3.5), epsilon = 1e-5);
    }

    #[test]
    fn test_drag_rotates_only_while_dragging() {
        let mut c = controller();
        c.handle(&InputEvent::PointerMove { x: 50.0, y: 0.0 });
        assert_eq!(c.state().theta, 0.0);

        c.handle(&InputEvent::PointerDown { x: 0.0, y: 0.0 });
        c.handle(&InputEvent::PointerMove { x: 100.0, y: 20.0 });
        assert_relative_eq!(c.state().theta, -0.5, epsilon = 1e-5);
        assert_relative_eq!(c.state().phi, FRAC_PI_2 - 0.1, epsilon = 1e-5);

        c.handle(&InputEvent::PointerLeave);
        assert_eq!(c.drag_state(), DragState::Idle);
        c.handle(&InputEvent::PointerMove { x: 300.0, y: 20.0 });
        assert_relative_eq!(c.state().theta, -0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_phi_is_clamped() {
        let mut c = controller();
        c.handle(&InputEvent::PointerDown { x: 0.0, y: 0.0 });
        c.handle(&InputEvent::PointerMove { x: 0.0, y: 10_000.0 });
        assert_eq!(c.state().phi, c.config().min_phi);
        c.handle(&InputEvent::PointerMove { x: 0.0, y: -10_000.0 });
        assert_eq!(c.state().phi, c.config().max_phi);
    }

    #[test]
    fn test_wheel_scales_with_distance_and_clamps() {
        let mut c = controller();
        c.handle(&InputEvent::Wheel { delta_y: 100.0 });
        assert_relative_eq!(c.state().target_distance, 3.5 + 100.0 * 0.001 * 3.5, epsilon = 1e-5);
        assert_eq!(c.state().distance, 3.5);

        c.handle(&InputEvent::Wheel { delta_y: 1.0e6 });
        assert_eq!(c.state().target_distance, c.config().max_distance);
        c.handle(&InputEvent::Wheel { delta_y: -1.0e6 });
        assert_eq!(c.state().target_distance, c.config().min_distance);
    }

    #[test]
    fn test_pinch_moves_target_distance() {
        let mut c = controller();
        c.handle(&InputEvent::TouchStart {
            touches: smallvec![Point2::new(0.0, 0.0), Point2::new(100.0, 0.0)],
        });
        assert!(c.is_pinching());
        c.handle(&InputEvent::TouchMove {
            touches: smallvec![Point2::new(0.0, 0.0), Point2::new(150.0, 0.0)],
        });
        assert_relative_eq!(c.state().target_distance, 3.0, epsilon = 1e-5);
        assert_eq!(c.state().theta, 0.0);

        c.handle(&InputEvent::TouchEnd { touches: smallvec![] });
        assert!(!c.is_pinching());
        assert_eq!(c.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_touch_end_with_one_contact_resumes_drag() {
        let mut c = controller();
        c.handle(&InputEvent::TouchStart {
            touches: smallvec![Point2::new(0.0, 0.0), Point2::new(80.0, 0.0)],
        });
        c.handle(&InputEvent::TouchEnd {
            touches: smallvec![Point2::new(80.0, 0.0)],
        });
        assert_eq!(
            c.drag_state(),
            DragState::Dragging {
                anchor: Point2::new(80.0, 0.0)
            }
        );
        c.handle(&InputEvent::TouchMove {
            touches: smallvec![Point2::new(90.0, 0.0)],
        });
        assert_relative_eq!(c.state().theta, -0.05, epsilon = 1e-5);
    }

    #[test]
    fn test_smoothing_converges() {
        let mut c = controller();
        c.set_target_distance(5.5);
        assert!(c.smooth());
        assert_relative_eq!(c.state().distance, 3.7, epsilon = 1e-5);
        for _ in 0..200 {
            c.smooth();
        }
        assert!((c.state().distance - 5.5).abs() <= c.config().zoom_epsilon);
        assert!(!c.smooth());
    }

    #[test]
    fn test_look_at_height_moves_eye() {
        let mut c = controller();
        c.set_look_at_height(0.8);
        assert_relative_eq!(c.state().position.y, 0.8, epsilon = 1e-5);
        assert_relative_eq!(c.state().position.z, 3.5, epsilon = 1e-5);
    }

    #[test]
    fn test_random_input_respects_limits() {
        let mut c = controller();
        let cfg = *c.config();
        // deterministic pseudo-random walk
        let mut seed: u32 = 0x2545_F491;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed % 2000) as f32 - 1000.0
        };
        for step in 0..2000 {
            let event = match step % 6 {
                0 => InputEvent::PointerDown { x: next(), y: next() },
                1 | 2 => InputEvent::PointerMove { x: next(), y: next() },
                3 => InputEvent::Wheel { delta_y: next() * 5.0 },
                4 => InputEvent::TouchStart {
                    touches: smallvec![Point2::new(next(), next()), Point2::new(next(), next())],
                },
                _ => InputEvent::TouchMove {
                    touches: smallvec![Point2::new(next(), next()), Point2::new(next(), next())],
                },
            };
            c.handle(&event);
            c.smooth();
            let s = c.state();
            assert!(s.phi >= cfg.min_phi && s.phi <= cfg.max_phi);
            assert!(s.distance >= cfg.min_distance && s.distance <= cfg.max_distance);
            assert!(s.target_distance >= cfg.min_distance && s.target_distance <= cfg.max_distance);
        }
    }
}
