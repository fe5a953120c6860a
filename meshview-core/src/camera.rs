/// Orbit camera: yaw/pitch/distance around the origin
use nalgebra::{Point3, Vector3};

use crate::error::TransformError;
use crate::transform::{Matrix4, Transform};

pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;

/// Pitch is held strictly inside the poles so the look-at basis never
/// degenerates: 89 degrees.
pub const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Clamp ranges for distance and field of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraLimits {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians.
    pub min_fov: f32,
    /// Radians.
    pub max_fov: f32,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            min_distance: 1.0,
            max_distance: 45.0,
            min_fov: 1.0f32.to_radians(),
            max_fov: 45.0f32.to_radians(),
        }
    }
}

/// Camera orientation and zoom. Updated by value: each input step returns
/// the next state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Radians around +Y; zero places the eye on +Z.
    pub yaw: f32,
    /// Radians above the XZ plane.
    pub pitch: f32,
    pub distance: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 5.0,
            fov: std::f32::consts::FRAC_PI_4, // 45 degrees
        }
    }
}

impl CameraState {
    pub fn new(yaw: f32, pitch: f32, distance: f32, fov: f32) -> Self {
        Self {
            yaw,
            pitch: pitch.clamp(-MAX_PITCH, MAX_PITCH),
            distance,
            fov,
        }
    }

    /// Orbit by a pointer-drag delta. Dragging right turns the eye left
    /// around the model; dragging down raises it.
    pub fn apply_drag(self, dx: f32, dy: f32, sensitivity: f32) -> Self {
        if !(dx.is_finite() && dy.is_finite() && sensitivity.is_finite()) {
            return self;
        }
        Self {
            yaw: self.yaw - dx * sensitivity,
            pitch: (self.pitch + dy * sensitivity).clamp(-MAX_PITCH, MAX_PITCH),
            ..self
        }
    }

    pub fn adjust_distance(self, delta: f32, limits: &CameraLimits) -> Self {
        if !delta.is_finite() {
            return self;
        }
        Self {
            distance: (self.distance + delta).clamp(limits.min_distance, limits.max_distance),
            ..self
        }
    }

    /// Field-of-view zoom, `delta` in radians.
    pub fn adjust_fov(self, delta: f32, limits: &CameraLimits) -> Self {
        if !delta.is_finite() {
            return self;
        }
        Self {
            fov: (self.fov + delta).clamp(limits.min_fov, limits.max_fov),
            ..self
        }
    }

    /// Eye position on the sphere of radius `distance`.
    pub fn eye_position(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Point3::new(
            self.distance * cos_pitch * sin_yaw,
            self.distance * sin_pitch,
            self.distance * cos_pitch * cos_yaw,
        )
    }

    pub fn view_matrix(&self) -> Matrix4 {
        Transform::look_at(&self.eye_position(), &Point3::origin(), &Vector3::y())
    }

    pub fn projection_matrix(&self, aspect: f32) -> Result<Matrix4, TransformError> {
        Transform::perspective(self.fov, aspect, NEAR_PLANE, FAR_PLANE)
    }
}
