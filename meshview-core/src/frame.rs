/// Per-frame matrices and the seam front-ends plug into
use nalgebra::{Point3, Vector3};

use crate::camera::CameraState;
use crate::error::TransformError;
use crate::transform::{Matrix4, Transform};

/// Uniform names as bound by shader-based front-ends.
pub const UNIFORM_NAMES: [&str; 6] = ["model", "view", "projection", "viewPos", "lightPos", "time"];

/// Time-varying placement of the loaded model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelMotion {
    /// Bounding-box center; the model is shifted so this sits at the origin.
    pub center: Point3<f32>,
    /// Turntable speed around +Y in radians per second.
    pub spin_speed: f32,
}

impl ModelMotion {
    pub fn new(center: Point3<f32>, spin_speed: f32) -> Self {
        Self { center, spin_speed }
    }

    pub fn model_matrix(&self, time: f32) -> Matrix4 {
        Transform::multiply(
            &Transform::rotation_y(time * self.spin_speed),
            &Transform::translation(&-self.center.coords),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Matrix4),
    Vec3(Vector3<f32>),
    Float(f32),
}

/// Everything a front-end binds for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub model: Matrix4,
    pub view: Matrix4,
    pub projection: Matrix4,
    pub view_pos: Point3<f32>,
    pub light_pos: Point3<f32>,
    pub time: f32,
}

impl FrameUniforms {
    pub fn compose(
        camera: &CameraState,
        aspect: f32,
        time: f32,
        motion: &ModelMotion,
        light_pos: Point3<f32>,
    ) -> Result<Self, TransformError> {
        Ok(Self {
            model: motion.model_matrix(time),
            view: camera.view_matrix(),
            projection: camera.projection_matrix(aspect)?,
            view_pos: camera.eye_position(),
            light_pos,
            time,
        })
    }

    pub fn mvp(&self) -> Matrix4 {
        Transform::mvp(&self.model, &self.view, &self.projection)
    }

    /// `(name, value)` pairs in [`UNIFORM_NAMES`] order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, UniformValue)> {
        let values = [
            UniformValue::Mat4(self.model),
            UniformValue::Mat4(self.view),
            UniformValue::Mat4(self.projection),
            UniformValue::Vec3(self.view_pos.coords),
            UniformValue::Vec3(self.light_pos.coords),
            UniformValue::Float(self.time),
        ];
        UNIFORM_NAMES.into_iter().zip(values)
    }
}

/// A rendering front-end: owns whatever GPU or screen resources a mesh needs
/// and draws it with the matrices it is handed.
pub trait Presenter {
    type Handle;
    type Error;

    /// Build a mesh from model bytes and keep it ready to draw.
    fn load(&mut self, source: &[u8]) -> Result<Self::Handle, Self::Error>;

    fn present(
        &mut self,
        handle: &Self::Handle,
        model: &Matrix4,
        view: &Matrix4,
        projection: &Matrix4,
    ) -> Result<(), Self::Error>;
}
