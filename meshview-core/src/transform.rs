/// Affine and projective transform matrices
///
/// Matrices act on column vectors: a point `p` maps to `M * p`. Storage is
/// nalgebra's fixed 16-float column-major array, so `m[(row, col)]` indexes
/// the mathematical row and column. Composition follows the same rule:
/// `multiply(a, b)` applies `b` first, then `a`.
///
/// Rotations are right-handed. A positive angle turns counter-clockwise when
/// looking from the positive end of the axis toward the origin.
use nalgebra::{Point3, Vector3};
use tracing::warn;

use crate::error::TransformError;

pub type Matrix4 = nalgebra::Matrix4<f32>;

/// Below this length a direction or cross product counts as degenerate.
const DEGENERATE_LENGTH: f32 = 1e-6;

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    pub fn identity() -> Matrix4 {
        Matrix4::identity()
    }

    pub fn translation(offset: &Vector3<f32>) -> Matrix4 {
        #[rustfmt::skip]
        let m = Matrix4::new(
            1.0, 0.0, 0.0, offset.x,
            0.0, 1.0, 0.0, offset.y,
            0.0, 0.0, 1.0, offset.z,
            0.0, 0.0, 0.0, 1.0,
        );
        m
    }

    pub fn scale(factors: &Vector3<f32>) -> Matrix4 {
        Matrix4::from_diagonal(&factors.push(1.0))
    }

    /// Rotation about +X; maps +Y toward +Z.
    pub fn rotation_x(angle: f32) -> Matrix4 {
        let (s, c) = angle.sin_cos();
        #[rustfmt::skip]
        let m = Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0,   c,  -s, 0.0,
            0.0,   s,   c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        m
    }

    /// Rotation about +Y; maps +Z toward +X.
    pub fn rotation_y(angle: f32) -> Matrix4 {
        let (s, c) = angle.sin_cos();
        #[rustfmt::skip]
        let m = Matrix4::new(
              c, 0.0,   s, 0.0,
            0.0, 1.0, 0.0, 0.0,
             -s, 0.0,   c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        m
    }

    /// Rotation about +Z; maps +X toward +Y.
    pub fn rotation_z(angle: f32) -> Matrix4 {
        let (s, c) = angle.sin_cos();
        #[rustfmt::skip]
        let m = Matrix4::new(
              c,  -s, 0.0, 0.0,
              s,   c, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        m
    }

    /// Symmetric right-handed perspective projection.
    ///
    /// View space looks down -Z; depth maps to clip-space `[-1, 1]` between
    /// `near` and `far`.
    pub fn perspective(
        fovy: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Result<Matrix4, TransformError> {
        if ![fovy, aspect, near, far].iter().all(|v| v.is_finite()) {
            return Err(TransformError::Domain(
                "parameters must be finite".to_string(),
            ));
        }
        if fovy <= 0.0 || fovy >= std::f32::consts::PI {
            return Err(TransformError::Domain(format!(
                "field of view {fovy} must lie in (0, pi)"
            )));
        }
        if aspect <= 0.0 {
            return Err(TransformError::Domain(format!(
                "aspect ratio {aspect} must be positive"
            )));
        }
        if near <= 0.0 {
            return Err(TransformError::Domain(format!(
                "near plane {near} must be positive"
            )));
        }
        if far <= near {
            return Err(TransformError::Domain(format!(
                "far plane {far} must lie beyond near plane {near}"
            )));
        }

        let f = 1.0 / (fovy * 0.5).tan();
        let depth = near - far;
        #[rustfmt::skip]
        let m = Matrix4::new(
            f / aspect, 0.0,                 0.0,                       0.0,
            0.0,          f,                 0.0,                       0.0,
            0.0,        0.0, (far + near) / depth, 2.0 * far * near / depth,
            0.0,        0.0,                -1.0,                       0.0,
        );
        Ok(m)
    }

    /// Right-handed view matrix placing `eye` at the origin looking toward
    /// `target` down -Z.
    ///
    /// Degenerate input falls back instead of producing NaN: a target equal
    /// to the eye looks down world -Z, and an `up` parallel to the view
    /// direction is replaced by world +Z (or +X when looking along Z).
    pub fn look_at(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4 {
        let forward = (target - eye)
            .try_normalize(DEGENERATE_LENGTH)
            .unwrap_or_else(|| {
                warn!(?eye, "look_at target coincides with eye, looking down -Z");
                -Vector3::z()
            });

        let right = forward
            .cross(up)
            .try_normalize(DEGENERATE_LENGTH)
            .unwrap_or_else(|| {
                let fallback = if forward.z.abs() < 0.9 {
                    Vector3::z()
                } else {
                    Vector3::x()
                };
                warn!(?up, ?forward, "look_at up is parallel to view direction");
                forward.cross(&fallback).normalize()
            });
        let true_up = right.cross(&forward);
        let eye = eye.coords;

        #[rustfmt::skip]
        let m = Matrix4::new(
             right.x,    right.y,    right.z,   -right.dot(&eye),
             true_up.x,  true_up.y,  true_up.z, -true_up.dot(&eye),
            -forward.x, -forward.y, -forward.z,  forward.dot(&eye),
             0.0,        0.0,        0.0,        1.0,
        );
        m
    }

    /// `a * b`: the transform that applies `b`, then `a`.
    pub fn multiply(a: &Matrix4, b: &Matrix4) -> Matrix4 {
        a * b
    }

    /// Model-view-projection product.
    pub fn mvp(model: &Matrix4, view: &Matrix4, projection: &Matrix4) -> Matrix4 {
        projection * view * model
    }

    /// Transform `(x, y, z, 1)` and divide by `w`.
    ///
    /// When `w` is exactly zero the undivided coordinates are returned.
    pub fn transform_point(point: &Point3<f32>, m: &Matrix4) -> Point3<f32> {
        let h = m * point.to_homogeneous();
        if h.w != 0.0 {
            Point3::new(h.x / h.w, h.y / h.w, h.z / h.w)
        } else {
            Point3::new(h.x, h.y, h.z)
        }
    }
}
