/// Geometry primitives shared by the mesh builder and front-ends
use nalgebra::{Point3, Vector3};

/// Cross products shorter than this are treated as zero-area.
pub const AREA_EPSILON: f32 = 1e-12;

/// A welded vertex with its smoothed normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// Unit normal of the triangle `(a, b, c)` taken in winding order.
///
/// Counter-clockwise winding seen from the front yields a normal pointing
/// toward the viewer. Returns `None` for zero-area triangles.
///
/// Evaluated in `f64`: the cross product of edges near the `f32` range
/// would overflow to infinity.
pub fn face_normal(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Option<Vector3<f32>> {
    let (a, b, c) = (a.cast::<f64>(), b.cast::<f64>(), c.cast::<f64>());
    let edge1 = b - a;
    let edge2 = c - a;
    edge1
        .cross(&edge2)
        .try_normalize(f64::from(AREA_EPSILON))
        .map(|normal| normal.cast::<f32>())
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    /// Bounds of `points`, or `None` when there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(
            Self {
                min: first,
                max: first,
            },
            |bounds, p| Self {
                min: bounds.min.inf(p),
                max: bounds.max.sup(p),
            },
        ))
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }
}
