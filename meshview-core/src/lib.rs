/// Meshview Core Library - Mesh ingestion, transforms and the orbit camera
///
/// This library provides the front-end independent part of the viewer:
/// parsing model text into a welded, triangulated mesh with smooth normals,
/// building model/view/projection matrices, and the orbit camera state.

pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod mesh;
pub mod obj;
pub mod transform;
pub mod weld;

// Re-export commonly used types
pub use camera::{CameraLimits, CameraState};
pub use config::ViewerConfig;
pub use error::{ConfigError, MeshError, TransformError};
pub use frame::{FrameUniforms, ModelMotion, Presenter, UniformValue};
pub use geometry::{BoundingBox, Vertex};
pub use mesh::{build_mesh, Mesh, MeshBuilder, VERTEX_STRIDE};
pub use transform::{Matrix4, Transform};
pub use weld::{WeldMap, DEFAULT_WELD_TOLERANCE};

/// A 2x2x2 cube centered on the origin, used when no model is given.
pub const CUBE_OBJ: &str = include_str!("../assets/cube.obj");
