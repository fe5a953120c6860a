/// Mesh building: scan, weld, fan-triangulate and smooth normals
use std::path::Path;

use nalgebra::{Point3, Vector3};
use tracing::{debug, info};

use crate::error::MeshError;
use crate::geometry::{face_normal, BoundingBox, Vertex};
use crate::obj::{self, Face};
use crate::weld::{sanitize_tolerance, WeldMap, DEFAULT_WELD_TOLERANCE};

/// Floats per vertex in [`Mesh::vertex_data`]: position then normal.
pub const VERTEX_STRIDE: usize = 6;

/// An indexed triangle mesh with smooth per-vertex normals.
///
/// Immutable once built. Vertex `i` of [`positions`](Mesh::positions) pairs
/// with normal `i`, and every index in [`indices`](Mesh::indices) refers to
/// that shared vertex list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
    indices: Vec<u32>,
    bounds: Option<BoundingBox>,
}

impl Mesh {
    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    /// Flat triangle index buffer, three entries per triangle.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(position, normal)| Vertex::new(*position, *normal))
    }

    /// Interleaved `[px, py, pz, nx, ny, nz]` per vertex, ready for upload.
    pub fn vertex_data(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.positions.len() * VERTEX_STRIDE);
        for vertex in self.vertices() {
            data.extend_from_slice(vertex.position.coords.as_slice());
            data.extend_from_slice(vertex.normal.as_slice());
        }
        data
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// Bounding-box center, `(min + max) / 2`; the origin for an empty mesh.
    pub fn center(&self) -> Point3<f32> {
        self.bounds
            .map(|b| b.center())
            .unwrap_or_else(Point3::origin)
    }

    /// Half the bounding-box diagonal.
    pub fn radius(&self) -> f32 {
        self.bounds.map(|b| b.extent().norm() * 0.5).unwrap_or(0.0)
    }
}

/// Builds a [`Mesh`] from model text.
///
/// Faces are assumed convex and planar. Polygons with more than three
/// vertices are fan-triangulated around their first vertex, which is exact
/// for triangles and convex quads but not for concave polygons.
#[derive(Debug, Clone, Copy)]
pub struct MeshBuilder {
    weld_tolerance: f32,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self {
            weld_tolerance: DEFAULT_WELD_TOLERANCE,
        }
    }
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-axis distance below which positions are welded together.
    /// Non-positive or non-finite values fall back to the default.
    pub fn weld_tolerance(mut self, tolerance: f32) -> Self {
        self.weld_tolerance = sanitize_tolerance(tolerance);
        self
    }

    pub fn build(&self, text: &str) -> Result<Mesh, MeshError> {
        let raw = obj::scan(text)?;
        debug!(
            positions = raw.positions.len(),
            faces = raw.faces.len(),
            "model scanned"
        );

        let weld = WeldMap::build(&raw.positions, self.weld_tolerance);
        debug!(
            raw = weld.raw_len(),
            welded = weld.len(),
            tolerance = self.weld_tolerance,
            "positions welded"
        );

        let indices = triangulate(&raw.faces, &weld);
        let positions = weld.into_positions();
        let normals = smooth_normals(&positions, &indices);
        let bounds = BoundingBox::from_points(&positions);

        let mesh = Mesh {
            positions,
            normals,
            indices,
            bounds,
        };
        info!(
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "mesh built"
        );
        Ok(mesh)
    }

    pub fn build_bytes(&self, bytes: &[u8]) -> Result<Mesh, MeshError> {
        self.build(std::str::from_utf8(bytes)?)
    }

    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Mesh, MeshError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MeshError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.build(&text)
    }
}

/// Build a mesh with the default weld tolerance.
pub fn build_mesh(text: &str) -> Result<Mesh, MeshError> {
    MeshBuilder::new().build(text)
}

/// Fan triangulation of one polygon: `(v0, v1, v2), (v0, v2, v3), ...`.
pub fn fan_triangulate(face: &[u32]) -> impl Iterator<Item = [u32; 3]> + '_ {
    let first = face.first().copied().unwrap_or_default();
    face.windows(2)
        .skip(1)
        .map(move |pair| [first, pair[0], pair[1]])
}

fn triangulate(faces: &[Face], weld: &WeldMap) -> Vec<u32> {
    let capacity = faces
        .iter()
        .map(|f| f.indices.len().saturating_sub(2) * 3)
        .sum();
    let mut indices = Vec::with_capacity(capacity);
    for face in faces {
        let welded: Vec<u32> = face.indices.iter().map(|&raw| weld.welded_index(raw)).collect();
        let mut distinct = welded.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < 3 {
            debug!(line = face.line, "face collapsed by welding");
        }
        indices.extend(fan_triangulate(&welded).flatten());
    }
    indices
}

/// Average of the unit face normals around each vertex, renormalized.
///
/// Vertices touched by no triangle with area, or whose face normals cancel
/// out, get the zero vector.
fn smooth_normals(positions: &[Point3<f32>], indices: &[u32]) -> Vec<Vector3<f32>> {
    let mut sums = vec![Vector3::zeros(); positions.len()];
    for t in indices.chunks_exact(3) {
        let [a, b, c] = [t[0] as usize, t[1] as usize, t[2] as usize];
        if let Some(normal) = face_normal(&positions[a], &positions[b], &positions[c]) {
            sums[a] += normal;
            sums[b] += normal;
            sums[c] += normal;
        }
    }
    sums.into_iter()
        .map(|sum| sum.try_normalize(1e-6).unwrap_or_else(Vector3::zeros))
        .collect()
}
