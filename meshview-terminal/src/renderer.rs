/// Hidden-line wireframe rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use meshview_core::camera::NEAR_PLANE;
use meshview_core::config::SceneConfig;
use meshview_core::{Matrix4, Mesh, MeshBuilder, MeshError, Presenter, Transform};
use nalgebra::{Point2, Point3, Vector3};
use std::io::Write;
use thiserror::Error;
use tracing::debug;

/// Character luminosity ramp for edge shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Pixels closer than this (in cells) to a triangle edge are drawn as line.
const EDGE_THRESHOLD: f32 = 0.55;

/// Lets an edge win against the fill of its own triangle.
const DEPTH_BIAS: f32 = 1e-4;

/// Ambient floor so edges facing away from the light stay visible.
const AMBIENT: f32 = 0.15;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("no mesh loaded for handle {0}")]
    UnknownHandle(usize),
}

/// Identifies a mesh loaded into a [`WireframeRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHandle(usize);

/// A vertex after projection: screen cell coordinates, NDC depth, shade.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    position: Point2<f32>,
    depth: f32,
    brightness: f32,
}

/// Wireframe renderer that converts meshes to terminal characters
pub struct WireframeRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    builder: MeshBuilder,
    meshes: Vec<Mesh>,
    /// World space.
    light_position: Point3<f32>,
}

impl WireframeRenderer {
    pub fn new(width: usize, height: usize, builder: MeshBuilder) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            builder,
            meshes: Vec::new(),
            light_position: SceneConfig::default().light_position(),
        }
    }

    pub fn set_light_position(&mut self, light_position: Point3<f32>) {
        self.light_position = light_position;
    }

    /// Take ownership of an already built mesh.
    pub fn insert(&mut self, mesh: Mesh) -> MeshHandle {
        self.meshes.push(mesh);
        MeshHandle(self.meshes.len() - 1)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle.0)
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Width over height of the drawing area, counting terminal cells as
    /// twice as tall as they are wide.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / (self.height as f32 * 2.0)
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let size = width * height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.char_buffer = vec![' '; size];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character at a cell, for inspection.
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    fn render_mesh(&mut self, mesh: &Mesh, model: &Matrix4, view: &Matrix4, projection: &Matrix4) {
        let model_view = Transform::multiply(view, model);
        let screen: Vec<Option<ScreenVertex>> = mesh
            .vertices()
            .map(|vertex| {
                let eye_space = Transform::transform_point(&vertex.position, &model_view);
                // Behind or too close to the camera
                if eye_space.z > -NEAR_PLANE {
                    return None;
                }
                let ndc = Transform::transform_point(&eye_space, projection);

                let world = Transform::transform_point(&vertex.position, model);
                let normal = model.transform_vector(&vertex.normal);

                Some(ScreenVertex {
                    position: Point2::new(
                        (ndc.x + 1.0) * 0.5 * self.width as f32,
                        (1.0 - ndc.y) * 0.5 * self.height as f32,
                    ),
                    depth: ndc.z,
                    brightness: lambert(&normal, &world, &self.light_position),
                })
            })
            .collect();

        let triangles: Vec<[ScreenVertex; 3]> = mesh
            .triangles()
            .filter_map(|[a, b, c]| {
                Some([
                    screen[a as usize]?,
                    screen[b as usize]?,
                    screen[c as usize]?,
                ])
            })
            .collect();
        debug!(
            triangles = mesh.triangle_count(),
            visible = triangles.len(),
            "wireframe pass"
        );

        // Depth first so edges behind nearer faces stay hidden.
        for triangle in &triangles {
            self.rasterize_triangle(triangle, None);
        }
        for triangle in &triangles {
            let brightness =
                (triangle[0].brightness + triangle[1].brightness + triangle[2].brightness) / 3.0;
            self.rasterize_triangle(triangle, Some(ramp_char(brightness)));
        }
    }

    /// With `edge: None` only depth is written; otherwise pixels near the
    /// triangle's edges that pass the depth test get `edge`.
    fn rasterize_triangle(&mut self, v: &[ScreenVertex; 3], edge: Option<char>) {
        let (p0, p1, p2) = (v[0].position, v[1].position, v[2].position);

        // Bounding box
        let min_x = p0.x.min(p1.x).min(p2.x).floor() as i64;
        let max_x = p0.x.max(p1.x).max(p2.x).ceil() as i64;
        let min_y = p0.y.min(p1.y).min(p2.y).floor() as i64;
        let max_y = p0.y.max(p1.y).max(p2.y).ceil() as i64;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i64 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let pixel = Point2::new(x as f32 + 0.5, y as f32 + 0.5);

                let Some((w0, w1, w2)) = barycentric(p0, p1, p2, pixel) else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v[0].depth + w1 * v[1].depth + w2 * v[2].depth;
                let idx = y as usize * self.width + x as usize;
                match edge {
                    None => {
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                        }
                    }
                    Some(character) => {
                        let on_edge = distance_to_segment(pixel, p0, p1) <= EDGE_THRESHOLD
                            || distance_to_segment(pixel, p1, p2) <= EDGE_THRESHOLD
                            || distance_to_segment(pixel, p2, p0) <= EDGE_THRESHOLD;
                        if on_edge && depth <= self.depth_buffer[idx] + DEPTH_BIAS {
                            self.char_buffer[idx] = character;
                        }
                    }
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let c = self.char_buffer[idx];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Presenter for WireframeRenderer {
    type Handle = MeshHandle;
    type Error = RenderError;

    fn load(&mut self, source: &[u8]) -> Result<MeshHandle, RenderError> {
        let mesh = self.builder.build_bytes(source)?;
        Ok(self.insert(mesh))
    }

    fn present(
        &mut self,
        handle: &MeshHandle,
        model: &Matrix4,
        view: &Matrix4,
        projection: &Matrix4,
    ) -> Result<(), RenderError> {
        // Taken out for the pass so the buffers can be borrowed mutably.
        let mesh = std::mem::take(
            self.meshes
                .get_mut(handle.0)
                .ok_or(RenderError::UnknownHandle(handle.0))?,
        );
        self.clear();
        self.render_mesh(&mesh, model, view, projection);
        self.meshes[handle.0] = mesh;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: Point2<f32>,
    v1: Point2<f32>,
    v2: Point2<f32>,
    p: Point2<f32>,
) -> Option<(f32, f32, f32)> {
    let denom = (v1.y - v2.y) * (v0.x - v2.x) + (v2.x - v1.x) * (v0.y - v2.y);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.y - v2.y) * (p.x - v2.x) + (v2.x - v1.x) * (p.y - v2.y)) / denom;
    let w1 = ((v2.y - v0.y) * (p.x - v2.x) + (v0.x - v2.x) * (p.y - v2.y)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

fn distance_to_segment(p: Point2<f32>, start: Point2<f32>, end: Point2<f32>) -> f32 {
    let edge = end - start;
    let length_sq = edge.norm_squared();
    if length_sq < 1e-6 {
        return (p - start).norm();
    }
    let t = ((p - start).dot(&edge) / length_sq).clamp(0.0, 1.0);
    (p - (start + edge * t)).norm()
}

/// Diffuse term of a point light over an ambient floor, in `[AMBIENT, 1]`.
/// A zero normal gets only the ambient part.
fn lambert(normal: &Vector3<f32>, position: &Point3<f32>, light: &Point3<f32>) -> f32 {
    let (Some(n), Some(l)) = (
        normal.try_normalize(1e-6),
        (light - position).try_normalize(1e-6),
    ) else {
        return AMBIENT;
    };
    AMBIENT + (1.0 - AMBIENT) * n.dot(&l).max(0.0)
}

fn ramp_char(brightness: f32) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = (brightness.clamp(0.0, 1.0) * last as f32).round() as usize;
    LUMINOSITY_RAMP[index.min(last)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshview_core::{CameraState, CUBE_OBJ};

    const FRONT_TRIANGLE: &[u8] = b"v -1 -1 0\nv 1 -1 0\nv 0 1 0\nf 1 2 3\n";

    fn project_to_cell(point: &Point3<f32>, mvp: &Matrix4, width: usize, height: usize) -> (f32, f32) {
        let ndc = Transform::transform_point(point, mvp);
        (
            (ndc.x + 1.0) * 0.5 * width as f32,
            (1.0 - ndc.y) * 0.5 * height as f32,
        )
    }

    fn drawn_chars(renderer: &WireframeRenderer) -> Vec<char> {
        let (w, h) = renderer.size();
        (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .filter_map(|(x, y)| renderer.cell(x, y))
            .filter(|&c| c != ' ')
            .collect()
    }

    fn lit_cells(renderer: &WireframeRenderer) -> usize {
        let (w, h) = renderer.size();
        (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .filter(|&(x, y)| renderer.cell(x, y) != Some(' '))
            .count()
    }

    fn camera_matrices(renderer: &WireframeRenderer) -> (Matrix4, Matrix4) {
        let camera = CameraState::default();
        (
            camera.view_matrix(),
            camera.projection_matrix(renderer.aspect()).unwrap(),
        )
    }

    #[test]
    fn test_barycentric_inside_and_outside() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(4.0, 0.0);
        let c = Point2::new(0.0, 4.0);
        let (w0, w1, w2) = barycentric(a, b, c, Point2::new(1.0, 1.0)).unwrap();
        assert!(w0 > 0.0 && w1 > 0.0 && w2 > 0.0);
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);

        let (w0, w1, w2) = barycentric(a, b, c, Point2::new(5.0, 5.0)).unwrap();
        assert!(w0 < 0.0 || w1 < 0.0 || w2 < 0.0);

        assert!(barycentric(a, a, c, Point2::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_distance_to_segment() {
        let start = Point2::new(0.0, 0.0);
        let end = Point2::new(10.0, 0.0);
        assert!((distance_to_segment(Point2::new(5.0, 2.0), start, end) - 2.0).abs() < 1e-6);
        assert!((distance_to_segment(Point2::new(-3.0, 4.0), start, end) - 5.0).abs() < 1e-6);
        assert!((distance_to_segment(Point2::new(1.0, 1.0), start, start) - 2f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_cube_draws_edges_but_not_face_centers() {
        let mut renderer = WireframeRenderer::new(80, 40, MeshBuilder::new());
        let handle = renderer.load(CUBE_OBJ.as_bytes()).unwrap();
        let (view, projection) = camera_matrices(&renderer);
        renderer
            .present(&handle, &Transform::identity(), &view, &projection)
            .unwrap();

        assert!(lit_cells(&renderer) > 0);

        // Front face center sits inside a quad, away from every edge.
        let mvp = Transform::mvp(&Transform::identity(), &view, &projection);
        let (x, y) = project_to_cell(&Point3::new(0.5, -0.5, 1.0), &mvp, 80, 40);
        assert_eq!(renderer.cell(x as usize, y as usize), Some(' '));

        // A front corner lies on an edge.
        let (x, y) = project_to_cell(&Point3::new(1.0, 1.0, 1.0), &mvp, 80, 40);
        let near_corner = (-1i64..=1).any(|dy| {
            (-1i64..=1).any(|dx| {
                let cx = (x as i64 + dx) as usize;
                let cy = (y as i64 + dy) as usize;
                matches!(renderer.cell(cx, cy), Some(c) if c != ' ')
            })
        });
        assert!(near_corner);
    }

    #[test]
    fn test_mesh_behind_camera_draws_nothing() {
        let mut renderer = WireframeRenderer::new(40, 20, MeshBuilder::new());
        let handle = renderer.load(CUBE_OBJ.as_bytes()).unwrap();
        let (view, projection) = camera_matrices(&renderer);
        let behind = Transform::translation(&nalgebra::Vector3::new(0.0, 0.0, 20.0));
        renderer.present(&handle, &behind, &view, &projection).unwrap();
        assert_eq!(lit_cells(&renderer), 0);
    }

    #[test]
    fn test_unknown_handle() {
        let mut renderer = WireframeRenderer::new(10, 10, MeshBuilder::new());
        let m = Transform::identity();
        assert!(matches!(
            renderer.present(&MeshHandle(3), &m, &m, &m),
            Err(RenderError::UnknownHandle(3))
        ));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut renderer = WireframeRenderer::new(10, 10, MeshBuilder::new());
        assert!(matches!(
            renderer.load(b"v 1 2\n"),
            Err(RenderError::Mesh(MeshError::Parse { line: 1, .. }))
        ));
    }

    #[test]
    fn test_resize_and_aspect() {
        let mut renderer = WireframeRenderer::new(80, 40, MeshBuilder::new());
        assert!((renderer.aspect() - 1.0).abs() < 1e-6);
        renderer.resize(120, 30);
        assert_eq!(renderer.size(), (120, 30));
        assert!((renderer.aspect() - 2.0).abs() < 1e-6);
        assert_eq!(renderer.cell(119, 29), Some(' '));
        assert_eq!(renderer.cell(120, 0), None);
    }

    #[test]
    fn test_lambert_shading() {
        let up = Vector3::z();
        let origin = Point3::origin();
        assert!((lambert(&up, &origin, &Point3::new(0.0, 0.0, 5.0)) - 1.0).abs() < 1e-6);
        assert_eq!(lambert(&up, &origin, &Point3::new(0.0, 0.0, -5.0)), AMBIENT);
        let oblique = lambert(&up, &origin, &Point3::new(5.0, 0.0, 5.0));
        assert!((oblique - (AMBIENT + (1.0 - AMBIENT) * std::f32::consts::FRAC_1_SQRT_2)).abs() < 1e-5);
        assert_eq!(lambert(&Vector3::zeros(), &origin, &Point3::new(0.0, 0.0, 5.0)), AMBIENT);
        assert_eq!(lambert(&up, &origin, &origin), AMBIENT);
    }

    #[test]
    fn test_ramp_char_ends() {
        assert_eq!(ramp_char(1.0), '@');
        assert_eq!(ramp_char(AMBIENT), ':');
        assert_eq!(ramp_char(0.0), '.');
        assert_eq!(ramp_char(f32::INFINITY), '@');
    }

    #[test]
    fn test_edges_shaded_by_light_position() {
        let mut renderer = WireframeRenderer::new(60, 30, MeshBuilder::new());
        let handle = renderer.load(FRONT_TRIANGLE).unwrap();
        let (view, projection) = camera_matrices(&renderer);

        renderer.set_light_position(Point3::new(0.0, 0.0, 1000.0));
        renderer
            .present(&handle, &Transform::identity(), &view, &projection)
            .unwrap();
        let lit = drawn_chars(&renderer);
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&c| c == '@'), "{lit:?}");

        // The light is fixed in the world; the same triangle seen from the
        // same camera darkens when the light moves behind it.
        renderer.set_light_position(Point3::new(0.0, 0.0, -1000.0));
        renderer
            .present(&handle, &Transform::identity(), &view, &projection)
            .unwrap();
        let unlit = drawn_chars(&renderer);
        assert_eq!(unlit.len(), lit.len());
        assert!(unlit.iter().all(|&c| c == ':'), "{unlit:?}");
    }

    #[test]
    fn test_model_rotation_turns_normals_toward_light() {
        let mut renderer = WireframeRenderer::new(60, 30, MeshBuilder::new());
        let handle = renderer.load(FRONT_TRIANGLE).unwrap();
        let (view, projection) = camera_matrices(&renderer);
        renderer.set_light_position(Point3::new(1000.0, 0.0, 0.0));

        // Facing the camera, the light grazes the face.
        renderer
            .present(&handle, &Transform::identity(), &view, &projection)
            .unwrap();
        assert!(drawn_chars(&renderer).iter().all(|&c| c == ':'));

        // Turned 45 degrees about Y the normal leans toward +X.
        let turned = Transform::rotation_y(std::f32::consts::FRAC_PI_4);
        renderer.present(&handle, &turned, &view, &projection).unwrap();
        let chars = drawn_chars(&renderer);
        assert!(!chars.is_empty());
        // 0.15 + 0.85 * cos(45) lands on the seventh ramp step.
        assert!(chars.iter().all(|&c| c == '#'), "{chars:?}");
    }
}
