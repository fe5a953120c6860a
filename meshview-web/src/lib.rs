/// Meshview Web - WASM bindings for a browser-side WebGL front-end
///
/// JavaScript owns the canvas, shaders and buffers. This module builds the
/// mesh, keeps the orbit camera and hands back flat arrays ready for
/// `bufferData` and `uniformMatrix4fv` (column-major, no transpose).
use meshview_core::{
    CameraLimits, CameraState, FrameUniforms, Mesh, MeshBuilder, ModelMotion, ViewerConfig,
};
use nalgebra::Point3;
use tracing::debug;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WebViewer {
    mesh: Mesh,
    builder: MeshBuilder,
    camera: CameraState,
    limits: CameraLimits,
    sensitivity: f32,
    spin_speed: f32,
    light_pos: Point3<f32>,
    uniforms: Option<FrameUniforms>,
}

#[wasm_bindgen]
impl WebViewer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebViewer {
        let config = ViewerConfig::default();
        WebViewer {
            mesh: Mesh::default(),
            builder: config.mesh.builder(),
            camera: config.camera.initial_state(),
            limits: config.camera.limits(),
            sensitivity: config.camera.drag_sensitivity,
            spin_speed: config.scene.spin_speed,
            light_pos: config.scene.light_position(),
            uniforms: None,
        }
    }

    /// Replace the current mesh with one built from model text.
    pub fn load(&mut self, source: &str) -> Result<(), JsValue> {
        self.mesh = self
            .builder
            .build(source)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        debug!(vertices = self.mesh.vertex_count(), "web mesh loaded");
        Ok(())
    }

    /// Interleaved position/normal floats, six per vertex.
    pub fn vertex_data(&self) -> Vec<f32> {
        self.mesh.vertex_data()
    }

    pub fn indices(&self) -> Vec<u32> {
        self.mesh.indices().to_vec()
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Pointer-drag delta in CSS pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.camera = self.camera.apply_drag(dx, dy, self.sensitivity);
    }

    /// Wheel delta in distance units.
    pub fn zoom(&mut self, delta: f32) {
        self.camera = self.camera.adjust_distance(delta, &self.limits);
    }

    /// Recompute the per-frame matrices. Read them back with `model`,
    /// `view`, `projection`, `view_pos` and `light_pos`.
    pub fn update(&mut self, aspect: f32, time: f32) -> Result<(), JsValue> {
        let motion = ModelMotion::new(self.mesh.center(), self.spin_speed);
        let uniforms = FrameUniforms::compose(&self.camera, aspect, time, &motion, self.light_pos)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.uniforms = Some(uniforms);
        Ok(())
    }

    pub fn model(&self) -> Vec<f32> {
        self.uniforms.map_or_else(Vec::new, |u| u.model.as_slice().to_vec())
    }

    pub fn view(&self) -> Vec<f32> {
        self.uniforms.map_or_else(Vec::new, |u| u.view.as_slice().to_vec())
    }

    pub fn projection(&self) -> Vec<f32> {
        self.uniforms
            .map_or_else(Vec::new, |u| u.projection.as_slice().to_vec())
    }

    pub fn view_pos(&self) -> Vec<f32> {
        self.uniforms
            .map_or_else(Vec::new, |u| u.view_pos.coords.as_slice().to_vec())
    }

    pub fn light_pos(&self) -> Vec<f32> {
        self.light_pos.coords.as_slice().to_vec()
    }
}

impl Default for WebViewer {
    fn default() -> Self {
        Self::new()
    }
}
