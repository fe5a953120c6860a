/// Viewer configuration
///
/// Loaded from TOML; every field has a default so a partial file is fine.
///
/// ```toml
/// [camera]
/// yaw_degrees = 0.0
/// pitch_degrees = 15.0
/// distance = 5.0
/// fov_degrees = 45.0
/// drag_sensitivity = 0.01
/// scroll_step = 0.5
/// min_distance = 1.0
/// max_distance = 45.0
///
/// [mesh]
/// weld_tolerance = 0.0001
///
/// [scene]
/// light_position = [1.2, 1.0, 2.0]
/// spin_speed = 0.3
///
/// [logging]
/// level = "info"
/// file = "meshview.log"
/// ```
use std::path::Path;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::camera::{CameraLimits, CameraState};
use crate::error::ConfigError;
use crate::mesh::MeshBuilder;
use crate::weld::DEFAULT_WELD_TOLERANCE;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub camera: CameraConfig,
    pub mesh: MeshConfig,
    pub scene: SceneConfig,
    pub logging: LoggingConfig,
}

/// Initial camera and input tuning. Angles are in degrees here and converted
/// to radians when the camera is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub distance: f32,
    pub fov_degrees: f32,
    /// Radians of orbit per unit of pointer movement.
    pub drag_sensitivity: f32,
    /// Distance change per scroll notch.
    pub scroll_step: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_fov_degrees: f32,
    pub max_fov_degrees: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub weld_tolerance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub light_position: [f32; 3],
    /// Turntable speed in radians per second.
    pub spin_speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Log file for the terminal viewer; `meshview.log` when unset.
    pub file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        let limits = CameraLimits::default();
        Self {
            yaw_degrees: 0.0,
            pitch_degrees: 15.0,
            distance: 5.0,
            fov_degrees: 45.0,
            drag_sensitivity: 0.01,
            scroll_step: 0.5,
            min_distance: limits.min_distance,
            max_distance: limits.max_distance,
            min_fov_degrees: limits.min_fov.to_degrees(),
            max_fov_degrees: limits.max_fov.to_degrees(),
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            weld_tolerance: DEFAULT_WELD_TOLERANCE,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            light_position: [1.2, 1.0, 2.0],
            spin_speed: 0.3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
        }
    }
}

impl CameraConfig {
    pub fn limits(&self) -> CameraLimits {
        CameraLimits {
            min_distance: self.min_distance,
            max_distance: self.max_distance,
            min_fov: self.min_fov_degrees.to_radians(),
            max_fov: self.max_fov_degrees.to_radians(),
        }
    }

    /// Starting camera, clamped into the configured limits.
    pub fn initial_state(&self) -> CameraState {
        let limits = self.limits();
        CameraState::new(
            self.yaw_degrees.to_radians(),
            self.pitch_degrees.to_radians(),
            self.distance.clamp(limits.min_distance, limits.max_distance),
            self.fov_degrees.to_radians().clamp(limits.min_fov, limits.max_fov),
        )
    }
}

impl MeshConfig {
    pub fn builder(&self) -> MeshBuilder {
        MeshBuilder::new().weld_tolerance(self.weld_tolerance)
    }
}

impl SceneConfig {
    pub fn light_position(&self) -> Point3<f32> {
        Point3::from(self.light_position)
    }
}

impl ViewerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        let [light_x, light_y, light_z] = self.scene.light_position;
        let numbers = [
            ("camera.yaw_degrees", camera.yaw_degrees),
            ("camera.pitch_degrees", camera.pitch_degrees),
            ("camera.distance", camera.distance),
            ("camera.fov_degrees", camera.fov_degrees),
            ("camera.drag_sensitivity", camera.drag_sensitivity),
            ("camera.scroll_step", camera.scroll_step),
            ("camera.min_distance", camera.min_distance),
            ("camera.max_distance", camera.max_distance),
            ("camera.min_fov_degrees", camera.min_fov_degrees),
            ("camera.max_fov_degrees", camera.max_fov_degrees),
            ("mesh.weld_tolerance", self.mesh.weld_tolerance),
            ("scene.light_position", light_x),
            ("scene.light_position", light_y),
            ("scene.light_position", light_z),
            ("scene.spin_speed", self.scene.spin_speed),
        ];
        if let Some((field, value)) = numbers.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field,
                reason: format!("must be finite, got {value}"),
            });
        }

        if !(camera.min_distance > 0.0 && camera.min_distance <= camera.max_distance) {
            return Err(ConfigError::InvalidValue {
                field: "camera.min_distance",
                reason: format!(
                    "need 0 < min_distance <= max_distance, got {} and {}",
                    camera.min_distance, camera.max_distance
                ),
            });
        }
        if !(camera.min_fov_degrees > 0.0
            && camera.min_fov_degrees <= camera.max_fov_degrees
            && camera.max_fov_degrees < 180.0)
        {
            return Err(ConfigError::InvalidValue {
                field: "camera.min_fov_degrees",
                reason: format!(
                    "need 0 < min_fov <= max_fov < 180, got {} and {}",
                    camera.min_fov_degrees, camera.max_fov_degrees
                ),
            });
        }
        if self.mesh.weld_tolerance <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "mesh.weld_tolerance",
                reason: format!("must be positive, got {}", self.mesh.weld_tolerance),
            });
        }
        Ok(())
    }
}
