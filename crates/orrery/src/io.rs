//! JSON files read and written by a session: the session config, recorded
//! detections and the replay report.

use std::{
    fs,
    path::{Path, PathBuf},
};

use nalgebra::{Point2, Vector3};
use orrery_core::{ImageSize, MarkerCorners, MarkerPose};
use orrery_scene::{
    ConsistencyRule, DrawCommand, FrameSummary, OrbitState, PlanetEntry, PlanetTable, SceneConfig,
};
use serde::{Deserialize, Serialize};

use crate::SessionError;

fn default_marker_size() -> f32 {
    SceneConfig::default().marker_size
}

fn default_near() -> f64 {
    SceneConfig::default().near
}

fn default_far() -> f64 {
    SceneConfig::default().far
}

fn default_output_path() -> PathBuf {
    PathBuf::from("orrery_report.json")
}

/// Everything a headless run needs.
///
/// Relative paths are resolved against the directory of the config file by
/// [`SessionConfig::load_json`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Camera calibration JSON.
    pub camera_path: PathBuf,
    /// Marker side length, in the unit of the recorded poses.
    #[serde(default = "default_marker_size")]
    pub marker_size: f32,
    /// Window `[width, height]`; the calibration size when absent.
    #[serde(default)]
    pub window: Option<[u32; 2]>,
    /// Frame images, in playback order.
    #[serde(default)]
    pub frames: Vec<PathBuf>,
    /// Recorded detections; every frame has no markers when absent.
    #[serde(default)]
    pub detections_path: Option<PathBuf>,
    /// Directory that relative planet texture paths are resolved against.
    #[serde(default)]
    pub texture_root: Option<PathBuf>,
    #[serde(default)]
    pub consistency: ConsistencyRule,
    #[serde(default = "default_near")]
    pub near: f64,
    #[serde(default = "default_far")]
    pub far: f64,
    /// Replaces the built-in planet table.
    #[serde(default)]
    pub planets: Option<Vec<PlanetEntry>>,
    /// Marker index whose axes are drawn every frame.
    #[serde(default)]
    pub debug_axis: Option<usize>,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

impl SessionConfig {
    pub fn new(camera_path: impl Into<PathBuf>) -> Self {
        Self {
            camera_path: camera_path.into(),
            marker_size: default_marker_size(),
            window: None,
            frames: Vec::new(),
            detections_path: None,
            texture_root: None,
            consistency: ConsistencyRule::default(),
            near: default_near(),
            far: default_far(),
            planets: None,
            debug_axis: None,
            output_path: default_output_path(),
        }
    }

    pub fn with_frames(mut self, frames: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.frames = frames.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_detections(mut self, path: impl Into<PathBuf>) -> Self {
        self.detections_path = Some(path.into());
        self
    }

    pub fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window = Some([width, height]);
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&raw)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Join every relative path onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.camera_path);
        self.frames.iter_mut().for_each(resolve);
        self.detections_path.iter_mut().for_each(resolve);
        self.texture_root.iter_mut().for_each(resolve);
        resolve(&mut self.output_path);
    }

    pub fn scene_config(&self) -> SceneConfig {
        SceneConfig {
            marker_size: self.marker_size,
            near: self.near,
            far: self.far,
            rule: self.consistency,
            ..SceneConfig::default()
        }
    }

    /// The configured planet table (or the built-in one), with texture
    /// paths resolved against `texture_root`.
    pub fn planet_table(&self) -> Result<PlanetTable, SessionError> {
        let table = match &self.planets {
            Some(entries) => PlanetTable::from_entries(entries.iter().cloned())?,
            None => PlanetTable::builtin(),
        };
        Ok(match &self.texture_root {
            Some(root) => table.with_texture_root(root),
            None => table,
        })
    }

    pub fn window_size(&self) -> Option<ImageSize> {
        self.window.map(|[w, h]| ImageSize::new(w, h))
    }
}

/// One marker as stored in a detection recording.
///
/// Corners are pixels of the window-sized frame, ordered TL, TR, BR, BL.
/// The pose is used only when both vectors are present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedMarker {
    pub id: i32,
    pub corners: [[f32; 2]; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rvec: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvec: Option<[f64; 3]>,
}

impl RecordedMarker {
    pub fn corners(&self) -> MarkerCorners {
        self.corners.map(|[x, y]| Point2::new(x, y))
    }

    pub fn pose(&self) -> Option<MarkerPose> {
        let (r, t) = self.rvec.zip(self.tvec)?;
        Some(MarkerPose::new(Vector3::from(r), Vector3::from(t)))
    }
}

/// Per-frame marker lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedDetections {
    pub frames: Vec<Vec<RecordedMarker>>,
}

impl RecordedDetections {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub index: usize,
    pub summary: FrameSummary,
    pub commands: Vec<DrawCommand>,
}

/// Output of a headless replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub window: ImageSize,
    pub frames: Vec<FrameReport>,
    /// Animation state after the last frame.
    pub final_state: OrbitState,
    /// Commands issued at shutdown (texture releases).
    pub teardown: Vec<DrawCommand>,
}

impl SessionReport {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
