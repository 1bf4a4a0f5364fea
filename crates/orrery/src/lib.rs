//! High-level facade crate for the `orrery-*` workspace.
//!
//! This crate provides:
//! - re-exports of the geometry (`orrery-core`) and scene (`orrery-scene`) crates,
//! - the frame-driven [`ArSession`] with its frame source and detector seams,
//! - JSON configuration, recorded detections and replay reports,
//! - a headless [`run_replay`] used by the `orrery` binary.
//!
//! ## Quickstart
//!
//! ```no_run
//! use orrery::{run_replay, SessionConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::load_json("session.json")?;
//! let report = run_replay(&config)?;
//! println!("drew {} frames", report.frames.len());
//! report.write_json(&config.output_path)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `orrery::core`: images, markers, poses, camera calibration, GL matrices, logging.
//! - `orrery::scene`: planet table, consistency rule, orbit state, renderer seam, overlays.
//! - [`ArSession`], [`FrameSource`], [`MarkerDetector`]: the live pipeline.
//! - [`SessionConfig`], [`RecordedDetections`], [`SessionReport`]: JSON files.

pub use orrery_core as core;
pub use orrery_scene as scene;

pub use orrery_core::{CameraParameters, ImageSize, Marker, MarkerPose};
pub use orrery_scene::{
    ConsistencyRule, FrameSummary, Planet, PlanetTable, RecordingRenderer, Renderer, Scene,
    SceneConfig,
};

mod io;
mod replay;
mod session;

pub use io::{FrameReport, RecordedDetections, RecordedMarker, SessionConfig, SessionReport};
pub use replay::{replay_with, run_replay};
pub use session::{
    ArSession, FrameSource, ImageSequence, MarkerDetector, ReplayDetector, SessionError,
};
