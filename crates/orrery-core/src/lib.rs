//! Core types for marker-registered AR overlays.
//!
//! This crate is intentionally small and purely geometric. It knows how a
//! detected marker and a calibrated camera map onto the two OpenGL matrices
//! (model-view and projection) an overlay renderer needs, but it does *not*
//! detect markers or draw anything.

mod camera;
mod homography;
mod image;
mod logger;
mod marker;
mod pose;

pub use camera::{CameraError, CameraIntrinsics, CameraParameters, RadialTangentialDistortion};
pub use homography::{homography_from_4pt, Homography};
pub use image::{ImageSize, RgbImageView};
pub use marker::{cv_to_gl, Marker, MarkerCorners, MarkerPose};
pub use pose::{estimate_marker_pose, marker_object_corners, PoseError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
