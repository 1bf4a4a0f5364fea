//! Camera calibration and the camera-to-screen projection.
//!
//! Calibration is read once from a JSON file. The projection produced here
//! pairs with [`crate::MarkerPose::gl_model_view`]: eye space is the OpenCV
//! camera frame with Y and Z flipped, so the camera looks down `-Z`.

use std::{fs, path::Path};

use nalgebra::{Matrix3, Matrix4, Point2, Vector3};
use serde::{Deserialize, Serialize};

use crate::ImageSize;

#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid camera intrinsics (fx={fx}, fy={fy}, cx={cx}, cy={cy})")]
    InvalidIntrinsics { fx: f64, fy: f64, cx: f64, cy: f64 },
    #[error("invalid image size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },
}

/// Pinhole camera intrinsics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraIntrinsics {
    /// Focal length in x (pixels).
    pub fx: f64,
    /// Focal length in y (pixels).
    pub fy: f64,
    /// Principal point x (pixels).
    pub cx: f64,
    /// Principal point y (pixels).
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Returns `true` when all values are finite and focal lengths are non-zero.
    pub fn is_valid(self) -> bool {
        self.fx.is_finite()
            && self.fy.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.fx.abs() > 1e-12
            && self.fy.abs() > 1e-12
    }

    /// `K` as a 3x3 matrix.
    pub fn matrix(self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }

    fn scaled(self, ax: f64, ay: f64) -> Self {
        Self {
            fx: self.fx * ax,
            fy: self.fy * ay,
            cx: self.cx * ax,
            cy: self.cy * ay,
        }
    }
}

/// Brown-Conrady radial-tangential distortion coefficients.
///
/// Carried with the calibration for completeness; frames are not undistorted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RadialTangentialDistortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

/// Calibrated camera: intrinsics valid for frames of `image_size`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraParameters {
    pub image_size: ImageSize,
    pub intrinsics: CameraIntrinsics,
    #[serde(default)]
    pub distortion: RadialTangentialDistortion,
}

impl CameraParameters {
    pub fn new(image_size: ImageSize, intrinsics: CameraIntrinsics) -> Result<Self, CameraError> {
        let params = Self {
            image_size,
            intrinsics,
            distortion: RadialTangentialDistortion::default(),
        };
        params.validate()?;
        Ok(params)
    }

    /// Load a JSON calibration file and validate it.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CameraError> {
        let raw = fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&raw)?;
        params.validate()?;
        Ok(params)
    }

    /// Write this calibration to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CameraError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CameraError> {
        if self.image_size.is_empty() {
            return Err(CameraError::InvalidImageSize {
                width: self.image_size.width,
                height: self.image_size.height,
            });
        }
        let k = self.intrinsics;
        if !k.is_valid() {
            return Err(CameraError::InvalidIntrinsics {
                fx: k.fx,
                fy: k.fy,
                cx: k.cx,
                cy: k.cy,
            });
        }
        Ok(())
    }

    /// Rescale the intrinsics so they describe frames of `new_size`.
    ///
    /// fx/cx scale with the width ratio, fy/cy with the height ratio.
    pub fn resize(&mut self, new_size: ImageSize) -> Result<(), CameraError> {
        if new_size.is_empty() {
            return Err(CameraError::InvalidImageSize {
                width: new_size.width,
                height: new_size.height,
            });
        }
        if new_size == self.image_size {
            return Ok(());
        }
        let ax = new_size.width as f64 / self.image_size.width as f64;
        let ay = new_size.height as f64 / self.image_size.height as f64;
        self.intrinsics = self.intrinsics.scaled(ax, ay);
        self.image_size = new_size;
        log::debug!(
            "camera resized to {}x{} (fx={:.2}, fy={:.2})",
            new_size.width,
            new_size.height,
            self.intrinsics.fx,
            self.intrinsics.fy
        );
        Ok(())
    }

    /// Pinhole projection of a point in the OpenCV camera frame.
    ///
    /// Returns `None` for points at or behind the camera.
    pub fn project(&self, p_cam: &Vector3<f64>) -> Option<Point2<f64>> {
        if p_cam.z <= 1e-12 {
            return None;
        }
        let k = self.intrinsics;
        Some(Point2::new(
            k.fx * p_cam.x / p_cam.z + k.cx,
            k.fy * p_cam.y / p_cam.z + k.cy,
        ))
    }

    /// OpenGL projection matrix for drawing over frames of `image_size`
    /// shown in a viewport of `window_size`.
    ///
    /// The intrinsics (assumed to match `image_size`) are rescaled to the
    /// window, then turned into a frustum with the given clip planes.
    pub fn gl_projection_matrix(
        &self,
        image_size: ImageSize,
        window_size: ImageSize,
        near: f64,
        far: f64,
    ) -> Matrix4<f64> {
        let ax = window_size.width as f64 / image_size.width as f64;
        let ay = window_size.height as f64 / image_size.height as f64;
        let k = self.intrinsics.scaled(ax, ay);
        let w = window_size.width as f64;
        let h = window_size.height as f64;

        Matrix4::new(
            2.0 * k.fx / w, 0.0, 1.0 - 2.0 * k.cx / w, 0.0, //
            0.0, 2.0 * k.fy / h, 2.0 * k.cy / h - 1.0, 0.0, //
            0.0, 0.0, -(far + near) / (far - near), -2.0 * far * near / (far - near), //
            0.0, 0.0, -1.0, 0.0,
        )
    }
}
