//! Planar marker pose from four image corners.
//!
//! The marker square lies on `Z = 0` of its own frame, centred at the
//! origin, with corners ordered TL, TR, BR, BL and +Y pointing towards the
//! top edge. The plane-to-image homography is decomposed with the camera
//! intrinsics into `[R | t]`.

use nalgebra::{Isometry3, Matrix3, Point2, Rotation3, Translation3, UnitQuaternion, Vector3};

use crate::{homography_from_4pt, CameraParameters, MarkerCorners, MarkerPose};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PoseError {
    #[error("marker size must be positive and finite (got {0})")]
    InvalidMarkerSize(f64),
    #[error("marker corners do not define a homography")]
    DegenerateCorners,
    #[error("camera intrinsics are not invertible")]
    SingularIntrinsics,
    #[error("degenerate homography for planar pose extraction")]
    DegenerateHomography,
}

/// Object-space corners of a square marker of side `marker_size`.
pub fn marker_object_corners(marker_size: f64) -> [Point2<f32>; 4] {
    let h = (marker_size * 0.5) as f32;
    [
        Point2::new(-h, h),
        Point2::new(h, h),
        Point2::new(h, -h),
        Point2::new(-h, -h),
    ]
}

/// Estimate the marker pose from its image corners.
pub fn estimate_marker_pose(
    corners: &MarkerCorners,
    camera: &CameraParameters,
    marker_size: f64,
) -> Result<MarkerPose, PoseError> {
    if !(marker_size.is_finite() && marker_size > 0.0) {
        return Err(PoseError::InvalidMarkerSize(marker_size));
    }

    let object = marker_object_corners(marker_size);
    let h = homography_from_4pt(&object, corners).ok_or(PoseError::DegenerateCorners)?;
    let iso = decompose_planar_homography(&camera.intrinsics.matrix(), &h.h)?;
    Ok(MarkerPose::from_isometry(&iso))
}

fn decompose_planar_homography(
    kmtx: &Matrix3<f64>,
    hmtx: &Matrix3<f64>,
) -> Result<Isometry3<f64>, PoseError> {
    let k_inv = kmtx.try_inverse().ok_or(PoseError::SingularIntrinsics)?;

    let k_inv_h1 = k_inv * hmtx.column(0);
    let k_inv_h2 = k_inv * hmtx.column(1);
    let k_inv_h3 = k_inv * hmtx.column(2);

    let norm1 = k_inv_h1.norm();
    let norm2 = k_inv_h2.norm();
    if norm1 <= 1e-12 || norm2 <= 1e-12 {
        return Err(PoseError::DegenerateHomography);
    }
    let lambda = 2.0 / (norm1 + norm2);

    let mut r1: Vector3<f64> = lambda * k_inv_h1;
    let mut r2: Vector3<f64> = lambda * k_inv_h2;
    let mut t_vec: Vector3<f64> = lambda * k_inv_h3;
    // The marker must sit in front of the camera.
    if t_vec.z < 0.0 {
        r1 = -r1;
        r2 = -r2;
        t_vec = -t_vec;
    }
    let r3 = r1.cross(&r2);
    if r3.norm() <= 1e-12 {
        return Err(PoseError::DegenerateHomography);
    }

    let mut r_mat = Matrix3::<f64>::zeros();
    r_mat.set_column(0, &r1);
    r_mat.set_column(1, &r2);
    r_mat.set_column(2, &r3);

    // Project onto SO(3).
    let svd = r_mat.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(PoseError::DegenerateHomography);
    };
    let mut r_orth = u * v_t;
    if r_orth.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        r_orth = u_flipped * v_t;
    }

    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r_orth));
    Ok(Isometry3::from_parts(Translation3::from(t_vec), rot))
}
