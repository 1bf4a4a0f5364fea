use nalgebra::{Isometry3, Matrix4, Point2, Rotation3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// The four corners of a detected marker in image pixels (TL, TR, BR, BL).
pub type MarkerCorners = [Point2<f32>; 4];

/// Marker pose in the OpenCV camera frame (X right, Y down, Z forward).
///
/// `rvec` is a Rodrigues rotation vector (axis * angle, radians), `tvec`
/// the marker origin in the same length unit as the marker size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerPose {
    pub rvec: Vector3<f64>,
    pub tvec: Vector3<f64>,
}

impl MarkerPose {
    pub fn new(rvec: Vector3<f64>, tvec: Vector3<f64>) -> Self {
        Self { rvec, tvec }
    }

    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        Self {
            rvec: iso.rotation.scaled_axis(),
            tvec: iso.translation.vector,
        }
    }

    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_scaled_axis(self.rvec)
    }

    pub fn isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::from(self.tvec),
            UnitQuaternion::from_scaled_axis(self.rvec),
        )
    }

    /// `[R | t]` mapping marker coordinates into the OpenCV camera frame.
    pub fn camera_from_marker(&self) -> Matrix4<f64> {
        self.isometry().to_homogeneous()
    }

    /// Model-view matrix placing the marker frame in GL eye space.
    pub fn gl_model_view(&self) -> Matrix4<f64> {
        cv_to_gl() * self.camera_from_marker()
    }
}

/// Axis flip between the OpenCV camera frame and the GL eye frame.
pub fn cv_to_gl() -> Matrix4<f64> {
    Matrix4::from_diagonal(&nalgebra::Vector4::new(1.0, -1.0, -1.0, 1.0))
}

/// A detected marker: dictionary id, image corners and pose.
///
/// Valid for one frame only; detectors return fresh markers every frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: i32,
    pub corners: MarkerCorners,
    #[serde(default)]
    pub pose: MarkerPose,
}

impl Marker {
    pub fn new(id: i32, corners: MarkerCorners, pose: MarkerPose) -> Self {
        Self { id, corners, pose }
    }

    /// Mean of the four corners.
    pub fn center(&self) -> Point2<f32> {
        let (sx, sy) = self
            .corners
            .iter()
            .fold((0.0_f32, 0.0_f32), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2::new(sx / 4.0, sy / 4.0)
    }

    /// Euclidean pixel distance between this marker's center and `point`.
    pub fn distance_to(&self, point: Point2<f32>) -> f32 {
        (self.center() - point).norm()
    }

    pub fn gl_model_view(&self) -> Matrix4<f64> {
        self.pose.gl_model_view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(cx: f32, cy: f32, half: f32) -> MarkerCorners {
        [
            Point2::new(cx - half, cy - half),
            Point2::new(cx + half, cy - half),
            Point2::new(cx + half, cy + half),
            Point2::new(cx - half, cy + half),
        ]
    }

    #[test]
    fn center_is_corner_mean() {
        let m = Marker::new(7, square(100.0, 50.0, 10.0), MarkerPose::default());
        assert_eq!(m.center(), Point2::new(100.0, 50.0));
        assert_relative_eq!(m.distance_to(Point2::new(103.0, 54.0)), 5.0);
    }

    #[test]
    fn identity_pose_flips_y_and_z() {
        let pose = MarkerPose::new(Vector3::zeros(), Vector3::new(0.1, 0.2, 0.5));
        let mv = pose.gl_model_view();
        let origin = mv * nalgebra::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin, nalgebra::Vector4::new(0.1, -0.2, -0.5, 1.0));
        let x_axis = mv * nalgebra::Vector4::new(1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(x_axis, nalgebra::Vector4::new(1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn rodrigues_vector_rotates_about_its_axis() {
        let quarter = std::f64::consts::FRAC_PI_2;
        let pose = MarkerPose::new(Vector3::new(0.0, 0.0, quarter), Vector3::zeros());
        let x = pose.camera_from_marker() * nalgebra::Vector4::new(1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(x, nalgebra::Vector4::new(0.0, 1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn isometry_round_trip_keeps_pose() {
        let pose = MarkerPose::new(Vector3::new(0.2, -0.1, 0.3), Vector3::new(0.0, 0.1, 1.0));
        let back = MarkerPose::from_isometry(&pose.isometry());
        assert_relative_eq!(back.rvec, pose.rvec, epsilon = 1e-12);
        assert_relative_eq!(back.tvec, pose.tvec, epsilon = 1e-12);
    }

    #[test]
    fn pose_is_optional_in_json() {
        let raw = r#"{ "id": 141, "corners": [[0,0],[10,0],[10,10],[0,10]] }"#;
        let m: Marker = serde_json::from_str(raw).expect("parse");
        assert_eq!(m.id, 141);
        assert_eq!(m.pose, MarkerPose::default());
    }
}
