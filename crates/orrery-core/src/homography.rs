//! Homography between a marker square and its four image corners.

use nalgebra::{Matrix3, Point2, SMatrix, SymmetricEigen, Vector3};

/// Projective map `p_dst ~ H * p_src`, scaled so `H` has unit norm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    /// Map a point; `None` when it lands on the line at infinity.
    pub fn map(&self, p: Point2<f64>) -> Option<Point2<f64>> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        (v.z.abs() > 1e-12).then(|| Point2::new(v.x / v.z, v.y / v.z))
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// Similarity moving the centroid to the origin with RMS radius `sqrt(2)`.
fn conditioning(points: &[Point2<f64>; 4]) -> Matrix3<f64> {
    let centroid = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.to_homogeneous()) / 4.0;
    let (cx, cy) = (centroid.x, centroid.y);
    let spread = points
        .iter()
        .map(|p| (p.x - cx).powi(2) + (p.y - cy).powi(2))
        .sum::<f64>()
        / 4.0;
    let s = if spread > 1e-24 {
        (2.0 / spread).sqrt()
    } else {
        1.0
    };
    Matrix3::new(
        s, 0.0, -s * cx, //
        0.0, s, -s * cy, //
        0.0, 0.0, 1.0,
    )
}

fn apply(t: &Matrix3<f64>, p: &Point2<f64>) -> Point2<f64> {
    Point2::from_homogeneous(t * p.to_homogeneous()).unwrap_or(*p)
}

/// Direct linear transform from four correspondences (same corner order in
/// `src` and `dst`).
///
/// `None` when the corners do not pin down an invertible map: repeated
/// corners, three collinear points, non-finite input.
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    let src = src.map(|p| Point2::new(p.x as f64, p.y as f64));
    let dst = dst.map(|p| Point2::new(p.x as f64, p.y as f64));
    if src.iter().chain(&dst).any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return None;
    }

    let t_src = conditioning(&src);
    let t_dst = conditioning(&dst);

    // Two rows per correspondence, unknowns h11..h33 row-major.
    let mut a = SMatrix::<f64, 8, 9>::zeros();
    for (k, (s, d)) in src.iter().zip(&dst).enumerate() {
        let s = apply(&t_src, s);
        let d = apply(&t_dst, d);
        let (x, y, u, v) = (s.x, s.y, d.x, d.y);
        a.row_mut(2 * k)
            .copy_from_slice(&[x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, -u]);
        a.row_mut(2 * k + 1)
            .copy_from_slice(&[0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, -v]);
    }

    // Null vector of A = eigenvector of AᵀA with the smallest eigenvalue.
    let eigen = SymmetricEigen::new(a.transpose() * a);
    let (min_idx, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|l, r| l.1.total_cmp(r.1))?;
    let n = eigen.eigenvectors.column(min_idx);
    let hn = Matrix3::new(
        n[0], n[1], n[2], //
        n[3], n[4], n[5], //
        n[6], n[7], n[8],
    );
    if hn.determinant().abs() < 1e-9 {
        return None;
    }

    let h = t_dst.try_inverse()? * hn * t_src;
    let norm = h.norm();
    if !(norm.is_finite() && norm > 1e-12) {
        return None;
    }
    Some(Homography::new(h / norm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> [Point2<f32>; 4] {
        [
            Point2::new(-0.5, 0.5),
            Point2::new(0.5, 0.5),
            Point2::new(0.5, -0.5),
            Point2::new(-0.5, -0.5),
        ]
    }

    #[test]
    fn inverse_undoes_the_map() {
        let h = Homography::new(Matrix3::new(
            1.2, 0.1, 5.0, //
            -0.05, 0.9, 3.0, //
            0.001, 0.0005, 1.0,
        ));
        let inv = h.inverse().expect("invertible");
        for p in [Point2::new(0.0, 0.0), Point2::new(50.0, -20.0), Point2::new(320.0, 200.0)] {
            let back = h.map(p).and_then(|q| inv.map(q)).expect("finite");
            assert_relative_eq!(back, p, epsilon = 1e-9);
        }
    }

    #[test]
    fn recovers_a_perspective_warp_of_the_square() {
        let truth = Homography::new(Matrix3::new(
            300.0, 15.0, 320.0, //
            -6.0, 330.0, 240.0, //
            0.3, -0.12, 1.0,
        ));
        let corners = square().map(|p| {
            let q = truth
                .map(Point2::new(p.x as f64, p.y as f64))
                .expect("finite");
            Point2::new(q.x as f32, q.y as f32)
        });

        let fitted = homography_from_4pt(&square(), &corners).expect("fit");
        for p in [Point2::new(0.0, 0.0), Point2::new(0.25, -0.1), Point2::new(-0.4, 0.3)] {
            let want = truth.map(p).expect("finite");
            let got = fitted.map(p).expect("finite");
            assert_relative_eq!(got, want, epsilon = 1e-2);
        }
    }

    #[test]
    fn collapsed_or_collinear_corners_are_rejected() {
        let same = [Point2::new(10.0_f32, 10.0); 4];
        assert!(homography_from_4pt(&square(), &same).is_none());

        let line = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(3.0, 3.0),
        ];
        assert!(homography_from_4pt(&square(), &line).is_none());
    }
}
