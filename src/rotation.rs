use glam::{DMat3, DVec3};

/// Unit quaternion giving the rotation of the globe relative to the viewer.
///
/// The camera frame is fixed: +x points east on screen, +y north (up),
/// +z out of the screen toward the viewer. A ground point `v` on the unit
/// sphere appears at screen position `(cx + r * s.x, cy - r * s.y)` where
/// `s = orientation.rotate(v)`, and is on the visible hemisphere iff
/// `s.z >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Orientation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Orientation {
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Hamilton product `self * other`. As a rotation, `other` applies
    /// first and `self` second, matching matrix-product order.
    pub fn compose(self, other: Self) -> Self {
        Self {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    /// Conjugate. Inverse of a unit quaternion.
    pub fn inverse(self) -> Self {
        Self {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Rescale to unit length. A degenerate near-zero input yields the
    /// identity instead of dividing by zero.
    pub fn normalize(self) -> Self {
        let norm =
            (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if norm < 1e-12 {
            return Self::IDENTITY;
        }
        Self {
            w: self.w / norm,
            x: self.x / norm,
            y: self.y / norm,
            z: self.z / norm,
        }
    }

    /// Rotation of `pitch` about +x, then `yaw` about +y, then `roll`
    /// about +z (applied to a vector in that order).
    pub fn from_euler(pitch: f64, yaw: f64, roll: f64) -> Self {
        let (sp, cp) = (0.5 * pitch).sin_cos();
        let (sy, cy) = (0.5 * yaw).sin_cos();
        let (sr, cr) = (0.5 * roll).sin_cos();
        let qx = Self::new(cp, sp, 0.0, 0.0);
        let qy = Self::new(cy, 0.0, sy, 0.0);
        let qz = Self::new(cr, 0.0, 0.0, sr);
        qz.compose(qy).compose(qx)
    }

    /// The orientation that brings the ground point at (lon, lat) to the
    /// center of the screen, north up.
    pub fn from_spherical(lon: f64, lat: f64) -> Self {
        let qy = Self::from_euler(0.0, -lon, 0.0);
        let qx = Self::from_euler(lat, 0.0, 0.0);
        qx.compose(qy)
    }

    /// Spherical linear interpolation from `self` at t = 0 to `other` at
    /// t = 1. Identical or antipodal endpoints fall back to `self`.
    pub fn slerp(self, other: Self, t: f64) -> Self {
        let cos_alpha = self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z;
        let alpha = cos_alpha.clamp(-1.0, 1.0).acos();
        let sin_alpha = alpha.sin();
        if sin_alpha.abs() < 1e-10 {
            return self;
        }
        let ka = ((1.0 - t) * alpha).sin() / sin_alpha;
        let kb = (t * alpha).sin() / sin_alpha;
        Self {
            w: ka * self.w + kb * other.w,
            x: ka * self.x + kb * other.x,
            y: ka * self.y + kb * other.y,
            z: ka * self.z + kb * other.z,
        }
    }

    /// Equivalent rotation matrix. Hot loops should build this once and
    /// apply it per point instead of calling `rotate` repeatedly.
    pub fn to_matrix(self) -> DMat3 {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        DMat3::from_cols(
            DVec3::new(
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y + w * z),
                2.0 * (x * z - w * y),
            ),
            DVec3::new(
                2.0 * (x * y - w * z),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z + w * x),
            ),
            DVec3::new(
                2.0 * (x * z + w * y),
                2.0 * (y * z - w * x),
                1.0 - 2.0 * (x * x + y * y),
            ),
        )
    }

    /// Apply the rotation to a vector.
    #[inline(always)]
    pub fn rotate(self, v: DVec3) -> DVec3 {
        self.to_matrix() * v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_quat_eq(a: Orientation, b: Orientation) {
        assert!((a.w - b.w).abs() < EPS, "w: {} vs {}", a.w, b.w);
        assert!((a.x - b.x).abs() < EPS, "x: {} vs {}", a.x, b.x);
        assert!((a.y - b.y).abs() < EPS, "y: {} vs {}", a.y, b.y);
        assert!((a.z - b.z).abs() < EPS, "z: {} vs {}", a.z, b.z);
    }

    #[test]
    fn test_normalize_returns_unit_norm() {
        let q = Orientation::new(0.3, -1.2, 2.5, 0.7).normalize();
        let n = (q.w * q.w + q.x * q.x + q.y * q.y + q.z * q.z).sqrt();
        assert!((n - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_normalize_degenerate_is_identity() {
        let q = Orientation::new(0.0, 0.0, 0.0, 0.0).normalize();
        assert_quat_eq(q, Orientation::IDENTITY);
    }

    #[test]
    fn test_compose_with_inverse_is_identity() {
        let q = Orientation::from_euler(0.4, -1.1, 0.25);
        assert_quat_eq(q.compose(q.inverse()), Orientation::IDENTITY);
        assert_quat_eq(q.inverse().compose(q), Orientation::IDENTITY);
    }

    #[test]
    fn test_compose_applies_right_operand_first() {
        let yaw = Orientation::from_euler(0.0, std::f64::consts::FRAC_PI_2, 0.0);
        let pitch = Orientation::from_euler(std::f64::consts::FRAC_PI_2, 0.0, 0.0);
        // Yaw first takes +z to +x, pitch about +x then leaves it there.
        let v = pitch.compose(yaw).rotate(DVec3::Z);
        assert!((v - DVec3::X).length() < EPS);
    }

    #[test]
    fn test_slerp_identical_endpoints_stay_fixed() {
        let q = Orientation::from_euler(0.2, 0.3, 0.0);
        for t in [0.0, 0.25, 0.5, 0.75, 1.0] {
            assert_quat_eq(q.slerp(q, t), q);
        }
    }

    #[test]
    fn test_slerp_reproduces_endpoints() {
        let a = Orientation::from_euler(0.1, -0.4, 0.0);
        let b = Orientation::from_euler(0.9, 0.6, 0.2);
        assert_quat_eq(a.slerp(b, 0.0), a);
        assert_quat_eq(a.slerp(b, 1.0), b);
    }

    #[test]
    fn test_slerp_midpoint_is_unit() {
        let a = Orientation::IDENTITY;
        let b = Orientation::from_euler(0.0, 1.2, 0.0);
        let m = a.slerp(b, 0.5);
        let n = (m.w * m.w + m.x * m.x + m.y * m.y + m.z * m.z).sqrt();
        assert!((n - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_from_spherical_centers_the_point() {
        let (lon, lat) = (0.8_f64, -0.3_f64);
        let v = DVec3::new(lat.cos() * lon.sin(), lat.sin(), lat.cos() * lon.cos());
        let s = Orientation::from_spherical(lon, lat).rotate(v);
        assert!(s.z > 1.0 - EPS, "point not centered: {s:?}");
        assert!(s.x.abs() < EPS && s.y.abs() < EPS);
    }

    #[test]
    fn test_rotate_round_trip() {
        let o = Orientation::from_euler(0.7, -0.2, 0.1);
        let v = DVec3::new(0.36, -0.48, 0.8);
        let back = o.inverse().rotate(o.rotate(v));
        assert!((back - v).length() < EPS);
    }

    #[test]
    fn test_matrix_matches_composition() {
        let a = Orientation::from_euler(0.3, 0.0, 0.0);
        let b = Orientation::from_euler(0.0, -0.8, 0.0);
        let v = DVec3::new(0.1, 0.5, -0.7);
        let via_compose = a.compose(b).rotate(v);
        let via_matrices = a.to_matrix() * (b.to_matrix() * v);
        assert!((via_compose - via_matrices).length() < EPS);
    }
}
