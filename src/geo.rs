use std::f64::consts::{FRAC_PI_2, PI, TAU};

use glam::DVec3;

/// Geographic position in radians. Longitude is east-positive in
/// [-PI, PI], latitude north-positive in [-PI/2, PI/2].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoCoordinate {
    pub lon: f64,
    pub lat: f64,
}

impl GeoCoordinate {
    /// Build from radians, wrapping longitude and clamping latitude.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon: normalize_lon(lon),
            lat: lat.clamp(-FRAC_PI_2, FRAC_PI_2),
        }
    }

    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        Self::new(lon.to_radians(), lat.to_radians())
    }

    /// Position on the unit sphere: +x at lon 90, +y at the north pole,
    /// +z at (0, 0).
    #[inline(always)]
    pub fn to_unit(self) -> DVec3 {
        let (slat, clat) = self.lat.sin_cos();
        let (slon, clon) = self.lon.sin_cos();
        DVec3::new(clat * slon, slat, clat * clon)
    }

    /// Recover lon/lat from a unit sphere position.
    #[inline(always)]
    pub fn from_unit(v: DVec3) -> Self {
        Self {
            lon: v.x.atan2(v.z),
            lat: v.y.clamp(-1.0, 1.0).asin(),
        }
    }
}

/// Wrap longitude into [-PI, PI).
#[inline(always)]
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::Orientation;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_unit_round_trip() {
        for &(lon, lat) in &[
            (0.0, 0.0),
            (1.2, 0.4),
            (-2.9, -1.1),
            (3.0, 1.4),
            (-0.5, 0.0),
        ] {
            let c = GeoCoordinate::new(lon, lat);
            let back = GeoCoordinate::from_unit(c.to_unit());
            assert!((back.lon - c.lon).abs() < EPS, "lon {lon}");
            assert!((back.lat - c.lat).abs() < EPS, "lat {lat}");
        }
    }

    #[test]
    fn test_round_trip_under_rotation() {
        let orientations = [
            Orientation::IDENTITY,
            Orientation::from_euler(0.3, -1.2, 0.0),
            Orientation::from_spherical(2.1, -0.7),
        ];
        for o in orientations {
            for &(lon, lat) in &[(0.1, 0.2), (-3.0, -1.3), (2.5, 1.1), (0.0, 0.0)] {
                let c = GeoCoordinate::new(lon, lat);
                let screen = o.rotate(c.to_unit());
                let back = GeoCoordinate::from_unit(o.inverse().rotate(screen));
                assert!((back.lon - c.lon).abs() < EPS, "lon for ({lon}, {lat})");
                assert!((back.lat - c.lat).abs() < EPS, "lat for ({lon}, {lat})");
            }
        }
    }

    #[test]
    fn test_normalize_lon_wraps_antimeridian() {
        assert!((normalize_lon(PI + 0.1) - (-PI + 0.1)).abs() < EPS);
        assert!((normalize_lon(-PI - 0.1) - (PI - 0.1)).abs() < EPS);
        assert!((normalize_lon(5.0 * PI) - (-PI)).abs() < EPS);
        assert!((normalize_lon(0.25) - 0.25).abs() < EPS);
    }

    #[test]
    fn test_new_clamps_latitude() {
        let c = GeoCoordinate::new(0.0, 2.0);
        assert!((c.lat - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_poles_map_to_y_axis() {
        let north = GeoCoordinate::new(0.0, FRAC_PI_2).to_unit();
        assert!((north - DVec3::Y).length() < EPS);
        let south = GeoCoordinate::new(0.0, -FRAC_PI_2).to_unit();
        assert!((south + DVec3::Y).length() < EPS);
    }
}
