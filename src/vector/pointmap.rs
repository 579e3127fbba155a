use std::f64::consts::{FRAC_PI_2, PI};

use glam::DVec3;

use crate::geo::{normalize_lon, GeoCoordinate};

/// Weight of a polyline's lead point. It survives every thinning level.
pub const DETAIL_MAX: u8 = 5;

/// Thinning cut for a globe radius. A node is drawn iff its detail weight
/// reaches the cut, so small globes keep only the heavy nodes.
pub fn detail_for_radius(radius: f64) -> u8 {
    if radius > 5000.0 {
        0
    } else if radius > 2500.0 {
        1
    } else if radius > 1000.0 {
        2
    } else if radius > 600.0 {
        3
    } else if radius > 50.0 {
        4
    } else {
        5
    }
}

/// One polyline node: its position on the unit sphere plus the thinning
/// weight assigned at load time.
#[derive(Debug, Clone, Copy)]
pub struct PolyPoint {
    pub unit: DVec3,
    pub detail: u8,
}

/// Polyline over the sphere with a precomputed culling boundary.
///
/// The boundary is five unit vectors: the center of the polyline's
/// lon/lat bounding box and its four corners. Rotating those five decides
/// whether the whole polyline can face away from the viewer, which is far
/// cheaper than touching every node.
#[derive(Debug, Clone)]
pub struct Polyline {
    points: Vec<PolyPoint>,
    closed: bool,
    crosses_dateline: bool,
    boundary: [DVec3; 5],
}

impl Polyline {
    pub fn new(points: Vec<(GeoCoordinate, u8)>, closed: bool) -> Self {
        // A jump between consecutive longitudes of opposite sign that is
        // wider than half the globe runs through the antimeridian, not
        // through Greenwich.
        let crosses_dateline = points.windows(2).any(|pair| {
            let (a, b) = (pair[0].0.lon, pair[1].0.lon);
            a * b < 0.0 && a.abs() + b.abs() > PI
        });
        let boundary = boundary_points(&points, crosses_dateline);
        let points = points
            .into_iter()
            .map(|(coordinate, detail)| PolyPoint {
                unit: coordinate.to_unit(),
                detail,
            })
            .collect();
        Self {
            points,
            closed,
            crosses_dateline,
            boundary,
        }
    }

    pub fn points(&self) -> &[PolyPoint] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn crosses_dateline(&self) -> bool {
        self.crosses_dateline
    }

    pub fn boundary(&self) -> &[DVec3; 5] {
        &self.boundary
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Center-plus-corners boundary of a polyline. Dateline crossers measure
/// their longitude interval around the seam: the eastern side of the
/// interval is the smallest longitude right of -90 degrees, the western
/// side the largest longitude left of it.
fn boundary_points(points: &[(GeoCoordinate, u8)], crosses_dateline: bool) -> [DVec3; 5] {
    if points.is_empty() {
        return [DVec3::Z; 5];
    }

    let mut lat_min = f64::INFINITY;
    let mut lat_max = f64::NEG_INFINITY;
    for (coordinate, _) in points {
        lat_min = lat_min.min(coordinate.lat);
        lat_max = lat_max.max(coordinate.lat);
    }

    let mut lon_min = f64::INFINITY;
    let mut lon_max = f64::NEG_INFINITY;
    for (coordinate, _) in points {
        lon_min = lon_min.min(coordinate.lon);
        lon_max = lon_max.max(coordinate.lon);
    }

    let (lon0, lon1, center_lon) = if crosses_dateline {
        let mut east = f64::INFINITY;
        let mut west = f64::NEG_INFINITY;
        for (coordinate, _) in points {
            if coordinate.lon > -FRAC_PI_2 {
                east = east.min(coordinate.lon);
            }
            if coordinate.lon < -FRAC_PI_2 {
                west = west.max(coordinate.lon);
            }
        }
        if east.is_finite() && west.is_finite() {
            (east, west, normalize_lon((east + west) / 2.0 + PI))
        } else {
            (lon_min, lon_max, (lon_min + lon_max) / 2.0)
        }
    } else {
        (lon_min, lon_max, (lon_min + lon_max) / 2.0)
    };
    let center_lat = (lat_min + lat_max) / 2.0;

    [
        GeoCoordinate::new(center_lon, center_lat).to_unit(),
        GeoCoordinate::new(lon0, lat_min).to_unit(),
        GeoCoordinate::new(lon1, lat_max).to_unit(),
        GeoCoordinate::new(lon1, lat_min).to_unit(),
        GeoCoordinate::new(lon0, lat_max).to_unit(),
    ]
}

/// All polylines of one vector layer.
#[derive(Debug, Clone, Default)]
pub struct PointMap {
    polylines: Vec<Polyline>,
}

impl PointMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, polyline: Polyline) {
        self.polylines.push(polyline);
    }

    pub fn polylines(&self) -> &[Polyline] {
        &self.polylines
    }

    pub fn len(&self) -> usize {
        self.polylines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    /// Total node count over all polylines.
    pub fn node_count(&self) -> usize {
        self.polylines.iter().map(Polyline::len).sum()
    }
}
