use std::fs;
use std::path::Path;

use anyhow::Result;
use geojson::{GeoJson, Geometry, Value};
use log::debug;
use rayon::prelude::*;

use crate::geo::GeoCoordinate;
use crate::theme::VectorLayer;
use crate::vector::{PointMap, Polyline, DETAIL_MAX};

/// The polyline sets of all vector layers.
#[derive(Debug, Clone, Default)]
pub struct WorldVectors {
    coastlines: PointMap,
    lakes: PointMap,
    rivers: PointMap,
    borders: PointMap,
}

impl WorldVectors {
    pub fn get(&self, layer: VectorLayer) -> &PointMap {
        match layer {
            VectorLayer::Coastlines => &self.coastlines,
            VectorLayer::Lakes => &self.lakes,
            VectorLayer::Rivers => &self.rivers,
            VectorLayer::Borders => &self.borders,
        }
    }

    fn set(&mut self, layer: VectorLayer, map: PointMap) {
        match layer {
            VectorLayer::Coastlines => self.coastlines = map,
            VectorLayer::Lakes => self.lakes = map,
            VectorLayer::Rivers => self.rivers = map,
            VectorLayer::Borders => self.borders = map,
        }
    }

    pub fn polyline_count(&self) -> usize {
        VectorLayer::ALL.iter().map(|&l| self.get(l).len()).sum()
    }

    pub fn node_count(&self) -> usize {
        VectorLayer::ALL
            .iter()
            .map(|&l| self.get(l).node_count())
            .sum()
    }
}

/// Candidate files per layer, most detailed first. The first one that
/// parses to a non-empty map wins.
const LAYER_FILES: [(VectorLayer, &[&str]); 4] = [
    (
        VectorLayer::Coastlines,
        &[
            "ne_50m_coastline.json",
            "ne_110m_coastline.json",
            "coastlines.json",
        ],
    ),
    (
        VectorLayer::Lakes,
        &["ne_50m_lakes.json", "ne_110m_lakes.json", "lakes.json"],
    ),
    (
        VectorLayer::Rivers,
        &[
            "ne_50m_rivers_lake_centerlines.json",
            "ne_110m_rivers_lake_centerlines.json",
            "rivers.json",
        ],
    ),
    (
        VectorLayer::Borders,
        &[
            "ne_50m_admin_0_boundary_lines_land.json",
            "ne_110m_admin_0_boundary_lines_land.json",
            "borders.json",
        ],
    ),
];

/// Load all available vector data from `data_dir`, one GeoJSON file per
/// layer. Layers without a usable file keep the built-in outlines.
pub fn load_world_vectors(data_dir: &Path) -> WorldVectors {
    let mut world = builtin_world();
    let loaded: Vec<(VectorLayer, Option<PointMap>)> = LAYER_FILES
        .par_iter()
        .map(|&(layer, candidates)| (layer, load_layer(data_dir, candidates)))
        .collect();
    for (layer, map) in loaded {
        if let Some(map) = map {
            world.set(layer, map);
        }
    }
    world
}

fn load_layer(data_dir: &Path, candidates: &[&str]) -> Option<PointMap> {
    for filename in candidates {
        let path = data_dir.join(filename);
        if !path.exists() {
            continue;
        }
        match read_layer_file(&path) {
            Ok(map) if !map.is_empty() => {
                debug!(
                    "{}: {} polylines, {} nodes",
                    filename,
                    map.len(),
                    map.node_count()
                );
                return Some(map);
            }
            Ok(_) => {}
            Err(e) => eprintln!("Warning: Failed to load {}: {}", filename, e),
        }
    }
    None
}

fn read_layer_file(path: &Path) -> Result<PointMap> {
    let mut bytes = fs::read(path)?;
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes)?;
    let mut map = PointMap::new();
    process_geojson_lines(&geojson, |line, closed| {
        if line.len() >= 2 {
            map.push(build_polyline(line, closed));
        }
    });
    Ok(map)
}

/// Thinning weight of the node at `index` within its polyline. The lead
/// node always survives; the rest fall off in power-of-two strides.
fn detail_weight(index: usize) -> u8 {
    if index == 0 {
        DETAIL_MAX
    } else if index % 16 == 0 {
        4
    } else if index % 8 == 0 {
        3
    } else if index % 4 == 0 {
        2
    } else if index % 2 == 0 {
        1
    } else {
        0
    }
}

fn build_polyline(mut line: Vec<(f64, f64)>, mut closed: bool) -> Polyline {
    // A duplicated end node means a ring, written out the GeoJSON way.
    if line.len() > 1 && line.first() == line.last() {
        line.pop();
        closed = true;
    }
    let points = line
        .iter()
        .enumerate()
        .map(|(i, &(lon, lat))| (GeoCoordinate::from_degrees(lon, lat), detail_weight(i)))
        .collect();
    Polyline::new(points, closed)
}

/// Walk a GeoJSON document and hand every line feature to `add_line`,
/// along with whether it is a ring.
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(Vec<(f64, f64)>, bool),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>, bool),
{
    match &geometry.value {
        Value::LineString(coords) => {
            let line: Vec<(f64, f64)> = coords.iter().map(|c| (c[0], c[1])).collect();
            add_line(line, false);
        }
        Value::MultiLineString(lines) => {
            for coords in lines {
                let line: Vec<(f64, f64)> = coords.iter().map(|c| (c[0], c[1])).collect();
                add_line(line, false);
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                let line: Vec<(f64, f64)> = exterior.iter().map(|c| (c[0], c[1])).collect();
                add_line(line, true);
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    let line: Vec<(f64, f64)> = exterior.iter().map(|c| (c[0], c[1])).collect();
                    add_line(line, true);
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Hand-drawn outline, already minimal: every node survives thinning.
fn coarse_outline(coords: &[(f64, f64)]) -> Polyline {
    let mut line = coords.to_vec();
    let mut closed = false;
    if line.len() > 1 && line.first() == line.last() {
        line.pop();
        closed = true;
    }
    let points = line
        .iter()
        .map(|&(lon, lat)| (GeoCoordinate::from_degrees(lon, lat), DETAIL_MAX))
        .collect();
    Polyline::new(points, closed)
}

/// Built-in world outlines for when no data files are available.
pub fn builtin_world() -> WorldVectors {
    let mut world = WorldVectors::default();

    // North America
    world.coastlines.push(coarse_outline(&[
        (-168.0, 65.0), (-166.0, 60.0), (-141.0, 60.0), (-130.0, 55.0),
        (-125.0, 48.0), (-124.0, 40.0), (-117.0, 32.0), (-110.0, 25.0),
        (-97.0, 25.0), (-97.0, 28.0), (-82.0, 24.0), (-80.0, 25.0),
        (-81.0, 31.0), (-75.0, 35.0), (-70.0, 41.0), (-67.0, 45.0),
        (-65.0, 47.0), (-55.0, 47.0), (-52.0, 47.0), (-55.0, 52.0),
        (-58.0, 55.0), (-64.0, 60.0), (-73.0, 62.0), (-80.0, 63.0),
        (-95.0, 62.0), (-110.0, 68.0), (-130.0, 70.0), (-145.0, 70.0),
        (-168.0, 65.0),
    ]));

    // South America
    world.coastlines.push(coarse_outline(&[
        (-80.0, 10.0), (-75.0, 5.0), (-70.0, 5.0), (-60.0, 5.0),
        (-50.0, 0.0), (-35.0, -5.0), (-35.0, -10.0), (-38.0, -15.0),
        (-40.0, -22.0), (-48.0, -25.0), (-55.0, -34.0), (-58.0, -38.0),
        (-65.0, -42.0), (-68.0, -50.0), (-75.0, -52.0), (-75.0, -45.0),
        (-72.0, -40.0), (-72.0, -30.0), (-70.0, -20.0), (-70.0, -15.0),
        (-80.0, -5.0), (-80.0, 0.0), (-80.0, 10.0),
    ]));

    // Europe
    world.coastlines.push(coarse_outline(&[
        (-10.0, 36.0), (-5.0, 36.0), (0.0, 38.0), (5.0, 43.0),
        (10.0, 44.0), (15.0, 45.0), (20.0, 40.0), (25.0, 37.0),
        (30.0, 40.0), (35.0, 42.0), (40.0, 43.0), (40.0, 55.0),
        (30.0, 60.0), (25.0, 65.0), (20.0, 70.0), (10.0, 71.0),
        (5.0, 62.0), (5.0, 58.0), (-5.0, 58.0), (-10.0, 52.0),
        (-5.0, 48.0), (-5.0, 43.0), (-10.0, 36.0),
    ]));

    // Africa, southern half
    world.coastlines.push(coarse_outline(&[
        (-17.0, 15.0), (-15.0, 10.0), (-10.0, 5.0), (0.0, 5.0),
        (10.0, 5.0), (15.0, 0.0), (20.0, -5.0), (25.0, -10.0),
        (35.0, -20.0), (35.0, -25.0), (30.0, -30.0), (20.0, -35.0),
        (18.0, -35.0), (15.0, -30.0), (10.0, -15.0), (10.0, 0.0),
        (5.0, 5.0), (-5.0, 5.0), (-10.0, 10.0), (-17.0, 15.0),
    ]));

    // Africa, northern coast and horn
    world.coastlines.push(coarse_outline(&[
        (-17.0, 15.0), (-17.0, 20.0), (-15.0, 28.0), (-5.0, 35.0),
        (10.0, 37.0), (20.0, 33.0), (25.0, 32.0), (35.0, 30.0),
        (35.0, 20.0), (42.0, 12.0), (50.0, 12.0), (45.0, 5.0),
        (35.0, -5.0), (35.0, -20.0),
    ]));

    // Asia
    world.coastlines.push(coarse_outline(&[
        (35.0, 42.0), (40.0, 43.0), (50.0, 40.0), (55.0, 37.0),
        (60.0, 25.0), (65.0, 25.0), (70.0, 20.0), (75.0, 15.0),
        (80.0, 8.0), (80.0, 15.0), (88.0, 22.0), (92.0, 22.0),
        (95.0, 16.0), (100.0, 14.0), (105.0, 10.0), (110.0, 20.0),
        (115.0, 22.0), (120.0, 22.0), (122.0, 25.0), (125.0, 30.0),
        (130.0, 35.0), (135.0, 35.0), (140.0, 40.0), (145.0, 45.0),
        (145.0, 50.0), (140.0, 55.0), (135.0, 55.0), (130.0, 52.0),
        (130.0, 43.0), (120.0, 40.0), (110.0, 45.0), (90.0, 50.0),
        (70.0, 55.0), (60.0, 55.0), (50.0, 50.0), (40.0, 43.0),
    ]));

    // Australia
    world.coastlines.push(coarse_outline(&[
        (115.0, -20.0), (120.0, -18.0), (130.0, -12.0), (140.0, -12.0),
        (145.0, -15.0), (150.0, -25.0), (153.0, -30.0), (150.0, -35.0),
        (145.0, -38.0), (140.0, -38.0), (135.0, -35.0), (130.0, -32.0),
        (125.0, -32.0), (115.0, -35.0), (115.0, -25.0), (115.0, -20.0),
    ]));

    // Lake Superior
    world.lakes.push(coarse_outline(&[
        (-92.0, 46.7), (-90.5, 47.9), (-87.5, 48.8), (-84.5, 47.9),
        (-84.8, 46.5), (-88.0, 46.5), (-92.0, 46.7),
    ]));

    // Caspian Sea
    world.lakes.push(coarse_outline(&[
        (50.0, 47.0), (53.0, 46.5), (53.5, 42.0), (54.5, 40.5),
        (53.0, 38.5), (50.0, 36.5), (48.5, 38.0), (49.5, 40.5),
        (47.0, 43.5), (47.5, 46.0), (50.0, 47.0),
    ]));

    // Lake Victoria
    world.lakes.push(coarse_outline(&[
        (32.0, 0.5), (33.5, 1.0), (34.5, 0.0), (34.0, -2.5),
        (32.5, -2.5), (31.7, -1.0), (32.0, 0.5),
    ]));

    // Amazon
    world.rivers.push(coarse_outline(&[
        (-73.0, -4.5), (-67.0, -3.0), (-60.0, -3.5), (-55.0, -2.0),
        (-52.0, -1.5), (-50.0, 0.0),
    ]));

    // Nile
    world.rivers.push(coarse_outline(&[
        (32.5, 0.5), (31.5, 6.0), (32.5, 12.0), (33.0, 18.0),
        (32.5, 24.0), (31.0, 30.0), (31.5, 31.5),
    ]));

    // Mississippi
    world.rivers.push(coarse_outline(&[
        (-95.0, 47.0), (-91.0, 43.0), (-90.0, 38.5), (-91.0, 34.0),
        (-91.5, 31.0), (-89.5, 29.0),
    ]));

    // Yangtze
    world.rivers.push(coarse_outline(&[
        (91.0, 33.5), (97.0, 31.0), (104.5, 29.5), (109.0, 30.5),
        (114.0, 30.5), (117.5, 31.5), (121.0, 31.5),
    ]));

    // United States / Canada
    world.borders.push(coarse_outline(&[
        (-123.0, 49.0), (-110.0, 49.0), (-95.0, 49.0), (-88.0, 48.0),
        (-83.0, 45.5), (-79.0, 43.5), (-75.0, 45.0), (-71.0, 45.0),
        (-67.5, 47.0),
    ]));

    // United States / Mexico
    world.borders.push(coarse_outline(&[
        (-117.1, 32.5), (-111.0, 31.3), (-106.5, 31.8), (-103.0, 29.0),
        (-99.5, 27.5), (-97.1, 25.9),
    ]));

    // Chile / Argentina
    world.borders.push(coarse_outline(&[
        (-70.0, -18.5), (-68.5, -27.0), (-70.0, -33.0), (-71.0, -40.0),
        (-72.0, -50.0),
    ]));

    // France / Spain
    world
        .borders
        .push(coarse_outline(&[(-1.8, 43.3), (0.7, 42.8), (3.2, 42.4)]));

    world
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_world_covers_every_layer() {
        let world = builtin_world();
        for layer in VectorLayer::ALL {
            assert!(!world.get(layer).is_empty(), "{layer:?} empty");
        }
        assert!(world.get(VectorLayer::Coastlines).len() >= 7);
        // Built-in outlines skip thinning entirely.
        for polyline in world.get(VectorLayer::Coastlines).polylines() {
            assert!(polyline.points().iter().all(|p| p.detail == DETAIL_MAX));
        }
    }

    #[test]
    fn test_duplicated_end_node_makes_a_ring() {
        let ring = build_polyline(
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)],
            false,
        );
        assert!(ring.is_closed());
        assert_eq!(ring.len(), 3);

        let open = build_polyline(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], false);
        assert!(!open.is_closed());
        assert_eq!(open.len(), 3);
    }

    #[test]
    fn test_detail_weights_fall_off_in_strides() {
        assert_eq!(detail_weight(0), DETAIL_MAX);
        assert_eq!(detail_weight(16), 4);
        assert_eq!(detail_weight(8), 3);
        assert_eq!(detail_weight(4), 2);
        assert_eq!(detail_weight(2), 1);
        assert_eq!(detail_weight(3), 0);
        assert_eq!(detail_weight(32), 4);
        assert_eq!(detail_weight(24), 3);
    }

    #[test]
    fn test_geojson_lines_and_polygons_are_extracted() {
        let mut raw = br#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString",
                              "coordinates": [[0.0, 0.0], [5.0, 5.0], [10.0, 5.0]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon",
                              "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]]]}}
            ]
        }"#
        .to_vec();
        let geojson: GeoJson = simd_json::serde::from_slice(&mut raw).unwrap();
        let mut lines = Vec::new();
        process_geojson_lines(&geojson, |line, closed| lines.push((line, closed)));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0.len(), 3);
        assert!(!lines[0].1);
        assert_eq!(lines[1].0.len(), 4);
        assert!(lines[1].1);
    }

    #[test]
    fn test_missing_data_dir_falls_back_to_builtin() {
        let world = load_world_vectors(Path::new("/nonexistent-vector-data"));
        assert_eq!(world.polyline_count(), builtin_world().polyline_count());
        assert_eq!(world.node_count(), builtin_world().node_count());
    }
}
