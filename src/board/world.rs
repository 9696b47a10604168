//! World data ingestion.
//!
//! Loads the static map: territory name -> polygon rings given as
//! `[longitude, latitude]` pairs. The accepted JSON layout is
//!
//! ```json
//! { "Canada": [[-141.0, 69.6], [-60.0, 45.0], ...],
//!   "Japan":  [[[129.4, 33.2], ...], [[141.2, 41.2], ...]] }
//! ```
//!
//! where a value is either one ring or a list of rings (islands). Loading is
//! fail-fast: any malformed entry rejects the whole dataset with
//! `GameError::DataIntegrity`, so no session can start on a partial world.
//!
//! Territories are stored sorted by name, which makes `TerritoryId`s stable
//! for a given dataset.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use geo::{BoundingRect, Contains, Coord, Intersects, LineString, MultiPolygon, Point, Polygon, Rect};
use rayon::prelude::*;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use super::territory::TerritoryId;
use crate::error::GameError;

/// Minimum number of distinct vertices in a ring.
const MIN_RING_VERTICES: usize = 3;

type Vertex = [f64; 2];

#[derive(Deserialize)]
#[serde(untagged)]
enum RawShape {
    Ring(Vec<Vertex>),
    Rings(Vec<Vec<Vertex>>),
}

impl RawShape {
    fn into_rings(self) -> Vec<Vec<Coord<f64>>> {
        let to_coords = |ring: Vec<Vertex>| -> Vec<Coord<f64>> {
            ring.into_iter().map(|[x, y]| Coord { x, y }).collect()
        };
        match self {
            RawShape::Ring(ring) => vec![to_coords(ring)],
            RawShape::Rings(rings) => rings.into_iter().map(to_coords).collect(),
        }
    }
}

/// Map entries in document order. A plain `BTreeMap` would silently drop
/// duplicate names.
struct RawWorld(Vec<(String, RawShape)>);

impl<'de> Deserialize<'de> for RawWorld {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawWorld;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of territory name to polygon rings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawWorld, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, shape)) = map.next_entry::<String, RawShape>()? {
                    entries.push((name, shape));
                }
                Ok(RawWorld(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Validated territory geometry, indexed by `TerritoryId`.
#[derive(Debug, Clone)]
pub struct WorldData {
    names: Vec<String>,
    shapes: Vec<MultiPolygon<f64>>,
}

impl WorldData {
    /// Parses world data from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        let raw: RawWorld = serde_json::from_str(json)
            .map_err(|e| GameError::DataIntegrity(format!("failed to parse world data: {}", e)))?;
        Self::from_raw(raw)
    }

    /// Parses world data from any reader producing JSON.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GameError> {
        let raw: RawWorld = serde_json::from_reader(reader)
            .map_err(|e| GameError::DataIntegrity(format!("failed to parse world data: {}", e)))?;
        Self::from_raw(raw)
    }

    /// Loads world data from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, GameError> {
        let data = fs::read_to_string(path).map_err(|e| {
            GameError::DataIntegrity(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&data)
    }

    /// Builds world data from in-memory rings of `(longitude, latitude)` pairs.
    pub fn from_rings<I, S>(entries: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = (S, Vec<Vec<(f64, f64)>>)>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(name, rings)| {
                let rings = rings
                    .into_iter()
                    .map(|ring| ring.into_iter().map(Coord::from).collect())
                    .collect();
                (name.into(), rings)
            })
            .collect();
        Self::from_entries(entries)
    }

    fn from_raw(raw: RawWorld) -> Result<Self, GameError> {
        let entries = raw
            .0
            .into_iter()
            .map(|(name, shape)| (name, shape.into_rings()))
            .collect();
        Self::from_entries(entries)
    }

    fn from_entries(mut entries: Vec<(String, Vec<Vec<Coord<f64>>>)>) -> Result<Self, GameError> {
        if entries.is_empty() {
            return Err(GameError::DataIntegrity(
                "world data contains no territories".into(),
            ));
        }
        if entries.len() > usize::from(u16::MAX) {
            return Err(GameError::DataIntegrity(format!(
                "world data has {} territories, at most {} are supported",
                entries.len(),
                u16::MAX
            )));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(GameError::DataIntegrity(format!(
                "duplicate territory '{}'",
                pair[0].0
            )));
        }

        let mut names = Vec::with_capacity(entries.len());
        let mut shapes = Vec::with_capacity(entries.len());
        for (name, rings) in entries {
            if name.trim().is_empty() {
                return Err(GameError::DataIntegrity("territory with a blank name".into()));
            }
            if rings.is_empty() {
                return Err(GameError::DataIntegrity(format!(
                    "territory '{}' has no polygon",
                    name
                )));
            }
            let polygons = rings
                .into_iter()
                .enumerate()
                .map(|(i, ring)| build_polygon(&name, i, ring))
                .collect::<Result<Vec<_>, _>>()?;
            names.push(name);
            shapes.push(MultiPolygon::new(polygons));
        }

        Ok(WorldData { names, shapes })
    }

    /// Number of territories.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Territory names in id order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Geometry of a territory.
    pub fn shape(&self, id: TerritoryId) -> Option<&MultiPolygon<f64>> {
        self.shapes.get(id.index())
    }

    /// Returns the territory whose interior contains the given point.
    pub fn territory_at(&self, lon: f64, lat: f64) -> Option<TerritoryId> {
        let point = Point::new(lon, lat);
        self.shapes
            .iter()
            .position(|shape| shape.0.iter().any(|polygon| polygon.contains(&point)))
            .map(|i| TerritoryId(i as u16))
    }

    /// All index pairs `(i, j)`, `i < j`, whose geometries intersect.
    ///
    /// Bounding boxes are compared before the exact polygon test. Rows of the
    /// pair matrix are processed in parallel.
    pub(crate) fn touching_pairs(&self) -> Vec<(usize, usize)> {
        let n = self.shapes.len();
        let bounds: Vec<Option<Rect<f64>>> =
            self.shapes.iter().map(|shape| shape.bounding_rect()).collect();
        let shapes = &self.shapes;
        let bounds = &bounds;

        (0..n)
            .into_par_iter()
            .flat_map_iter(move |i| {
                ((i + 1)..n)
                    .filter(move |&j| shapes_touch(bounds[i], bounds[j], &shapes[i], &shapes[j]))
                    .map(move |j| (i, j))
            })
            .collect()
    }
}

fn shapes_touch(
    a_bounds: Option<Rect<f64>>,
    b_bounds: Option<Rect<f64>>,
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
) -> bool {
    match (a_bounds, b_bounds) {
        (Some(ra), Some(rb)) if ra.intersects(&rb) => a
            .0
            .iter()
            .any(|pa| b.0.iter().any(|pb| pa.intersects(pb))),
        _ => false,
    }
}

fn build_polygon(name: &str, ring_index: usize, ring: Vec<Coord<f64>>) -> Result<Polygon<f64>, GameError> {
    let mut distinct = HashSet::with_capacity(ring.len());
    for c in &ring {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(GameError::DataIntegrity(format!(
                "territory '{}' ring {} has a non-finite coordinate",
                name, ring_index
            )));
        }
        if !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y) {
            return Err(GameError::DataIntegrity(format!(
                "territory '{}' ring {} has out-of-range coordinate ({}, {})",
                name, ring_index, c.x, c.y
            )));
        }
        distinct.insert((c.x.to_bits(), c.y.to_bits()));
    }
    if distinct.len() < MIN_RING_VERTICES {
        return Err(GameError::DataIntegrity(format!(
            "territory '{}' ring {} has {} distinct vertices, need {}",
            name,
            ring_index,
            distinct.len(),
            MIN_RING_VERTICES
        )));
    }
    Ok(Polygon::new(LineString::from(ring), Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<(f64, f64)> {
        vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size)]
    }

    #[test]
    fn parses_single_ring_and_multi_ring_entries() {
        let json = r#"{
            "Beta": [[10, 0], [20, 0], [20, 10], [10, 10]],
            "Alpha": [[[0, 0], [5, 0], [5, 5]], [[-10, -10], [-5, -10], [-5, -5]]]
        }"#;
        let world = WorldData::from_json_str(json).unwrap();
        assert_eq!(world.names(), ["Alpha", "Beta"]);
        assert_eq!(world.shape(TerritoryId(0)).unwrap().0.len(), 2);
        assert_eq!(world.shape(TerritoryId(1)).unwrap().0.len(), 1);
    }

    #[test]
    fn rejects_duplicate_names() {
        let json = r#"{
            "Alpha": [[0, 0], [5, 0], [5, 5]],
            "Alpha": [[10, 0], [15, 0], [15, 5]]
        }"#;
        let err = WorldData::from_json_str(json).unwrap_err();
        assert!(matches!(err, GameError::DataIntegrity(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn rejects_degenerate_rings() {
        let json = r#"{ "Alpha": [[0, 0], [5, 0], [0, 0]] }"#;
        let err = WorldData::from_json_str(json).unwrap_err();
        assert!(matches!(err, GameError::DataIntegrity(ref m) if m.contains("distinct vertices")));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = WorldData::from_rings([("Alpha", vec![vec![(0.0, 0.0), (200.0, 0.0), (0.0, 5.0)]])])
            .unwrap_err();
        assert!(matches!(err, GameError::DataIntegrity(ref m) if m.contains("out-of-range")));
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let err = WorldData::from_rings([("Alpha", vec![vec![(0.0, 0.0), (f64::NAN, 0.0), (0.0, 5.0)]])])
            .unwrap_err();
        assert!(matches!(err, GameError::DataIntegrity(ref m) if m.contains("non-finite")));
    }

    #[test]
    fn rejects_blank_names_and_empty_worlds() {
        let err = WorldData::from_rings([("  ", vec![square(0.0, 0.0, 1.0)])]).unwrap_err();
        assert!(err.is_fatal());
        let err = WorldData::from_json_str("{}").unwrap_err();
        assert!(matches!(err, GameError::DataIntegrity(ref m) if m.contains("no territories")));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(WorldData::from_json_str("[1, 2, 3]").unwrap_err().is_fatal());
        assert!(WorldData::from_json_str(r#"{ "Alpha": "nope" }"#).unwrap_err().is_fatal());
    }

    #[test]
    fn territory_at_finds_containing_polygon() {
        let world = WorldData::from_rings([
            ("Left", vec![square(0.0, 0.0, 10.0)]),
            ("Right", vec![square(10.0, 0.0, 10.0)]),
        ])
        .unwrap();
        assert_eq!(world.territory_at(5.0, 5.0), Some(TerritoryId(0)));
        assert_eq!(world.territory_at(15.0, 2.0), Some(TerritoryId(1)));
        assert_eq!(world.territory_at(50.0, 50.0), None);
    }

    #[test]
    fn touching_pairs_detects_shared_edges_and_corners() {
        let world = WorldData::from_rings([
            ("A", vec![square(0.0, 0.0, 10.0)]),
            ("B", vec![square(10.0, 0.0, 10.0)]),
            ("C", vec![square(20.0, 10.0, 5.0)]),
            ("D", vec![square(50.0, 50.0, 5.0)]),
        ])
        .unwrap();
        let mut pairs = world.touching_pairs();
        pairs.sort_unstable();
        // A-B share an edge, B-C share the corner (20, 10), D is isolated.
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
    }
}
