//! Points of interest on campus: gates, canteens and dorms.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LocationDataError;
use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationCategory {
    Gate,
    Canteen,
    Dorm,
}

impl LocationCategory {
    fn id_prefix(self) -> &'static str {
        match self {
            LocationCategory::Gate => "gate",
            LocationCategory::Canteen => "canteen",
            LocationCategory::Dorm => "dorm",
        }
    }

    fn default_name(self) -> &'static str {
        match self {
            LocationCategory::Gate => "Gate",
            LocationCategory::Canteen => "Canteen",
            LocationCategory::Dorm => "Dorm",
        }
    }

    /// Orders may only be picked up at gates and canteens.
    pub fn is_pickup(self) -> bool {
        matches!(self, LocationCategory::Gate | LocationCategory::Canteen)
    }
}

impl fmt::Display for LocationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id_prefix())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinate,
    pub category: LocationCategory,
}

impl Location {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        coordinates: Coordinate,
        category: LocationCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinates,
            category,
        }
    }
}

/// All loaded locations, grouped by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationRegistry {
    pub gates: Vec<Location>,
    pub canteens: Vec<Location>,
    pub dorms: Vec<Location>,
}

impl LocationRegistry {
    /// The small built-in set used when location data cannot be loaded.
    pub fn builtin() -> Self {
        use LocationCategory::{Canteen, Dorm, Gate};

        Self {
            gates: vec![
                Location::new("gate_1", "东门", Coordinate::new(116.325263, 40.0053343), Gate),
                Location::new("gate_2", "西门", Coordinate::new(116.315263, 40.0053343), Gate),
                Location::new("gate_3", "南门", Coordinate::new(116.320263, 40.0003343), Gate),
            ],
            canteens: vec![
                Location::new(
                    "canteen_1",
                    "观畴园餐厅（万人大食堂）",
                    Coordinate::new(116.315263, 40.0053343),
                    Canteen,
                ),
                Location::new("canteen_2", "紫荆园餐厅", Coordinate::new(116.322763, 40.0103343), Canteen),
                Location::new("canteen_3", "清芬园餐厅", Coordinate::new(116.318763, 40.0073343), Canteen),
            ],
            dorms: vec![
                Location::new("dorm_1", "紫荆学生公寓1号楼", Coordinate::new(116.320263, 40.0103343), Dorm),
                Location::new("dorm_2", "紫荆学生公寓2号楼", Coordinate::new(116.321263, 40.0103343), Dorm),
                Location::new("dorm_3", "紫荆学生公寓3号楼", Coordinate::new(116.322263, 40.0103343), Dorm),
            ],
        }
    }

    /// Build a registry from three GeoJSON FeatureCollection documents.
    ///
    /// Gates are points; canteens and dorms are polygons and are placed at the
    /// first vertex of their outer ring.
    pub fn from_geojson(gates: &str, canteens: &str, dorms: &str) -> Result<Self, LocationDataError> {
        Ok(Self {
            gates: parse_features(gates, LocationCategory::Gate)?,
            canteens: parse_features(canteens, LocationCategory::Canteen)?,
            dorms: parse_features(dorms, LocationCategory::Dorm)?,
        })
    }

    pub fn all(&self) -> impl Iterator<Item = &Location> {
        self.gates.iter().chain(&self.canteens).chain(&self.dorms)
    }

    pub fn resolve(&self, id: &str) -> Option<&Location> {
        self.all().find(|loc| loc.id == id)
    }

    pub fn len(&self) -> usize {
        self.gates.len() + self.canteens.len() + self.dorms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Map<String, Value>,
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
struct Geometry {
    coordinates: Value,
}

fn parse_features(json: &str, category: LocationCategory) -> Result<Vec<Location>, LocationDataError> {
    let collection: FeatureCollection = serde_json::from_str(json)?;

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let number = i + 1;
            let coordinates = feature
                .geometry
                .as_ref()
                .and_then(|g| anchor_point(&g.coordinates))
                .ok_or(LocationDataError::MissingCoordinates { category, index: i })?;

            let name = ["name", "name:zh"]
                .iter()
                .filter_map(|key| feature.properties.get(*key))
                .filter_map(Value::as_str)
                .find(|s| !s.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} {}", category.default_name(), number));

            Ok(Location {
                id: format!("{}_{}", category.id_prefix(), number),
                name,
                coordinates,
                category,
            })
        })
        .collect()
}

/// A Point's own position, or the first vertex of a (Multi)Polygon.
fn anchor_point(value: &Value) -> Option<Coordinate> {
    let mut current = value;
    loop {
        let items = current.as_array()?;
        match items.first()? {
            Value::Number(_) => {
                let lon = items.first()?.as_f64()?;
                let lat = items.get(1)?.as_f64()?;
                return Some(Coordinate::new(lon, lat));
            }
            nested => current = nested,
        }
    }
}
