//! Boundary geometry for geographic levels

use geojson::{Feature, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::GeographicLevel;

/// Unique identifier for a boundary level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoundaryLevelId(pub u64);

impl fmt::Display for BoundaryLevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A geometry vintage for one geographic level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryLevel {
    pub id: BoundaryLevelId,

    pub level: GeographicLevel,

    /// Human label, e.g. `Local authorities December 2021`
    pub label: String,
}

/// Boundary polygon of one location code within a boundary level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryData {
    pub code: String,

    pub name: String,

    pub geometry: Geometry,

    #[serde(default)]
    pub properties: JsonObject,
}

impl BoundaryData {
    /// Whether the geometry is a polygon or multipolygon
    pub fn is_areal(&self) -> bool {
        matches!(self.geometry.value, geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_))
    }

    /// GeoJSON feature carrying the geometry, the boundary properties, and
    /// the boundary's `code` and `name`
    pub fn to_feature(&self) -> Feature {
        let mut properties = self.properties.clone();
        properties.insert("code".to_string(), self.code.clone().into());
        properties.insert("name".to_string(), self.name.clone().into());

        Feature {
            bbox: None,
            geometry: Some(self.geometry.clone()),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Geometry {
        Geometry::new(geojson::Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 0.0],
        ]]))
    }

    #[test]
    fn test_feature_carries_code_and_properties() {
        let mut properties = JsonObject::new();
        properties.insert("area_sq_km".to_string(), 2.9.into());
        let data = BoundaryData {
            code: "E09000001".to_string(),
            name: "City of London".to_string(),
            geometry: square(),
            properties,
        };

        let feature = data.to_feature();
        let props = feature.properties.unwrap();
        assert_eq!(props["code"], "E09000001");
        assert_eq!(props["name"], "City of London");
        assert_eq!(props["area_sq_km"], 2.9);
        assert_eq!(feature.geometry, Some(square()));
        assert!(data.is_areal());
    }

    #[test]
    fn test_point_is_not_areal() {
        let data = BoundaryData {
            code: "X".to_string(),
            name: "Point".to_string(),
            geometry: Geometry::new(geojson::Value::Point(vec![0.0, 0.0])),
            properties: JsonObject::new(),
        };
        assert!(!data.is_areal());
    }
}
