//! `GeoJSON` `FeatureCollection` parsing for neighborhood boundaries.
//!
//! Splits a boundary document into [`PolygonRow`]s and reads the legacy
//! `crs` member so that the polygon loader knows whether to reproject.

use geojson::{FeatureCollection, GeoJson, JsonObject, JsonValue};

use crate::StoreError;
use crate::crs::Crs;
use crate::polygons::PolygonRow;

/// Keywords that mark a property as a neighborhood name when the
/// configured property is absent.
const NAME_HINTS: &[&str] = &["name", "neigh", "hood"];

/// Rows and declared CRS extracted from a boundary document.
#[derive(Debug, Clone)]
pub struct PolygonSource {
    /// One row per feature with geometry, in document order.
    pub rows: Vec<PolygonRow>,
    /// CRS declared by the document, WGS84 when absent.
    pub crs: Crs,
}

/// Parses a `GeoJSON` `FeatureCollection` of neighborhood boundaries.
///
/// The neighborhood name is read from `name_property`. When a feature
/// lacks it, the first string property whose key mentions a name or
/// neighborhood is used, then any string property, then a positional
/// placeholder. Features without geometry are skipped.
///
/// # Errors
///
/// * [`StoreError::GeoJson`] if the text is not a `FeatureCollection`
/// * [`StoreError::UnsupportedCrs`] if the declared CRS cannot be reprojected
pub fn parse_feature_collection(
    text: &str,
    name_property: &str,
) -> Result<PolygonSource, StoreError> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| StoreError::GeoJson(e.to_string()))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(StoreError::GeoJson(
            "expected a FeatureCollection".to_string(),
        ));
    };

    let crs = declared_crs(&collection)?;
    let mut rows = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            log::warn!("Skipping boundary feature {index}: no geometry");
            continue;
        };
        let name = feature
            .properties
            .as_ref()
            .and_then(|props| feature_name(props, name_property))
            .unwrap_or_else(|| format!("polygon-{}", rows.len()));

        rows.push(PolygonRow { name, geometry });
    }

    log::debug!("Parsed {} boundary features ({crs:?})", rows.len());

    Ok(PolygonSource { rows, crs })
}

/// Reads `crs.properties.name` from the collection's foreign members.
fn declared_crs(collection: &FeatureCollection) -> Result<Crs, StoreError> {
    let name = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(JsonValue::as_str);

    name.map_or(Ok(Crs::Wgs84), Crs::from_name)
}

fn feature_name(props: &JsonObject, name_property: &str) -> Option<String> {
    if let Some(value) = props.get(name_property).and_then(property_text) {
        return Some(value);
    }

    let hinted = props.iter().find_map(|(key, value)| {
        let lower = key.to_lowercase();
        if NAME_HINTS.iter().any(|hint| lower.contains(hint)) {
            value.as_str().and_then(non_blank)
        } else {
            None
        }
    });

    hinted.or_else(|| props.values().find_map(|v| v.as_str().and_then(non_blank)))
}

fn property_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => non_blank(s),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[-118.3,34.0],[-118.2,34.0],[-118.2,34.1],[-118.3,34.1],[-118.3,34.0]]]}"#;

    fn collection(features: &[String], crs: Option<&str>) -> String {
        let crs_member = crs.map_or_else(String::new, |name| {
            format!(r#","crs":{{"type":"name","properties":{{"name":"{name}"}}}}"#)
        });
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]{crs_member}}}"#,
            features.join(",")
        )
    }

    fn feature(properties: &str, geometry: &str) -> String {
        format!(r#"{{"type":"Feature","properties":{properties},"geometry":{geometry}}}"#)
    }

    #[test]
    fn reads_configured_name_property() {
        let text = collection(
            &[feature(r#"{"NAME":"Downtown LA","OBJECTID":1}"#, SQUARE)],
            None,
        );
        let source = parse_feature_collection(&text, "NAME").unwrap();
        assert_eq!(source.crs, Crs::Wgs84);
        assert_eq!(source.rows.len(), 1);
        assert_eq!(source.rows[0].name, "Downtown LA");
    }

    #[test]
    fn falls_back_to_hinted_property() {
        let text = collection(
            &[feature(r#"{"code":"X1","nc_neighborhood":"Echo Park"}"#, SQUARE)],
            None,
        );
        let source = parse_feature_collection(&text, "NAME").unwrap();
        assert_eq!(source.rows[0].name, "Echo Park");
    }

    #[test]
    fn falls_back_to_positional_name() {
        let text = collection(&[feature(r#"{"OBJECTID":7}"#, SQUARE)], None);
        let source = parse_feature_collection(&text, "NAME").unwrap();
        assert_eq!(source.rows[0].name, "polygon-0");
    }

    #[test]
    fn skips_features_without_geometry() {
        let text = collection(
            &[
                feature(r#"{"NAME":"Empty"}"#, "null"),
                feature(r#"{"NAME":"Kept"}"#, SQUARE),
            ],
            None,
        );
        let source = parse_feature_collection(&text, "NAME").unwrap();
        assert_eq!(source.rows.len(), 1);
        assert_eq!(source.rows[0].name, "Kept");
    }

    #[test]
    fn reads_declared_crs() {
        let text = collection(
            &[feature(r#"{"NAME":"A"}"#, SQUARE)],
            Some("urn:ogc:def:crs:EPSG::3857"),
        );
        let source = parse_feature_collection(&text, "NAME").unwrap();
        assert_eq!(source.crs, Crs::WebMercator);
    }

    #[test]
    fn rejects_unsupported_crs() {
        let text = collection(&[feature(r#"{"NAME":"A"}"#, SQUARE)], Some("EPSG:2229"));
        assert!(matches!(
            parse_feature_collection(&text, "NAME"),
            Err(StoreError::UnsupportedCrs { .. })
        ));
    }

    #[test]
    fn rejects_bare_geometry() {
        assert!(matches!(
            parse_feature_collection(SQUARE, "NAME"),
            Err(StoreError::GeoJson(_))
        ));
    }
}
