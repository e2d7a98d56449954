//! Neighborhood polygon loader.

use collision_map_collision_models::Polygon;
use geo::MultiPolygon;

use crate::StoreError;
use crate::crs::Crs;

/// A raw neighborhood feature: display name plus `GeoJSON` geometry in
/// the source CRS.
#[derive(Debug, Clone)]
pub struct PolygonRow {
    /// Neighborhood name.
    pub name: String,
    /// Polygon or `MultiPolygon` geometry.
    pub geometry: geojson::Geometry,
}

/// Converts raw neighborhood rows into WGS84 [`Polygon`]s.
///
/// Each polygon's `id` is its zero-based position in `rows`. Geometries
/// in Web Mercator are reprojected to WGS84 degrees.
///
/// # Errors
///
/// Returns [`StoreError::InvalidGeometry`] if a row's geometry is not a
/// `Polygon` or `MultiPolygon`.
pub fn load_polygons(rows: Vec<PolygonRow>, crs: Crs) -> Result<Vec<Polygon>, StoreError> {
    let polygons = rows
        .into_iter()
        .enumerate()
        .map(|(id, row)| {
            let boundary = to_multipolygon(id, row.geometry)?;
            Ok(Polygon {
                id,
                name: row.name,
                boundary: crs.to_wgs84(boundary),
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    log::info!("Loaded {} neighborhood polygons ({crs:?})", polygons.len());

    Ok(polygons)
}

/// Converts `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(
    index: usize,
    geometry: geojson::Geometry,
) -> Result<MultiPolygon<f64>, StoreError> {
    let geo_geom: geo::Geometry<f64> =
        geometry
            .try_into()
            .map_err(|e: geojson::Error| StoreError::InvalidGeometry {
                index,
                message: e.to_string(),
            })?;

    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        other => Err(StoreError::InvalidGeometry {
            index,
            message: format!("expected Polygon or MultiPolygon, found {}", kind(&other)),
        }),
    }
}

const fn kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use geojson::{Geometry, Value};

    use super::*;

    fn square(min_x: f64, min_y: f64, size: f64) -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![min_x, min_y],
            vec![min_x + size, min_y],
            vec![min_x + size, min_y + size],
            vec![min_x, min_y + size],
            vec![min_x, min_y],
        ]]))
    }

    #[test]
    fn assigns_positional_ids() {
        let rows = vec![
            PolygonRow {
                name: "A".to_string(),
                geometry: square(-118.3, 34.0, 0.1),
            },
            PolygonRow {
                name: "B".to_string(),
                geometry: square(-118.2, 34.0, 0.1),
            },
        ];

        let polygons = load_polygons(rows, Crs::Wgs84).unwrap();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].id, 0);
        assert_eq!(polygons[0].name, "A");
        assert_eq!(polygons[1].id, 1);
        assert_eq!(polygons[1].name, "B");
    }

    #[test]
    fn reprojects_web_mercator_input() {
        // Roughly downtown LA in EPSG:3857 meters.
        let rows = vec![PolygonRow {
            name: "Downtown".to_string(),
            geometry: square(-13_163_000.0, 4_035_000.0, 1_000.0),
        }];

        let polygons = load_polygons(rows, Crs::WebMercator).unwrap();
        let (lat, lon) = polygons[0].centroid().unwrap();
        assert!((33.9..34.2).contains(&lat), "lat {lat}");
        assert!((-118.3..-118.1).contains(&lon), "lon {lon}");
    }

    #[test]
    fn rejects_non_polygonal_geometry() {
        let rows = vec![PolygonRow {
            name: "Point".to_string(),
            geometry: Geometry::new(Value::Point(vec![-118.0, 34.0])),
        }];

        let err = load_polygons(rows, Crs::Wgs84).unwrap_err();
        assert!(matches!(err, StoreError::InvalidGeometry { index: 0, .. }));
    }
}
