//! Coordinate reference system detection and reprojection to WGS84.
//!
//! Neighborhood boundaries are published either in WGS84 degrees or in
//! spherical Web Mercator meters. Anything else is rejected rather than
//! silently treated as degrees.

use std::f64::consts::FRAC_PI_2;

use geo::{Coord, MapCoords as _, MultiPolygon};

use crate::StoreError;

/// WGS84 semi-major axis used by spherical Web Mercator, in meters.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Coordinate reference systems the record store can normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Crs {
    /// Geographic WGS84 degrees (EPSG:4326 / OGC CRS84).
    #[default]
    Wgs84,
    /// Spherical Web Mercator meters (EPSG:3857 and its aliases).
    WebMercator,
}

impl Crs {
    /// Resolves a CRS name as found in a `GeoJSON` `crs` member, e.g.
    /// `"urn:ogc:def:crs:EPSG::3857"` or `"EPSG:4326"`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedCrs`] for any other system.
    pub fn from_name(name: &str) -> Result<Self, StoreError> {
        let normalized = name.trim().to_ascii_uppercase();
        let code = normalized
            .rsplit(|c| c == ':' || c == '/')
            .next()
            .unwrap_or_default();

        match code {
            "4326" | "CRS84" | "WGS84" => Ok(Self::Wgs84),
            "3857" | "900913" | "102100" | "102113" | "3785" => Ok(Self::WebMercator),
            _ => Err(StoreError::UnsupportedCrs {
                crs: name.to_string(),
            }),
        }
    }

    /// Reprojects a boundary from this CRS into WGS84 degrees.
    #[must_use]
    pub fn to_wgs84(self, boundary: MultiPolygon<f64>) -> MultiPolygon<f64> {
        match self {
            Self::Wgs84 => boundary,
            Self::WebMercator => boundary.map_coords(web_mercator_to_wgs84),
        }
    }
}

/// Inverse spherical Mercator: meters to `(lon, lat)` degrees.
///
/// Not clamped. Input outside the projection's extent yields a longitude
/// beyond ±180 so the WGS84 check downstream rejects it.
fn web_mercator_to_wgs84(coord: Coord<f64>) -> Coord<f64> {
    let x = (coord.x / EARTH_RADIUS_M).to_degrees();
    let y = 2.0f64
        .mul_add((coord.y / EARTH_RADIUS_M).exp().atan(), -FRAC_PI_2)
        .to_degrees();
    Coord { x, y }
}

/// Forward spherical Mercator, used to check the round trip.
#[cfg(test)]
fn wgs84_to_web_mercator(coord: Coord<f64>) -> Coord<f64> {
    let x = coord.x.to_radians() * EARTH_RADIUS_M;
    let y = (std::f64::consts::FRAC_PI_4 + coord.y.to_radians() / 2.0)
        .tan()
        .ln()
        * EARTH_RADIUS_M;
    Coord { x, y }
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    #[test]
    fn resolves_common_crs_names() {
        assert_eq!(Crs::from_name("EPSG:4326").unwrap(), Crs::Wgs84);
        assert_eq!(
            Crs::from_name("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(),
            Crs::Wgs84
        );
        assert_eq!(
            Crs::from_name("urn:ogc:def:crs:EPSG::3857").unwrap(),
            Crs::WebMercator
        );
        assert_eq!(Crs::from_name("epsg:102100").unwrap(), Crs::WebMercator);
    }

    #[test]
    fn rejects_unknown_crs() {
        let err = Crs::from_name("EPSG:2229").unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedCrs { crs } if crs == "EPSG:2229"));
    }

    #[test]
    fn inverse_mercator_recovers_degrees() {
        let original = Coord {
            x: -118.25,
            y: 34.05,
        };
        let projected = wgs84_to_web_mercator(original);
        let back = web_mercator_to_wgs84(projected);
        assert!((back.x - original.x).abs() < 1e-9);
        assert!((back.y - original.y).abs() < 1e-9);
    }

    #[test]
    fn origin_maps_to_null_island() {
        let back = web_mercator_to_wgs84(Coord { x: 0.0, y: 0.0 });
        assert!(back.x.abs() < 1e-12);
        assert!(back.y.abs() < 1e-12);
    }

    #[test]
    fn out_of_extent_meters_stay_out_of_range() {
        let back = web_mercator_to_wgs84(Coord { x: 3.0e7, y: 0.0 });
        assert!(back.x > 180.0);

        let back = web_mercator_to_wgs84(Coord { x: -3.0e7, y: 0.0 });
        assert!(back.x < -180.0);
    }

    #[test]
    fn reprojects_every_vertex() {
        let a = wgs84_to_web_mercator(Coord { x: -118.3, y: 34.0 });
        let b = wgs84_to_web_mercator(Coord { x: -118.2, y: 34.1 });
        let square = polygon![
            (x: a.x, y: a.y),
            (x: b.x, y: a.y),
            (x: b.x, y: b.y),
            (x: a.x, y: b.y),
            (x: a.x, y: a.y),
        ];
        let reprojected = Crs::WebMercator.to_wgs84(MultiPolygon(vec![square]));
        for coord in reprojected.0[0].exterior().coords() {
            assert!((-118.31..=-118.19).contains(&coord.x));
            assert!((33.99..=34.11).contains(&coord.y));
        }
    }
}
