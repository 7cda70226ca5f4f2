//! Great-circle distance and radius filtering

use std::fmt;
use std::str::FromStr;

use arrow::array::{Array, BooleanArray, Float64Array, RecordBatch};
use arrow::error::ArrowError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::listing::{LATITUDE, LONGITUDE};
use crate::utils::f64_column;

/// Mean earth radius (IUGG)
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

pub const MILES_PER_KM: f64 = 0.621371192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    #[serde(rename = "mi")]
    Miles,
    #[serde(rename = "km")]
    Kilometers,
}

impl DistanceUnit {
    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Kilometers => EARTH_RADIUS_KM,
            DistanceUnit::Miles => EARTH_RADIUS_KM * MILES_PER_KM,
        }
    }

    /// Express `value` (given in `self`) in `target` units
    pub fn convert(self, value: f64, target: DistanceUnit) -> f64 {
        match (self, target) {
            (DistanceUnit::Kilometers, DistanceUnit::Miles) => value * MILES_PER_KM,
            (DistanceUnit::Miles, DistanceUnit::Kilometers) => value / MILES_PER_KM,
            _ => value,
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DistanceUnit::Miles => "mi",
            DistanceUnit::Kilometers => "km",
        })
    }
}

impl FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mi" | "mile" | "miles" => Ok(DistanceUnit::Miles),
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => {
                Ok(DistanceUnit::Kilometers)
            }
            other => Err(format!("unknown distance unit '{}'", other)),
        }
    }
}

/// A point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Haversine distance between two points
pub fn haversine(a: Coordinate, b: Coordinate, unit: DistanceUnit) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let d = (dlat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon * 0.5).sin().powi(2);
    2.0 * unit.earth_radius() * d.sqrt().asin()
}

/// Mask of positions lying within `radius` of `reference`.
///
/// The boundary is inclusive. A negative or NaN radius matches nothing;
/// null coordinates never match.
pub fn radius_mask(
    reference: Coordinate,
    radius: f64,
    unit: DistanceUnit,
    latitudes: &Float64Array,
    longitudes: &Float64Array,
) -> BooleanArray {
    if radius.is_nan() || radius < 0.0 {
        warn!(radius, "radius is not a usable distance, matching no listings");
        return BooleanArray::from(vec![false; latitudes.len()]);
    }

    latitudes
        .iter()
        .zip(longitudes.iter())
        .map(|(lat, lon)| match (lat, lon) {
            (Some(lat), Some(lon)) => {
                Some(haversine(reference, Coordinate::new(lat, lon), unit) <= radius)
            }
            _ => Some(false),
        })
        .collect()
}

/// Radius mask over the coordinate columns of a listings batch
pub fn within_radius(
    reference: Coordinate,
    radius: f64,
    unit: DistanceUnit,
    batch: &RecordBatch,
) -> Result<BooleanArray, ArrowError> {
    let latitudes = f64_column(batch, LATITUDE)?;
    let longitudes = f64_column(batch, LONGITUDE)?;
    Ok(radius_mask(reference, radius, unit, latitudes, longitudes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIG_BEN: Coordinate = Coordinate::new(51.5032973, -0.1217477);
    const HYDE_PARK: Coordinate = Coordinate::new(51.5064124, -0.1704307);

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine(BIG_BEN, BIG_BEN, DistanceUnit::Kilometers), 0.0);
    }

    #[test]
    fn test_known_distance() {
        // Big Ben to Hyde Park is a little under 3.4 km
        let km = haversine(BIG_BEN, HYDE_PARK, DistanceUnit::Kilometers);
        assert!((km - 3.39).abs() < 0.05, "got {}", km);

        let mi = haversine(BIG_BEN, HYDE_PARK, DistanceUnit::Miles);
        assert!((mi - km * MILES_PER_KM).abs() < 1e-9);
    }

    #[test]
    fn test_unit_round_trip() {
        let km = 2.5;
        let mi = DistanceUnit::Kilometers.convert(km, DistanceUnit::Miles);
        assert!((DistanceUnit::Miles.convert(mi, DistanceUnit::Kilometers) - km).abs() < 1e-12);
        assert_eq!(DistanceUnit::Miles.convert(1.0, DistanceUnit::Miles), 1.0);
    }

    #[test]
    fn test_mask_same_set_in_either_unit() {
        let lats = Float64Array::from(vec![51.5032973, 51.5064124, 51.51, 51.52, 51.0]);
        let lons = Float64Array::from(vec![-0.1217477, -0.1704307, -0.13, -0.10, -0.5]);
        for radius_km in [0.5, 1.0, 2.0, 3.0, 5.0] {
            let radius_mi = DistanceUnit::Kilometers.convert(radius_km, DistanceUnit::Miles);
            let by_km = radius_mask(BIG_BEN, radius_km, DistanceUnit::Kilometers, &lats, &lons);
            let by_mi = radius_mask(BIG_BEN, radius_mi, DistanceUnit::Miles, &lats, &lons);
            assert_eq!(by_km, by_mi, "radius {} km", radius_km);
        }
    }

    #[test]
    fn test_mask_edges() {
        let lats = Float64Array::from(vec![Some(51.5032973), None, Some(51.9)]);
        let lons = Float64Array::from(vec![Some(-0.1217477), Some(-0.12), Some(-0.12)]);

        let exact = radius_mask(BIG_BEN, 0.0, DistanceUnit::Kilometers, &lats, &lons);
        assert_eq!(exact, BooleanArray::from(vec![true, false, false]));

        let negative = radius_mask(BIG_BEN, -1.0, DistanceUnit::Miles, &lats, &lons);
        assert_eq!(negative.true_count(), 0);

        let nan = radius_mask(BIG_BEN, f64::NAN, DistanceUnit::Miles, &lats, &lons);
        assert_eq!(nan.true_count(), 0);
    }

    #[test]
    fn test_parse_unit() {
        assert_eq!("mi".parse::<DistanceUnit>().unwrap(), DistanceUnit::Miles);
        assert_eq!("KM".parse::<DistanceUnit>().unwrap(), DistanceUnit::Kilometers);
        assert!("furlong".parse::<DistanceUnit>().is_err());
    }
}
