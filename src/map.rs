//! Map marker extraction and GeoJSON export

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use arrow::array::Array;
use arrow::error::ArrowError;
use serde::Serialize;
use serde_json::{json, Value};

use crate::dataset::ListingTable;
use crate::geo::Coordinate;
use crate::landmark::Landmark;
use crate::listing::{LATITUDE, LONGITUDE, NAME, PRICE};
use crate::utils::{f64_column, str_column};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Listing,
    Landmark,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub kind: MarkerKind,
    pub latitude: f64,
    pub longitude: f64,
    /// Hover text
    pub label: String,
    /// Click text
    pub popup: Option<String>,
}

/// One marker per listing, in view order, then the landmark if any
pub fn markers(
    table: &impl ListingTable,
    landmark: Option<&Landmark>,
) -> Result<Vec<MapMarker>, ArrowError> {
    let batch = table.batch();
    let name = str_column(batch, NAME)?;
    let price = f64_column(batch, PRICE)?;
    let latitude = f64_column(batch, LATITUDE)?;
    let longitude = f64_column(batch, LONGITUDE)?;

    let mut markers: Vec<MapMarker> = (0..batch.num_rows())
        .map(|i| MapMarker {
            kind: MarkerKind::Listing,
            latitude: latitude.value(i),
            longitude: longitude.value(i),
            label: if name.is_null(i) { String::new() } else { name.value(i).to_string() },
            popup: Some(format!("Price: {}", price.value(i))),
        })
        .collect();

    if let Some(landmark) = landmark {
        markers.push(MapMarker {
            kind: MarkerKind::Landmark,
            latitude: landmark.coordinate.latitude,
            longitude: landmark.coordinate.longitude,
            label: landmark.name.to_string(),
            popup: None,
        });
    }
    Ok(markers)
}

/// A FeatureCollection with the initial viewport stored as foreign members
pub fn to_geojson(markers: &[MapMarker], center: Coordinate, zoom: u8) -> Value {
    let features: Vec<Value> = markers
        .iter()
        .map(|m| {
            json!({
                "type": "Feature",
                // GeoJSON positions are [longitude, latitude]
                "geometry": { "type": "Point", "coordinates": [m.longitude, m.latitude] },
                "properties": {
                    "kind": m.kind,
                    "tooltip": m.label,
                    "popup": m.popup,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "center": [center.latitude, center.longitude],
        "zoom": zoom,
        "features": features,
    })
}

pub fn write_geojson(
    path: impl AsRef<Path>,
    markers: &[MapMarker],
    center: Coordinate,
    zoom: u8,
) -> io::Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &to_geojson(markers, center, zoom))?;
    Ok(())
}
