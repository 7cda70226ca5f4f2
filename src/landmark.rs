//! Fixed table of London points of interest used as proximity anchors

use serde::Serialize;

use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Landmark {
    pub name: &'static str,
    pub coordinate: Coordinate,
}

const fn landmark(name: &'static str, latitude: f64, longitude: f64) -> Landmark {
    Landmark {
        name,
        coordinate: Coordinate::new(latitude, longitude),
    }
}

/// Sorted by name
pub const LANDMARKS: [Landmark; 10] = [
    landmark("Big Ben", 51.5032973, -0.1217477),
    landmark("British Museum", 51.5194133, -0.1291506),
    landmark("Buckingham Palace", 51.5060671, -0.1535122),
    landmark("Greenwich Park", 51.4793578, -0.0066917),
    landmark("Harrods", 51.4989874, -0.1657343),
    landmark("Hyde Park", 51.5064124, -0.1704307),
    landmark("National Gallery", 51.5089712, -0.1312407),
    landmark("Natural History Museum", 51.496165, -0.1791013),
    landmark("Tate Modern", 51.5032969, -0.1283406),
    landmark("Tower of London", 51.5045321, -0.1267774),
];

/// Case-insensitive lookup by name
pub fn find(name: &str) -> Option<&'static Landmark> {
    let name = name.trim();
    LANDMARKS.iter().find(|l| l.name.eq_ignore_ascii_case(name))
}
