use std::fmt;

use serde::Serialize;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<[f64; 2]> for LatLon {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

/// A named mission point. Never mutated once appended to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub name: String,
    pub ordinal: usize,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above mean sea level.
    pub altitude: f64,
}

impl Waypoint {
    pub(crate) fn new(ordinal: usize, latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            name: format!("Waypoint {ordinal}"),
            ordinal,
            latitude,
            longitude,
            altitude,
        }
    }

    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }

    /// Marker popup text, `<br>` separated.
    pub fn label(&self) -> String {
        format!(
            "{}<br>Lat: {:?}<br>Lon: {:?}<br>Alt: {:?}m",
            self.name, self.latitude, self.longitude, self.altitude
        )
    }
}

/// Renders the list line, e.g. `Waypoint 1: 25.2, 55.3, 10.0`.
impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?}, {:?}, {:?}",
            self.name, self.latitude, self.longitude, self.altitude
        )
    }
}
