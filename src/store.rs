use crate::error::{CoordinateField, MissionError};
use crate::waypoint::Waypoint;

type Result<T> = std::result::Result<T, MissionError>;

/// The authoritative, ordered waypoint collection.
///
/// Ordinals are `1..=len` with no gaps: there is no single-item delete, so
/// the position at insertion is also the position for life.
#[derive(Debug, Default)]
pub struct WaypointStore {
    waypoints: Vec<Waypoint>,
}

impl WaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the raw inputs and append a new waypoint.
    /// Nothing is appended unless all three fields parse.
    pub fn add_waypoint(&mut self, lat: &str, lon: &str, alt: &str) -> Result<Waypoint> {
        let latitude = parse_coordinate(CoordinateField::Latitude, lat)?;
        let longitude = parse_coordinate(CoordinateField::Longitude, lon)?;
        let altitude = parse_coordinate(CoordinateField::Altitude, alt)?;
        Ok(self.push(latitude, longitude, altitude))
    }

    pub(crate) fn push(&mut self, latitude: f64, longitude: f64, altitude: f64) -> Waypoint {
        let wp = Waypoint::new(self.waypoints.len() + 1, latitude, longitude, altitude);
        self.waypoints.push(wp.clone());
        wp
    }

    pub fn clear_all(&mut self) {
        self.waypoints.clear();
    }

    pub fn list(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Any finite number is accepted; no range checks.
pub(crate) fn parse_coordinate(field: CoordinateField, text: &str) -> Result<f64> {
    let invalid = || MissionError::InvalidCoordinate {
        field,
        value: text.to_string(),
    };
    let value = text.trim().parse::<f64>().map_err(|_| invalid())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid())
    }
}
