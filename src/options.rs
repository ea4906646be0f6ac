use serde::Deserialize;

use crate::waypoint::LatLon;

/// Dubai.
pub const DEFAULT_BASE_LOCATION: [f64; 2] = [25.276987, 55.296249];
pub const DEFAULT_ZOOM: u8 = 12;
pub const FOCUS_ZOOM: u8 = 13;

/// Map appearance and viewport defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    /// Center shown when nothing is focused, as [lat, lon] (default: Dubai)
    #[serde(default = "default_base_location")]
    pub base_location: [f64; 2],

    /// Zoom used with the base location (default: 12)
    #[serde(default = "default_zoom")]
    pub default_zoom: u8,

    /// Zoom used when centering on a newly added waypoint (default: 13)
    #[serde(default = "focus_zoom")]
    pub focus_zoom: u8,

    /// Tile URL template (default: OpenStreetMap)
    #[serde(default = "default_tile_url")]
    pub tile_url: String,

    #[serde(default = "default_attribution")]
    pub attribution: String,

    /// HTML page title
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            base_location: default_base_location(),
            default_zoom: default_zoom(),
            focus_zoom: focus_zoom(),
            tile_url: default_tile_url(),
            attribution: default_attribution(),
            title: default_title(),
        }
    }
}

impl MapOptions {
    pub fn base_center(&self) -> LatLon {
        LatLon::from(self.base_location)
    }
}

fn default_base_location() -> [f64; 2] {
    DEFAULT_BASE_LOCATION
}

fn default_zoom() -> u8 {
    DEFAULT_ZOOM
}

fn focus_zoom() -> u8 {
    FOCUS_ZOOM
}

fn default_tile_url() -> String {
    "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_attribution() -> String {
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
        .to_string()
}

fn default_title() -> String {
    "Mission Editor".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_keep_defaults() {
        let opts: MapOptions =
            serde_json::from_str(r#"{"baseLocation": [59.91, 10.75], "focusZoom": 15}"#).unwrap();
        assert_eq!(opts.base_center(), LatLon::new(59.91, 10.75));
        assert_eq!(opts.focus_zoom, 15);
        assert_eq!(opts.default_zoom, DEFAULT_ZOOM);
        assert_eq!(opts.title, "Mission Editor");
    }

    #[test]
    fn test_empty_object_is_default() {
        let opts: MapOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, MapOptions::default());
    }
}
