use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::options::MapOptions;
use crate::waypoint::{LatLon, Waypoint};

const LEAFLET_VERSION: &str = "1.9.4";

/// Optional viewport override handed to a rebuild.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Focus {
    pub center: LatLon,
    pub zoom: u8,
}

impl Focus {
    /// Center on a waypoint at the configured focus zoom.
    pub fn on(wp: &Waypoint, opts: &MapOptions) -> Self {
        Self {
            center: wp.position(),
            zoom: opts.focus_zoom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: LatLon,
    pub zoom: u8,
}

impl Viewport {
    /// The focus when given, otherwise the base location at the default zoom.
    pub fn derive(focus: Option<Focus>, opts: &MapOptions) -> Self {
        match focus {
            Some(Focus { center, zoom }) => Self { center, zoom },
            None => Self {
                center: opts.base_center(),
                zoom: opts.default_zoom,
            },
        }
    }

    fn to_json(self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert(
            "center".to_string(),
            JsonValue::Array(vec![self.center.lat.into(), self.center.lon.into()]),
        );
        obj.insert("zoom".to_string(), JsonValue::Number(self.zoom.into()));
        JsonValue::Object(obj)
    }
}

/// A complete, self-contained map: tile layer, viewport and one marker per
/// waypoint. Never patched, only replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    viewport: Viewport,
    markers: FeatureCollection,
    tile_url: String,
    attribution: String,
    title: String,
}

impl MapDocument {
    /// Build the document from scratch for the given waypoints.
    pub fn build(waypoints: &[Waypoint], viewport: Viewport, opts: &MapOptions) -> Self {
        let features = waypoints.iter().map(waypoint_to_marker).collect();

        let mut foreign = Map::new();
        foreign.insert("viewport".to_string(), viewport.to_json());

        Self {
            viewport,
            markers: FeatureCollection {
                bbox: None,
                features,
                foreign_members: Some(foreign),
            },
            tile_url: opts.tile_url.clone(),
            attribution: opts.attribution.clone(),
            title: opts.title.clone(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn marker_count(&self) -> usize {
        self.markers.features.len()
    }

    /// Markers as GeoJSON, with the viewport as a foreign member.
    pub fn geojson(&self) -> &FeatureCollection {
        &self.markers
    }

    /// Render as a standalone Leaflet page.
    pub fn to_html(&self) -> serde_json::Result<String> {
        // "</" would close the inline script early.
        let markers = serde_json::to_string(&self.markers)?.replace("</", "<\\/");
        let center = serde_json::to_string(&[self.viewport.center.lat, self.viewport.center.lon])?;
        let tile_url = serde_json::to_string(&self.tile_url)?;
        let attribution = serde_json::to_string(&self.attribution)?;

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{title}</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css" />
  <script src="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js"></script>
  <style>html, body, #map {{ height: 100%; width: 100%; margin: 0; padding: 0; }}</style>
</head>
<body>
  <div id="map"></div>
  <script>
    const map = L.map('map').setView({center}, {zoom});
    L.tileLayer({tile_url}, {{ maxZoom: 19, attribution: {attribution} }}).addTo(map);
    const markers = {markers};
    L.geoJSON(markers, {{
      onEachFeature: (feature, layer) => layer.bindPopup(feature.properties.popup)
    }}).addTo(map);
  </script>
</body>
</html>
"#,
            title = escape_html(&self.title),
            zoom = self.viewport.zoom,
        ))
    }
}

fn waypoint_to_marker(wp: &Waypoint) -> Feature {
    // [lon, lat, alt]
    let coords = vec![wp.longitude, wp.latitude, wp.altitude];
    let geometry = Geometry::new(Value::Point(coords));

    let mut props = Map::new();
    props.insert("name".to_string(), JsonValue::String(wp.name.clone()));
    props.insert("ordinal".to_string(), JsonValue::Number(wp.ordinal.into()));
    props.insert("latitude".to_string(), wp.latitude.into());
    props.insert("longitude".to_string(), wp.longitude.into());
    props.insert("altitude".to_string(), wp.altitude.into());
    props.insert("popup".to_string(), JsonValue::String(wp.label()));

    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WaypointStore;

    fn two_waypoints() -> WaypointStore {
        let mut store = WaypointStore::new();
        store.add_waypoint("25.2", "55.3", "10").unwrap();
        store.add_waypoint("25.3", "55.4", "20").unwrap();
        store
    }

    #[test]
    fn test_viewport_defaults_to_base() {
        let opts = MapOptions::default();
        let vp = Viewport::derive(None, &opts);
        assert_eq!(vp.center, LatLon::new(25.276987, 55.296249));
        assert_eq!(vp.zoom, 12);
    }

    #[test]
    fn test_viewport_follows_focus() {
        let opts = MapOptions::default();
        let store = two_waypoints();
        let focus = Focus::on(store.last().unwrap(), &opts);
        let vp = Viewport::derive(Some(focus), &opts);
        assert_eq!(vp.center, LatLon::new(25.3, 55.4));
        assert_eq!(vp.zoom, 13);
    }

    #[test]
    fn test_one_marker_per_waypoint_in_order() {
        let opts = MapOptions::default();
        let store = two_waypoints();
        let doc = MapDocument::build(store.list(), Viewport::derive(None, &opts), &opts);

        assert_eq!(doc.marker_count(), 2);
        let names: Vec<&str> = doc
            .geojson()
            .features
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Waypoint 1", "Waypoint 2"]);
    }

    #[test]
    fn test_marker_coordinates_are_lon_lat_alt() {
        let opts = MapOptions::default();
        let store = two_waypoints();
        let doc = MapDocument::build(store.list(), Viewport::derive(None, &opts), &opts);

        let geom = doc.geojson().features[0].geometry.as_ref().unwrap();
        if let Value::Point(coords) = &geom.value {
            assert!((coords[0] - 55.3).abs() < 1e-10); // lon
            assert!((coords[1] - 25.2).abs() < 1e-10); // lat
            assert!((coords[2] - 10.0).abs() < 1e-10); // alt
        } else {
            panic!("Expected Point geometry");
        }

        let props = doc.geojson().features[0].properties.as_ref().unwrap();
        assert_eq!(props["popup"], "Waypoint 1<br>Lat: 25.2<br>Lon: 55.3<br>Alt: 10.0m");
        assert_eq!(props["altitude"], 10.0);
    }

    #[test]
    fn test_viewport_foreign_member() {
        let opts = MapOptions::default();
        let doc = MapDocument::build(&[], Viewport::derive(None, &opts), &opts);
        let foreign = doc.geojson().foreign_members.as_ref().unwrap();
        assert_eq!(foreign["viewport"]["zoom"], 12);
        assert_eq!(foreign["viewport"]["center"][0], 25.276987);
    }

    #[test]
    fn test_html_contains_view_and_markers() {
        let opts = MapOptions::default();
        let store = two_waypoints();
        let focus = Focus::on(store.last().unwrap(), &opts);
        let doc = MapDocument::build(store.list(), Viewport::derive(Some(focus), &opts), &opts);
        let html = doc.to_html().unwrap();

        assert!(html.contains("setView([25.3,55.4], 13)"));
        assert!(html.contains("Waypoint 2<br>Lat: 25.3"));
        assert!(html.contains("<title>Mission Editor</title>"));
    }

    #[test]
    fn test_html_escapes_title_and_script_close() {
        let opts = MapOptions {
            title: "<Ops & Planning>".to_string(),
            ..Default::default()
        };
        let doc = MapDocument::build(&[], Viewport::derive(None, &opts), &opts);
        let html = doc.to_html().unwrap();
        assert!(html.contains("<title>&lt;Ops &amp; Planning&gt;</title>"));
    }
}
