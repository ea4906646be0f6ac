use tracing::debug;

use crate::display::MapDisplay;
use crate::document::{Focus, MapDocument, Viewport};
use crate::error::MissionError;
use crate::options::MapOptions;
use crate::waypoint::Waypoint;

/// Owns the current map document and republishes it in full on every rebuild.
#[derive(Debug)]
pub struct MapSynchronizer {
    options: MapOptions,
    current: Option<MapDocument>,
}

impl MapSynchronizer {
    pub fn new(options: MapOptions) -> Self {
        Self {
            options,
            current: None,
        }
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    /// The most recently built document.
    pub fn current(&self) -> Option<&MapDocument> {
        self.current.as_ref()
    }

    /// Build a fresh document without publishing it.
    pub fn render(&self, waypoints: &[Waypoint], focus: Option<Focus>) -> MapDocument {
        let viewport = Viewport::derive(focus, &self.options);
        MapDocument::build(waypoints, viewport, &self.options)
    }

    /// Replace the current document and hand it to `display`.
    ///
    /// The new document is kept even if the display rejects it, so the next
    /// successful publish never shows stale markers.
    pub fn rebuild(
        &mut self,
        waypoints: &[Waypoint],
        focus: Option<Focus>,
        display: &mut dyn MapDisplay,
    ) -> Result<&MapDocument, MissionError> {
        let document = self.render(waypoints, focus);
        debug!(
            markers = document.marker_count(),
            lat = document.viewport().center.lat,
            lon = document.viewport().center.lon,
            zoom = document.viewport().zoom,
            "rebuilt map document"
        );

        let document = self.current.insert(document);
        display.publish(document)?;
        Ok(&*document)
    }
}
