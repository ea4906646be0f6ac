use tracing::{error, info, warn};

use crate::display::{ListDisplay, MapDisplay};
use crate::document::{Focus, MapDocument};
use crate::error::MissionError;
use crate::gpx;
use crate::options::MapOptions;
use crate::store::WaypointStore;
use crate::sync::MapSynchronizer;
use crate::waypoint::Waypoint;

type Result<T> = std::result::Result<T, MissionError>;

/// Command handler tying the store to the map and list surfaces.
///
/// Each command runs to completion before returning: a rejected input leaves
/// everything as it was, an accepted one mutates the store and then rebuilds
/// and republishes the whole map. A display failure is returned to the caller
/// but never undoes the store mutation.
pub struct MissionEditor<M, L> {
    store: WaypointStore,
    sync: MapSynchronizer,
    map: M,
    list: L,
}

impl<M: MapDisplay, L: ListDisplay> MissionEditor<M, L> {
    /// Nothing is published until the first command or [`Self::start`].
    pub fn new(options: MapOptions, map: M, list: L) -> Self {
        Self {
            store: WaypointStore::new(),
            sync: MapSynchronizer::new(options),
            map,
            list,
        }
    }

    /// Publish the base map, as shown before any waypoint exists.
    pub fn start(&mut self) -> Result<&MapDocument> {
        self.refresh_map(None)
    }

    pub fn add_waypoint(&mut self, lat: &str, lon: &str, alt: &str) -> Result<Waypoint> {
        let wp = match self.store.add_waypoint(lat, lon, alt) {
            Ok(wp) => wp,
            Err(e) => {
                warn!(lat, lon, alt, "{e}");
                return Err(e);
            }
        };
        info!(
            name = %wp.name,
            lat = wp.latitude,
            lon = wp.longitude,
            alt = wp.altitude,
            total = self.store.len(),
            "waypoint added"
        );

        let listed = self.list.append(&wp.to_string()).map_err(MissionError::from);
        let focus = Focus::on(&wp, self.sync.options());
        let published = self.refresh_map(Some(focus)).map(|_| ());
        listed.and(published)?;
        Ok(wp)
    }

    pub fn clear_all(&mut self) -> Result<()> {
        let removed = self.store.len();
        self.store.clear_all();
        info!(removed, "waypoints cleared");

        let listed = self.list.clear().map_err(MissionError::from);
        let published = self.refresh_map(None).map(|_| ());
        listed.and(published)
    }

    /// Rebuild and republish the map from the current store.
    pub fn refresh_map(&mut self, focus: Option<Focus>) -> Result<&MapDocument> {
        let result = self.sync.rebuild(self.store.list(), focus, &mut self.map);
        if let Err(e) = &result {
            error!("{e}");
        }
        result
    }

    /// Replace the mission with the waypoints of a GPX document.
    /// The store is only touched once the whole document has parsed.
    pub fn import_gpx(&mut self, xml: &str) -> Result<usize> {
        let points =
            gpx::parse_waypoints(xml).inspect_err(|e| warn!("gpx import rejected: {e}"))?;

        self.store.clear_all();
        let listed = self.list.clear().map_err(MissionError::from);
        let listed = points.iter().fold(listed, |listed, pt| {
            let wp = self.store.push(pt.lat, pt.lon, pt.ele);
            listed.and(self.list.append(&wp.to_string()).map_err(MissionError::from))
        });
        info!(imported = points.len(), "mission imported from gpx");

        let focus = self
            .store
            .last()
            .map(|wp| Focus::on(wp, self.sync.options()));
        let published = self.refresh_map(focus).map(|_| ());
        listed.and(published)?;
        Ok(points.len())
    }

    pub fn export_gpx(&self) -> Result<String> {
        gpx::to_gpx(self.store.list())
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        self.store.list()
    }

    pub fn document(&self) -> Option<&MapDocument> {
        self.sync.current()
    }

    pub fn map_display(&self) -> &M {
        &self.map
    }

    pub fn list_display(&self) -> &L {
        &self.list
    }
}
