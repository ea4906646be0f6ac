pub mod display;
pub mod document;
pub mod editor;
pub mod error;
pub mod gpx;
pub mod options;
pub mod store;
pub mod sync;
pub mod waypoint;

use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use crate::display::{
    FileMapDisplay, ListDisplay, MapDisplay, MemoryListDisplay, MemoryMapDisplay,
};
pub use crate::document::{Focus, MapDocument, Viewport};
pub use crate::editor::MissionEditor;
pub use crate::error::{CoordinateField, DisplayError, MissionError};
pub use crate::options::MapOptions;
pub use crate::store::WaypointStore;
pub use crate::sync::MapSynchronizer;
pub use crate::waypoint::{LatLon, Waypoint};

/// Map surface backed by a JS callback that receives the rendered page.
struct JsMapDisplay {
    on_map: Function,
}

impl MapDisplay for JsMapDisplay {
    fn publish(&mut self, document: &MapDocument) -> Result<(), DisplayError> {
        let html = document.to_html()?;
        self.on_map
            .call1(&JsValue::NULL, &JsValue::from_str(&html))
            .map(|_| ())
            .map_err(rejected)
    }
}

struct JsListDisplay {
    on_append: Option<Function>,
    on_clear: Option<Function>,
}

impl ListDisplay for JsListDisplay {
    fn append(&mut self, line: &str) -> Result<(), DisplayError> {
        match &self.on_append {
            Some(f) => f
                .call1(&JsValue::NULL, &JsValue::from_str(line))
                .map(|_| ())
                .map_err(rejected),
            None => Ok(()),
        }
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        match &self.on_clear {
            Some(f) => f.call0(&JsValue::NULL).map(|_| ()).map_err(rejected),
            None => Ok(()),
        }
    }
}

fn rejected(e: JsValue) -> DisplayError {
    DisplayError::Rejected(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

/// Mission editor exported to JS. The base map is published on construction.
#[wasm_bindgen(js_name = MissionEditor)]
pub struct WasmMissionEditor {
    editor: MissionEditor<JsMapDisplay, JsListDisplay>,
}

#[wasm_bindgen(js_class = MissionEditor)]
impl WasmMissionEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(
        options: JsValue,
        on_map: Function,
        on_list_append: Option<Function>,
        on_list_clear: Option<Function>,
    ) -> Result<WasmMissionEditor, JsValue> {
        console_error_panic_hook::set_once();

        let opts = parse_options(options)?;
        let mut editor = MissionEditor::new(
            opts,
            JsMapDisplay { on_map },
            JsListDisplay {
                on_append: on_list_append,
                on_clear: on_list_clear,
            },
        );
        editor.start()?;
        Ok(Self { editor })
    }

    /// Validate and append a waypoint, returned as a JS object.
    #[wasm_bindgen(js_name = addWaypoint)]
    pub fn add_waypoint(&mut self, lat: &str, lon: &str, alt: &str) -> Result<JsValue, JsValue> {
        let wp = self.editor.add_waypoint(lat, lon, alt)?;
        to_js(&wp)
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&mut self) -> Result<(), JsValue> {
        Ok(self.editor.clear_all()?)
    }

    pub fn waypoints(&self) -> Result<JsValue, JsValue> {
        to_js(self.editor.waypoints())
    }

    #[wasm_bindgen(js_name = listLines)]
    pub fn list_lines(&self) -> Vec<String> {
        self.editor.waypoints().iter().map(ToString::to_string).collect()
    }

    #[wasm_bindgen(js_name = mapHtml)]
    pub fn map_html(&self) -> Result<Option<String>, JsValue> {
        self.editor
            .document()
            .map(|doc| doc.to_html())
            .transpose()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = mapGeoJson)]
    pub fn map_geojson(&self) -> Result<JsValue, JsValue> {
        match self.editor.document() {
            Some(doc) => to_js(doc.geojson()),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = exportGpx)]
    pub fn export_gpx(&self) -> Result<String, JsValue> {
        Ok(self.editor.export_gpx()?)
    }

    /// Replace the mission with the waypoints in `gpx`; returns how many.
    #[wasm_bindgen(js_name = importGpx)]
    pub fn import_gpx(&mut self, gpx: &str) -> Result<usize, JsValue> {
        Ok(self.editor.import_gpx(gpx)?)
    }
}

fn parse_options(options: JsValue) -> Result<MapOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(MapOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
