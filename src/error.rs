use std::fmt;
use std::path::PathBuf;

use wasm_bindgen::JsValue;

/// Which of the three coordinate inputs failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateField {
    Latitude,
    Longitude,
    Altitude,
}

impl fmt::Display for CoordinateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::Altitude => "altitude",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("Invalid coordinates: {field} '{value}' is not a number")]
    InvalidCoordinate {
        field: CoordinateField,
        value: String,
    },
    #[error("Failed to publish update: {0}")]
    DisplayPublish(#[from] DisplayError),
    #[error("GPX parse error: {0}")]
    Gpx(#[from] quick_xml::Error),
    #[error("GPX document ends inside <{0}>")]
    GpxTruncated(String),
    #[error("GPX write error: {0}")]
    GpxWrite(String),
}

/// A display surface refused or could not take an update.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("could not write map document to '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not render map document: {0}")]
    Render(#[from] serde_json::Error),
    #[error("display surface rejected the update: {0}")]
    Rejected(String),
}

impl From<MissionError> for JsValue {
    fn from(e: MissionError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
