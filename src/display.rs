use std::path::{Path, PathBuf};

use crate::document::MapDocument;
use crate::error::DisplayError;

type Result<T> = std::result::Result<T, DisplayError>;

/// Somewhere a map document is shown. A publish replaces whatever was shown
/// before and must complete before returning.
pub trait MapDisplay {
    fn publish(&mut self, document: &MapDocument) -> Result<()>;

    /// Stable handle the surface reloads from, if it has one.
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Receives one line per added waypoint, and a clear signal.
pub trait ListDisplay {
    fn append(&mut self, line: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Writes the rendered page to a fixed file path on every publish.
#[derive(Debug, Clone)]
pub struct FileMapDisplay {
    path: PathBuf,
}

impl FileMapDisplay {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for FileMapDisplay {
    fn default() -> Self {
        Self::new("map.html")
    }
}

impl MapDisplay for FileMapDisplay {
    fn publish(&mut self, document: &MapDocument) -> Result<()> {
        let html = document.to_html()?;
        std::fs::write(&self.path, html).map_err(|source| DisplayError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Holds the latest published document for hosts that pull.
#[derive(Debug, Default)]
pub struct MemoryMapDisplay {
    current: Option<MapDocument>,
    reloads: usize,
}

impl MemoryMapDisplay {
    pub fn current(&self) -> Option<&MapDocument> {
        self.current.as_ref()
    }

    /// Number of publishes received.
    pub fn reloads(&self) -> usize {
        self.reloads
    }
}

impl MapDisplay for MemoryMapDisplay {
    fn publish(&mut self, document: &MapDocument) -> Result<()> {
        self.current = Some(document.clone());
        self.reloads += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryListDisplay {
    lines: Vec<String>,
}

impl MemoryListDisplay {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl ListDisplay for MemoryListDisplay {
    fn append(&mut self, line: &str) -> Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.lines.clear();
        Ok(())
    }
}
