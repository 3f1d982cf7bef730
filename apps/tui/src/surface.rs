//! In-terminal rendering surface: reads the written page back and keeps a
//! summary of it for the Markers screen.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use towermap_core::RenderSurface;
use towermap_shared::{Result, TowerMapError};

/// What the surface currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DocumentInfo {
    pub path: PathBuf,
    pub bytes: usize,
    /// Marker statements found in the page text.
    pub markers: usize,
    /// How many times the page was (re)loaded.
    pub loads: usize,
}

/// Cloneable handle; clones share the displayed document.
#[derive(Clone, Default)]
pub(crate) struct TuiSurface {
    shown: Arc<Mutex<Option<DocumentInfo>>>,
}

impl TuiSurface {
    pub(crate) fn snapshot(&self) -> Option<DocumentInfo> {
        self.shown.lock().ok().and_then(|guard| guard.clone())
    }
}

impl RenderSurface for TuiSurface {
    fn display_document(&self, path: &Path) -> Result<()> {
        let (bytes, markers) = read_document(path)?;
        let mut shown = self
            .shown
            .lock()
            .map_err(|_| TowerMapError::validation("surface state poisoned"))?;
        *shown = Some(DocumentInfo {
            path: path.to_path_buf(),
            bytes,
            markers,
            loads: 1,
        });
        debug!(path = %path.display(), markers, "document displayed");
        Ok(())
    }

    fn reload(&self) -> Result<()> {
        let mut shown = self
            .shown
            .lock()
            .map_err(|_| TowerMapError::validation("surface state poisoned"))?;
        let current = shown
            .as_mut()
            .ok_or_else(|| TowerMapError::validation("no map page is being shown"))?;

        let (bytes, markers) = read_document(&current.path)?;
        current.bytes = bytes;
        current.markers = markers;
        current.loads += 1;
        debug!(path = %current.path.display(), markers, "document reloaded");
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<(usize, usize)> {
    let text = std::fs::read_to_string(path).map_err(|e| TowerMapError::io(path, e))?;
    Ok((text.len(), towermap_mapdoc::count_markers(&text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_then_reload_tracks_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mymap.html");
        std::fs::write(&path, "var marker1 = new L.marker([1,2]).addTo(myMap);\n").unwrap();

        let surface = TuiSurface::default();
        let handle = surface.clone();
        surface.display_document(&path).unwrap();

        let info = handle.snapshot().unwrap();
        assert_eq!(info.markers, 1);
        assert_eq!(info.loads, 1);

        std::fs::write(&path, "no markers any more").unwrap();
        surface.reload().unwrap();

        let info = handle.snapshot().unwrap();
        assert_eq!(info.markers, 0);
        assert_eq!(info.bytes, "no markers any more".len());
        assert_eq!(info.loads, 2);
    }

    #[test]
    fn reload_without_document_fails() {
        assert!(TuiSurface::default().reload().is_err());
    }

    #[test]
    fn display_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let surface = TuiSurface::default();
        assert!(surface.display_document(&dir.path().join("nope.html")).is_err());
        assert!(surface.snapshot().is_none());
    }
}
