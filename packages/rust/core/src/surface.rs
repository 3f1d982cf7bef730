//! Rendering surface: whatever shows the generated map page to the user.

use std::path::Path;

use towermap_shared::Result;

/// Displays the map page produced by a pipeline run.
///
/// The pipeline calls [`display_document`](Self::display_document) the first
/// time it produces a page at a given path, and [`reload`](Self::reload) on
/// every later run that rewrites that path.
pub trait RenderSurface: Send + Sync {
    /// Start showing the document at `path`.
    fn display_document(&self, path: &Path) -> Result<()>;

    /// Re-read and re-display the current document.
    fn reload(&self) -> Result<()>;
}

/// Surface that displays nothing (headless runs, tests).
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn display_document(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn reload(&self) -> Result<()> {
        Ok(())
    }
}
