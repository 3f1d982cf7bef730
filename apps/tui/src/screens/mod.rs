//! TUI screen definitions.
//!
//! Each screen corresponds to a tab in the TUI and encapsulates its
//! own state and rendering logic.

mod markers;
mod run;

use std::fmt;
use std::path::PathBuf;

use towermap_shared::Operator;

pub(crate) use markers::MarkersScreen;
pub(crate) use run::RunScreen;

/// Screen identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    Run,
    Markers,
}

impl ScreenId {
    pub(crate) const ALL: [ScreenId; 2] = [ScreenId::Run, ScreenId::Markers];
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "Run"),
            Self::Markers => write!(f, "Markers"),
        }
    }
}

/// Request to start a pipeline run, produced by the Run screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunRequest {
    pub input: PathBuf,
    pub operator: Operator,
    pub output: PathBuf,
}
