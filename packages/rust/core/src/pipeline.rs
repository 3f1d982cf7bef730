//! End-to-end run: spreadsheet → tower lookups → map page → rendering surface.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use towermap_mapdoc::MapDocument;
use towermap_resolver::{Lookup, TowerResolver};
use towermap_shared::{MapSettings, Operator, ResolvedLocation, Result, TowerRecord};

use crate::surface::RenderSurface;

// ---------------------------------------------------------------------------
// Run configuration and results
// ---------------------------------------------------------------------------

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Spreadsheet with CID/LAC rows.
    pub input: PathBuf,
    /// Operator whose network the towers belong to.
    pub operator: Operator,
    /// Where the map page is written.
    pub output: PathBuf,
    /// Map page settings.
    pub map: MapSettings,
}

/// A marker placed on the map for a resolved tower.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedMarker {
    /// Marker id in the page (1-based, in placement order).
    pub id: usize,
    pub location: ResolvedLocation,
}

/// Why a tower got no marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The service had no coordinates for the tower.
    NotFound,
    /// The request itself failed.
    LookupFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "cell tower not found"),
            Self::LookupFailed(msg) => write!(f, "lookup failed: {msg}"),
        }
    }
}

/// A tower that was skipped during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub record: TowerRecord,
    pub reason: SkipReason,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Operator the run resolved against.
    pub operator: Operator,
    /// Number of towers loaded from the spreadsheet.
    pub total_records: usize,
    /// Markers placed, in id order.
    pub markers: Vec<PlacedMarker>,
    /// Towers without a marker, in spreadsheet order.
    pub skipped: Vec<SkippedRecord>,
    /// Path of the written map page.
    pub output: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// State and progress reporting
// ---------------------------------------------------------------------------

/// Pipeline phase.
///
/// `Idle -> Loading -> Resolving -> Rendering -> Done`; a load failure returns
/// to `Idle`. Skipped towers keep the pipeline in `Resolving`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loading,
    /// Resolving tower `current` (1-based) of `total`.
    Resolving { current: usize, total: usize },
    Rendering,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Loading => write!(f, "Loading spreadsheet"),
            Self::Resolving { current, total } => write!(f, "Resolving [{current}/{total}]"),
            Self::Rendering => write!(f, "Writing map"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called on every state transition.
    fn state(&self, state: PipelineState);
    /// Called when a tower gets a marker.
    fn record_resolved(&self, marker: &PlacedMarker);
    /// Called when a tower is skipped.
    fn record_skipped(&self, skipped: &SkippedRecord);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn state(&self, _state: PipelineState) {}
    fn record_resolved(&self, _marker: &PlacedMarker) {}
    fn record_skipped(&self, _skipped: &SkippedRecord) {}
    fn done(&self, _summary: &RunSummary) {}
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Drives pipeline runs against a resolver and a rendering surface.
///
/// Runs are sequential: each tower lookup completes before the next starts.
pub struct PipelineController<R, S> {
    resolver: R,
    surface: S,
    state: PipelineState,
    /// Page currently shown by the surface, if any.
    displayed: Option<PathBuf>,
}

impl<R: TowerResolver, S: RenderSurface> PipelineController<R, S> {
    pub fn new(resolver: R, surface: S) -> Self {
        Self {
            resolver,
            surface,
            state: PipelineState::Idle,
            displayed: None,
        }
    }

    /// Current pipeline phase.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The rendering surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Run the full pipeline.
    ///
    /// 1. Load: read towers from the spreadsheet (fatal on error, nothing written)
    /// 2. Resolve: look up each tower in order, skipping failures
    /// 3. Render: write the map page, replacing the previous one
    /// 4. Done: show or reload the page on the rendering surface
    #[instrument(skip_all, fields(input = %config.input.display(), operator = %config.operator))]
    pub async fn run(
        &mut self,
        config: &RunConfig,
        progress: &dyn ProgressReporter,
    ) -> Result<RunSummary> {
        let start = Instant::now();

        // --- Loading ---
        self.transition(PipelineState::Loading, progress);
        let records = match towermap_loader::load(&config.input) {
            Ok(records) => records,
            Err(e) => {
                self.transition(PipelineState::Idle, progress);
                return Err(e);
            }
        };
        let total = records.len();
        info!(records = total, "starting tower resolution");

        // --- Resolving ---
        let mut document = MapDocument::new(&config.map);
        let mut markers: Vec<PlacedMarker> = Vec::new();
        let mut skipped: Vec<SkippedRecord> = Vec::new();

        for (i, record) in records.into_iter().enumerate() {
            self.transition(
                PipelineState::Resolving {
                    current: i + 1,
                    total,
                },
                progress,
            );

            match self.resolver.resolve(config.operator, record).await {
                Ok(Lookup::Found(location)) => {
                    let id = document.add_marker(
                        &location.latitude,
                        &location.longitude,
                        &location.info(),
                    );
                    let marker = PlacedMarker { id, location };
                    progress.record_resolved(&marker);
                    markers.push(marker);
                }
                Ok(Lookup::NotFound) => {
                    warn!(
                        lac = record.lac,
                        cid = record.cid,
                        reason = "not found",
                        "cell tower not found"
                    );
                    let entry = SkippedRecord {
                        record,
                        reason: SkipReason::NotFound,
                    };
                    progress.record_skipped(&entry);
                    skipped.push(entry);
                }
                Err(e) if !e.is_fatal() => {
                    warn!(
                        lac = record.lac,
                        cid = record.cid,
                        reason = %e,
                        "lookup failed, skipping tower"
                    );
                    let entry = SkippedRecord {
                        record,
                        reason: SkipReason::LookupFailed(e.to_string()),
                    };
                    progress.record_skipped(&entry);
                    skipped.push(entry);
                }
                Err(e) => {
                    self.transition(PipelineState::Idle, progress);
                    return Err(e);
                }
            }
        }

        // --- Rendering ---
        self.transition(PipelineState::Rendering, progress);
        let text = document.finalize();
        if let Err(e) = towermap_mapdoc::write_document(&config.output, &text) {
            self.transition(PipelineState::Idle, progress);
            return Err(e);
        }

        // --- Done ---
        self.transition(PipelineState::Done, progress);
        self.show(&config.output);

        let summary = RunSummary {
            operator: config.operator,
            total_records: total,
            markers,
            skipped,
            output: config.output.clone(),
            elapsed: start.elapsed(),
        };

        info!(
            records = summary.total_records,
            markers = summary.markers.len(),
            skipped = summary.skipped.len(),
            elapsed_ms = summary.elapsed.as_millis(),
            "pipeline complete"
        );

        progress.done(&summary);
        Ok(summary)
    }

    fn transition(&mut self, state: PipelineState, progress: &dyn ProgressReporter) {
        debug!(from = %self.state, to = %state, "pipeline state");
        self.state = state;
        progress.state(state);
    }

    /// Hand the written page to the surface. The page is already on disk, so
    /// surface failures are logged rather than failing the run.
    fn show(&mut self, path: &Path) {
        let result = if self.displayed.as_deref() == Some(path) {
            self.surface.reload()
        } else {
            self.surface.display_document(path).map(|()| {
                self.displayed = Some(path.to_path_buf());
            })
        };

        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "rendering surface failed to show map");
        }
    }
}
