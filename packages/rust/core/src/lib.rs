//! Core pipeline orchestration for towermap.
//!
//! This crate ties together spreadsheet loading, tower resolution, and map
//! page generation into one run (see [`pipeline::PipelineController`]), and
//! defines the collaborator traits front ends implement.

pub mod pipeline;
pub mod surface;

pub use pipeline::{
    PipelineController, PipelineState, PlacedMarker, ProgressReporter, RunConfig, RunSummary,
    SilentProgress, SkipReason, SkippedRecord,
};
pub use surface::{NullSurface, RenderSurface};
