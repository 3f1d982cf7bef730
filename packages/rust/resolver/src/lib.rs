//! Tower resolution: maps a (operator, LAC, CID) identity to coordinates.
//!
//! This crate provides:
//! - [`TowerResolver`] — the resolution interface the pipeline depends on
//! - [`HttpResolver`] — queries the cell search web service
//! - [`extract`] — swappable strategies for reading coordinates out of responses

pub mod extract;
mod http;

use std::future::Future;

use towermap_shared::{Operator, ResolvedLocation, Result, TowerRecord};

pub use extract::{AnchorTextExtractor, CoordinateExtractor, Coordinates};
pub use http::HttpResolver;

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Outcome of resolving one tower.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The service returned coordinates for the tower.
    Found(ResolvedLocation),
    /// The service answered but had no coordinates; the tower is skipped.
    NotFound,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Resolves a tower identity to a location.
///
/// `Err` is reserved for transport-level failures
/// ([`towermap_shared::TowerMapError::Lookup`]); callers skip the tower and
/// carry on. A well-formed answer without coordinates is `Ok(Lookup::NotFound)`.
pub trait TowerResolver: Send + Sync {
    fn resolve(
        &self,
        operator: Operator,
        record: TowerRecord,
    ) -> impl Future<Output = Result<Lookup>> + Send;
}
