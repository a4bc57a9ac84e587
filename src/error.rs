//! Errors surfaced at the library boundary.

use thiserror::Error;

/// Failures the dynamic shortest path service can report.
///
/// Unreachable queries are not errors; they answer `None`. Errors are reserved
/// for updates the graph cannot accept and for states the index must never
/// reach.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A weight update named vertices or weights the graph cannot accept.
    /// The update is rejected before any graph or index state changes.
    #[error("invalid weight update for graph `{graph}`: {reason}")]
    InvalidUpdate {
        /// Identifier of the graph wrapper the update was aimed at.
        graph: String,
        /// Human-readable description of the rejected condition.
        reason: String,
    },

    /// The index or the engine observed structurally impossible state.
    /// Fatal for the current call; never silently recovered.
    #[error("shortest path invariant violated: {0}")]
    InvariantViolation(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
