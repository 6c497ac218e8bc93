//! Error taxonomy for building allocation and consumption synthesis.

use thiserror::Error;

/// Failures raised while planning or synthesizing a dataset.
///
/// `EmptyCandidateSet`, `InvalidRequest` and `InvalidReferenceData` are fatal
/// and surface before any output exists. `UnknownBuildingClass` and
/// `MissingAuthoritativeData` are recovered where they occur and only logged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// No location survived the request's location selection.
    #[error("no location matches the requested selection")]
    EmptyCandidateSet,

    /// Request parameters are out of range (zero buildings, reversed dates,
    /// unknown frequency token, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A label did not name any building class.
    #[error("unknown building class \"{0}\"")]
    UnknownBuildingClass(String),

    /// No usable authoritative per-class table for a location.
    #[error("no usable authoritative counts for \"{location}\": {reason}")]
    MissingAuthoritativeData { location: String, reason: String },

    /// Reference catalog or archetype table violates its own constraints.
    #[error("invalid reference data: {0}")]
    InvalidReferenceData(String),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
