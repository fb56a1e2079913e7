//! Error types for the generation engine.
//!
//! This module defines the central `Error` enum covering every reportable
//! failure in the generation pipeline, from capacity enforcement through
//! artifact I/O. Transport layers map these onto their own status codes; see
//! the `numspool-http-server` crate for the HTTP mapping.
//!
//! ## Error Cases
//! - `OverCapacity`: the deduplicated result exceeded the configured ceiling.
//! - `DestinationUnwritable` / `DiskExhausted`: artifact write failure.
//! - `SourceUnreadable`: an artifact vanished or could not be re-read for
//!   partitioning.
//! - `ArtifactExpired`: a requested artifact was already removed by the
//!   retention sweep.
//! - `Cancelled`: the caller's cancellation signal fired mid-generation.
//! - `Channel`: an internal communication failure between tasks or workers.
//! - `Shutdown`: a request arrived while the engine was shutting down.

use std::io;
use std::path::PathBuf;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the generation engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The deduplicated identifier count exceeded the configured ceiling.
    ///
    /// Carries both the limit and the actual count so callers can tell the
    /// user how far over the request landed.
    #[error("generated {actual} identifiers, exceeding the limit of {limit}")]
    OverCapacity { limit: usize, actual: usize },

    /// The artifact destination could not be opened for writing.
    #[error("cannot open destination {path}: {source}")]
    DestinationUnwritable { path: PathBuf, source: io::Error },

    /// A write failed mid-stream; the partial file has been discarded.
    #[error("write to {path} failed: {source}")]
    DiskExhausted { path: PathBuf, source: io::Error },

    /// The source artifact could not be opened or read back.
    #[error("cannot read artifact {path}: {source}")]
    SourceUnreadable { path: PathBuf, source: io::Error },

    /// The requested artifact has already been removed by retention.
    #[error("artifact {name} has expired or been removed")]
    ArtifactExpired { name: String },

    /// The caller aborted the generation request.
    #[error("generation cancelled")]
    Cancelled,

    /// Internal channel send/receive failure (e.g., closed channel).
    #[error("channel error: {context}")]
    Channel { context: String },

    /// The engine is in the process of shutting down.
    #[error("engine is shutting down")]
    Shutdown,
}
