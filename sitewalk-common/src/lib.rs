//! Common types and utilities shared across sitewalk crates.
//!
//! This crate defines the error taxonomy, run identifiers and observability
//! helpers used throughout the sitewalk workspace. It is intentionally
//! lightweight so that every crate can depend on it without pulling in the
//! browser stack.
//!
//! # Overview
//!
//! - [`SessionError`]: faults reported by a browser session, classified so
//!   callers can tell a stale handle from a missing element from a dead session
//! - [`SinkError`]: failures while persisting a result row
//! - [`SitewalkError`] and [`Result`]: run-level error handling
//! - [`RunId`]: identifier attached to every log line of one run
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use sitewalk_common::SessionError;
//!
//! let err = SessionError::StaleReference;
//! assert!(err.is_recoverable());
//! assert!(!SessionError::Unavailable("gone".into()).is_recoverable());
//! ```
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod observability;

/// Faults surfaced by a browser session or one of its element handles.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The element is no longer attached to the document.
    #[error("stale element reference")]
    StaleReference,

    /// A query matched nothing.
    #[error("no such element: {0}")]
    NotFound(String),

    /// A script run inside the page threw or returned garbage.
    #[error("script error: {0}")]
    Script(String),

    /// The element exists but refused the interaction (covered, disabled, ...).
    #[error("interaction rejected: {0}")]
    Interaction(String),

    /// Loading a location failed or timed out.
    #[error("navigation to {location} failed: {reason}")]
    Navigation { location: String, reason: String },

    /// The session itself is gone or the driver stopped answering.
    #[error("session unavailable: {0}")]
    Unavailable(String),
}

impl SessionError {
    /// Stale handles, empty matches and rejected interactions only affect the
    /// element at hand.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::StaleReference | Self::NotFound(_) | Self::Interaction(_) | Self::Script(_)
        )
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleReference)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Failure while appending a row to an output sink.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("sink io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(String),

    /// Row width does not match the header.
    #[error("row has {got} fields, header has {expected}")]
    Width { expected: usize, got: usize },
}

/// Error types used across a sitewalk run.
#[derive(thiserror::Error, Debug)]
pub enum SitewalkError {
    /// A browser session fault.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Writing a result row failed.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run could not be started (session or output could not be opened).
    #[error("Initialisation failed: {0}")]
    Init(#[source] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient alias for results that use [`SitewalkError`].
pub type Result<T> = std::result::Result<T, SitewalkError>;

/// Identifier of one run, attached to spans and the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp stamped on outcome rows (`yyyy-MM-dd HH:mm:ss`, local time).
pub fn row_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Timestamp used in artifact file names (`yyyyMMdd_HHmmss`, local time).
pub fn file_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
