/// Error types shared across the app.
///
/// Nothing here is fatal on its own: callers log and degrade to silence or
/// a not-found page. Only terminal setup failures end the process.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("could not persist preference to {path}: {source}")]
    Preference {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("content table is empty")]
    EmptyContent,

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Failures from an audio backend.
#[derive(Debug, Error)]
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
pub enum AudioError {
    /// The platform refused to start playback without prior interaction.
    /// Desktop outputs never report it.
    #[allow(dead_code)]
    #[error("playback blocked until user interaction")]
    Blocked,

    #[error("audio output unavailable")]
    Unavailable,

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("audio output error: {0}")]
    Output(String),
}

/// Raised at the routing boundary for unknown persona/project slugs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("404 not found: /project/{persona}/{project}")]
    NotFound { persona: String, project: String },

    #[error("malformed route {0:?}, expected <persona>/<project>")]
    Malformed(String),
}
