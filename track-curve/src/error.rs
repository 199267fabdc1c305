use std::path::PathBuf;

use thiserror::Error;

/// Errors from the fallible edges of the track engine (files, editing).
///
/// Curve evaluation itself never fails; degenerate geometry is handled
/// numerically where it is evaluated.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize track: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("track has no control points")]
    Empty,

    #[error("track needs at least {min} control points, got {count}")]
    TooFewPoints { count: usize, min: usize },

    #[error("control point {index} out of range (track has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
