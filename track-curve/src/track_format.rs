use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::arc_length::{POSITION_STEPS, RAIL_SAMPLE_STEPS};
use crate::control_points::{ControlPoints, MIN_CONTROL_POINTS};
use crate::error::TrackError;

const BUILTIN_TRACK: &str = include_str!("../tracks/default.toml");

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrackFile {
    #[serde(default)]
    pub metadata: TrackMetadata,
    pub control_points: Vec<[f32; 2]>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrackMetadata {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub author: String,
    /// Distance between the two rails.
    #[serde(default = "default_rail_gauge")]
    pub rail_gauge: f32,
    /// Arc length between consecutive ties.
    #[serde(default = "default_tie_spacing")]
    pub tie_spacing: f32,
    #[serde(default = "default_tie_width")]
    pub tie_width: f32,
    /// Samples per segment for rails and ties.
    #[serde(default = "default_rail_steps")]
    pub rail_steps: usize,
    /// Samples per segment when placing a follower.
    #[serde(default = "default_position_steps")]
    pub position_steps: usize,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            name: default_name(),
            author: String::new(),
            rail_gauge: default_rail_gauge(),
            tie_spacing: default_tie_spacing(),
            tie_width: default_tie_width(),
            rail_steps: default_rail_steps(),
            position_steps: default_position_steps(),
        }
    }
}

fn default_name() -> String {
    "Untitled".to_string()
}

fn default_rail_gauge() -> f32 {
    20.0
}

fn default_tie_spacing() -> f32 {
    30.0
}

fn default_tie_width() -> f32 {
    20.0
}

fn default_rail_steps() -> usize {
    RAIL_SAMPLE_STEPS
}

fn default_position_steps() -> usize {
    POSITION_STEPS
}

impl TrackFile {
    /// Create a new empty track with default metadata.
    pub fn new_empty(name: &str) -> Self {
        Self {
            metadata: TrackMetadata {
                name: name.to_string(),
                ..TrackMetadata::default()
            },
            control_points: Vec::new(),
        }
    }

    /// The six-point loop shipped with the crate.
    pub fn load_builtin() -> Result<Self, TrackError> {
        Self::from_toml_str(BUILTIN_TRACK, Path::new("tracks/default.toml"))
    }

    /// Load a track from a TOML file.
    pub fn load(path: &Path) -> Result<Self, TrackError> {
        let text = std::fs::read_to_string(path).map_err(|source| TrackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Parse TOML text; `origin` is only used in error messages.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, TrackError> {
        toml::from_str(text).map_err(|source| TrackError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn to_toml_string(&self) -> Result<String, TrackError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save this track to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), TrackError> {
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(|source| TrackError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The control points as an evaluable loop. Unlike a bare
    /// [`ControlPoints`], a file must describe a proper loop.
    pub fn control_points(&self) -> Result<ControlPoints, TrackError> {
        if self.control_points.len() < MIN_CONTROL_POINTS {
            return Err(TrackError::TooFewPoints {
                count: self.control_points.len(),
                min: MIN_CONTROL_POINTS,
            });
        }
        ControlPoints::from_arrays(&self.control_points)
    }
}
