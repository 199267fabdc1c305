//! Closed-loop Catmull-Rom track curves: evaluation, arc-length
//! reparameterization, offset rails and an editable control polygon.

pub mod arc_length;
pub mod bezier;
pub mod control_points;
pub mod editor;
pub mod error;
pub mod follower;
pub mod mapping;
pub mod offset;
pub mod track_format;

pub use arc_length::{ArcLengthCache, ArcLengthTable, POSITION_STEPS, RAIL_SAMPLE_STEPS};
pub use bezier::{CurveSample, evaluate_segment};
pub use control_points::{ControlPoints, MIN_CONTROL_POINTS};
pub use editor::TrackEditor;
pub use error::TrackError;
pub use follower::{BoostPanels, FollowerPose, SliderPlayback, TrackFollower};
pub use mapping::{GlobalPosition, TrackParameter, map_global_parameter, map_with_table};
pub use offset::{DenseSample, RailPair, Tie, build_rails, offset_polyline, sample_dense_polyline};
pub use track_format::{TrackFile, TrackMetadata};
