use bevy::math::Vec2;
use tracing::{trace, warn};

use crate::arc_length::ArcLengthTable;
use crate::bezier::evaluate_segment;
use crate::control_points::ControlPoints;
use crate::error::TrackError;
use crate::mapping::{TrackParameter, map_with_table};

/// A centerline sample with its raw tangent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenseSample {
    pub position: Vec2,
    pub tangent: Vec2,
}

/// The two parallel rails, each its own Catmull-Rom loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RailPair {
    pub left: ControlPoints,
    pub right: ControlPoints,
}

/// A cross tie laid perpendicular to the centerline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tie {
    pub center: Vec2,
    pub start: Vec2,
    pub end: Vec2,
}

/// Walk the whole loop at `steps` evenly spaced values of the global
/// parameter (segment index + local `u`). The closing sample is left out,
/// the loop closes back onto the first one.
pub fn sample_dense_polyline(points: &ControlPoints, steps: usize) -> Vec<DenseSample> {
    let steps = steps.max(1);
    let n = points.segment_count();
    let increment = n as f32 / steps as f32;

    (0..steps)
        .map(|k| {
            let t = k as f32 * increment;
            let whole = t.floor();
            let sample = evaluate_segment(points, whole as usize % n, t - whole);
            DenseSample {
                position: sample.point,
                tangent: sample.tangent,
            }
        })
        .collect()
}

/// Left-hand unit normal of `tangent`, or `None` when it has no direction.
pub fn unit_normal(tangent: Vec2) -> Option<Vec2> {
    let length = tangent.length();
    if length > 0.0 && length.is_finite() {
        Some(tangent.perp() / length)
    } else {
        None
    }
}

/// Push every sample `distance` along its left-hand normal (negative goes
/// right). A sample whose tangent has zero length cannot define a normal and
/// is kept where it is, so the output stays index-aligned with the input.
pub fn offset_polyline(samples: &[DenseSample], distance: f32) -> Vec<Vec2> {
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| match unit_normal(sample.tangent) {
            Some(normal) => sample.position + normal * distance,
            None => {
                trace!(sample = i, "zero tangent, leaving sample on centerline");
                sample.position
            }
        })
        .collect()
}

/// Offset the centerline by half the gauge to either side.
pub fn build_rails(
    points: &ControlPoints,
    steps: usize,
    gauge: f32,
) -> Result<RailPair, TrackError> {
    let samples = sample_dense_polyline(points, steps);
    let half = gauge * 0.5;
    Ok(RailPair {
        left: ControlPoints::new(offset_polyline(&samples, half))?,
        right: ControlPoints::new(offset_polyline(&samples, -half))?,
    })
}

/// Upper bound on ties laid along one loop.
pub const MAX_TIES: usize = 100_000;

/// Lay a tie every `spacing` units of arc length, starting at distance zero.
/// Positions with no usable tangent get no tie. A spacing that would need
/// more than [`MAX_TIES`] ties lays none.
pub fn rail_ties(
    points: &ControlPoints,
    table: &ArcLengthTable,
    spacing: f32,
    width: f32,
) -> Vec<Tie> {
    let mut ties = Vec::new();
    if spacing <= 0.0 || !spacing.is_finite() {
        return ties;
    }

    let half = width * 0.5;
    let count = (table.total() / spacing).ceil();
    if count > MAX_TIES as f32 {
        warn!(spacing, total = table.total(), "tie spacing too small, laying no ties");
        return ties;
    }
    let count = count as usize;
    for k in 0..count {
        let distance = k as f32 * spacing;
        if distance >= table.total() {
            break;
        }
        let pos = map_with_table(points, table, TrackParameter::Distance(distance));
        let Some(normal) = unit_normal(pos.tangent) else {
            continue;
        };
        ties.push(Tie {
            center: pos.point,
            start: pos.point + normal * half,
            end: pos.point - normal * half,
        });
    }
    ties
}
