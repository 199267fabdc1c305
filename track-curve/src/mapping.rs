//! Arc-length reparameterization: from a slider value or a distance to a
//! position on the loop.

use bevy::math::Vec2;

use crate::arc_length::ArcLengthTable;
use crate::bezier::evaluate_segment;
use crate::control_points::ControlPoints;

/// How a value passed to the mapper is interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackParameter {
    /// Slider position in `[0, n)`, counted in segments; wraps modulo `n`.
    Slider(f32),
    /// Distance along the loop; wraps modulo the total length.
    Distance(f32),
}

/// Where a parameter lands on the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalPosition {
    pub segment_index: usize,
    pub u: f32,
    pub point: Vec2,
    pub tangent: Vec2,
}

impl GlobalPosition {
    /// Direction of travel in radians, counter-clockwise from +x.
    pub fn heading(&self) -> f32 {
        self.tangent.y.atan2(self.tangent.x)
    }
}

/// Build a fresh table at `steps` samples per segment and map `param` on it.
pub fn map_global_parameter(
    points: &ControlPoints,
    param: TrackParameter,
    steps: usize,
) -> GlobalPosition {
    let table = ArcLengthTable::build(points, steps);
    map_with_table(points, &table, param)
}

/// Map `param` using a table built from the same `points`.
pub fn map_with_table(
    points: &ControlPoints,
    table: &ArcLengthTable,
    param: TrackParameter,
) -> GlobalPosition {
    let distance = target_distance(points.len(), table.total(), param);
    let (segment_index, u) = table.locate(distance);
    let sample = evaluate_segment(points, segment_index, u);
    GlobalPosition {
        segment_index,
        u,
        point: sample.point,
        tangent: sample.tangent,
    }
}

/// Plain parameter mapping with no arc-length correction: the integer part of
/// the slider picks the segment, the fraction is the local `u`.
pub fn map_uniform(points: &ControlPoints, slider: f32) -> GlobalPosition {
    let n = points.len() as f32;
    let wrapped = slider.rem_euclid(n);
    let whole = wrapped.floor();
    let segment_index = (whole as usize) % points.len();
    let u = wrapped - whole;
    let sample = evaluate_segment(points, segment_index, u);
    GlobalPosition {
        segment_index,
        u,
        point: sample.point,
        tangent: sample.tangent,
    }
}

fn target_distance(point_count: usize, total: f32, param: TrackParameter) -> f32 {
    if total <= 0.0 {
        return 0.0;
    }
    let distance = match param {
        TrackParameter::Slider(value) => {
            let n = point_count as f32;
            value.rem_euclid(n) / n * total
        }
        TrackParameter::Distance(value) => value.rem_euclid(total),
    };
    // rem_euclid can round up to the modulus itself for tiny negative inputs.
    if distance >= total { 0.0 } else { distance }
}
