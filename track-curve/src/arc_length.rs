use tracing::debug;

use crate::bezier::CubicSegment;
use crate::control_points::ControlPoints;

/// Per-segment samples used for the rail polylines and cross ties.
pub const RAIL_SAMPLE_STEPS: usize = 100;
/// Per-segment samples used when placing the train.
pub const POSITION_STEPS: usize = 1000;

/// Riemann-sum arc lengths of every segment of the loop.
///
/// A snapshot: it is never updated in place, only rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcLengthTable {
    lengths: Vec<f32>,
    cumulative: Vec<f32>,
    total: f32,
    steps: usize,
}

impl ArcLengthTable {
    /// Sample each segment at `steps + 1` parameters and sum the chords.
    /// A step count of zero is treated as one.
    pub fn build(points: &ControlPoints, steps: usize) -> Self {
        let steps = steps.max(1);
        let lengths = (0..points.segment_count())
            .map(|i| CubicSegment::of(points, i).sampled_length(steps))
            .collect();
        Self::from_lengths(lengths, steps)
    }

    pub(crate) fn from_lengths(lengths: Vec<f32>, steps: usize) -> Self {
        let mut cumulative = Vec::with_capacity(lengths.len() + 1);
        cumulative.push(0.0f32);
        let mut total = 0.0f32;
        for &len in &lengths {
            total += len;
            cumulative.push(total);
        }
        Self {
            lengths,
            cumulative,
            total,
            steps,
        }
    }

    pub fn lengths(&self) -> &[f32] {
        &self.lengths
    }

    /// Prefix sums with a leading zero; one entry longer than `lengths`.
    pub fn cumulative(&self) -> &[f32] {
        &self.cumulative
    }

    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn segment_count(&self) -> usize {
        self.lengths.len()
    }

    /// Find the segment holding `distance` and the local parameter in it.
    ///
    /// `distance` is expected in `[0, total)`. The first segment with
    /// `cumulative[i] <= distance < cumulative[i + 1]` wins, so zero-length
    /// segments are skipped over. Anything that matches no segment (rounding
    /// at `total`, an all-zero table) lands on the last segment with `u`
    /// clamped to [0, 1], or on segment 0 with `u = 0` for a zero table.
    pub fn locate(&self, distance: f32) -> (usize, f32) {
        let found = (0..self.lengths.len())
            .find(|&i| distance >= self.cumulative[i] && distance < self.cumulative[i + 1]);

        match found {
            Some(i) => (i, self.local_u(i, distance)),
            None if self.total > 0.0 => {
                let i = self.lengths.len() - 1;
                (i, self.local_u(i, distance).clamp(0.0, 1.0))
            }
            None => (0, 0.0),
        }
    }

    fn local_u(&self, index: usize, distance: f32) -> f32 {
        let length = self.lengths[index];
        if length > 0.0 {
            (distance - self.cumulative[index]) / length
        } else {
            0.0
        }
    }
}

/// Memoizes one [`ArcLengthTable`] keyed on the control-point version and the
/// step count it was built with.
#[derive(Debug, Default)]
pub struct ArcLengthCache {
    entry: Option<CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    version: u64,
    steps: usize,
    table: ArcLengthTable,
}

impl ArcLengthCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, points: &ControlPoints, steps: usize) -> &ArcLengthTable {
        let steps = steps.max(1);
        let stale = match &self.entry {
            Some(entry) => entry.version != points.version() || entry.steps != steps,
            None => true,
        };
        if stale {
            self.entry = None;
        }
        let entry = self.entry.get_or_insert_with(|| {
            debug!(
                version = points.version(),
                steps,
                segments = points.segment_count(),
                "rebuilding arc-length table"
            );
            CacheEntry {
                version: points.version(),
                steps,
                table: ArcLengthTable::build(points, steps),
            }
        });
        &entry.table
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_cached(&self, points: &ControlPoints, steps: usize) -> bool {
        self.entry.as_ref().is_some_and(|entry| {
            entry.version == points.version() && entry.steps == steps.max(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec2;

    fn square() -> ControlPoints {
        ControlPoints::from_arrays(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]).unwrap()
    }

    fn hexagon() -> ControlPoints {
        ControlPoints::from_arrays(&[
            [125.0, 150.0],
            [150.0, 400.0],
            [450.0, 450.0],
            [400.0, 300.0],
            [500.0, 250.0],
            [300.0, 100.0],
        ])
        .unwrap()
    }

    #[test]
    fn square_loop_length_regression() {
        let table = ArcLengthTable::build(&square(), RAIL_SAMPLE_STEPS);
        assert!((table.total() - 42.0375).abs() < 1e-2, "total = {}", table.total());
        for &len in table.lengths() {
            assert!((len - 10.5094).abs() < 1e-2);
        }
    }

    #[test]
    fn hexagon_loop_length_regression() {
        let table = ArcLengthTable::build(&hexagon(), POSITION_STEPS);
        assert!((table.total() - 1312.646).abs() < 0.5, "total = {}", table.total());
        assert!((table.lengths()[1] - 310.664).abs() < 0.2);
    }

    #[test]
    fn cumulative_sums_are_consistent() {
        let table = ArcLengthTable::build(&hexagon(), RAIL_SAMPLE_STEPS);
        let cumulative = table.cumulative();
        assert_eq!(cumulative.len(), table.lengths().len() + 1);
        assert_eq!(cumulative[0], 0.0);
        for (i, &len) in table.lengths().iter().enumerate() {
            assert!((cumulative[i + 1] - cumulative[i] - len).abs() < 1e-3);
        }
        assert_eq!(cumulative[table.segment_count()], table.total());
    }

    #[test]
    fn more_steps_never_shorten_the_polyline() {
        let coarse = ArcLengthTable::build(&hexagon(), 10);
        let fine = ArcLengthTable::build(&hexagon(), POSITION_STEPS);
        // Chords of a refined polyline are never shorter in total.
        assert!(fine.total() >= coarse.total());
    }

    #[test]
    fn coincident_points_give_zero_table() {
        let pts = ControlPoints::new(vec![Vec2::new(3.0, 4.0); 4]).unwrap();
        let table = ArcLengthTable::build(&pts, 50);
        assert_eq!(table.total(), 0.0);
        assert_eq!(table.locate(0.0), (0, 0.0));
    }

    #[test]
    fn locate_skips_zero_length_segments() {
        let table = ArcLengthTable::from_lengths(vec![5.0, 0.0, 5.0], 10);
        assert_eq!(table.locate(0.0), (0, 0.0));
        assert_eq!(table.locate(2.5), (0, 0.5));
        // Boundary at 5.0 belongs to both the empty segment's range and the
        // next one; the empty segment can never claim it.
        assert_eq!(table.locate(5.0), (2, 0.0));
        assert_eq!(table.locate(7.5), (2, 0.5));
    }

    #[test]
    fn locate_at_total_clamps_to_last_segment() {
        let table = ArcLengthTable::from_lengths(vec![4.0, 6.0], 10);
        assert_eq!(table.locate(10.0), (1, 1.0));
    }

    #[test]
    fn zero_steps_behave_like_one() {
        let zero = ArcLengthTable::build(&square(), 0);
        let one = ArcLengthTable::build(&square(), 1);
        assert_eq!(zero, one);
        assert_eq!(zero.steps(), 1);
    }

    #[test]
    fn cache_rebuilds_on_version_or_steps_change() {
        let mut pts = square();
        let mut cache = ArcLengthCache::new();
        assert!(!cache.is_cached(&pts, 100));

        let first = cache.get_or_build(&pts, 100).total();
        assert!(cache.is_cached(&pts, 100));
        assert!(!cache.is_cached(&pts, 1000));

        pts.set(2, Vec2::new(20.0, 20.0)).unwrap();
        assert!(!cache.is_cached(&pts, 100));
        let second = cache.get_or_build(&pts, 100).total();
        assert!(second > first);
        assert!(cache.is_cached(&pts, 100));

        cache.invalidate();
        assert!(!cache.is_cached(&pts, 100));
    }
}
