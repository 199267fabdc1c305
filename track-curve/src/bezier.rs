//! Catmull-Rom to cubic Bezier conversion and de Casteljau evaluation.

use bevy::math::Vec2;

use crate::control_points::ControlPoints;

/// The two inner Bezier control points of one Catmull-Rom segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierControlPair {
    pub cp1: Vec2,
    pub cp2: Vec2,
}

/// A point on a segment together with its (unnormalized) derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub point: Vec2,
    pub tangent: Vec2,
}

/// Uniform Catmull-Rom segment from `p1` to `p2` expressed as Bezier handles.
pub fn catmull_rom_to_bezier(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> BezierControlPair {
    BezierControlPair {
        cp1: p1 + (p2 - p0) / 6.0,
        cp2: p2 - (p3 - p1) / 6.0,
    }
}

/// Affine interpolation; `u` outside [0, 1] extrapolates. Exact when
/// `a == b`.
pub fn lerp(u: f32, a: Vec2, b: Vec2) -> Vec2 {
    a + (b - a) * u
}

/// One cubic Bezier piece of the track, built on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub start: Vec2,
    pub cp1: Vec2,
    pub cp2: Vec2,
    pub end: Vec2,
}

impl CubicSegment {
    pub fn from_window([p0, p1, p2, p3]: [Vec2; 4]) -> Self {
        let BezierControlPair { cp1, cp2 } = catmull_rom_to_bezier(p0, p1, p2, p3);
        Self {
            start: p1,
            cp1,
            cp2,
            end: p2,
        }
    }

    pub fn of(points: &ControlPoints, index: usize) -> Self {
        Self::from_window(points.window(index))
    }

    /// de Casteljau: three levels of lerps give the point, the second level
    /// gives the derivative `3 * (R1 - R0)`.
    pub fn evaluate(&self, u: f32) -> CurveSample {
        let q0 = lerp(u, self.start, self.cp1);
        let q1 = lerp(u, self.cp1, self.cp2);
        let q2 = lerp(u, self.cp2, self.end);

        let r0 = lerp(u, q0, q1);
        let r1 = lerp(u, q1, q2);

        CurveSample {
            point: lerp(u, r0, r1),
            tangent: 3.0 * (r1 - r0),
        }
    }

    /// Polyline length through `steps + 1` evenly spaced parameter samples.
    pub fn sampled_length(&self, steps: usize) -> f32 {
        let steps = steps.max(1);
        let mut length = 0.0f32;
        let mut prev = self.start;
        for j in 1..=steps {
            let p = self.evaluate(j as f32 / steps as f32).point;
            length += prev.distance(p);
            prev = p;
        }
        length
    }
}

/// Evaluate segment `index` of the loop at local parameter `u`.
pub fn evaluate_segment(points: &ControlPoints, index: usize, u: f32) -> CurveSample {
    CubicSegment::of(points, index).evaluate(u)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-3
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
    fn conversion_uses_one_sixth_of_the_neighbour_chord() {
        let pair = catmull_rom_to_bezier(
            Vec2::new(0.0, 10.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
        );
        assert!(close(pair.cp1, Vec2::new(10.0 / 6.0, -10.0 / 6.0)));
        assert!(close(pair.cp2, Vec2::new(10.0 - 10.0 / 6.0, -10.0 / 6.0)));
    }

    #[test]
    fn segment_interpolates_its_knots() {
        let pts = hexagon();
        for i in 0..pts.len() {
            let seg = CubicSegment::of(&pts, i);
            assert!(close(seg.evaluate(0.0).point, pts.get(i).unwrap()));
            assert!(close(seg.evaluate(1.0).point, pts.get((i + 1) % pts.len()).unwrap()));
        }
    }

    #[test]
    fn adjacent_segments_meet() {
        let pts = hexagon();
        for i in 0..pts.len() {
            let end = evaluate_segment(&pts, i, 1.0);
            let start = evaluate_segment(&pts, i + 1, 0.0);
            assert!(close(end.point, start.point));
            // C1 as well: Catmull-Rom tangents are shared at the knot.
            assert!(close(end.tangent, start.tangent));
        }
    }

    #[test]
    fn midpoint_and_tangent_match_hand_values() {
        let pts =
            ControlPoints::from_arrays(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]])
                .unwrap();
        let sample = evaluate_segment(&pts, 0, 0.5);
        assert!(close(sample.point, Vec2::new(5.0, -1.25)));
        assert!(close(sample.tangent, Vec2::new(12.5, 0.0)));
    }

    #[test]
    fn tangent_matches_finite_difference() {
        let seg = CubicSegment::of(&hexagon(), 2);
        let h = 1e-3;
        for &u in &[0.1f32, 0.4, 0.8] {
            let fd = (seg.evaluate(u + h).point - seg.evaluate(u - h).point) / (2.0 * h);
            let t = seg.evaluate(u).tangent;
            assert!(fd.distance(t) / t.length() < 1e-2, "u={u} fd={fd} t={t}");
        }
    }

    #[test]
    fn parameter_outside_unit_interval_extrapolates() {
        let seg = CubicSegment::of(&hexagon(), 0);
        let before = seg.evaluate(-0.25);
        let after = seg.evaluate(1.25);
        assert!(before.point.is_finite());
        assert!(after.point.is_finite());
        assert_ne!(before.point, seg.start);
        assert_ne!(after.point, seg.end);
    }

    #[test]
    fn coincident_knots_collapse_to_a_point() {
        let p = Vec2::new(3.0, 4.0);
        for u in [0.0, 0.3, 0.7, 1.0] {
            assert_eq!(lerp(u, p, p), p);
        }
        let pts = ControlPoints::new(vec![p; 4]).unwrap();
        let seg = CubicSegment::of(&pts, 1);
        for u in [0.1, 0.5, 0.9] {
            let sample = seg.evaluate(u);
            assert_eq!(sample.point, p);
            assert_eq!(sample.tangent, Vec2::ZERO);
        }
        assert_eq!(seg.sampled_length(100), 0.0);
    }

    #[test]
    fn straight_segment_length_is_exact() {
        let seg = CubicSegment {
            start: Vec2::ZERO,
            cp1: Vec2::new(1.0, 0.0),
            cp2: Vec2::new(2.0, 0.0),
            end: Vec2::new(3.0, 0.0),
        };
        assert!((seg.sampled_length(10) - 3.0).abs() < 1e-5);
        assert!((seg.sampled_length(0) - 3.0).abs() < 1e-5);
    }
}
