use bevy::math::Vec2;

use crate::error::TrackError;

/// Fewest control points that give every segment four distinct window points.
pub const MIN_CONTROL_POINTS: usize = 4;

/// The ordered loop of points the track passes through.
///
/// Every mutation bumps `version`, so derived data (arc-length tables) can
/// tell when it has gone stale.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPoints {
    points: Vec<Vec2>,
    version: u64,
}

impl ControlPoints {
    /// Wrap a loop of points. Fewer than [`MIN_CONTROL_POINTS`] is accepted
    /// and simply degenerates; an empty loop has no segments at all and is
    /// rejected.
    pub fn new(points: Vec<Vec2>) -> Result<Self, TrackError> {
        if points.is_empty() {
            return Err(TrackError::Empty);
        }
        Ok(Self { points, version: 0 })
    }

    pub fn from_arrays(points: &[[f32; 2]]) -> Result<Self, TrackError> {
        Self::new(points.iter().map(|&[x, y]| Vec2::new(x, y)).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed loop.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// One segment starts at every control point.
    pub fn segment_count(&self) -> usize {
        self.points.len()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn as_slice(&self) -> &[Vec2] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<Vec2> {
        self.points.get(index).copied()
    }

    pub fn to_arrays(&self) -> Vec<[f32; 2]> {
        self.points.iter().map(|p| [p.x, p.y]).collect()
    }

    /// The four Catmull-Rom points around segment `index`:
    /// `[P(i-1), P(i), P(i+1), P(i+2)]`, all wrapped around the loop.
    pub fn window(&self, index: usize) -> [Vec2; 4] {
        let n = self.points.len();
        let i = index % n;
        [
            self.points[(i + n - 1) % n],
            self.points[i],
            self.points[(i + 1) % n],
            self.points[(i + 2) % n],
        ]
    }

    pub fn set(&mut self, index: usize, point: Vec2) -> Result<(), TrackError> {
        let len = self.points.len();
        let slot = self
            .points
            .get_mut(index)
            .ok_or(TrackError::IndexOutOfRange { index, len })?;
        *slot = point;
        self.touch();
        Ok(())
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert(&mut self, index: usize, point: Vec2) -> Result<(), TrackError> {
        let len = self.points.len();
        if index > len {
            return Err(TrackError::IndexOutOfRange { index, len });
        }
        self.points.insert(index, point);
        self.touch();
        Ok(())
    }

    /// Remove a point, never shrinking the loop below [`MIN_CONTROL_POINTS`].
    pub fn remove(&mut self, index: usize) -> Result<Vec2, TrackError> {
        let len = self.points.len();
        if index >= len {
            return Err(TrackError::IndexOutOfRange { index, len });
        }
        if len <= MIN_CONTROL_POINTS {
            return Err(TrackError::TooFewPoints {
                count: len - 1,
                min: MIN_CONTROL_POINTS,
            });
        }
        let removed = self.points.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Swap in a whole new loop (undo/redo snapshots, file loads).
    pub fn replace(&mut self, points: Vec<Vec2>) -> Result<(), TrackError> {
        if points.is_empty() {
            return Err(TrackError::Empty);
        }
        self.points = points;
        self.touch();
        Ok(())
    }

    /// Apply `f` to every point as a single mutation.
    pub fn map_in_place(&mut self, mut f: impl FnMut(Vec2) -> Vec2) {
        for p in &mut self.points {
            *p = f(*p);
        }
        self.touch();
    }

    pub fn centroid(&self) -> Vec2 {
        self.points.iter().copied().sum::<Vec2>() / self.points.len() as f32
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}
