//! Headless track editing: the one place control points get mutated.

use bevy::math::Vec2;
use tracing::{debug, info};

use crate::arc_length::{ArcLengthCache, ArcLengthTable};
use crate::control_points::ControlPoints;
use crate::error::TrackError;
use crate::track_format::TrackFile;

/// World-space radius within which a click grabs a control point.
pub const DEFAULT_HIT_RADIUS: f32 = 10.0;

pub struct TrackEditor {
    track_file: TrackFile,
    points: ControlPoints,
    selected_point: Option<usize>,
    dragging: bool,
    hit_radius: f32,
    /// Undo stack: snapshots of the points *before* a modification.
    undo_stack: Vec<Vec<Vec2>>,
    /// Redo stack: snapshots popped from undo.
    redo_stack: Vec<Vec<Vec2>>,
    /// Unsaved changes.
    dirty: bool,
    arc_lengths: ArcLengthCache,
}

impl TrackEditor {
    pub fn new(track_file: TrackFile) -> Result<Self, TrackError> {
        let points = track_file.control_points()?;
        info!(
            name = %track_file.metadata.name,
            points = points.len(),
            "editing track"
        );
        Ok(Self {
            track_file,
            points,
            selected_point: None,
            dragging: false,
            hit_radius: DEFAULT_HIT_RADIUS,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            dirty: false,
            arc_lengths: ArcLengthCache::new(),
        })
    }

    pub fn with_hit_radius(mut self, radius: f32) -> Self {
        self.hit_radius = radius;
        self
    }

    pub fn points(&self) -> &ControlPoints {
        &self.points
    }

    pub fn selected_point(&self) -> Option<usize> {
        self.selected_point
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The edited track, with the current points written back.
    pub fn track_file(&self) -> TrackFile {
        TrackFile {
            metadata: self.track_file.metadata.clone(),
            control_points: self.points.to_arrays(),
        }
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Arc-length table for the current points, rebuilt only after edits.
    pub fn arc_length(&mut self, steps: usize) -> &ArcLengthTable {
        self.arc_lengths.get_or_build(&self.points, steps)
    }

    /// Nearest control point within the hit radius.
    pub fn pick(&self, pos: Vec2) -> Option<usize> {
        let mut best_idx: Option<usize> = None;
        let mut best_dist = f32::MAX;
        for (i, p) in self.points.as_slice().iter().enumerate() {
            let d = pos.distance(*p);
            if d < best_dist && d < self.hit_radius {
                best_dist = d;
                best_idx = Some(i);
            }
        }
        best_idx
    }

    pub fn select(&mut self, index: usize) -> Result<(), TrackError> {
        if index >= self.points.len() {
            return Err(TrackError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        self.selected_point = Some(index);
        Ok(())
    }

    /// Select the point under `pos` and start dragging it. Returns whether a
    /// point was grabbed.
    pub fn begin_drag(&mut self, pos: Vec2) -> bool {
        self.selected_point = self.pick(pos);
        if self.selected_point.is_some() {
            self.dragging = true;
            self.push_undo(); // snapshot before drag
        }
        self.dragging
    }

    pub fn drag_to(&mut self, pos: Vec2) -> Result<(), TrackError> {
        if !self.dragging {
            return Ok(());
        }
        if let Some(idx) = self.selected_point {
            self.points.set(idx, pos)?;
            self.dirty = true;
        }
        Ok(())
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Move one point as its own undoable step.
    pub fn move_point(&mut self, index: usize, pos: Vec2) -> Result<(), TrackError> {
        let before = self.points.as_slice().to_vec();
        self.points.set(index, pos)?;
        self.record(before);
        Ok(())
    }

    /// Insert a point on the loop edge closest to `pos`; returns its index
    /// and selects it.
    pub fn insert_point(&mut self, pos: Vec2) -> Result<usize, TrackError> {
        let before = self.points.as_slice().to_vec();
        let insert_idx = find_insert_index(pos, self.points.as_slice());
        self.points.insert(insert_idx, pos)?;
        self.record(before);
        self.selected_point = Some(insert_idx);
        debug!(index = insert_idx, "inserted control point");
        Ok(insert_idx)
    }

    /// Delete the selected point. The loop never drops below the minimum
    /// point count; nothing happens without a selection.
    pub fn delete_selected(&mut self) -> Result<Option<Vec2>, TrackError> {
        let Some(idx) = self.selected_point else {
            return Ok(None);
        };
        let before = self.points.as_slice().to_vec();
        let removed = self.points.remove(idx)?;
        self.record(before);
        if idx >= self.points.len() {
            self.selected_point = Some(self.points.len() - 1);
        }
        debug!(index = idx, "deleted control point");
        Ok(Some(removed))
    }

    /// Scale all control points around their centroid.
    pub fn scale(&mut self, factor: f32) {
        self.push_undo();
        let center = self.points.centroid();
        self.points.map_in_place(|p| center + (p - center) * factor);
    }

    pub fn undo(&mut self) -> bool {
        let Some(prev) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(self.points.as_slice().to_vec());
        self.restore(prev)
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(self.points.as_slice().to_vec());
        self.restore(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn push_undo(&mut self) {
        self.undo_stack.push(self.points.as_slice().to_vec());
        self.redo_stack.clear();
        self.dirty = true;
    }

    fn record(&mut self, before: Vec<Vec2>) {
        self.undo_stack.push(before);
        self.redo_stack.clear();
        self.dirty = true;
    }

    fn restore(&mut self, snapshot: Vec<Vec2>) -> bool {
        // Snapshots come from a live loop, so they are never empty.
        if self.points.replace(snapshot).is_err() {
            return false;
        }
        if self
            .selected_point
            .is_some_and(|idx| idx >= self.points.len())
        {
            self.selected_point = None;
        }
        self.dragging = false;
        self.dirty = true;
        true
    }
}

/// Find the best index to insert a new control point near `click`.
fn find_insert_index(click: Vec2, points: &[Vec2]) -> usize {
    if points.len() < 2 {
        return points.len();
    }
    let n = points.len();
    let mut best_idx = 0;
    let mut best_dist = f32::MAX;
    for i in 0..n {
        let d = point_to_segment_dist(click, points[i], points[(i + 1) % n]);
        if d < best_dist {
            best_dist = d;
            // The closing edge (n-1 -> 0) appends.
            best_idx = i + 1;
        }
    }
    best_idx
}

fn point_to_segment_dist(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-8 {
        return ap.length();
    }
    let t = (ap.dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t - p).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arc_length::RAIL_SAMPLE_STEPS;

    fn square_editor() -> TrackEditor {
        let mut track = TrackFile::new_empty("Square");
        track.control_points = vec![[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]];
        TrackEditor::new(track).unwrap()
    }

    #[test]
    fn pick_respects_hit_radius() {
        let editor = square_editor();
        assert_eq!(editor.pick(Vec2::new(3.0, 4.0)), Some(0));
        assert_eq!(editor.pick(Vec2::new(97.0, 98.0)), Some(2));
        assert_eq!(editor.pick(Vec2::new(50.0, 50.0)), None);

        let wide = square_editor().with_hit_radius(80.0);
        assert!(wide.pick(Vec2::new(50.0, 50.0)).is_some());
    }

    #[test]
    fn drag_moves_point_and_is_one_undo_step() {
        let mut editor = square_editor();
        assert!(editor.begin_drag(Vec2::new(101.0, 1.0)));
        assert_eq!(editor.selected_point(), Some(1));
        editor.drag_to(Vec2::new(120.0, 10.0)).unwrap();
        editor.drag_to(Vec2::new(130.0, 20.0)).unwrap();
        editor.end_drag();

        assert_eq!(editor.points().get(1), Some(Vec2::new(130.0, 20.0)));
        assert!(editor.is_dirty());

        assert!(editor.undo());
        assert_eq!(editor.points().get(1), Some(Vec2::new(100.0, 0.0)));
        assert!(!editor.undo());

        assert!(editor.redo());
        assert_eq!(editor.points().get(1), Some(Vec2::new(130.0, 20.0)));
        assert!(!editor.redo());
    }

    #[test]
    fn missed_click_does_not_drag() {
        let mut editor = square_editor();
        assert!(!editor.begin_drag(Vec2::new(50.0, 50.0)));
        editor.drag_to(Vec2::new(0.0, 0.0)).unwrap();
        assert_eq!(editor.points().get(0), Some(Vec2::ZERO));
        assert!(!editor.can_undo());
        assert!(!editor.is_dirty());
    }

    #[test]
    fn insert_goes_into_nearest_edge() {
        let mut editor = square_editor();
        // Closest to the edge 1 -> 2 (x = 100).
        let idx = editor.insert_point(Vec2::new(110.0, 50.0)).unwrap();
        assert_eq!(idx, 2);
        assert_eq!(editor.points().len(), 5);
        assert_eq!(editor.points().get(2), Some(Vec2::new(110.0, 50.0)));
        assert_eq!(editor.selected_point(), Some(2));

        // Closest to the closing edge 4 -> 0 (x = 0) appends.
        let idx = editor.insert_point(Vec2::new(-10.0, 50.0)).unwrap();
        assert_eq!(idx, 5);
        assert_eq!(editor.points().len(), 6);
    }

    #[test]
    fn delete_keeps_minimum_loop() {
        let mut editor = square_editor();
        editor.insert_point(Vec2::new(50.0, -10.0)).unwrap();
        assert_eq!(editor.points().len(), 5);

        let removed = editor.delete_selected().unwrap();
        assert_eq!(removed, Some(Vec2::new(50.0, -10.0)));
        assert_eq!(editor.points().len(), 4);

        assert!(matches!(
            editor.delete_selected(),
            Err(TrackError::TooFewPoints { .. })
        ));
        assert_eq!(editor.points().len(), 4);
    }

    #[test]
    fn select_by_index_is_range_checked() {
        let mut editor = square_editor();
        assert!(matches!(
            editor.select(4),
            Err(TrackError::IndexOutOfRange { index: 4, len: 4 })
        ));
        assert_eq!(editor.selected_point(), None);
        editor.select(3).unwrap();
        assert_eq!(editor.selected_point(), Some(3));
    }

    #[test]
    fn delete_without_selection_is_a_no_op() {
        let mut editor = square_editor();
        assert_eq!(editor.delete_selected().unwrap(), None);
        assert!(!editor.can_undo());
    }

    #[test]
    fn scale_about_centroid() {
        let mut editor = square_editor();
        editor.scale(2.0);
        assert_eq!(editor.points().get(0), Some(Vec2::new(-50.0, -50.0)));
        assert_eq!(editor.points().get(2), Some(Vec2::new(150.0, 150.0)));
        assert!(editor.undo());
        assert_eq!(editor.points().get(0), Some(Vec2::ZERO));
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut editor = square_editor();
        editor.move_point(0, Vec2::new(-5.0, -5.0)).unwrap();
        assert!(editor.undo());
        assert!(editor.can_redo());
        editor.move_point(3, Vec2::new(-5.0, 105.0)).unwrap();
        assert!(!editor.can_redo());
    }

    #[test]
    fn arc_length_tracks_edits() {
        let mut editor = square_editor();
        let before = editor.arc_length(RAIL_SAMPLE_STEPS).total();
        editor.scale(2.0);
        let after = editor.arc_length(RAIL_SAMPLE_STEPS).total();
        assert!((after / before - 2.0).abs() < 1e-4);
        assert!(editor.undo());
        let restored = editor.arc_length(RAIL_SAMPLE_STEPS).total();
        assert!((restored - before).abs() < 1e-3);
    }

    #[test]
    fn track_file_reflects_edits() {
        let mut editor = square_editor();
        editor.move_point(1, Vec2::new(90.0, -10.0)).unwrap();
        let track = editor.track_file();
        assert_eq!(track.metadata.name, "Square");
        assert_eq!(track.control_points[1], [90.0, -10.0]);
        editor.mark_saved();
        assert!(!editor.is_dirty());
    }

    #[test]
    fn short_track_cannot_be_edited() {
        let mut track = TrackFile::new_empty("Stub");
        track.control_points = vec![[0.0, 0.0], [1.0, 1.0]];
        assert!(TrackEditor::new(track).is_err());
    }
}
