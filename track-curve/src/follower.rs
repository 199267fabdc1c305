use bevy::math::Vec2;
use tracing::debug;

use crate::arc_length::ArcLengthTable;
use crate::control_points::ControlPoints;
use crate::mapping::{TrackParameter, map_with_table};

/// Fraction of the speed gap closed per step.
const SPEED_LERP: f32 = 0.03;
/// Boost lasts this long after passing the last panel.
const BOOST_HOLD_MS: f32 = 200.0;
const BOOST_MULTIPLIER: f32 = 1.8;

/// An auto-advancing slider in `[0, max)`, stepping `step` per 60 ms.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderPlayback {
    pub value: f32,
    pub max: f32,
    pub step: f32,
    /// Wrap at `max` instead of stopping there.
    pub looping: bool,
    pub running: bool,
}

impl SliderPlayback {
    /// A looping slider over one lap of `point_count` segments.
    pub fn for_loop(point_count: usize, step: f32) -> Self {
        Self {
            value: 0.0,
            max: point_count as f32,
            step,
            looping: true,
            running: true,
        }
    }

    pub fn tick(&mut self, delta_ms: f32) -> f32 {
        if !self.running || self.max <= 0.0 {
            return self.value;
        }
        let value = self.value + self.step * delta_ms / 60.0;
        self.value = if self.looping {
            value.rem_euclid(self.max)
        } else {
            if value >= self.max {
                self.running = false;
            }
            value.min(self.max)
        };
        self.value
    }
}

/// Two trigger spots on the track: passing `first` starts a boost, passing
/// `last` ends it shortly after.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostPanels {
    /// Track distance of the panel that starts the boost.
    pub first: f32,
    /// Track distance of the panel that ends it.
    pub last: f32,
    /// How close (in world units) the follower must come to a panel.
    pub trigger_radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowerPose {
    pub distance: f32,
    pub position: Vec2,
    pub heading: f32,
}

/// A vehicle driving the loop at an arc-length speed that eases towards its
/// target.
#[derive(Debug, Clone)]
pub struct TrackFollower {
    distance: f32,
    normal_speed: f32,
    boost_speed: f32,
    speed: f32,
    target_speed: f32,
    panels: Option<BoostPanels>,
    position: Vec2,
    boosted: bool,
    awaiting_boost_end: bool,
    boost_countdown_ms: f32,
}

impl TrackFollower {
    /// `speed` is in world units per second.
    pub fn new(speed: f32) -> Self {
        Self {
            distance: 0.0,
            normal_speed: speed,
            boost_speed: speed * BOOST_MULTIPLIER,
            speed,
            target_speed: speed,
            panels: None,
            position: Vec2::NAN,
            boosted: false,
            awaiting_boost_end: false,
            boost_countdown_ms: 0.0,
        }
    }

    pub fn with_panels(mut self, panels: BoostPanels) -> Self {
        self.panels = Some(panels);
        self
    }

    pub fn starting_at(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn target_speed(&self) -> f32 {
        self.target_speed
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn is_boosted(&self) -> bool {
        self.boosted
    }

    /// Advance by `delta_ms` along a loop whose lengths are in `table`.
    pub fn step(
        &mut self,
        points: &ControlPoints,
        table: &ArcLengthTable,
        delta_ms: f32,
    ) -> FollowerPose {
        if !self.position.is_finite() {
            self.position = self.locate(points, table, self.distance).0;
        }
        self.update_boost(points, table, delta_ms);
        self.ease_speed();

        let total = table.total();
        self.distance += self.speed * delta_ms / 1000.0;
        if total > 0.0 {
            self.distance = self.distance.rem_euclid(total);
        }

        let (position, heading) = self.locate(points, table, self.distance);
        self.position = position;
        FollowerPose {
            distance: self.distance,
            position,
            heading,
        }
    }

    fn update_boost(&mut self, points: &ControlPoints, table: &ArcLengthTable, delta_ms: f32) {
        if self.awaiting_boost_end && self.boost_countdown_ms > 0.0 {
            self.boost_countdown_ms -= delta_ms;
        }

        let Some(panels) = self.panels else {
            return;
        };
        let first = self.locate(points, table, panels.first).0;
        let last = self.locate(points, table, panels.last).0;

        if !self.boosted && self.position.distance(first) < panels.trigger_radius {
            debug!(distance = self.distance, "boost start");
            self.boosted = true;
            self.target_speed = self.boost_speed;
            self.boost_countdown_ms = 0.0;
            self.awaiting_boost_end = false;
        }

        // Re-arm once the previous countdown has run out.
        if self.boosted
            && self.position.distance(last) < panels.trigger_radius
            && (!self.awaiting_boost_end || self.boost_countdown_ms <= 0.0)
        {
            self.boost_countdown_ms = BOOST_HOLD_MS;
            self.awaiting_boost_end = true;
        }

        if self.boosted && self.awaiting_boost_end && self.boost_countdown_ms <= 0.0 {
            debug!(distance = self.distance, "boost end");
            self.boosted = false;
            self.target_speed = self.normal_speed;
            self.boost_countdown_ms = 0.0;
            self.awaiting_boost_end = false;
        }
    }

    fn ease_speed(&mut self) {
        self.speed += (self.target_speed - self.speed) * SPEED_LERP;
        if self.target_speed > self.normal_speed {
            self.speed = self.speed.min(self.target_speed);
        } else {
            self.speed = self.speed.max(self.target_speed);
        }
    }

    fn locate(&self, points: &ControlPoints, table: &ArcLengthTable, distance: f32) -> (Vec2, f32) {
        let pos = map_with_table(points, table, TrackParameter::Distance(distance));
        (pos.point, pos.heading())
    }
}
