//! Common ECS components

use glam::Vec2;

use crate::animation::{Curve, Interpolation, Keyframe, ease_in_out};

/// 2D transform in the creature's local (parent) space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    /// Local position
    pub position: Vec2,
    /// Scale factor; a negative X means the sprite faces left
    pub scale: Vec2,
}

impl Transform2D {
    /// Create a new transform at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Whether the sprite currently faces +X
    pub fn is_facing_right(&self) -> bool {
        self.scale.x >= 0.0
    }

    /// Mirror the sprite horizontally
    pub fn flip(&mut self) {
        self.scale.x = -self.scale.x;
    }

    /// Face -X
    pub fn turn_left(&mut self) {
        if self.is_facing_right() {
            self.flip();
        }
    }

    /// Face +X
    pub fn turn_right(&mut self) {
        if !self.is_facing_right() {
            self.flip();
        }
    }

    /// Face the horizontal direction of `target`. Equal X keeps the facing.
    pub fn face_towards(&mut self, target: Vec2) {
        if target.x < self.position.x {
            self.turn_left();
        } else if target.x > self.position.x {
            self.turn_right();
        }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
        }
    }
}

/// Gameplay stats of a creature
#[derive(Debug, Clone, PartialEq)]
pub struct Creature {
    /// Growth level
    pub level: u32,
    /// XP granted when eaten
    pub xp: u32,
    /// Movement speed factor
    pub speed: f32,
    /// Seconds to wait between idle trips
    pub time_between_movement: f32,
    /// Full width/height of the box an idle creature roams in
    pub movement_limit: Vec2,
}

impl Creature {
    /// Scale speed for a new player level
    pub fn apply_level_up(&mut self, player_level: u32) {
        let exponent = i32::try_from(player_level).unwrap_or(i32::MAX);
        self.speed *= 1.3_f32.powi(exponent);
    }
}

impl Default for Creature {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 1,
            speed: 1.0,
            time_between_movement: 1.0,
            movement_limit: Vec2::new(6.0, 1.0),
        }
    }
}

/// In-flight eased trip from one point to another
#[derive(Debug, Clone)]
pub struct Mover {
    from: Vec2,
    to: Vec2,
    elapsed: f32,
    steps: u32,
    curved: bool,
    moving: bool,
    /// Vertical offset added along long trips, sampled by elapsed time
    pub movement_curve: Curve,
}

impl Mover {
    /// Distance under which a trip counts as finished
    pub const ARRIVAL_DISTANCE: f32 = 0.1;
    /// Trips at least this long get the vertical bow
    pub const CURVE_DISTANCE: f32 = 1.0;
    /// Steps after which a trip is abandoned
    pub const MAX_STEPS: u32 = 1000;

    /// Create an idle mover
    pub fn new(movement_curve: Curve) -> Self {
        Self {
            from: Vec2::ZERO,
            to: Vec2::ZERO,
            elapsed: 0.0,
            steps: 0,
            curved: false,
            moving: false,
            movement_curve,
        }
    }

    /// Whether a trip is in progress
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Current trip goal
    pub fn destination(&self) -> Vec2 {
        self.to
    }

    /// Start a trip from the transform's position to `to`.
    ///
    /// Ignored while another trip is running. Returns whether the trip
    /// started.
    pub fn start(&mut self, transform: &mut Transform2D, to: Vec2) -> bool {
        if self.moving {
            return false;
        }

        self.from = transform.position;
        self.to = to;
        self.elapsed = 0.0;
        self.steps = 0;
        self.curved = self.from.distance(to) >= Self::CURVE_DISTANCE;
        self.moving = true;
        transform.face_towards(to);
        true
    }

    /// Advance the trip by one frame
    pub fn step(&mut self, transform: &mut Transform2D, speed: f32, delta: f32) {
        if !self.moving {
            return;
        }
        if transform.position.distance(self.to) <= Self::ARRIVAL_DISTANCE {
            self.moving = false;
            return;
        }

        let progress = ease_in_out(self.elapsed * speed);
        let mut position = self.from.lerp(self.to, progress);
        if self.curved {
            position.y += self.movement_curve.evaluate(self.elapsed);
        }
        transform.position = position;

        self.elapsed += delta;
        self.steps += 1;
        if self.steps > Self::MAX_STEPS {
            log::debug!("Abandoning trip to {:?} after {} steps", self.to, self.steps);
            self.moving = false;
        }
    }
}

impl Default for Mover {
    fn default() -> Self {
        // Small hump that returns to zero by the end of a one-second trip
        Self::new(Curve::new(
            vec![
                Keyframe::new(0.0, 0.0),
                Keyframe::new(0.5, 0.25),
                Keyframe::new(1.0, 0.0),
            ],
            Interpolation::CubicSpline,
        ))
    }
}

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_towards_flips_only_when_needed() {
        let mut transform = Transform2D::from_position(Vec2::new(1.0, 0.0));

        transform.face_towards(Vec2::new(3.0, 0.0));
        assert!(transform.is_facing_right());

        transform.face_towards(Vec2::new(-1.0, 5.0));
        assert!(!transform.is_facing_right());
        assert_eq!(transform.scale.x, -1.0);

        // Straight above: keep facing
        transform.face_towards(Vec2::new(1.0, 5.0));
        assert!(!transform.is_facing_right());
    }

    #[test]
    fn test_level_up_scales_speed() {
        let mut creature = Creature {
            speed: 1.0,
            ..Default::default()
        };
        creature.apply_level_up(2);
        assert!((creature.speed - 1.69).abs() < 1e-4);
    }

    #[test]
    fn test_huge_level_never_slows_down() {
        let mut creature = Creature {
            speed: 1.0,
            ..Default::default()
        };
        creature.apply_level_up(u32::MAX);
        assert!(creature.speed >= 1.0);
        assert!(creature.speed.is_infinite());
    }

    #[test]
    fn test_mover_reaches_destination() {
        let mut transform = Transform2D::new();
        let mut mover = Mover::new(Curve::constant(0.0));

        assert!(mover.start(&mut transform, Vec2::new(-2.0, 0.0)));
        assert!(!transform.is_facing_right());
        // A second start while moving is refused
        assert!(!mover.start(&mut transform, Vec2::new(5.0, 5.0)));

        for _ in 0..200 {
            mover.step(&mut transform, 1.0, 0.02);
        }

        assert!(!mover.is_moving());
        assert!(transform.position.distance(Vec2::new(-2.0, 0.0)) <= Mover::ARRIVAL_DISTANCE);
    }

    #[test]
    fn test_mover_gives_up_after_max_steps() {
        let mut transform = Transform2D::new();
        let mut mover = Mover::new(Curve::constant(0.0));
        mover.start(&mut transform, Vec2::new(10.0, 0.0));

        // Zero speed never makes progress
        for _ in 0..=Mover::MAX_STEPS {
            mover.step(&mut transform, 0.0, 0.016);
        }

        assert!(!mover.is_moving());
        assert_eq!(transform.position, Vec2::ZERO);
    }
}
