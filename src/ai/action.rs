//! Per-tick actions run by state nodes

use std::fmt;

use glam::Vec2;
use rand::Rng;

use super::controller::StateContext;
use super::decision::WANDER_COUNT_KEY;
use crate::animation::Curve;

/// Behavior executed every tick while its node is active
pub trait StateAction: fmt::Debug {
    /// Run once for the controller in `ctx`
    fn on_update(&self, ctx: &mut StateContext<'_>);
}

/// Memory key of the current wander destination (`Option<Vec2>`)
pub const DESTINATION_KEY: &str = "CurrentDestination";

/// Memory key of the time spent on the current wander leg
pub const MOVEMENT_TIME_KEY: &str = "MovementTimeElapsed";

/// Memory key marking that wander memory was set up
pub const WANDER_INIT_KEY: &str = "isInitialized";

/// Roams between random nearby points on eased, slightly bowed paths.
///
/// Each arrival bumps the wander counter read by
/// [`WanderingCounter`](super::WanderingCounter).
#[derive(Debug, Clone, PartialEq)]
pub struct WanderAction {
    /// Vertical bow sampled by leg time, scaled by `curve_intensity`
    pub curve: Curve,
    /// Strength of the bow
    pub curve_intensity: f32,
    /// Leg time to lerp factor, scaled by the body's speed
    pub easing: Curve,
    /// Horizontal reach around the current position
    pub radius_x: f32,
    /// Vertical reach around the current position
    pub radius_y: f32,
}

impl WanderAction {
    /// Distance at which a destination counts as reached
    pub const ARRIVAL_RADIUS: f32 = 0.5;

    /// Wander with default curves inside the given radii
    #[must_use]
    pub fn new(radius_x: f32, radius_y: f32) -> Self {
        Self {
            radius_x,
            radius_y,
            ..Self::default()
        }
    }

    /// Replace the bow curve and its intensity
    #[must_use]
    pub fn with_curve(mut self, curve: Curve, intensity: f32) -> Self {
        self.curve = curve;
        self.curve_intensity = intensity.clamp(0.0, 1.0);
        self
    }

    /// Replace the easing curve
    #[must_use]
    pub fn with_easing(mut self, easing: Curve) -> Self {
        self.easing = easing;
        self
    }

    fn initialize(&self, ctx: &mut StateContext<'_>) {
        if ctx.controller.get_data::<bool>(WANDER_INIT_KEY) {
            return;
        }

        ctx.controller.set_data::<Option<Vec2>>(DESTINATION_KEY, None);
        ctx.controller.set_data(MOVEMENT_TIME_KEY, 0.0_f32);
        ctx.controller.set_data(WANDER_INIT_KEY, true);
        ctx.controller.set_data(WANDER_COUNT_KEY, 0_i32);
    }

    /// Distance to the destination, `0.0` when there is none.
    ///
    /// Reaching the destination counts a completion and clears it.
    fn distance_to_destination(&self, ctx: &mut StateContext<'_>) -> f32 {
        let Some(destination) = ctx.controller.get_data::<Option<Vec2>>(DESTINATION_KEY) else {
            return 0.0;
        };

        let distance = ctx.body.local_position().distance(destination);
        if distance <= Self::ARRIVAL_RADIUS {
            let completed: i32 = ctx.controller.get_data(WANDER_COUNT_KEY);
            ctx.controller.set_data(WANDER_COUNT_KEY, completed + 1);
            self.clear_destination(ctx);
        }
        distance
    }

    fn pick_destination(&self, ctx: &mut StateContext<'_>) {
        let (rx, ry) = (self.radius_x.abs(), self.radius_y.abs());
        let offset = Vec2::new(ctx.rng.gen_range(-rx..=rx), ctx.rng.gen_range(-ry..=ry));
        let destination = ctx.body.local_position() + offset;

        ctx.controller.set_data(DESTINATION_KEY, Some(destination));
        ctx.controller.set_data(MOVEMENT_TIME_KEY, 0.0_f32);
        ctx.body.face_towards(destination);
    }

    fn clear_destination(&self, ctx: &mut StateContext<'_>) {
        ctx.controller.set_data::<Option<Vec2>>(DESTINATION_KEY, None);
        ctx.controller.set_data(MOVEMENT_TIME_KEY, 0.0_f32);
    }

    fn move_towards(&self, ctx: &mut StateContext<'_>) {
        let Some(destination) = ctx.controller.get_data::<Option<Vec2>>(DESTINATION_KEY) else {
            return;
        };
        let elapsed: f32 = ctx.controller.get_data(MOVEMENT_TIME_KEY);

        let current = ctx.body.local_position();
        let progress = self.easing.evaluate(elapsed) * ctx.body.speed();
        let mut next = current.lerp(destination, progress);

        // Bow away from the direction of travel on Y
        let bow = self.curve.evaluate(elapsed) * self.curve_intensity;
        if destination.y >= current.y {
            next.y -= bow;
        } else {
            next.y += bow;
        }

        ctx.body.set_local_position(next);
        ctx.controller
            .set_data(MOVEMENT_TIME_KEY, elapsed + ctx.time.delta_seconds());
    }
}

impl Default for WanderAction {
    fn default() -> Self {
        Self {
            curve: Curve::constant(0.0),
            curve_intensity: 0.05,
            easing: Curve::ease_in_out(0.0, 0.0, 1.0, 1.0),
            radius_x: 1.0,
            radius_y: 1.0,
        }
    }
}

impl StateAction for WanderAction {
    fn on_update(&self, ctx: &mut StateContext<'_>) {
        self.initialize(ctx);

        if self.distance_to_destination(ctx) <= Self::ARRIVAL_RADIUS {
            self.pick_destination(ctx);
        }

        self.move_towards(ctx);
    }
}
