//! Keyframed scalar curves
//!
//! Curves drive eased movement: an easing curve maps elapsed time to a
//! lerp factor, and a bow curve adds a vertical offset to a path.

use serde::{Deserialize, Serialize};

/// Interpolation method for keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    /// Linear interpolation
    Linear,
    /// Step/discrete (no interpolation)
    Step,
    /// Hermite spline through the keyframe tangents
    #[default]
    CubicSpline,
}

/// A single keyframe with timestamp and value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds
    pub time: f32,
    /// Value at this keyframe
    pub value: f32,
    /// Incoming slope (0 when absent)
    #[serde(default)]
    pub in_tangent: Option<f32>,
    /// Outgoing slope (0 when absent)
    #[serde(default)]
    pub out_tangent: Option<f32>,
}

impl Keyframe {
    /// Create a new keyframe with flat tangents
    #[must_use]
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: None,
            out_tangent: None,
        }
    }

    /// Create a keyframe with explicit tangents
    #[must_use]
    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: Some(in_tangent),
            out_tangent: Some(out_tangent),
        }
    }
}

/// A scalar curve sampled by time.
///
/// Sampling before the first key or after the last key clamps to the end
/// values. An empty curve evaluates to `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Keys sorted by time
    pub keys: Vec<Keyframe>,
    /// Interpolation between keys
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl Curve {
    /// Build a curve, sorting the keys by time
    #[must_use]
    pub fn new(mut keys: Vec<Keyframe>, interpolation: Interpolation) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self {
            keys,
            interpolation,
        }
    }

    /// Curve that always evaluates to `value`
    #[must_use]
    pub fn constant(value: f32) -> Self {
        Self::new(vec![Keyframe::new(0.0, value)], Interpolation::Step)
    }

    /// Straight line between two keys
    #[must_use]
    pub fn linear(time_start: f32, value_start: f32, time_end: f32, value_end: f32) -> Self {
        Self::new(
            vec![
                Keyframe::new(time_start, value_start),
                Keyframe::new(time_end, value_end),
            ],
            Interpolation::Linear,
        )
    }

    /// Smooth S-curve between two keys with flat tangents
    #[must_use]
    pub fn ease_in_out(time_start: f32, value_start: f32, time_end: f32, value_end: f32) -> Self {
        Self::new(
            vec![
                Keyframe::new(time_start, value_start),
                Keyframe::new(time_end, value_end),
            ],
            Interpolation::CubicSpline,
        )
    }

    /// Duration covered by the keys
    #[must_use]
    pub fn duration(&self) -> f32 {
        match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }

    /// Sample the curve at `time`
    #[must_use]
    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };

        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        for pair in self.keys.windows(2) {
            let (k0, k1) = (&pair[0], &pair[1]);
            if time >= k0.time && time < k1.time {
                let dt = k1.time - k0.time;
                let t = (time - k0.time) / dt;
                return match self.interpolation {
                    Interpolation::Step => k0.value,
                    Interpolation::Linear => k0.value + (k1.value - k0.value) * t,
                    Interpolation::CubicSpline => {
                        let t2 = t * t;
                        let t3 = t2 * t;
                        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
                        let h10 = t3 - 2.0 * t2 + t;
                        let h01 = -2.0 * t3 + 3.0 * t2;
                        let h11 = t3 - t2;

                        let out_tan = k0.out_tangent.unwrap_or(0.0);
                        let in_tan = k1.in_tangent.unwrap_or(0.0);

                        k0.value * h00 + out_tan * dt * h10 + k1.value * h01 + in_tan * dt * h11
                    }
                };
            }
        }

        last.value
    }
}

impl Default for Curve {
    fn default() -> Self {
        Self::ease_in_out(0.0, 0.0, 1.0, 1.0)
    }
}

/// Eased 0..1 progress for a raw 0..1 percentage.
///
/// Input is clamped first. The ends carry a slight slope so movement never
/// stalls completely at the start of a trip.
#[must_use]
pub fn ease_in_out(percentage: f32) -> f32 {
    let p = percentage.clamp(0.0, 1.0);

    // Hermite between (0,0) and (1,1) with tangents of 0.05
    let (p2, p3) = (p * p, p * p * p);
    let tangent = 0.05;
    (p3 - 2.0 * p2 + p) * tangent + (-2.0 * p3 + 3.0 * p2) + (p3 - p2) * tangent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_curve_endpoints_and_midpoint() {
        let curve = Curve::default();

        assert_eq!(curve.evaluate(-1.0), 0.0);
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(2.0), 1.0);
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-5);
        // Slow start
        assert!(curve.evaluate(0.1) < 0.1);
    }

    #[test]
    fn test_linear_curve_sampling() {
        let curve = Curve::linear(0.0, 0.0, 2.0, 10.0);
        assert!((curve.evaluate(0.5) - 2.5).abs() < 1e-5);
        assert!((curve.duration() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_step_and_constant_curves() {
        let step = Curve::new(
            vec![Keyframe::new(1.0, 3.0), Keyframe::new(0.0, 1.0)],
            Interpolation::Step,
        );
        // Keys were sorted on construction
        assert_eq!(step.evaluate(0.5), 1.0);
        assert_eq!(step.evaluate(1.5), 3.0);

        assert_eq!(Curve::constant(0.25).evaluate(42.0), 0.25);
        assert_eq!(Curve::new(Vec::new(), Interpolation::Linear).evaluate(1.0), 0.0);
    }

    #[test]
    fn test_ease_in_out_clamps() {
        assert_eq!(ease_in_out(-0.5), 0.0);
        assert!((ease_in_out(1.5) - 1.0).abs() < 1e-6);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_curve_ron_round_trip() {
        let curve = Curve::new(
            vec![Keyframe::with_tangents(0.0, 0.0, 0.0, 1.0), Keyframe::new(1.0, 0.0)],
            Interpolation::CubicSpline,
        );
        let text = ron::ser::to_string(&curve).unwrap();
        let loaded: Curve = ron::from_str(&text).unwrap();
        assert_eq!(loaded, curve);
    }
}
