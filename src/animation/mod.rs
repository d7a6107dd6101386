//! Animation curves
//!
//! Keyframed scalar curves used for eased and bowed movement.

mod curve;

pub use curve::{Curve, Interpolation, Keyframe, ease_in_out};
