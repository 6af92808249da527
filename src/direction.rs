//! Direction-of-change classification and prediction grading.
//!
//! A change smaller than [`EPSILON`] in magnitude counts as "No change"; the
//! same tolerance backs the arrow glyphs drawn for the downstream HR/SV/CO
//! boxes. Everything here is total over finite inputs.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default comparison tolerance.
pub const EPSILON: f64 = 1.0e-6;

/// Categorical direction of change, as offered to the student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    Increase,
    Decrease,
    NoChange,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Increase, Direction::Decrease, Direction::NoChange];

    /// Label as shown on the prediction radio buttons.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Increase => "Increase",
            Direction::Decrease => "Decrease",
            Direction::NoChange => "No change",
        }
    }

    /// Parse a user-supplied label. Accepts the display labels plus the
    /// compact forms used on the wire ("increase", "nochange", ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Increase" | "increase" => Some(Direction::Increase),
            "Decrease" | "decrease" => Some(Direction::Decrease),
            "No change" | "no change" | "nochange" => Some(Direction::NoChange),
            _ => None,
        }
    }
}

/// Classify `after` relative to `before` with tolerance `eps`.
pub fn direction_of_change(before: f64, after: f64, eps: f64) -> Direction {
    let delta = after - before;
    if delta >= eps {
        Direction::Increase
    } else if delta <= -eps {
        Direction::Decrease
    } else {
        Direction::NoChange
    }
}

/// Signed comparison against a baseline: +1 above, -1 below, 0 within `eps`.
/// Feeds arrow-glyph rendering (via [`crate::model::Effect::from_sign`])
/// rather than grading.
pub fn direction_vs_baseline(value: f64, baseline: f64, eps: f64) -> i8 {
    match direction_of_change(baseline, value, eps) {
        Direction::Increase => 1,
        Direction::Decrease => -1,
        Direction::NoChange => 0,
    }
}

/// The one business rule: a prediction is correct iff it exactly matches the
/// graded direction of change (default tolerance).
pub fn grade_prediction(predicted: Direction, before: f64, after: f64) -> bool {
    direction_of_change(before, after, EPSILON) == predicted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_values_are_no_change() {
        for x in [0.0, 4.9, -3.25, 180.0] {
            assert_eq!(direction_of_change(x, x, EPSILON), Direction::NoChange);
        }
    }

    #[test]
    fn epsilon_bounds_the_dead_band() {
        assert_eq!(
            direction_of_change(4.9, 4.9 + 5.0e-7, EPSILON),
            Direction::NoChange
        );
        assert_eq!(
            direction_of_change(4.9, 4.9 + 2.0e-6, EPSILON),
            Direction::Increase
        );
        assert_eq!(
            direction_of_change(4.9, 4.9 - 2.0e-6, EPSILON),
            Direction::Decrease
        );
    }

    #[test]
    fn baseline_comparison_matches_signs() {
        assert_eq!(direction_vs_baseline(78.4, 70.0, EPSILON), 1);
        assert_eq!(direction_vs_baseline(61.6, 70.0, EPSILON), -1);
        assert_eq!(direction_vs_baseline(70.0, 70.0, EPSILON), 0);
    }

    #[test]
    fn grading_is_exact_match() {
        assert!(grade_prediction(Direction::Decrease, 4.9, 4.312));
        assert!(!grade_prediction(Direction::Increase, 4.9, 4.312));
        assert!(grade_prediction(Direction::Increase, 4.9, 5.488));
        assert!(grade_prediction(Direction::NoChange, 4.9, 4.9));
    }

    #[test]
    fn labels_round_trip() {
        for d in Direction::ALL {
            assert_eq!(Direction::from_label(d.label()), Some(d));
        }
        assert_eq!(Direction::from_label("nochange"), Some(Direction::NoChange));
        assert_eq!(Direction::from_label("sideways"), None);
    }
}
