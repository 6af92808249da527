//! Interaction-round driver.
//!
//! A round walks `SelectLever → ChooseDirection → Predict → ShowResult`. The
//! session captures the derived triple before and after the single lever
//! mutation, grades the student's prediction against the direction of change
//! in cardiac output, and keeps running stats. Lever arrows persist across
//! rounds until the teacher resets them.

use crate::direction::{direction_of_change, direction_vs_baseline, Direction, EPSILON};
use crate::model::{
    AdvancedModel, Effect, Lever, ModelMode, Outputs, PathwayTones, PhysiologyState, BASELINE_MAX,
    BASELINE_MIN,
};
use crate::stats::SessionStats;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where the current round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RoundPhase {
    #[default]
    SelectLever,
    ChooseDirection,
    Predict,
    ShowResult,
}

impl RoundPhase {
    pub fn label(self) -> &'static str {
        match self {
            RoundPhase::SelectLever => "select_lever",
            RoundPhase::ChooseDirection => "choose_direction",
            RoundPhase::Predict => "predict",
            RoundPhase::ShowResult => "show_result",
        }
    }
}

/// One graded round, as shown on the feedback panel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoundOutcome {
    pub lever: Lever,
    pub effect: Effect,
    pub predicted: Direction,
    pub actual: Direction,
    pub correct: bool,
    pub before: Outputs,
    pub after: Outputs,
}

/// Owns the model state for one student sitting.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Session {
    pub state: PhysiologyState,
    pub mode: ModelMode,
    pub phase: RoundPhase,
    pub stats: SessionStats,
    pub last_outcome: Option<RoundOutcome>,

    pending_lever: Option<Lever>,
    pending_effect: Option<Effect>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_mode(ModelMode::Basic)
    }

    pub fn with_mode(mode: ModelMode) -> Self {
        Self {
            state: PhysiologyState::new(),
            mode,
            phase: RoundPhase::SelectLever,
            stats: SessionStats::new(),
            last_outcome: None,
            pending_lever: None,
            pending_effect: None,
        }
    }

    /// Derived triple for the current lever state under the active strategy.
    pub fn outputs(&self) -> Outputs {
        self.mode.compute(&self.state)
    }

    /// Downstream HR / SV / CO arrows relative to the resting baselines.
    /// Glyphs come from the same [`Effect`] mapping the lever boxes use.
    pub fn arrows(&self) -> [&'static str; 3] {
        let base = self.state.baseline_outputs();
        let out = self.outputs();
        [
            (out.heart_rate, base.heart_rate),
            (out.stroke_volume, base.stroke_volume),
            (out.cardiac_output, base.cardiac_output),
        ]
        .map(|(value, baseline)| {
            Effect::from_sign(direction_vs_baseline(value, baseline, EPSILON)).arrow()
        })
    }

    /// Intermediate autonomic tones, advanced mode only.
    pub fn pathway(&self) -> Option<PathwayTones> {
        match self.mode {
            ModelMode::Advanced => Some(AdvancedModel.pathway(&self.state)),
            ModelMode::Basic => None,
        }
    }

    /// Teacher surface: baselines are clamped to the configuration range here,
    /// not in the compute step.
    pub fn set_baselines(&mut self, hr: f64, sv: f64) {
        self.state.hr_baseline = hr.clamp(BASELINE_MIN, BASELINE_MAX);
        self.state.sv_baseline = sv.clamp(BASELINE_MIN, BASELINE_MAX);
    }

    /// Switch strategies. The lever sets are incompatible, so the round and
    /// all arrows restart.
    pub fn set_mode(&mut self, mode: ModelMode) {
        self.mode = mode;
        self.reset_round();
    }

    /// Start (or restart) a round on the given lever. Allowed in any phase;
    /// clicking a new box abandons an unfinished round.
    pub fn select_lever(&mut self, lever: Lever) {
        self.pending_lever = Some(lever);
        self.pending_effect = None;
        self.phase = RoundPhase::ChooseDirection;
    }

    /// Choose ↑ or ↓ for the selected lever. Returns false when no lever is
    /// selected yet.
    pub fn choose_direction(&mut self, effect: Effect) -> bool {
        if self.pending_lever.is_none() {
            return false;
        }
        self.pending_effect = Some(effect);
        self.phase = RoundPhase::Predict;
        true
    }

    /// Grade the student's prediction: capture the triple, apply the pending
    /// lever mutation, recompute, compare directions of cardiac output.
    ///
    /// Returns `None` until both a lever and a direction have been chosen
    /// ("Make a prediction first").
    pub fn predict(&mut self, predicted: Direction) -> Option<RoundOutcome> {
        let lever = self.pending_lever?;
        let effect = self.pending_effect?;

        let before = self.outputs();
        self.state.set_effect(lever, effect);
        let after = self.outputs();

        let actual = direction_of_change(before.cardiac_output, after.cardiac_output, EPSILON);
        let correct = actual == predicted;
        self.stats.record_round(lever, correct);

        let outcome = RoundOutcome {
            lever,
            effect,
            predicted,
            actual,
            correct,
            before,
            after,
        };
        self.last_outcome = Some(outcome);
        self.pending_lever = None;
        self.pending_effect = None;
        self.phase = RoundPhase::ShowResult;
        Some(outcome)
    }

    /// "Where did you get confused?" choices for the feedback panel. Present
    /// only while an incorrect result is showing.
    pub fn confusion_topics(&self) -> Option<&'static [&'static str]> {
        match self.last_outcome {
            Some(outcome) if !outcome.correct && self.phase == RoundPhase::ShowResult => {
                Some(outcome.lever.confusion_topics())
            }
            _ => None,
        }
    }

    /// Record the student's answer to the confusion prompt, by index into
    /// [`Session::confusion_topics`]. Returns false when nothing is being
    /// asked or the index is out of range.
    pub fn report_confusion(&mut self, topic_index: usize) -> bool {
        let (lever, topic) = match (self.confusion_topics(), self.last_outcome) {
            (Some(topics), Some(outcome)) => match topics.get(topic_index) {
                Some(topic) => (outcome.lever, *topic),
                None => return false,
            },
            _ => return false,
        };
        self.stats.record_confusion(lever, topic);
        true
    }

    /// Move on without touching the arrows.
    pub fn next_round(&mut self) {
        self.pending_lever = None;
        self.pending_effect = None;
        self.phase = RoundPhase::SelectLever;
    }

    /// Teacher surface: all arrows back to "—", baselines and stats kept.
    pub fn reset_round(&mut self) {
        self.state.reset_round();
        self.next_round();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1.0e-6
    }

    #[test]
    fn full_round_grades_a_correct_prediction() {
        let mut s = Session::new();
        assert_eq!(s.phase, RoundPhase::SelectLever);

        s.select_lever(Lever::ChronoPos);
        assert_eq!(s.phase, RoundPhase::ChooseDirection);
        assert!(s.choose_direction(Effect::Up));
        assert_eq!(s.phase, RoundPhase::Predict);

        let outcome = s.predict(Direction::Increase).unwrap();
        assert_eq!(s.phase, RoundPhase::ShowResult);
        assert!(outcome.correct);
        assert_eq!(outcome.actual, Direction::Increase);
        assert!(close(outcome.before.cardiac_output, 4.9));
        assert!(close(outcome.after.cardiac_output, 5.488));
        assert_eq!(s.stats.correct, 1);
    }

    #[test]
    fn wrong_prediction_is_a_normal_outcome() {
        let mut s = Session::new();
        s.select_lever(Lever::Afterload);
        s.choose_direction(Effect::Up);
        let outcome = s.predict(Direction::Increase).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.actual, Direction::Decrease);
        assert!(close(outcome.after.cardiac_output, 4.312));
        assert_eq!(s.stats.incorrect, 1);
    }

    #[test]
    fn predict_requires_a_selected_lever_and_direction() {
        let mut s = Session::new();
        assert!(s.predict(Direction::Increase).is_none());
        assert!(!s.choose_direction(Effect::Up));

        s.select_lever(Lever::InoPos);
        assert!(s.predict(Direction::Increase).is_none());
        assert_eq!(s.stats.rounds, 0);
    }

    #[test]
    fn arrows_follow_the_lever_state_across_rounds() {
        let mut s = Session::new();
        assert_eq!(s.arrows(), ["—", "—", "—"]);

        s.select_lever(Lever::ChronoPos);
        s.choose_direction(Effect::Up);
        s.predict(Direction::Increase);
        assert_eq!(s.arrows(), ["↑", "—", "↑"]);

        // The arrow persists into the next round until a reset.
        s.next_round();
        assert_eq!(s.arrows(), ["↑", "—", "↑"]);

        s.reset_round();
        assert_eq!(s.arrows(), ["—", "—", "—"]);
        assert_eq!(s.outputs(), s.state.baseline_outputs());
    }

    #[test]
    fn baselines_clamp_at_the_teacher_surface() {
        let mut s = Session::new();
        s.set_baselines(20.0, 300.0);
        assert_eq!(s.state.hr_baseline, BASELINE_MIN);
        assert_eq!(s.state.sv_baseline, BASELINE_MAX);
    }

    #[test]
    fn advanced_mode_round_uses_the_pathway() {
        let mut s = Session::new();
        s.set_mode(ModelMode::Advanced);
        assert!(s.pathway().is_some());

        s.select_lever(Lever::Exercise);
        s.choose_direction(Effect::Up);
        let outcome = s.predict(Direction::Increase).unwrap();
        assert!(outcome.correct);
        assert!(close(outcome.after.heart_rate, 78.4));
        assert!(close(outcome.after.stroke_volume, 78.4));
    }

    #[test]
    fn confusion_prompt_only_follows_an_incorrect_result() {
        let mut s = Session::new();

        // A correct round never asks.
        s.select_lever(Lever::ChronoPos);
        s.choose_direction(Effect::Up);
        s.predict(Direction::Increase);
        assert!(s.confusion_topics().is_none());
        assert!(!s.report_confusion(0));

        // Afterload ↑ drops CO; a wrong prediction opens the prompt with the
        // afterload topics.
        s.next_round();
        s.select_lever(Lever::Afterload);
        s.choose_direction(Effect::Up);
        let outcome = s.predict(Direction::Increase).unwrap();
        assert!(!outcome.correct);

        let topics = s.confusion_topics().unwrap();
        assert_eq!(topics, Lever::Afterload.confusion_topics());
        assert_eq!(topics[0], "Afterload → SV (inverse)");

        assert!(!s.report_confusion(topics.len()));
        assert!(s.report_confusion(0));
        assert_eq!(s.stats.confusions.len(), 1);
        assert_eq!(s.stats.confusions[0].lever, Lever::Afterload);
        assert_eq!(s.stats.confusions[0].topic, "Afterload → SV (inverse)");

        // Starting the next round closes the prompt.
        s.next_round();
        assert!(s.confusion_topics().is_none());
    }

    #[test]
    fn stats_break_down_by_lever() {
        let mut s = Session::new();
        for predicted in [Direction::Increase, Direction::Decrease, Direction::Increase] {
            s.select_lever(Lever::Afterload);
            s.choose_direction(Effect::Up);
            s.predict(predicted);
            s.reset_round();
        }
        let tally = s.stats.tally(Lever::Afterload).unwrap();
        assert_eq!(tally.attempts(), 3);
        assert_eq!(tally.correct, 1);
        assert_eq!(tally.incorrect, 2);
        assert_eq!(s.stats.weakest_lever(), Some(Lever::Afterload));
    }

    #[test]
    fn downward_change_renders_down_arrows() {
        let mut s = Session::new();
        s.select_lever(Lever::Afterload);
        s.choose_direction(Effect::Up);
        s.predict(Direction::Decrease);
        assert_eq!(s.arrows(), ["—", "↓", "↓"]);
    }

    #[test]
    fn mode_switch_restarts_the_round() {
        let mut s = Session::new();
        s.select_lever(Lever::VenousReturn);
        s.choose_direction(Effect::Up);
        s.predict(Direction::Increase);

        s.set_mode(ModelMode::Advanced);
        assert_eq!(s.phase, RoundPhase::SelectLever);
        assert_eq!(s.arrows(), ["—", "—", "—"]);
    }
}
