//! Physiology state and the compute strategies.
//!
//! The teaching model is `CO = HR × SV`. Discrete lever settings (↑ / — / ↓)
//! scale the configured baselines by a fixed 12% step per unit of net effect,
//! and the derived rates are clamped to plausible teaching ranges.
//!
//! Two interchangeable strategies produce the derived triple:
//! - [`BasicModel`]: six pharmacology/hemodynamics levers plus optional direct
//!   HR/SV overrides.
//! - [`AdvancedModel`]: a two-stimulus autonomic pathway (exercise and blood
//!   pressure) driving sympathetic/parasympathetic tone.
//!
//! This module is intentionally `no_std` friendly (no `Instant`, no `Vec`, no
//! `String`).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fractional change per unit of net lever effect (12%).
pub const EFFECT_STEP: f64 = 0.12;

/// Heart rate clamp range, beats per minute.
pub const HR_MIN: f64 = 30.0;
pub const HR_MAX: f64 = 180.0;

/// Stroke volume clamp range, teaching units (mL per beat).
pub const SV_MIN: f64 = 30.0;
pub const SV_MAX: f64 = 140.0;

/// Default resting baseline for both HR and SV.
pub const DEFAULT_BASELINE: f64 = 70.0;

/// Range the teacher-configuration surface accepts for baselines.
/// The compute step itself does not enforce this.
pub const BASELINE_MIN: f64 = 40.0;
pub const BASELINE_MAX: f64 = 120.0;

/// One discrete lever setting: decreased, unchanged, or increased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Effect {
    Down,
    #[default]
    Neutral,
    Up,
}

impl Effect {
    pub const ALL: [Effect; 3] = [Effect::Down, Effect::Neutral, Effect::Up];

    /// Signed unit value used by the arithmetic: -1, 0, or +1.
    pub fn value(self) -> f64 {
        match self {
            Effect::Down => -1.0,
            Effect::Neutral => 0.0,
            Effect::Up => 1.0,
        }
    }

    /// Arrow glyph shown in the flow-chart boxes.
    pub fn arrow(self) -> &'static str {
        match self {
            Effect::Down => "↓",
            Effect::Neutral => "—",
            Effect::Up => "↑",
        }
    }

    pub fn from_sign(sign: i8) -> Self {
        if sign > 0 {
            Effect::Up
        } else if sign < 0 {
            Effect::Down
        } else {
            Effect::Neutral
        }
    }
}

/// The closed set of interactive levers.
///
/// The first six belong to the basic flow chart; `HrDirect`/`SvDirect` are the
/// direct-override boxes some chart variants add; `Exercise`/`BloodPressure`
/// are the stimuli of the advanced autonomic pathway. Each strategy reads the
/// subset it understands and ignores the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Lever {
    ChronoPos,
    ChronoNeg,
    InoPos,
    InoNeg,
    VenousReturn,
    Afterload,
    HrDirect,
    SvDirect,
    Exercise,
    BloodPressure,
}

impl Lever {
    pub const ALL: [Lever; 10] = [
        Lever::ChronoPos,
        Lever::ChronoNeg,
        Lever::InoPos,
        Lever::InoNeg,
        Lever::VenousReturn,
        Lever::Afterload,
        Lever::HrDirect,
        Lever::SvDirect,
        Lever::Exercise,
        Lever::BloodPressure,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Lever::ChronoPos => "chrono_pos",
            Lever::ChronoNeg => "chrono_neg",
            Lever::InoPos => "ino_pos",
            Lever::InoNeg => "ino_neg",
            Lever::VenousReturn => "venous_return",
            Lever::Afterload => "afterload",
            Lever::HrDirect => "hr_direct",
            Lever::SvDirect => "sv_direct",
            Lever::Exercise => "exercise",
            Lever::BloodPressure => "blood_pressure",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Lever::ALL.into_iter().find(|l| l.label() == label)
    }

    /// Human-readable box title, matching the flow-chart cells.
    pub fn title(self) -> &'static str {
        match self {
            Lever::ChronoPos => "Positive chronotropic agents",
            Lever::ChronoNeg => "Negative chronotropic agents",
            Lever::InoPos => "Positive inotropic agents",
            Lever::InoNeg => "Negative inotropic agents",
            Lever::VenousReturn => "Venous return (preload)",
            Lever::Afterload => "Afterload",
            Lever::HrDirect => "Heart rate (direct)",
            Lever::SvDirect => "Stroke volume (direct)",
            Lever::Exercise => "Exercise",
            Lever::BloodPressure => "Blood pressure",
        }
    }

    /// One-line physiology blurb shown under the box title.
    pub fn description(self) -> &'static str {
        match self {
            Lever::ChronoPos => "Increase SA/AV node activity.",
            Lever::ChronoNeg => "Decrease SA/AV node activity.",
            Lever::InoPos => "Increase myocardial contractility.",
            Lever::InoNeg => "Decrease myocardial contractility.",
            Lever::VenousReturn => "More blood returning → more stretch → higher SV.",
            Lever::Afterload => "Higher arterial resistance makes ejection harder → lower SV.",
            Lever::HrDirect => "Directly raise or lower beats per minute.",
            Lever::SvDirect => "Directly raise or lower blood pumped per beat.",
            Lever::Exercise => "Physical activity raises sympathetic drive and venous return.",
            Lever::BloodPressure => "Arterial pressure sensed by the baroreflex.",
        }
    }

    /// "Where did you get confused?" choices offered after an incorrect
    /// prediction on this lever.
    pub fn confusion_topics(self) -> &'static [&'static str] {
        match self {
            Lever::ChronoPos => &[
                "How positive chronotropes affect HR",
                "How HR affects CO",
                "How SV affects CO",
                "Not sure / other",
            ],
            Lever::ChronoNeg => &[
                "How negative chronotropes affect HR",
                "How HR affects CO",
                "How SV affects CO",
                "Not sure / other",
            ],
            Lever::InoPos => &[
                "How positive inotropes affect SV",
                "How SV affects CO",
                "Not sure / other",
            ],
            Lever::InoNeg => &[
                "How negative inotropes affect SV",
                "How SV affects CO",
                "Not sure / other",
            ],
            Lever::VenousReturn => &[
                "Frank–Starling / preload → SV",
                "How SV affects CO",
                "Not sure / other",
            ],
            Lever::Afterload => &[
                "Afterload → SV (inverse)",
                "How SV affects CO",
                "Not sure / other",
            ],
            Lever::HrDirect => &["How HR affects CO", "Not sure / other"],
            Lever::SvDirect => &["How SV affects CO", "Not sure / other"],
            Lever::Exercise => &[
                "Exercise → sympathetic tone",
                "How HR affects CO",
                "How SV affects CO",
                "Not sure / other",
            ],
            Lever::BloodPressure => &[
                "Baroreflex → parasympathetic tone",
                "How HR affects CO",
                "Not sure / other",
            ],
        }
    }
}

/// Caller-owned model state: two teacher-configured baselines plus one
/// discrete effect per lever. Derived rates are never stored here.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhysiologyState {
    pub hr_baseline: f64,
    pub sv_baseline: f64,

    pub chrono_pos: Effect,
    pub chrono_neg: Effect,
    pub ino_pos: Effect,
    pub ino_neg: Effect,
    pub venous_return: Effect,
    pub afterload: Effect,
    pub hr_direct: Effect,
    pub sv_direct: Effect,

    pub exercise: Effect,
    pub blood_pressure: Effect,
}

impl Default for PhysiologyState {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysiologyState {
    /// Default baselines (70 / 70), every lever at "—".
    pub fn new() -> Self {
        Self::with_baselines(DEFAULT_BASELINE, DEFAULT_BASELINE)
    }

    pub fn with_baselines(hr_baseline: f64, sv_baseline: f64) -> Self {
        Self {
            hr_baseline,
            sv_baseline,
            chrono_pos: Effect::Neutral,
            chrono_neg: Effect::Neutral,
            ino_pos: Effect::Neutral,
            ino_neg: Effect::Neutral,
            venous_return: Effect::Neutral,
            afterload: Effect::Neutral,
            hr_direct: Effect::Neutral,
            sv_direct: Effect::Neutral,
            exercise: Effect::Neutral,
            blood_pressure: Effect::Neutral,
        }
    }

    pub fn effect(&self, lever: Lever) -> Effect {
        match lever {
            Lever::ChronoPos => self.chrono_pos,
            Lever::ChronoNeg => self.chrono_neg,
            Lever::InoPos => self.ino_pos,
            Lever::InoNeg => self.ino_neg,
            Lever::VenousReturn => self.venous_return,
            Lever::Afterload => self.afterload,
            Lever::HrDirect => self.hr_direct,
            Lever::SvDirect => self.sv_direct,
            Lever::Exercise => self.exercise,
            Lever::BloodPressure => self.blood_pressure,
        }
    }

    pub fn set_effect(&mut self, lever: Lever, effect: Effect) {
        match lever {
            Lever::ChronoPos => self.chrono_pos = effect,
            Lever::ChronoNeg => self.chrono_neg = effect,
            Lever::InoPos => self.ino_pos = effect,
            Lever::InoNeg => self.ino_neg = effect,
            Lever::VenousReturn => self.venous_return = effect,
            Lever::Afterload => self.afterload = effect,
            Lever::HrDirect => self.hr_direct = effect,
            Lever::SvDirect => self.sv_direct = effect,
            Lever::Exercise => self.exercise = effect,
            Lever::BloodPressure => self.blood_pressure = effect,
        }
    }

    /// Zero every lever back to "—". Baselines are untouched.
    pub fn reset_round(&mut self) {
        for lever in Lever::ALL {
            self.set_effect(lever, Effect::Neutral);
        }
    }

    /// The derived triple with every lever at "—": `(hr0, sv0, hr0*sv0/1000)`.
    pub fn baseline_outputs(&self) -> Outputs {
        Outputs::from_rates(self.hr_baseline, self.sv_baseline)
    }
}

/// Derived rates. Always recomputed, `cardiac_output` is never stored
/// independently of the other two.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Outputs {
    pub heart_rate: f64,
    pub stroke_volume: f64,
    pub cardiac_output: f64,
}

impl Outputs {
    fn from_rates(heart_rate: f64, stroke_volume: f64) -> Self {
        Self {
            heart_rate,
            stroke_volume,
            cardiac_output: heart_rate * stroke_volume / 1000.0,
        }
    }

    fn clamped(heart_rate: f64, stroke_volume: f64) -> Self {
        Self::from_rates(
            heart_rate.clamp(HR_MIN, HR_MAX),
            stroke_volume.clamp(SV_MIN, SV_MAX),
        )
    }
}

/// A pure, total mapping from lever state to derived rates.
pub trait PhysiologyModel {
    fn compute(&self, state: &PhysiologyState) -> Outputs;
}

/// Canonical flow-chart arithmetic.
///
/// Net chronotropic effect (plus any direct override) scales HR; net inotropic
/// effect, venous return, afterload (inverse) and any direct override scale
/// SV. Afterload is the only lever that enters with a negative sign.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicModel;

impl PhysiologyModel for BasicModel {
    fn compute(&self, state: &PhysiologyState) -> Outputs {
        let net_chrono = state.chrono_pos.value() - state.chrono_neg.value();
        let net_ino = state.ino_pos.value() - state.ino_neg.value();

        let hr_effect = net_chrono + state.hr_direct.value();
        let sv_effect = net_ino + state.venous_return.value() - state.afterload.value()
            + state.sv_direct.value();

        Outputs::clamped(
            state.hr_baseline * (1.0 + EFFECT_STEP * hr_effect),
            state.sv_baseline * (1.0 + EFFECT_STEP * sv_effect),
        )
    }
}

/// Intermediate tones of the advanced pathway, exposed for arrow display.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathwayTones {
    pub sympathetic: f64,
    pub parasympathetic: f64,
    pub venous_return: f64,
    pub end_diastolic_volume: f64,
}

/// Two-stimulus autonomic pathway.
///
/// Exercise raises sympathetic tone and venous return; blood pressure shifts
/// the balance toward parasympathetic tone via the baroreflex. Parasympathetic
/// tone equals the blood-pressure stimulus (positive sign) everywhere in this
/// model.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvancedModel;

impl AdvancedModel {
    pub fn pathway(&self, state: &PhysiologyState) -> PathwayTones {
        let exercise = state.exercise.value();
        let blood_pressure = state.blood_pressure.value();

        let venous_return = exercise;
        PathwayTones {
            sympathetic: exercise - blood_pressure,
            parasympathetic: blood_pressure,
            venous_return,
            // More return → more ventricular filling before contraction.
            end_diastolic_volume: venous_return,
        }
    }
}

impl PhysiologyModel for AdvancedModel {
    fn compute(&self, state: &PhysiologyState) -> Outputs {
        let tones = self.pathway(state);
        let hr_effect = tones.sympathetic - tones.parasympathetic;
        let sv_effect = tones.end_diastolic_volume;

        Outputs::clamped(
            state.hr_baseline * (1.0 + EFFECT_STEP * hr_effect),
            state.sv_baseline * (1.0 + EFFECT_STEP * sv_effect),
        )
    }
}

/// Which strategy a session runs. Selected explicitly by the caller, never
/// inferred from lever values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ModelMode {
    #[default]
    Basic,
    Advanced,
}

impl ModelMode {
    pub fn compute(self, state: &PhysiologyState) -> Outputs {
        match self {
            ModelMode::Basic => BasicModel.compute(state),
            ModelMode::Advanced => AdvancedModel.compute(state),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelMode::Basic => "basic",
            ModelMode::Advanced => "advanced",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "basic" => Some(ModelMode::Basic),
            "advanced" => Some(ModelMode::Advanced),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1.0e-6
    }

    #[test]
    fn zero_effects_reproduce_baselines_exactly() {
        for (hr0, sv0) in [(70.0, 70.0), (40.0, 120.0), (55.5, 98.25)] {
            let state = PhysiologyState::with_baselines(hr0, sv0);
            let out = BasicModel.compute(&state);
            assert_eq!(out.heart_rate, hr0);
            assert_eq!(out.stroke_volume, sv0);
            assert_eq!(out.cardiac_output, hr0 * sv0 / 1000.0);
            assert_eq!(out, state.baseline_outputs());
        }
    }

    #[test]
    fn default_state_computes_resting_triple() {
        let out = BasicModel.compute(&PhysiologyState::new());
        assert!(close(out.heart_rate, 70.0));
        assert!(close(out.stroke_volume, 70.0));
        assert!(close(out.cardiac_output, 4.9));
    }

    #[test]
    fn positive_chronotrope_raises_hr_only() {
        let mut state = PhysiologyState::new();
        state.set_effect(Lever::ChronoPos, Effect::Up);
        let out = BasicModel.compute(&state);
        assert!(close(out.heart_rate, 78.4));
        assert!(close(out.stroke_volume, 70.0));
        assert!(close(out.cardiac_output, 5.488));
    }

    #[test]
    fn afterload_is_inverse_for_sv() {
        let mut state = PhysiologyState::new();
        state.set_effect(Lever::Afterload, Effect::Up);
        let out = BasicModel.compute(&state);
        assert!(close(out.heart_rate, 70.0));
        assert!(close(out.stroke_volume, 61.6));
        assert!(close(out.cardiac_output, 4.312));
    }

    #[test]
    fn venous_return_raises_sv_and_co() {
        let mut state = PhysiologyState::new();
        let before = BasicModel.compute(&state);
        state.set_effect(Lever::VenousReturn, Effect::Up);
        let after = BasicModel.compute(&state);
        assert!(after.stroke_volume > before.stroke_volume);
        assert!(after.cardiac_output > before.cardiac_output);
    }

    #[test]
    fn clamps_hold_for_every_lever_combination() {
        // Exhaustive over the eight basic-model levers at extreme baselines.
        let levers = [
            Lever::ChronoPos,
            Lever::ChronoNeg,
            Lever::InoPos,
            Lever::InoNeg,
            Lever::VenousReturn,
            Lever::Afterload,
            Lever::HrDirect,
            Lever::SvDirect,
        ];
        for (hr0, sv0) in [(40.0, 40.0), (70.0, 70.0), (120.0, 120.0)] {
            for combo in 0..3usize.pow(levers.len() as u32) {
                let mut state = PhysiologyState::with_baselines(hr0, sv0);
                let mut c = combo;
                for lever in levers {
                    state.set_effect(lever, Effect::ALL[c % 3]);
                    c /= 3;
                }
                let out = BasicModel.compute(&state);
                assert!(out.heart_rate >= HR_MIN && out.heart_rate <= HR_MAX);
                assert!(out.stroke_volume >= SV_MIN && out.stroke_volume <= SV_MAX);
                assert_eq!(
                    out.cardiac_output,
                    out.heart_rate * out.stroke_volume / 1000.0
                );
            }
        }
    }

    #[test]
    fn clamp_actually_engages_at_extreme_baselines() {
        let mut state = PhysiologyState::with_baselines(40.0, 40.0);
        state.chrono_pos = Effect::Down;
        state.chrono_neg = Effect::Up;
        state.hr_direct = Effect::Down;
        state.ino_pos = Effect::Down;
        state.ino_neg = Effect::Up;
        state.afterload = Effect::Up;
        state.sv_direct = Effect::Down;
        state.venous_return = Effect::Down;
        // Raw values (25.6, 16.0) sit below both floors.
        let out = BasicModel.compute(&state);
        assert_eq!(out.heart_rate, HR_MIN);
        assert_eq!(out.stroke_volume, SV_MIN);
    }

    #[test]
    fn clamps_hold_for_every_stimulus_combination() {
        // Exhaustive over the advanced-mode stimuli at extreme baselines.
        for (hr0, sv0) in [(40.0, 40.0), (70.0, 70.0), (120.0, 120.0)] {
            for exercise in Effect::ALL {
                for blood_pressure in Effect::ALL {
                    let mut state = PhysiologyState::with_baselines(hr0, sv0);
                    state.exercise = exercise;
                    state.blood_pressure = blood_pressure;
                    let out = AdvancedModel.compute(&state);
                    assert!(out.heart_rate >= HR_MIN && out.heart_rate <= HR_MAX);
                    assert!(out.stroke_volume >= SV_MIN && out.stroke_volume <= SV_MAX);
                    assert_eq!(
                        out.cardiac_output,
                        out.heart_rate * out.stroke_volume / 1000.0
                    );
                }
            }
        }

        // Exercise ↓ with blood pressure ↑ gives hr_effect -3: 40·(1-0.36) =
        // 25.6 raw, so the HR floor engages.
        let mut state = PhysiologyState::with_baselines(40.0, 40.0);
        state.exercise = Effect::Down;
        state.blood_pressure = Effect::Up;
        assert_eq!(AdvancedModel.compute(&state).heart_rate, HR_MIN);
    }

    #[test]
    fn advanced_exercise_raises_both_rates() {
        let mut state = PhysiologyState::new();
        state.set_effect(Lever::Exercise, Effect::Up);

        let tones = AdvancedModel.pathway(&state);
        assert!(close(tones.sympathetic, 1.0));
        assert!(close(tones.parasympathetic, 0.0));

        let out = AdvancedModel.compute(&state);
        assert!(close(out.heart_rate, 78.4));
        assert!(close(out.stroke_volume, 78.4));
        assert!(close(out.cardiac_output, 78.4 * 78.4 / 1000.0));
    }

    #[test]
    fn advanced_blood_pressure_slows_the_heart() {
        let mut state = PhysiologyState::new();
        state.set_effect(Lever::BloodPressure, Effect::Up);

        // Baroreflex: sympathetic -1, parasympathetic +1 → hr_effect -2.
        let tones = AdvancedModel.pathway(&state);
        assert!(close(tones.sympathetic, -1.0));
        assert!(close(tones.parasympathetic, 1.0));

        let out = AdvancedModel.compute(&state);
        assert!(close(out.heart_rate, 70.0 * (1.0 - 2.0 * EFFECT_STEP)));
        assert!(close(out.stroke_volume, 70.0));
    }

    #[test]
    fn advanced_ignores_basic_levers() {
        let mut state = PhysiologyState::new();
        state.set_effect(Lever::ChronoPos, Effect::Up);
        state.set_effect(Lever::Afterload, Effect::Up);
        let out = AdvancedModel.compute(&state);
        assert_eq!(out, state.baseline_outputs());
    }

    #[test]
    fn reset_round_reproduces_baseline_triple() {
        let mut state = PhysiologyState::with_baselines(88.0, 64.0);
        for lever in Lever::ALL {
            state.set_effect(lever, Effect::Up);
        }
        state.reset_round();
        assert_eq!(BasicModel.compute(&state), state.baseline_outputs());
        assert_eq!(AdvancedModel.compute(&state), state.baseline_outputs());
        assert_eq!(state.hr_baseline, 88.0);
        assert_eq!(state.sv_baseline, 64.0);
    }

    #[test]
    fn lever_labels_round_trip() {
        for lever in Lever::ALL {
            assert_eq!(Lever::from_label(lever.label()), Some(lever));
        }
        assert_eq!(Lever::from_label("preload"), None);
    }

    #[test]
    fn every_lever_carries_teaching_content() {
        for lever in Lever::ALL {
            assert!(!lever.description().is_empty());
            // Every topic list ends with the catch-all option.
            assert_eq!(lever.confusion_topics().last(), Some(&"Not sure / other"));
        }
    }

    #[test]
    fn effect_from_sign_matches_arrow_glyphs() {
        assert_eq!(Effect::from_sign(1), Effect::Up);
        assert_eq!(Effect::from_sign(-1), Effect::Down);
        assert_eq!(Effect::from_sign(0), Effect::Neutral);
        assert_eq!(Effect::from_sign(1).arrow(), "↑");
        assert_eq!(Effect::from_sign(-1).arrow(), "↓");
        assert_eq!(Effect::from_sign(0).arrow(), "—");
    }
}
