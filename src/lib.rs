//! # cardio
//!
//! A deterministic cardiovascular teaching model: `CO = HR × SV`.
//!
//! Students toggle discrete ↑ / ↓ effects on physiological levers
//! (chronotropes, inotropes, venous return, afterload, ...), predict the
//! direction of change in cardiac output, and get graded feedback. The model
//! is pure arithmetic over caller-owned state; rendering and interaction
//! sequencing live in the consumers (`cardiod` and the CLI).
//!
//! ## Quick Start
//!
//! ```
//! use cardio::prelude::*;
//!
//! let mut session = Session::new();
//!
//! // One round: pick a box, choose ↑, predict what CO does.
//! session.select_lever(Lever::ChronoPos);
//! session.choose_direction(Effect::Up);
//! let outcome = session.predict(Direction::Increase).unwrap();
//!
//! assert!(outcome.correct);
//! assert_eq!(session.arrows(), ["↑", "—", "↑"]);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `serde`: Enable serialization/deserialization
//!
//! ## no_std Support
//!
//! The pure compute core ([`model`] and [`direction`]) works without `std`:
//! ```toml
//! cardio = { version = "0.1", default-features = false }
//! ```
//!
//! ## Modules
//!
//! - [`model`]: Physiology state and the two compute strategies
//! - [`direction`]: Direction classification and prediction grading
//! - [`session`]: Interaction-round driver
//! - [`stats`]: Per-session prediction statistics

// no_std support
#![cfg_attr(not(feature = "std"), no_std)]

pub mod direction;
pub mod model;

// The round driver and its stats keep history in heap collections; the pure
// compute modules above stay available to `no_std` consumers.
#[cfg(feature = "std")]
pub mod session;
#[cfg(feature = "std")]
pub mod stats;

pub mod prelude {
    pub use crate::direction::{
        direction_of_change, direction_vs_baseline, grade_prediction, Direction, EPSILON,
    };
    pub use crate::model::{
        AdvancedModel, BasicModel, Effect, Lever, ModelMode, Outputs, PathwayTones,
        PhysiologyModel, PhysiologyState,
    };
    #[cfg(feature = "std")]
    pub use crate::session::{RoundOutcome, RoundPhase, Session};
    #[cfg(feature = "std")]
    pub use crate::stats::{ConfusionNote, LeverTally, RoundRecord, SessionStats};
}
