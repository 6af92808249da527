//! Per-session prediction statistics.
//!
//! Beyond raw totals, the session tracks where a student struggles: every
//! graded round is tallied against the lever it exercised, self-reported
//! confusion topics are kept for the teacher to review, and correct-answer
//! streaks give the feedback panel something to celebrate.

use crate::model::Lever;
use std::string::String;
use std::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rounds kept for the rolling recent-accuracy window.
pub const HISTORY_WINDOW: usize = 100;

/// Attempts a lever needs before it can be singled out as the weakest.
const WEAKEST_MIN_ATTEMPTS: u32 = 3;

/// One graded round, as remembered by the rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoundRecord {
    pub lever: Lever,
    pub correct: bool,
}

/// Lifetime correct/incorrect counts for a single lever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LeverTally {
    pub lever: Lever,
    pub correct: u32,
    pub incorrect: u32,
}

impl LeverTally {
    pub fn attempts(&self) -> u32 {
        self.correct + self.incorrect
    }

    pub fn accuracy(&self) -> f32 {
        let attempts = self.attempts();
        if attempts == 0 {
            0.0
        } else {
            self.correct as f32 / attempts as f32
        }
    }
}

/// A "where did you get confused?" answer after an incorrect prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfusionNote {
    pub lever: Lever,
    pub topic: String,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionStats {
    pub correct: u32,
    pub incorrect: u32,
    pub rounds: u32,

    /// Current and best runs of consecutive correct predictions.
    pub streak: u32,
    pub best_streak: u32,

    /// The last [`HISTORY_WINDOW`] rounds, oldest first.
    pub history: Vec<RoundRecord>,

    /// One entry per lever the student has attempted.
    pub lever_tallies: Vec<LeverTally>,

    /// Self-reported confusion, in the order it was given.
    pub confusions: Vec<ConfusionNote>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            correct: 0,
            incorrect: 0,
            rounds: 0,
            streak: 0,
            best_streak: 0,
            history: Vec::with_capacity(HISTORY_WINDOW),
            lever_tallies: Vec::new(),
            confusions: Vec::new(),
        }
    }

    pub fn record_round(&mut self, lever: Lever, is_correct: bool) {
        if is_correct {
            self.correct += 1;
            self.streak += 1;
            if self.streak > self.best_streak {
                self.best_streak = self.streak;
            }
        } else {
            self.incorrect += 1;
            self.streak = 0;
        }
        self.rounds += 1;

        self.history.push(RoundRecord {
            lever,
            correct: is_correct,
        });
        if self.history.len() > HISTORY_WINDOW {
            self.history.remove(0);
        }

        match self.lever_tallies.iter_mut().find(|t| t.lever == lever) {
            Some(tally) => {
                if is_correct {
                    tally.correct += 1;
                } else {
                    tally.incorrect += 1;
                }
            }
            None => self.lever_tallies.push(LeverTally {
                lever,
                correct: is_correct as u32,
                incorrect: !is_correct as u32,
            }),
        }
    }

    pub fn record_confusion(&mut self, lever: Lever, topic: &str) {
        self.confusions.push(ConfusionNote {
            lever,
            topic: topic.to_string(),
        });
    }

    pub fn accuracy(&self) -> f32 {
        if self.rounds == 0 {
            0.0
        } else {
            self.correct as f32 / self.rounds as f32
        }
    }

    /// Accuracy over the rolling window only.
    pub fn recent_rate(&self) -> f32 {
        if self.history.is_empty() {
            return 0.0;
        }
        let correct_count = self.history.iter().filter(|r| r.correct).count();
        correct_count as f32 / self.history.len() as f32
    }

    pub fn tally(&self, lever: Lever) -> Option<&LeverTally> {
        self.lever_tallies.iter().find(|t| t.lever == lever)
    }

    /// The lever the student gets wrong most often: lowest accuracy among
    /// levers with enough attempts and at least one miss.
    pub fn weakest_lever(&self) -> Option<Lever> {
        self.lever_tallies
            .iter()
            .filter(|t| t.attempts() >= WEAKEST_MIN_ATTEMPTS && t.incorrect > 0)
            .min_by(|a, b| {
                a.accuracy()
                    .partial_cmp(&b.accuracy())
                    .unwrap_or(core::cmp::Ordering::Equal)
            })
            .map(|t| t.lever)
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
