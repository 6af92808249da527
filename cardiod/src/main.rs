//! Cardio Daemon - Background teaching-session service
//!
//! This daemon owns one flow-chart session, managing:
//! - Physiology state and round sequencing
//! - Prediction grading and session stats
//! - Persistent storage
//! - IPC server for UI clients
//!
//! Storage locations:
//! - Linux: ~/.local/share/cardio/
//! - Windows: %APPDATA%\Cardio\
//! - MacOS: ~/Library/Application Support/Cardio/

use cardio::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio::time;
use tracing::{error, info, warn};

mod paths;

use paths::AppPaths;

const LISTEN_ADDR: &str = "127.0.0.1:9690";

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode/decode: {0}")]
    Json(#[from] serde_json::Error),
    #[error("session file not found: {0}")]
    SessionFileMissing(PathBuf),
    #[error("could not determine data directory")]
    NoDataDir,
}

// ═══════════════════════════════════════════════════════════════════════════
// Protocol Messages
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Request {
    GetState,
    SetMode { mode: String },
    SetBaselines { hr: f64, sv: f64 },
    SelectLever { lever: String },
    ChooseDirection { direction: String },
    Predict { prediction: String },
    ReportConfusion { topic: usize },
    NextRound,
    ResetRound,
    SaveSession,
    LoadSession,
    ResetSession,
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum Response {
    State(StateSnapshot),
    Outcome(OutcomeView),
    Success { message: String },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateSnapshot {
    mode: String,
    phase: String,
    heart_rate: f64,
    stroke_volume: f64,
    cardiac_output: f64,
    hr_arrow: String,
    sv_arrow: String,
    co_arrow: String,
    levers: Vec<LeverView>,
    pathway: Option<PathwayView>,
    hud: HudData,
    last_outcome: Option<OutcomeView>,
    /// Non-empty only while an incorrect result is showing.
    #[serde(default)]
    confusion_topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LeverView {
    lever: String,
    title: String,
    description: String,
    arrow: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PathwayView {
    sympathetic: f64,
    parasympathetic: f64,
    venous_return: f64,
    end_diastolic_volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HudData {
    rounds: u32,
    correct: u32,
    incorrect: u32,
    accuracy: f32,
    recent_rate: f32,
    streak: u32,
    best_streak: u32,
    #[serde(default)]
    weakest_lever: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OutcomeView {
    lever: String,
    effect: String,
    predicted: String,
    actual: String,
    correct: bool,
    co_before: f64,
    co_after: f64,
}

impl OutcomeView {
    fn from_outcome(o: &RoundOutcome) -> Self {
        Self {
            lever: o.lever.label().to_string(),
            effect: o.effect.arrow().to_string(),
            predicted: o.predicted.label().to_string(),
            actual: o.actual.label().to_string(),
            correct: o.correct,
            co_before: o.before.cardiac_output,
            co_after: o.after.cardiac_output,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Daemon State
// ═══════════════════════════════════════════════════════════════════════════

struct DaemonState {
    session: Session,
    paths: AppPaths,
}

impl DaemonState {
    fn new(paths: AppPaths) -> Self {
        Self {
            session: Session::new(),
            paths,
        }
    }

    fn snapshot(&self) -> StateSnapshot {
        let out = self.session.outputs();
        let [hr_arrow, sv_arrow, co_arrow] = self.session.arrows();
        let stats = &self.session.stats;

        StateSnapshot {
            mode: self.session.mode.label().to_string(),
            phase: self.session.phase.label().to_string(),
            heart_rate: out.heart_rate,
            stroke_volume: out.stroke_volume,
            cardiac_output: out.cardiac_output,
            hr_arrow: hr_arrow.to_string(),
            sv_arrow: sv_arrow.to_string(),
            co_arrow: co_arrow.to_string(),
            levers: Lever::ALL
                .into_iter()
                .map(|lever| LeverView {
                    lever: lever.label().to_string(),
                    title: lever.title().to_string(),
                    description: lever.description().to_string(),
                    arrow: self.session.state.effect(lever).arrow().to_string(),
                })
                .collect(),
            pathway: self.session.pathway().map(|t| PathwayView {
                sympathetic: t.sympathetic,
                parasympathetic: t.parasympathetic,
                venous_return: t.venous_return,
                end_diastolic_volume: t.end_diastolic_volume,
            }),
            hud: HudData {
                rounds: stats.rounds,
                correct: stats.correct,
                incorrect: stats.incorrect,
                accuracy: stats.accuracy(),
                recent_rate: stats.recent_rate(),
                streak: stats.streak,
                best_streak: stats.best_streak,
                weakest_lever: stats.weakest_lever().map(|l| l.label().to_string()),
            },
            last_outcome: self.session.last_outcome.as_ref().map(OutcomeView::from_outcome),
            confusion_topics: self
                .session
                .confusion_topics()
                .unwrap_or(&[])
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }

    fn save_session(&self) -> Result<(), DaemonError> {
        let path = self.paths.session_file();
        info!("Saving session to {:?}", path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(&self.session)?;
        std::fs::write(&path, json)?;

        info!("✓ Session saved to {:?}", path);
        Ok(())
    }

    fn load_session(&mut self) -> Result<(), DaemonError> {
        let path = self.paths.session_file();
        if !path.exists() {
            return Err(DaemonError::SessionFileMissing(path));
        }
        let json = std::fs::read_to_string(&path)?;
        self.session = serde_json::from_str(&json)?;
        info!("Session loaded from {:?}", path);
        Ok(())
    }

    fn reset_session(&mut self) {
        self.session = Session::new();
        info!("Session reset to initial state");
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Client Handler
// ═══════════════════════════════════════════════════════════════════════════

async fn handle_client(
    stream: TcpStream,
    state: Arc<RwLock<DaemonState>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let request: Request = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                let resp = Response::Error {
                    message: format!("Invalid request: {}", e),
                };
                writer
                    .write_all(serde_json::to_string(&resp)?.as_bytes())
                    .await?;
                writer.write_all(b"\n").await?;
                continue;
            }
        };

        let response = match request {
            Request::GetState => {
                let s = state.read().await;
                Response::State(s.snapshot())
            }
            Request::SetMode { mode } => match ModelMode::from_label(&mode) {
                Some(mode) => {
                    let mut s = state.write().await;
                    s.session.set_mode(mode);
                    Response::Success {
                        message: format!("Mode set to {}", mode.label()),
                    }
                }
                None => Response::Error {
                    message: format!("Unknown mode: {} (basic|advanced)", mode),
                },
            },
            Request::SetBaselines { hr, sv } => {
                if !hr.is_finite() || !sv.is_finite() {
                    Response::Error {
                        message: "Baselines must be finite".to_string(),
                    }
                } else {
                    let mut s = state.write().await;
                    s.session.set_baselines(hr, sv);
                    let st = &s.session.state;
                    Response::Success {
                        message: format!(
                            "Baselines set to HR {:.1} / SV {:.1}",
                            st.hr_baseline, st.sv_baseline
                        ),
                    }
                }
            }
            Request::SelectLever { lever } => match Lever::from_label(&lever) {
                Some(lever) => {
                    let mut s = state.write().await;
                    s.session.select_lever(lever);
                    Response::Success {
                        message: format!("Selected {}", lever.title()),
                    }
                }
                None => Response::Error {
                    message: format!("Unknown lever: {}", lever),
                },
            },
            Request::ChooseDirection { direction } => {
                let effect = match direction.as_str() {
                    "up" => Some(Effect::Up),
                    "down" => Some(Effect::Down),
                    _ => None,
                };
                match effect {
                    Some(effect) => {
                        let mut s = state.write().await;
                        if s.session.choose_direction(effect) {
                            Response::Success {
                                message: format!("Direction {}", effect.arrow()),
                            }
                        } else {
                            Response::Error {
                                message: "Select a lever first".to_string(),
                            }
                        }
                    }
                    None => Response::Error {
                        message: format!("Unknown direction: {} (up|down)", direction),
                    },
                }
            }
            Request::Predict { prediction } => match Direction::from_label(&prediction) {
                Some(predicted) => {
                    let mut s = state.write().await;
                    match s.session.predict(predicted) {
                        Some(outcome) => Response::Outcome(OutcomeView::from_outcome(&outcome)),
                        None => Response::Error {
                            message: "Make a prediction after choosing a lever and direction"
                                .to_string(),
                        },
                    }
                }
                None => Response::Error {
                    message: format!(
                        "Unknown prediction: {} (increase|decrease|nochange)",
                        prediction
                    ),
                },
            },
            Request::ReportConfusion { topic } => {
                let mut s = state.write().await;
                if s.session.report_confusion(topic) {
                    Response::Success {
                        message: "Thanks — that point is worth reviewing".to_string(),
                    }
                } else {
                    Response::Error {
                        message: "No confusion prompt is open (or topic index out of range)"
                            .to_string(),
                    }
                }
            }
            Request::NextRound => {
                let mut s = state.write().await;
                s.session.next_round();
                Response::Success {
                    message: "Next round".to_string(),
                }
            }
            Request::ResetRound => {
                let mut s = state.write().await;
                s.session.reset_round();
                Response::Success {
                    message: "All arrows reset to baseline (—)".to_string(),
                }
            }
            Request::SaveSession => {
                let s = state.read().await;
                match s.save_session() {
                    Ok(_) => Response::Success {
                        message: "Session saved".to_string(),
                    },
                    Err(e) => Response::Error {
                        message: e.to_string(),
                    },
                }
            }
            Request::LoadSession => {
                let mut s = state.write().await;
                match s.load_session() {
                    Ok(_) => Response::Success {
                        message: "Session loaded".to_string(),
                    },
                    Err(e) => Response::Error {
                        message: e.to_string(),
                    },
                }
            }
            Request::ResetSession => {
                let mut s = state.write().await;
                s.reset_session();
                Response::Success {
                    message: "Session reset".to_string(),
                }
            }
            Request::Shutdown => {
                let s = state.read().await;
                match s.save_session() {
                    Ok(_) => {
                        info!("Shutdown requested; session saved");
                        tokio::spawn(async {
                            // Give the response a moment to flush before exiting.
                            time::sleep(Duration::from_millis(50)).await;
                            std::process::exit(0);
                        });
                        Response::Success {
                            message: "Shutting down".to_string(),
                        }
                    }
                    Err(e) => Response::Error {
                        message: format!("Save failed, aborting shutdown: {}", e),
                    },
                }
            }
        };

        writer
            .write_all(serde_json::to_string(&response)?.as_bytes())
            .await?;
        writer.write_all(b"\n").await?;
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Main
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Setup application paths
    let paths = AppPaths::new()?;
    info!("Data directory: {:?}", paths.data_dir());
    info!("Session file: {:?}", paths.session_file());

    // Initialize daemon state
    let state = Arc::new(RwLock::new(DaemonState::new(paths)));

    // Save on Ctrl-C so the session persists even if the daemon is stopped abruptly.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let s = state.read().await;
                if let Err(e) = s.save_session() {
                    error!("Ctrl-C save failed: {}", e);
                } else {
                    info!("Ctrl-C: session saved");
                }
                std::process::exit(0);
            }
        });
    }

    // Try to resume an existing session
    {
        let mut s = state.write().await;
        if let Err(e) = s.load_session() {
            warn!("Could not load session: {}", e);
            info!("Starting with a fresh session");
        }
    }

    // Accept client connections. Every mutation is a synchronous
    // read-compute-mutate-compute-compare cycle, so there is no tick loop.
    let listener = TcpListener::bind(LISTEN_ADDR).await?;
    info!("Cardio daemon listening on {}", LISTEN_ADDR);

    loop {
        let (stream, addr) = listener.accept().await?;
        info!("Client connected: {}", addr);
        let state_clone = Arc::clone(&state);

        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, state_clone).await {
                error!("Client handler error: {}", e);
            }
        });
    }
}
