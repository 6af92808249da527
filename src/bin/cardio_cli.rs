//! CLI client for the `cardiod` daemon.
//!
//! Examples:
//!   cardio-cli status
//!   cardio-cli mode advanced
//!   cardio-cli baselines 80 65
//!   cardio-cli lever chrono_pos
//!   cardio-cli direction up
//!   cardio-cli predict increase
//!   cardio-cli reset
//!
//! By default it talks to 127.0.0.1:9690; override with `--addr host:port`.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::process;
use std::time::Duration;

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

fn usage() -> ! {
    eprintln!("cardio-cli (talks to cardiod @ 127.0.0.1:9690 by default)");
    eprintln!("Usage: cardio-cli [--addr host:port] <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  status                      Show session state");
    eprintln!("  mode <basic|advanced>       Switch compute strategy");
    eprintln!("  baselines <hr> <sv>         Teacher: set resting baselines (40-120)");
    eprintln!("  lever <name>                Select a flow-chart box (e.g. chrono_pos)");
    eprintln!("  direction <up|down>         Choose ↑ or ↓ for the selected lever");
    eprintln!("  predict <increase|decrease|nochange>  Grade a CO prediction");
    eprintln!("  confused <n>                Answer the confusion prompt (see status)");
    eprintln!("  round                       Start the next round (arrows kept)");
    eprintln!("  reset                       Teacher: reset all arrows to baseline (—)");
    eprintln!("  save | load | reset-session Persistence controls");
    eprintln!("  shutdown                    Save and exit daemon");
    process::exit(1);
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let mut addr = "127.0.0.1:9690".to_string();
    if args.len() >= 2 && args[0] == "--addr" {
        addr = args[1].clone();
        args.drain(0..2);
    }

    if args.is_empty() {
        usage();
    }

    (addr, args)
}

fn send_request(addr: &str, req: &Request) -> Result<Response, String> {
    let mut stream = TcpStream::connect(addr).map_err(|e| format!("connect: {e}"))?;
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .map_err(|e| format!("set_read_timeout: {e}"))?;
    let mut reader = BufReader::new(stream.try_clone().map_err(|e| format!("clone: {e}"))?);

    let line = serde_json::to_string(req).map_err(|e| format!("serialize: {e}"))?;
    stream
        .write_all(line.as_bytes())
        .and_then(|_| stream.write_all(b"\n"))
        .map_err(|e| format!("send: {e}"))?;

    let mut resp_line = String::new();
    reader
        .read_line(&mut resp_line)
        .map_err(|e| format!("recv: {e}"))?;
    serde_json::from_str(&resp_line).map_err(|e| format!("parse response: {e}"))
}

fn print_state(s: StateSnapshot) {
    println!(
        "mode={:<8} phase={:<16} HR {} {:.1} bpm | SV {} {:.1} mL | CO {} {:.3} L/min",
        s.mode,
        s.phase,
        s.hr_arrow,
        s.heart_rate,
        s.sv_arrow,
        s.stroke_volume,
        s.co_arrow,
        s.cardiac_output,
    );
    println!(
        "hud: rounds={} correct={} incorrect={} acc={:.1}% recent={:.1}% streak={} best={}{}",
        s.hud.rounds,
        s.hud.correct,
        s.hud.incorrect,
        s.hud.accuracy * 100.0,
        s.hud.recent_rate * 100.0,
        s.hud.streak,
        s.hud.best_streak,
        match &s.hud.weakest_lever {
            Some(lever) => format!(" weakest={}", lever),
            None => String::new(),
        },
    );
    for lever in &s.levers {
        println!(
            "  {} {:<16} {} — {}",
            lever.arrow, lever.lever, lever.title, lever.description
        );
    }
    if let Some(p) = &s.pathway {
        println!(
            "pathway: sympathetic={:+.0} parasympathetic={:+.0} venous_return={:+.0} edv={:+.0}",
            p.sympathetic, p.parasympathetic, p.venous_return, p.end_diastolic_volume,
        );
    }
    if let Some(o) = &s.last_outcome {
        print_outcome(o);
    }
    if !s.confusion_topics.is_empty() {
        println!("Where did you get confused? (answer with: cardio-cli confused <n>)");
        for (i, topic) in s.confusion_topics.iter().enumerate() {
            println!("  [{}] {}", i, topic);
        }
    }
}

fn print_outcome(o: &OutcomeView) {
    println!(
        "last round: {} {}  predicted {:<9} actual {:<9} {}  (CO {:.3} → {:.3})",
        o.lever,
        o.effect,
        o.predicted,
        o.actual,
        if o.correct { "✅ correct" } else { "❌ not quite" },
        o.co_before,
        o.co_after,
    );
}

fn main() {
    let (addr, args) = parse_args();
    let cmd = &args[0];

    let make_error = |msg: &str| -> ! {
        eprintln!("{}", msg);
        process::exit(1);
    };

    let req = match cmd.as_str() {
        "status" => Request::GetState,
        "mode" => {
            if args.len() < 2 {
                usage();
            }
            let mode = args[1].clone();
            if mode != "basic" && mode != "advanced" {
                make_error("mode must be 'basic' or 'advanced'");
            }
            Request::SetMode { mode }
        }
        "baselines" => {
            if args.len() < 3 {
                usage();
            }
            let hr: f64 = args[1]
                .parse()
                .unwrap_or_else(|_| make_error("hr must be a number"));
            let sv: f64 = args[2]
                .parse()
                .unwrap_or_else(|_| make_error("sv must be a number"));
            Request::SetBaselines { hr, sv }
        }
        "lever" => {
            if args.len() < 2 {
                usage();
            }
            Request::SelectLever {
                lever: args[1].clone(),
            }
        }
        "direction" => {
            if args.len() < 2 {
                usage();
            }
            let direction = args[1].clone();
            if direction != "up" && direction != "down" {
                make_error("direction must be 'up' or 'down'");
            }
            Request::ChooseDirection { direction }
        }
        "predict" => {
            if args.len() < 2 {
                usage();
            }
            Request::Predict {
                prediction: args[1].clone(),
            }
        }
        "confused" => {
            if args.len() < 2 {
                usage();
            }
            let topic: usize = args[1]
                .parse()
                .unwrap_or_else(|_| make_error("topic must be an index (see status)"));
            Request::ReportConfusion { topic }
        }
        "round" => Request::NextRound,
        "reset" => Request::ResetRound,
        "save" => Request::SaveSession,
        "load" => Request::LoadSession,
        "reset-session" => Request::ResetSession,
        "shutdown" => Request::Shutdown,
        _ => usage(),
    };

    match send_request(&addr, &req) {
        Ok(Response::State(s)) => print_state(s),
        Ok(Response::Outcome(o)) => {
            print_outcome(&o);
            if !o.correct {
                println!("(see 'cardio-cli status' for the confusion prompt)");
            }
        }
        Ok(Response::Success { message }) => println!("{}", message),
        Ok(Response::Error { message }) => {
            eprintln!("error: {}", message);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
