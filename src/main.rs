use cardio::prelude::*;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h" || args[1] == "help") {
        print_help();
        return;
    }
    if args.len() >= 2 && args[1] == "advanced" {
        run_advanced_demo();
        return;
    }

    if args.len() >= 2 {
        eprintln!("Unknown command: {}", args[1]);
        print_help();
        std::process::exit(2);
    }

    // Minimal demo:
    // - walk the classic flow-chart rounds at resting baselines (70 / 70)
    // - each round: pick a box, push it ↑, predict, show the graded result
    let mut session = Session::new();

    println!("Cardiac Output Flow Chart — CO = HR × SV");
    print_state(&session);
    println!();

    let rounds = [
        (Lever::ChronoPos, Effect::Up, Direction::Increase),
        (Lever::ChronoNeg, Effect::Up, Direction::Decrease),
        (Lever::InoPos, Effect::Up, Direction::Increase),
        (Lever::VenousReturn, Effect::Up, Direction::Increase),
        (Lever::Afterload, Effect::Up, Direction::Decrease),
    ];

    for (lever, effect, predicted) in rounds {
        session.reset_round();
        session.select_lever(lever);
        session.choose_direction(effect);
        if let Some(outcome) = session.predict(predicted) {
            print_round(&session, &outcome);
        }
        session.next_round();
    }

    // A miss: inotropic blockade lowers SV, so CO falls — "No change" is
    // wrong and opens the confusion prompt.
    session.reset_round();
    session.select_lever(Lever::InoNeg);
    session.choose_direction(Effect::Up);
    if let Some(outcome) = session.predict(Direction::NoChange) {
        print_round(&session, &outcome);
        if let Some(topics) = session.confusion_topics() {
            println!("Where did you get confused?");
            for (i, topic) in topics.iter().enumerate() {
                println!("  [{}] {}", i, topic);
            }
            session.report_confusion(0);
        }
    }

    println!();
    println!(
        "session: rounds={} correct={} accuracy={:.0}% best_streak={}",
        session.stats.rounds,
        session.stats.correct,
        session.stats.accuracy() * 100.0,
        session.stats.best_streak
    );
    if let Some(weakest) = session.stats.weakest_lever() {
        println!("worth reviewing: {}", weakest.title());
    }
}

fn run_advanced_demo() {
    // The two-stimulus autonomic pathway: exercise and blood pressure replace
    // the six-lever set.
    let mut session = Session::with_mode(ModelMode::Advanced);

    println!("Advanced pathway — exercise / blood pressure");
    print_state(&session);

    session.select_lever(Lever::Exercise);
    session.choose_direction(Effect::Up);
    if let Some(outcome) = session.predict(Direction::Increase) {
        print_round(&session, &outcome);
    }

    if let Some(tones) = session.pathway() {
        println!(
            "tones: sympathetic={:+.0} parasympathetic={:+.0} venous_return={:+.0} edv={:+.0}",
            tones.sympathetic,
            tones.parasympathetic,
            tones.venous_return,
            tones.end_diastolic_volume
        );
    }
}

fn print_state(session: &Session) {
    let out = session.outputs();
    let [hr, sv, co] = session.arrows();
    println!(
        "HR {} {:.1} bpm | SV {} {:.1} mL | CO {} {:.3} L/min",
        hr, out.heart_rate, sv, out.stroke_volume, co, out.cardiac_output
    );
}

fn print_round(session: &Session, outcome: &RoundOutcome) {
    println!(
        "{} {}  ({})  predicted CO: {:<9} actual: {:<9} {}",
        outcome.lever.title(),
        outcome.effect.arrow(),
        outcome.lever.description(),
        outcome.predicted.label(),
        outcome.actual.label(),
        if outcome.correct { "✅" } else { "❌" }
    );
    print_state(session);
}

fn print_help() {
    println!("cardio — cardiac output teaching model demo");
    println!();
    println!("Usage:");
    println!("  cardio             Run the basic flow-chart walkthrough");
    println!("  cardio advanced    Run the exercise/blood-pressure pathway demo");
    println!("  cardio --help      Show this help");
}
