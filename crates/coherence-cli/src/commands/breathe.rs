use std::time::Duration;

use chrono::Utc;
use clap::Args;
use coherence_core::{
    run_session, BreathCounter, BreathingCycleController, Config, CycleEvent, RhythmFeedback,
    SessionRecord,
};
use serde::Serialize;
use tracing::{info, warn};

use super::{open_engine, CommandResult};

const POLL_EVERY: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct BreatheArgs {
    /// Inhale/exhale length in milliseconds (defaults to cycle.phase_duration_ms)
    #[arg(long)]
    phase_ms: Option<u64>,
    /// Session length in milliseconds (defaults to cycle.total_duration_ms)
    #[arg(long)]
    total_ms: Option<u64>,
    /// Do not add the session to the log
    #[arg(long)]
    no_record: bool,
}

/// Final line printed after the event stream.
#[derive(Serialize)]
#[serde(tag = "type")]
struct Summary<'a> {
    record: &'a SessionRecord,
    /// Breath tally reached the counter's validation threshold.
    valid: bool,
    rhythm: Option<RhythmFeedback>,
    recorded: bool,
}

pub fn run(args: BreatheArgs) -> CommandResult {
    let config = Config::load()?;
    let mut cycle = config.cycle;
    if let Some(phase_ms) = args.phase_ms {
        cycle.phase_duration_ms = phase_ms;
    }
    if let Some(total_ms) = args.total_ms {
        cycle.total_duration_ms = total_ms;
    }
    let mut controller = BreathingCycleController::with_config(cycle)?;

    let mut counter = BreathCounter::new(config.counter);
    counter.begin(Utc::now());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(run_session(&mut controller, POLL_EVERY, interrupted(), |event| {
        counter.observe(event);
        print_event(event);
    }))?;

    let rhythm = counter.rhythm_feedback(Utc::now());
    let valid = counter.is_valid(outcome.elapsed_ms, cycle.cycle_period_ms());
    let Some(record) = counter.finish(
        outcome.elapsed_ms,
        &cycle,
        config.session.completion_threshold_ms,
    ) else {
        return Ok(());
    };

    let recorded = !args.no_record;
    if recorded {
        let mut engine = open_engine(&config)?;
        if let Err(e) = engine.record_session(record.clone()) {
            warn!(error = %e, id = %record.id, "session could not be saved");
            return Err(e.into());
        }
        info!(id = %record.id, "session saved");
    }

    let summary = Summary {
        record: &record,
        valid,
        rhythm,
        recorded,
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn print_event(event: &CycleEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "failed to serialize event"),
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler can't be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
