use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use clap::Args;
use coherence_core::{Config, ExportBundle, Period, SessionKind, SessionRecord};

use super::{open_engine, CommandResult};

#[derive(Args)]
pub struct RecordArgs {
    /// How long the session lasted
    #[arg(long)]
    duration_ms: u64,
    /// Inhales counted during the session
    #[arg(long)]
    breaths: u32,
    /// Session start (RFC 3339). Defaults to now minus the duration.
    #[arg(long)]
    started_at: Option<DateTime<Utc>>,
}

pub fn record(args: RecordArgs) -> CommandResult {
    let config = Config::load()?;
    let duration = Duration::try_milliseconds(i64::try_from(args.duration_ms)?)
        .ok_or("duration out of range")?;
    let started_at = args.started_at.unwrap_or_else(|| Utc::now() - duration);
    let kind = if config.cycle.is_standard() {
        SessionKind::Standard
    } else {
        SessionKind::Custom
    };

    let record = SessionRecord::from_measurements(
        started_at,
        args.duration_ms,
        args.breaths,
        config.cycle.cycle_period_ms(),
        config.session.completion_threshold_ms,
    )
    .with_kind(kind);

    let mut engine = open_engine(&config)?;
    engine.record_session(record.clone())?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn list(period: Period) -> CommandResult {
    let engine = open_engine(&Config::load()?)?;
    println!("{}", serde_json::to_string_pretty(&engine.sessions(period))?);
    Ok(())
}

pub fn export(output: Option<&Path>) -> CommandResult {
    let engine = open_engine(&Config::load()?)?;
    let json = serde_json::to_string_pretty(&engine.export())?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            eprintln!("exported {} sessions to {}", engine.log().len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn import(path: &Path) -> CommandResult {
    let content = std::fs::read_to_string(path)?;
    let bundle: ExportBundle = serde_json::from_str(&content)?;
    let mut engine = open_engine(&Config::load()?)?;
    let kept = engine.import(bundle)?;
    println!("{}", serde_json::json!({ "imported": kept }));
    Ok(())
}

pub fn cleanup(days: u32) -> CommandResult {
    let mut engine = open_engine(&Config::load()?)?;
    let removed = engine.cleanup(days)?;
    println!("{}", serde_json::json!({ "removed": removed }));
    Ok(())
}
