use coherence_core::{Config, Period};

use super::{open_engine, CommandResult};

pub fn statistics(period: Period) -> CommandResult {
    let engine = open_engine(&Config::load()?)?;
    println!("{}", serde_json::to_string_pretty(&engine.statistics(period))?);
    Ok(())
}

pub fn summary() -> CommandResult {
    let engine = open_engine(&Config::load()?)?;
    println!("{}", serde_json::to_string_pretty(&engine.quick_summary())?);
    Ok(())
}

pub fn analyze(period: Period) -> CommandResult {
    let engine = open_engine(&Config::load()?)?;
    println!("{}", serde_json::to_string_pretty(&engine.analyze(period))?);
    Ok(())
}
