use anyhow::Result;
use chrono::{DateTime, Utc};
use is_terminal::IsTerminal;
use serde::Serialize;

pub fn use_color() -> bool {
    std::io::stdout().is_terminal()
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn format_ts(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Collapse a message body to one display line.
pub fn one_line(text: &str, max: usize) -> String {
    let flat = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    loglens_types::truncate(&flat, max)
}
