use anyhow::Result;
use loglens_index::SessionFilter;
use loglens_types::SourceKind;
use owo_colors::OwoColorize;

use crate::context::CliContext;
use crate::output::{format_ts, print_json, use_color};
use crate::types::OutputFormat;

pub fn handle(ctx: &CliContext, source: Option<&str>, limit: usize) -> Result<()> {
    let filter = SessionFilter {
        source: source.map(SourceKind::from_name),
        limit: Some(limit),
    };
    let sessions = ctx.engine.list_sessions(&filter)?;

    if ctx.format == OutputFormat::Json {
        return print_json(&sessions);
    }

    if sessions.is_empty() {
        println!("No sessions indexed. Run `loglens index update` first.");
        return Ok(());
    }

    let color = use_color();
    for session in &sessions {
        let short_id: String = session.id.chars().take(12).collect();
        let id = if color {
            short_id.bold().to_string()
        } else {
            short_id
        };
        let counts = format!(
            "{}u/{}a",
            session.user_message_count, session.assistant_message_count
        );

        println!(
            "{:<12}  {:<8}  {:<8}  {:>7}  {:<16}  {}",
            id,
            session.source.as_str(),
            session.parse_level.as_str(),
            counts,
            format_ts(session.last_modified_at),
            session.cwd.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}
