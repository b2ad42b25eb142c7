use anyhow::Result;
use loglens_types::VisibilityKind;
use owo_colors::OwoColorize;

use crate::context::CliContext;
use crate::output::{one_line, print_json, use_color};
use crate::types::OutputFormat;

pub fn handle(ctx: &CliContext, session_id: &str) -> Result<()> {
    let turns = ctx.engine.timeline(session_id)?;

    if ctx.format == OutputFormat::Json {
        return print_json(&turns);
    }

    if turns.is_empty() {
        println!("Session is empty.");
        return Ok(());
    }

    let color = use_color();
    for (index, turn) in turns.iter().enumerate() {
        if let Some(user) = &turn.user {
            let header = format!("── turn {} ", index + 1);
            if color {
                println!("{}{}", header.bold(), user.text);
            } else {
                println!("{}{}", header, user.text);
            }
        } else {
            println!("── (before first user message)");
        }

        for event in &turn.outputs {
            let label = event_label(event.kind, event.title.as_deref());
            let body = one_line(&event.text, 140);
            let repeat = if event.repeat_count > 1 {
                format!(" (x{})", event.repeat_count)
            } else {
                String::new()
            };
            if color {
                println!("   {} {}{}", label.dimmed(), body, repeat);
            } else {
                println!("   {} {}{}", label, body, repeat);
            }
        }
        println!();
    }

    Ok(())
}

fn event_label(kind: VisibilityKind, title: Option<&str>) -> String {
    match (kind, title) {
        (VisibilityKind::Tool, Some(name)) => format!("[tool:{}]", name),
        (VisibilityKind::CodeEdit, Some(name)) => format!("[edit:{}]", name),
        (VisibilityKind::CodeEdit, None) => "[edit]".to_string(),
        (kind, _) => format!("[{}]", kind.as_str()),
    }
}
