use std::io::Read;

use anyhow::{Context, Result};
use loglens_ingest::Classification;

use crate::context::CliContext;
use crate::output::print_json;
use crate::types::OutputFormat;

pub fn handle(ctx: &CliContext, line: Option<&str>) -> Result<()> {
    let line = match line {
        Some(line) => line.to_string(),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read record from stdin")?;
            buffer
        }
    };
    let line = line.trim();
    if line.is_empty() {
        anyhow::bail!("No record provided (pass --line or pipe one JSONL record)");
    }

    let classification = ctx.engine.classify_line(line)?;

    if ctx.format == OutputFormat::Json {
        return match &classification {
            Classification::Event(event) => print_json(&serde_json::json!({
                "outcome": "event",
                "event": event,
            })),
            Classification::Dropped(reason) => print_json(&serde_json::json!({
                "outcome": "dropped",
                "reason": reason,
            })),
        };
    }

    match classification {
        Classification::Event(event) => {
            println!("kind: {}", event.kind.as_str());
            println!("actor: {}", event.actor.as_str());
            println!("tool_like: {}", event.is_tool_like);
            if let Some(title) = &event.title {
                println!("title: {}", title);
            }
            if let Some(call_id) = &event.call_id {
                println!("call_id: {}", call_id);
            }
            if !event.attachments.is_empty() {
                println!("attachments: {}", event.attachments.join(", "));
            }
            println!("text: {}", event.text);
        }
        Classification::Dropped(reason) => {
            println!("dropped: {}", reason.as_str());
        }
    }

    Ok(())
}
