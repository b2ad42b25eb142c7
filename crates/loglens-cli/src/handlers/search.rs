use anyhow::Result;
use loglens_engine::SearchOptions;
use owo_colors::OwoColorize;

use crate::context::CliContext;
use crate::output::{one_line, print_json, use_color};
use crate::types::OutputFormat;

pub fn handle(
    ctx: &CliContext,
    terms: &[String],
    limit: usize,
    per_session: usize,
) -> Result<()> {
    let query = terms.join(" ");
    let options = SearchOptions {
        total_limit: limit,
        per_session_limit: per_session,
    };

    let results = ctx.engine.search(&query, options, &ctx.roots(None))?;

    if ctx.format == OutputFormat::Json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!("No matches for '{}'.", query);
        return Ok(());
    }

    let color = use_color();
    for result in &results {
        let short_id: String = result.session_id.chars().take(12).collect();
        let origin = if result.from_fallback { "raw" } else { "idx" };
        let location = format!("{}:{} [{}]", short_id, result.position, origin);
        let body = one_line(&result.text, 120);

        if color {
            println!("{}  {}  {}", location.bold(), result.role.as_str().dimmed(), body);
        } else {
            println!("{}  {}  {}", location, result.role.as_str(), body);
        }
    }

    Ok(())
}
