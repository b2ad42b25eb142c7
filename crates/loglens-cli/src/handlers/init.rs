use anyhow::Result;

use crate::config::Config;
use crate::context::CliContext;
use crate::output::print_json;
use crate::types::OutputFormat;

pub fn handle(ctx: &CliContext, refresh: bool) -> Result<()> {
    let config_path = ctx.data_dir.join("config.toml");

    if config_path.exists() && !refresh {
        println!(
            "Configuration already exists at {} (use --refresh to re-detect)",
            config_path.display()
        );
        return Ok(());
    }

    let config = Config::detect_sources();
    config.save_to(&config_path)?;

    if ctx.format == OutputFormat::Json {
        return print_json(&config);
    }

    if config.sources.is_empty() {
        println!("No assistant CLI log roots found on this host.");
        println!("Edit {} to add sources manually.", config_path.display());
        return Ok(());
    }

    println!("Detected {} source(s):", config.sources.len());
    for (name, source) in &config.sources {
        println!("  {:8} {}", name, source.log_root.display());
    }
    println!("Wrote {}", config_path.display());

    Ok(())
}
