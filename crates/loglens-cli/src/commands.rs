use anyhow::Result;

use crate::args::{Cli, Commands, IndexCommand};
use crate::context::CliContext;
use crate::handlers;
use crate::logging;

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level);

    let ctx = CliContext::init(&cli)?;

    match &cli.command {
        Commands::Init { refresh } => handlers::init::handle(&ctx, *refresh),
        Commands::Index { command } => match command {
            IndexCommand::Update {
                level,
                force,
                source,
            } => handlers::index::update(&ctx, *level, *force, source.as_deref()),
            IndexCommand::Watch => handlers::index::watch(&ctx),
            IndexCommand::Vacuum => handlers::index::vacuum(&ctx),
        },
        Commands::Sessions { source, limit } => {
            handlers::sessions::handle(&ctx, source.as_deref(), *limit)
        }
        Commands::Show { session_id } => handlers::show::handle(&ctx, session_id),
        Commands::Search {
            terms,
            limit,
            per_session,
        } => handlers::search::handle(&ctx, terms, *limit, *per_session),
        Commands::Classify { line } => handlers::classify::handle(&ctx, line.as_deref()),
    }
}
