use crate::cli::{Cli, Command};
use crate::commands;
use crate::context::AppContext;
use crate::error::AppResult;

pub async fn run(cli: Cli) -> AppResult<()> {
    let Cli {
        profile,
        json,
        verbose: _,
        overrides,
        command,
    } = cli;

    let ctx = AppContext::bootstrap(profile, json, overrides)?;

    match command {
        Command::List(args) => commands::list::run(&ctx, args).await,
        Command::Get(args) => commands::get::run(&ctx, args).await,
        Command::Triage(args) => commands::triage::run(&ctx, args).await,
        Command::Label(args) => commands::label::run(&ctx, args.command).await,
        Command::Draft(args) => commands::draft::run(&ctx, args).await,
    }
}
