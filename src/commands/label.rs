use serde::Serialize;

use crate::cli::{LabelCommand, LabelMutateArgs};
use crate::context::AppContext;
use crate::error::AppResult;

#[derive(Debug, Serialize)]
struct LabelMutation<'a> {
    id: &'a str,
    added: &'a [String],
    removed: &'a [String],
}

pub async fn run(ctx: &AppContext, command: LabelCommand) -> AppResult<()> {
    match command {
        LabelCommand::Add(args) => mutate(ctx, args, true).await,
        LabelCommand::Rm(args) => mutate(ctx, args, false).await,
    }
}

async fn mutate(ctx: &AppContext, args: LabelMutateArgs, add: bool) -> AppResult<()> {
    let source = ctx.mail_source().await?;
    let none: &[String] = &[];
    let (added, removed) = if add {
        (args.labels.as_slice(), none)
    } else {
        (none, args.labels.as_slice())
    };

    source.apply_labels(&args.id, added, removed).await?;

    let verb = if add { "added" } else { "removed" };
    let text = format!("labels {verb} on {}: {}", args.id, args.labels.join(", "));
    ctx.output.emit(
        &text,
        &LabelMutation {
            id: &args.id,
            added,
            removed,
        },
    )
}
