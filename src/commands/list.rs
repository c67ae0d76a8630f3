use tracing::info;

use crate::cli::ListArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::output::OutputMode;
use crate::output::text;

pub async fn run(ctx: &AppContext, args: ListArgs) -> AppResult<()> {
    if args.limit == 0 {
        return Err(AppError::InvalidInput(
            "--limit must be greater than 0".to_string(),
        ));
    }

    let source = ctx.mail_source().await?;
    let messages = source.list_messages(args.limit).await?;
    info!(source = source.name(), count = messages.len(), "listed messages");

    if ctx.output.mode() == OutputMode::Text {
        if messages.is_empty() {
            println!("0 messages");
            return Ok(());
        }

        let cards = messages
            .iter()
            .enumerate()
            .map(|(index, message)| text::message_summary(index, message))
            .collect::<Vec<_>>();
        println!("{}", cards.join("\n\n"));
        return Ok(());
    }

    let text = format!("{} messages", messages.len());
    ctx.output.emit(&text, &messages)
}
