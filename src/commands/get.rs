use crate::cli::GetArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::output::text;

pub async fn run(ctx: &AppContext, args: GetArgs) -> AppResult<()> {
    let source = ctx.mail_source().await?;
    let message = source.get_message(&args.id).await?;
    ctx.output.emit(&text::message_detail(&message), &message)
}
