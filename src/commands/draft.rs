use std::fs;

use serde::Serialize;

use crate::cli::DraftArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct DraftCreated<'a> {
    thread_id: &'a str,
    draft_id: String,
}

pub async fn run(ctx: &AppContext, args: DraftArgs) -> AppResult<()> {
    let body = read_body(&args)?;
    let source = ctx.mail_source().await?;
    let draft_id = source.create_draft(&args.thread_id, &body).await?;

    let text = format!("created draft {draft_id} in thread {}", args.thread_id);
    ctx.output.emit(
        &text,
        &DraftCreated {
            thread_id: &args.thread_id,
            draft_id,
        },
    )
}

fn read_body(args: &DraftArgs) -> AppResult<String> {
    let body = match (&args.body, &args.body_file) {
        (Some(body), None) => body.clone(),
        (None, Some(path)) => fs::read_to_string(path)?,
        _ => {
            return Err(AppError::InvalidInput(
                "pass exactly one body source: --body or --body-file".to_string(),
            ));
        }
    };

    if body.trim().is_empty() {
        return Err(AppError::InvalidInput("draft body is empty".to_string()));
    }

    Ok(body)
}
