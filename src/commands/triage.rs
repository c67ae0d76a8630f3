use tracing::{info, warn};

use crate::cli::TriageArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::mail::{MailSource, Message};
use crate::output::json::{self, TriageView};
use crate::output::{OutputMode, text};
use crate::triage::{
    ReplyDrafts, TEMPLATE_VERSION, TriageOutcome, TriagePipeline, create_reply_drafts,
};

enum Row {
    Done(TriageOutcome, ReplyDrafts),
    Failed(String, AppError),
}

pub async fn run(ctx: &AppContext, args: TriageArgs) -> AppResult<()> {
    if args.ids.is_empty() && args.limit == 0 {
        return Err(AppError::InvalidInput(
            "--limit must be greater than 0".to_string(),
        ));
    }

    let client = ctx.model_client()?;
    let source = ctx.mail_source().await?;
    info!(
        source = source.name(),
        backend = client.backend_name(),
        model = client.model(),
        template = TEMPLATE_VERSION,
        "starting triage"
    );

    let (messages, mut rows) = collect_messages(source.as_ref(), &args).await?;
    let pipeline = TriagePipeline::with_marker(&client, ctx.settings.marker_label());
    let results = pipeline
        .triage_batch(source.as_ref(), &messages, args.concurrency)
        .await;

    for (id, result) in results {
        match result {
            Ok(outcome) => {
                if let Some(err) = &outcome.label_error {
                    warn!(id = %id, error = %err, "labels not applied");
                }
                let drafts = if args.create_drafts {
                    create_reply_drafts(source.as_ref(), &outcome).await
                } else {
                    ReplyDrafts::default()
                };
                if let Some(err) = &drafts.error {
                    warn!(
                        id = %id,
                        created = drafts.created.len(),
                        error = %err,
                        "reply drafts incomplete"
                    );
                }
                rows.push(Row::Done(outcome, drafts));
            }
            Err(err) => {
                warn!(id = %id, kind = err.kind(), error = %err, "triage failed");
                rows.push(Row::Failed(id, err));
            }
        }
    }

    render(ctx, &rows)?;

    let failed = rows
        .iter()
        .filter(|row| matches!(row, Row::Failed(..)))
        .count();
    if failed > 0 {
        return Err(AppError::TriageIncomplete {
            failed,
            total: rows.len(),
        });
    }

    Ok(())
}

/// Explicit ids are fetched one by one; unknown ids become failed rows.
async fn collect_messages(
    source: &dyn MailSource,
    args: &TriageArgs,
) -> AppResult<(Vec<Message>, Vec<Row>)> {
    if args.ids.is_empty() {
        return Ok((source.list_messages(args.limit).await?, Vec::new()));
    }

    let mut messages = Vec::new();
    let mut failed = Vec::new();
    for id in &args.ids {
        match source.get_message(id).await {
            Ok(message) => messages.push(message),
            Err(err) => failed.push(Row::Failed(id.clone(), err)),
        }
    }
    Ok((messages, failed))
}

fn render(ctx: &AppContext, rows: &[Row]) -> AppResult<()> {
    if ctx.output.mode() == OutputMode::Json {
        let views = rows
            .iter()
            .map(|row| match row {
                Row::Done(outcome, drafts) => TriageView::succeeded(outcome, drafts),
                Row::Failed(id, err) => TriageView::failed(id, err),
            })
            .collect::<Vec<_>>();
        return json::print(&views);
    }

    if rows.is_empty() {
        println!("0 messages");
        return Ok(());
    }

    let cards = rows
        .iter()
        .map(|row| match row {
            Row::Done(outcome, drafts) => text::triage_card(outcome, drafts),
            Row::Failed(id, err) => text::triage_failure(id, err),
        })
        .collect::<Vec<_>>();
    println!("{}", cards.join("\n\n"));
    Ok(())
}
