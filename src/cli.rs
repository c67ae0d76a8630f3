use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::SourceKind;
use crate::llm::BackendKind;

#[derive(Debug, Parser)]
#[command(name = "triage", version, about = "Summarize, prioritize and label email with an LLM")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Profile name to use"
    )]
    pub profile: String,
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Verbose logging")]
    pub verbose: u8,
    #[command(flatten)]
    pub overrides: Overrides,
    #[command(subcommand)]
    pub command: Command,
}

/// Per-invocation overrides of profile settings.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    #[arg(long, global = true, value_enum, help = "Mailbox to read from")]
    pub source: Option<SourceKind>,
    #[arg(long, global = true, help = "Inbox JSON file for the demo source")]
    pub inbox: Option<PathBuf>,
    #[arg(long, global = true, value_enum, help = "Model vendor")]
    pub backend: Option<BackendKind>,
    #[arg(long, global = true, help = "Model name or alias")]
    pub model: Option<String>,
    #[arg(long, global = true, help = "API key for the model backend")]
    pub api_key: Option<String>,
    #[arg(long, global = true, help = "Model call timeout in seconds")]
    pub timeout: Option<u64>,
    #[arg(long, global = true, help = "Use the offline canned-reply model")]
    pub mock: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    List(ListArgs),
    Get(GetArgs),
    Triage(TriageArgs),
    Label(LabelArgs),
    Draft(DraftArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, default_value_t = 10, help = "Maximum messages to return")]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    #[arg(help = "Message id")]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct TriageArgs {
    #[arg(help = "Message ids to triage; defaults to the most recent messages")]
    pub ids: Vec<String>,
    #[arg(long, default_value_t = 5, help = "Messages to triage when no ids are given")]
    pub limit: usize,
    #[arg(long, default_value_t = 4, help = "Model calls in flight at once")]
    pub concurrency: usize,
    #[arg(long, help = "Create drafts for suggested replies")]
    pub create_drafts: bool,
}

#[derive(Debug, Args)]
pub struct LabelArgs {
    #[command(subcommand)]
    pub command: LabelCommand,
}

#[derive(Debug, Subcommand)]
pub enum LabelCommand {
    Add(LabelMutateArgs),
    Rm(LabelMutateArgs),
}

#[derive(Debug, Args)]
pub struct LabelMutateArgs {
    #[arg(help = "Message id")]
    pub id: String,
    #[arg(required = true, num_args = 1.., help = "Labels to mutate")]
    pub labels: Vec<String>,
}

#[derive(Debug, Args)]
pub struct DraftArgs {
    #[arg(help = "Thread to reply in")]
    pub thread_id: String,
    #[arg(long, conflicts_with = "body_file", required_unless_present = "body_file", help = "Inline body text")]
    pub body: Option<String>,
    #[arg(long, help = "Read body from file")]
    pub body_file: Option<PathBuf>,
}
