use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{AnswerInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::RagService;

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, help = "Question to answer")]
    pub question: String,

    #[arg(long, short = 's', help = "Session ID returned by ingest or upload")]
    pub session: Option<String>,
}

pub async fn handle_ask(args: AskArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let question = args.question.trim();
    if question.is_empty() {
        anyhow::bail!("question cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    if verbose {
        eprintln!("Question: \"{question}\"");
        eprintln!("  Top K: {}", config.retrieval.top_k);
        match args.session {
            Some(ref session) => eprintln!("  Session: {session}"),
            None => eprintln!("  Session: (none, default namespace)"),
        }
    }

    let service = RagService::from_config(&config).await?;
    let answer = service
        .answer(question, args.session.as_deref())
        .await
        .context("failed to answer question")?;

    let info = AnswerInfo {
        question: question.to_string(),
        session_id: args.session,
        answer,
        duration_ms: start_time.elapsed().as_millis() as u64,
    };

    if verbose {
        eprintln!("Total: {}ms", info.duration_ms);
        eprintln!();
    }

    print!("{}", formatter.format_answer(&info));
    Ok(())
}
