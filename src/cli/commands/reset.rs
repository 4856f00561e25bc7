use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, Namespace, OutputFormat};
use crate::services::RagService;

#[derive(Debug, Args)]
pub struct ResetArgs {
    #[arg(required = true, help = "Session ID to clear")]
    pub session: String,
}

pub async fn handle_reset(args: ResetArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let namespace = Namespace::from_session_id(Some(&args.session));
    if namespace.is_default() {
        anyhow::bail!("session id cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);

    let service = RagService::from_config(&config).await?;
    service
        .reset(&namespace)
        .await
        .with_context(|| format!("failed to reset session {namespace}"))?;

    print!(
        "{}",
        formatter.format_message(&format!("Session {namespace} reset"))
    );
    Ok(())
}
