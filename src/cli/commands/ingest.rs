use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, Namespace, OutputFormat};
use crate::services::RagService;
use crate::utils::is_pdf_filename;

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(required = true, help = "Path to the PDF file")]
    pub path: PathBuf,

    #[arg(
        long,
        short = 's',
        help = "Add to an existing session instead of starting a new one"
    )]
    pub session: Option<String>,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let filename = args
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !is_pdf_filename(&filename) {
        anyhow::bail!("only PDF files are supported: {}", args.path.display());
    }
    if !args.path.is_file() {
        anyhow::bail!("file not found: {}", args.path.display());
    }

    let namespace = match Namespace::from_session_id(args.session.as_deref()) {
        Namespace::Default => Namespace::new_session(),
        session => session,
    };

    let config = Config::load()?;
    let formatter = get_formatter(format);

    if verbose {
        eprintln!("Ingesting: {}", args.path.display());
        eprintln!("  Session: {namespace}");
        eprintln!("  Chunk size: {} tokens", config.ingest.chunk_size);
    }

    let service = RagService::from_config(&config).await?;
    let summary = service
        .ingest_file(&args.path, &filename, &namespace)
        .await
        .with_context(|| format!("failed to ingest {}", args.path.display()))?;

    print!("{}", formatter.format_ingest(&summary));
    Ok(())
}
