use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ragdoc::cli::commands::{handle_ask, handle_ingest, handle_reset, handle_serve, handle_status};
use ragdoc::cli::output::get_formatter;
use ragdoc::cli::{Cli, Commands};
use ragdoc::models::OutputFormat;
use ragdoc::server::shutdown_signal;

const DEFAULT_LOG_FILTER: &str = "ragdoc=info,tower_http=info";

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("ragdoc=debug,tower_http=debug")
        } else {
            EnvFilter::new(DEFAULT_LOG_FILTER)
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = cli.format.unwrap_or_default();
    let verbose = cli.verbose;

    match cli.command {
        // The server handles its own graceful shutdown.
        Commands::Serve(args) => handle_serve(args).await,
        command => {
            tokio::select! {
                result = run_command(command, format, verbose) => {
                    if let Err(e) = result {
                        eprint!("{}", get_formatter(format).format_error(&format!("{e:#}")));
                        std::process::exit(1);
                    }
                }
                _ = shutdown_signal() => {
                    eprintln!("\nReceived shutdown signal, cleaning up...");
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
            }
            Ok(())
        }
    }
}

async fn run_command(command: Commands, format: OutputFormat, verbose: bool) -> Result<()> {
    match command {
        Commands::Serve(args) => {
            handle_serve(args).await?;
        }
        Commands::Ingest(args) => {
            handle_ingest(args, format, verbose).await?;
        }
        Commands::Ask(args) => {
            handle_ask(args, format, verbose).await?;
        }
        Commands::Reset(args) => {
            handle_reset(args, format, verbose).await?;
        }
        Commands::Status => {
            handle_status(format, verbose).await?;
        }
    }

    Ok(())
}
