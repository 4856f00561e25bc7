//! CLI module for the PDF question-answering service.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Ask questions about PDF documents with Azure OpenAI and a vector index.
#[derive(Debug, Parser)]
#[command(name = "ragdoc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve(commands::ServeArgs),

    /// Index a PDF into a session namespace
    Ingest(commands::IngestArgs),

    /// Ask a question against a session's documents
    Ask(commands::AskArgs),

    /// Delete every record in a session namespace
    Reset(commands::ResetArgs),

    /// Check configuration and vector store status
    Status,
}
