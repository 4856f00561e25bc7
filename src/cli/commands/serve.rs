use anyhow::Result;
use clap::Args;

use crate::models::Config;
use crate::server::run_server;

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, short = 'b', help = "Address to listen on (overrides RAGDOC_BIND)")]
    pub bind: Option<String>,
}

pub async fn handle_serve(args: ServeArgs) -> Result<()> {
    let mut config = Config::load()?;

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    run_server(config)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))
}
