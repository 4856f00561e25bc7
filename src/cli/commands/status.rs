use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat, VectorDriver};
use crate::services::create_backend;

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    // Unvalidated: status should still report on a partially configured setup.
    let mut config = Config::load_file()?;
    config.apply_env(|key| std::env::var(key).ok())?;
    let formatter = get_formatter(format);

    let (vector_store_connected, index) =
        if let Ok(store) = create_backend(&config.vector_store).await {
            let connected = store.health_check().await.unwrap_or(false);
            let index = if connected {
                store.get_index_info().await.ok().flatten()
            } else {
                None
            };
            (connected, index)
        } else {
            (false, None)
        };

    let status = StatusInfo {
        azure_endpoint: config.azure.endpoint.clone(),
        embedding_deployment: config.azure.embedding_deployment.clone(),
        chat_deployment: config.azure.chat_deployment.clone(),
        vector_store_driver: config.vector_store.driver.to_string(),
        index_name: config.vector_store.index_name.clone(),
        vector_store_connected,
        index,
    };

    print!("{}", formatter.format_status(&status));

    if !vector_store_connected {
        eprintln!();
        match config.vector_store.driver {
            VectorDriver::Pinecone => {
                eprintln!("Warning: Pinecone not reachable. Check PINECONE_API_KEY and network access.");
            }
            VectorDriver::Qdrant => {
                eprintln!("Warning: Qdrant not running. Start with: docker-compose up -d qdrant");
            }
            VectorDriver::Memory => {}
        }
    }

    Ok(())
}
