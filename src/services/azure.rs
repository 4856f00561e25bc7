//! Shared plumbing for Azure OpenAI deployments.

use std::time::Duration;

use reqwest::Client;

use crate::models::AzureConfig;

/// A single deployment endpoint (`/openai/deployments/{name}/{operation}`).
#[derive(Debug, Clone)]
pub(crate) struct AzureDeployment {
    pub client: Client,
    pub url: String,
    pub api_key: String,
    pub deployment: String,
}

impl AzureDeployment {
    /// Build a deployment endpoint. Errors are returned as plain messages for the
    /// caller to wrap in its own error type.
    pub fn new(config: &AzureConfig, deployment: &str, operation: &str) -> Result<Self, String> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| "AZURE_OPENAI_API_KEY is not set".to_string())?;
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or_else(|| "AZURE_OPENAI_ENDPOINT is not set".to_string())?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| e.to_string())?;

        Ok(Self {
            client,
            url: deployment_url(endpoint, deployment, operation, &config.api_version),
            api_key,
            deployment: deployment.to_string(),
        })
    }
}

pub(crate) fn deployment_url(
    endpoint: &str,
    deployment: &str,
    operation: &str,
    api_version: &str,
) -> String {
    format!(
        "{}/openai/deployments/{}/{}?api-version={}",
        endpoint.trim_end_matches('/'),
        deployment,
        operation,
        api_version
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_url() {
        assert_eq!(
            deployment_url(
                "https://example.openai.azure.com/",
                "text-embedding-3-small",
                "embeddings",
                "2023-05-15"
            ),
            "https://example.openai.azure.com/openai/deployments/text-embedding-3-small/embeddings?api-version=2023-05-15"
        );
    }

    #[test]
    fn test_missing_credentials() {
        let config = AzureConfig::default();
        let err = AzureDeployment::new(&config, "gpt", "chat/completions").unwrap_err();
        assert!(err.contains("AZURE_OPENAI_API_KEY"));
    }
}
