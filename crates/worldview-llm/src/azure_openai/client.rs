// Azure OpenAI-specific client implementation

use crate::openai::OpenAIChatResponse;
use crate::streaming::parse_chat_sse_stream;
use crate::traits::{build_chat_payload, ChatClient, ChatRequest, ChatResponse, ChatStream};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

/// Azure OpenAI client (HTTP direct, no SDK)
///
/// Azure OpenAI uses a different endpoint structure and authentication method than OpenAI:
/// - URL: https://{resource}.openai.azure.com/openai/deployments/{deployment}/...
/// - Auth header: api-key instead of Authorization: Bearer
/// - Deployment name is passed via the model parameter in each request
#[derive(Debug)]
pub struct AzureOpenAIClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_version: String,
}

impl AzureOpenAIClient {
    pub fn builder() -> AzureOpenAIClientBuilder {
        AzureOpenAIClientBuilder::default()
    }

    /// Build the full URL for an Azure OpenAI endpoint
    fn build_url(&self, deployment_name: &str, path: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, deployment_name, path, self.api_version
        )
    }

    async fn post_chat(&self, request: &ChatRequest, stream: bool) -> Result<reqwest::Response> {
        let payload = build_chat_payload(
            &request.model,
            false,
            &request.messages,
            &request.options,
            stream,
        );
        let url = self.build_url(&request.model, "chat/completions");

        tracing::debug!(deployment = %request.model, messages = request.messages.len(), stream, "azure chat request");

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Azure OpenAI API error ({}): {}", status, error_text);
        }

        Ok(response)
    }
}

/// Builder for AzureOpenAIClient
#[derive(Default)]
pub struct AzureOpenAIClientBuilder {
    api_key: Option<String>,
    endpoint: Option<String>,
    api_version: Option<String>,
}

impl AzureOpenAIClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the Azure OpenAI endpoint (base URL)
    /// Example: "https://my-resource.openai.azure.com"
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn build(self) -> Result<AzureOpenAIClient> {
        let api_key = self.api_key.context("API key is required")?;
        let endpoint = self.endpoint.context("Endpoint is required")?;
        let api_version = self.api_version.context("API version is required")?;

        let endpoint = endpoint.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "api-key",
            HeaderValue::from_str(&api_key).context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(AzureOpenAIClient {
            http_client,
            endpoint,
            api_version,
        })
    }
}

#[async_trait]
impl ChatClient for AzureOpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let response = self.post_chat(&request, false).await?;

        let raw: OpenAIChatResponse = response
            .json()
            .await
            .context("Failed to parse response")?;

        raw.into_chat_response()
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream> {
        let response = self.post_chat(&request, true).await?;
        Ok(parse_chat_sse_stream(response))
    }
}
