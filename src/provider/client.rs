use std::future::Future;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use super::error::ProviderError;
use super::types::GenerationRequest;

const TASKS_PATH: &str = "/contents/generations/tasks";

/// The generation provider's task API.
///
/// Responses are returned as raw JSON; shape normalisation lives in
/// [`extract`](super::extract).
pub trait TaskProvider: Send + Sync {
    fn create_task(
        &self,
        req: &GenerationRequest,
    ) -> impl Future<Output = Result<Value, ProviderError>> + Send;

    fn get_task(&self, task_id: &str)
    -> impl Future<Output = Result<Value, ProviderError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ProviderClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl ProviderClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self::with_client(Client::new(), api_key, base_url)
    }

    pub fn with_client(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            client,
            base_url,
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}{TASKS_PATH}", self.base_url)
    }
}

impl TaskProvider for ProviderClient {
    async fn create_task(&self, req: &GenerationRequest) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(self.tasks_url())
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn get_task(&self, task_id: &str) -> Result<Value, ProviderError> {
        let response = self
            .client
            .get(format!("{}/{task_id}", self.tasks_url()))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        parse_response(response).await
    }
}

async fn parse_response(response: Response) -> Result<Value, ProviderError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| secs * 1000)
            .unwrap_or(1000);
        return Err(ProviderError::RateLimited {
            retry_after_ms: retry_after,
        });
    }

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(ProviderError::ApiError {
            status: status.as_u16(),
            message,
        });
    }

    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}
