use std::future::Future;

use reqwest::{Client, Response};

use super::error::StoreError;
use super::types::{FinalizeUpload, JobList, StatusUpdate, WriteAck};
use crate::queue::Job;

const LIST_ACTION: &str = "listPhotos";

/// The system of record for job rows.
///
/// Implemented by [`StoreClient`] over HTTP and by in-memory fakes in tests.
pub trait JobStore: Send + Sync {
    /// Fresh snapshot of every job row, in sheet order.
    fn list_jobs(&self) -> impl Future<Output = Result<Vec<Job>, StoreError>> + Send;

    fn update_video_status(
        &self,
        update: &StatusUpdate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns the archived file id when the store reports one.
    fn finalize_video_upload(
        &self,
        upload: &FinalizeUpload,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;
}

/// HTTP client for the spreadsheet-backed store.
#[derive(Debug, Clone)]
pub struct StoreClient {
    client: Client,
    base_url: String,
}

impl StoreClient {
    pub fn new(base_url: String) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Reuse an existing [`reqwest::Client`] so the store and provider share a pool.
    pub fn with_client(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    async fn post_write<T: serde::Serialize>(
        &self,
        action: &'static str,
        body: &T,
    ) -> Result<WriteAck, StoreError> {
        let response = self.client.post(&self.base_url).json(body).send().await?;
        let text = ensure_success(response).await?;
        let ack: WriteAck = serde_json::from_str(&text)?;
        if !ack.ok {
            return Err(StoreError::Rejected {
                action,
                message: ack
                    .error
                    .unwrap_or_else(|| "no error message".to_string()),
            });
        }
        Ok(ack)
    }
}

impl JobStore for StoreClient {
    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("action", LIST_ACTION)])
            .send()
            .await?;
        let text = ensure_success(response).await?;
        let list: JobList = serde_json::from_str(&text)?;

        let total = list.items.len();
        let jobs: Vec<Job> = list.items.into_iter().filter(|job| !job.id.is_empty()).collect();
        if jobs.len() < total {
            tracing::warn!(skipped = total - jobs.len(), "store rows without an id were skipped");
        }
        Ok(jobs)
    }

    async fn update_video_status(&self, update: &StatusUpdate) -> Result<(), StoreError> {
        self.post_write(update.action, update).await.map(|_| ())
    }

    async fn finalize_video_upload(
        &self,
        upload: &FinalizeUpload,
    ) -> Result<Option<String>, StoreError> {
        self.post_write(upload.action, upload)
            .await
            .map(|ack| ack.file_id)
    }
}

async fn ensure_success(response: Response) -> Result<String, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(StoreError::ApiError {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::VideoStatus;
    use wiremock::matchers::{body_json, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn list_jobs_reads_items_and_skips_blank_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "listPhotos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    { "id": "a", "videoStatus": "queued" },
                    { "id": "", "videoStatus": "queued" },
                    { "id": "b", "videoStatus": "processing", "videoTaskId": "t-1" }
                ]
            })))
            .mount(&server)
            .await;

        let store = StoreClient::new(server.uri());
        let jobs = store.list_jobs().await.unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, "a");
        assert_eq!(jobs[1].video_status, VideoStatus::Processing);
    }

    #[tokio::test]
    async fn list_jobs_surfaces_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("sheet locked"))
            .mount(&server)
            .await;

        let err = StoreClient::new(server.uri()).list_jobs().await.unwrap_err();
        match err {
            StoreError::ApiError { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "sheet locked");
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_jobs_rejects_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = StoreClient::new(server.uri()).list_jobs().await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn update_posts_expected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({
                "action": "updateVideoStatus",
                "photoId": "p1",
                "status": "processing",
                "taskId": "t-7"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        StoreClient::new(server.uri())
            .update_video_status(&StatusUpdate::processing("p1", "t-7"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_with_ok_false_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "ok": false, "error": "row not found" })),
            )
            .mount(&server)
            .await;

        let err = StoreClient::new(server.uri())
            .update_video_status(&StatusUpdate::failed("p1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "store rejected updateVideoStatus: row not found");
    }

    #[tokio::test]
    async fn finalize_returns_file_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "ok": true, "fileId": "drive-123" })),
            )
            .mount(&server)
            .await;

        let file_id = StoreClient::new(server.uri())
            .finalize_video_upload(&FinalizeUpload::new("p1", "http://v", Some("f")))
            .await
            .unwrap();
        assert_eq!(file_id.as_deref(), Some("drive-123"));
    }
}
