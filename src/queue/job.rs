use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Lifecycle of a job row as recorded in the store.
///
/// Only `Queued` and `Processing` are acted on by a tick. `ReadyUrl → Done`
/// is advanced by the archival side of the store, never by the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Queued,
    Processing,
    ReadyUrl,
    Failed,
    Done,
    /// Blank or unrecognised cell. Never acted on.
    #[default]
    Unknown,
}

impl VideoStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" => VideoStatus::Queued,
            "processing" => VideoStatus::Processing,
            "ready_url" => VideoStatus::ReadyUrl,
            "failed" => VideoStatus::Failed,
            "done" => VideoStatus::Done,
            _ => VideoStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Queued => "queued",
            VideoStatus::Processing => "processing",
            VideoStatus::ReadyUrl => "ready_url",
            VideoStatus::Failed => "failed",
            VideoStatus::Done => "done",
            VideoStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VideoStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cell = cell(deserializer)?;
        Ok(cell.as_deref().map(VideoStatus::parse).unwrap_or_default())
    }
}

/// One row of the job sheet.
///
/// Cells come from a spreadsheet, so identifiers may arrive as numbers and
/// optional parameters as empty strings. Both are normalised on the way in:
/// blank cells become `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default, deserialize_with = "required_cell")]
    pub id: String,
    #[serde(default)]
    pub video_status: VideoStatus,
    #[serde(default, deserialize_with = "cell")]
    pub video_task_id: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub video_prompt: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub video_model: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub video_resolution: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    pub session_folder_id: Option<String>,
}

impl Job {
    /// A job the reconciliation phase should poll: `processing` with a task id.
    pub fn is_in_flight(&self) -> bool {
        self.video_status == VideoStatus::Processing && self.video_task_id.is_some()
    }

    pub fn is_queued(&self) -> bool {
        self.video_status == VideoStatus::Queued
    }
}

fn cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn required_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(cell(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_full_row() {
        let json = r#"{
            "id": "1AbC",
            "videoStatus": "processing",
            "videoTaskId": "cgt-123",
            "videoPrompt": "wave hello",
            "videoModel": "seedance-pro",
            "videoResolution": "1080p",
            "sessionFolderId": "folder-9"
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, "1AbC");
        assert_eq!(job.video_status, VideoStatus::Processing);
        assert_eq!(job.video_task_id.as_deref(), Some("cgt-123"));
        assert_eq!(job.video_resolution.as_deref(), Some("1080p"));
        assert_eq!(job.session_folder_id.as_deref(), Some("folder-9"));
        assert!(job.is_in_flight());
    }

    #[test]
    fn blank_cells_become_none() {
        let json = r#"{
            "id": 42,
            "videoStatus": "queued",
            "videoTaskId": "",
            "videoPrompt": "   ",
            "videoModel": null
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, "42");
        assert!(job.video_task_id.is_none());
        assert!(job.video_prompt.is_none());
        assert!(job.video_model.is_none());
        assert!(job.is_queued());
    }

    #[test]
    fn processing_without_task_id_is_not_in_flight() {
        let job = Job {
            id: "x".into(),
            video_status: VideoStatus::Processing,
            ..Default::default()
        };
        assert!(!job.is_in_flight());
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(VideoStatus::parse(" Ready_URL "), VideoStatus::ReadyUrl);
        assert_eq!(VideoStatus::parse("DONE"), VideoStatus::Done);
        assert_eq!(VideoStatus::parse(""), VideoStatus::Unknown);
        assert_eq!(VideoStatus::parse("archived"), VideoStatus::Unknown);
    }

    #[test]
    fn missing_status_is_unknown() {
        let job: Job = serde_json::from_str(r#"{"id": "a"}"#).unwrap();
        assert_eq!(job.video_status, VideoStatus::Unknown);
        assert!(!job.is_queued());
        assert!(!job.is_in_flight());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&VideoStatus::ReadyUrl).unwrap();
        assert_eq!(json, r#""ready_url""#);
    }
}
