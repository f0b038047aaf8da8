//! Wire types for the store's list and write actions.

use serde::{Deserialize, Serialize};

use crate::queue::{Job, VideoStatus};

pub const UPDATE_VIDEO_STATUS: &str = "updateVideoStatus";
pub const FINALIZE_VIDEO_UPLOAD: &str = "finalizeVideoUpload";

/// Body of the list query: `{ items: [Job...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub items: Vec<Job>,
}

/// `updateVideoStatus` write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub action: &'static str,
    pub photo_id: String,
    pub status: VideoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl StatusUpdate {
    fn new(photo_id: &str, status: VideoStatus) -> Self {
        Self {
            action: UPDATE_VIDEO_STATUS,
            photo_id: photo_id.to_string(),
            status,
            provider_url: None,
            task_id: None,
        }
    }

    pub fn processing(photo_id: &str, task_id: &str) -> Self {
        Self {
            task_id: Some(task_id.to_string()),
            ..Self::new(photo_id, VideoStatus::Processing)
        }
    }

    pub fn ready_url(photo_id: &str, provider_url: &str) -> Self {
        Self {
            provider_url: Some(provider_url.to_string()),
            ..Self::new(photo_id, VideoStatus::ReadyUrl)
        }
    }

    pub fn failed(photo_id: &str) -> Self {
        Self::new(photo_id, VideoStatus::Failed)
    }
}

/// `finalizeVideoUpload` write: copy the provider's video into the session folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeUpload {
    pub action: &'static str,
    pub photo_id: String,
    pub video_url: String,
    pub session_folder_id: Option<String>,
}

impl FinalizeUpload {
    pub fn new(photo_id: &str, video_url: &str, session_folder_id: Option<&str>) -> Self {
        Self {
            action: FINALIZE_VIDEO_UPLOAD,
            photo_id: photo_id.to_string(),
            video_url: video_url.to_string(),
            session_folder_id: session_folder_id.map(str::to_string),
        }
    }
}

/// `{ ok, fileId?, error? }` answer to either write.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteAck {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
