//! Ordered-fallback readers for provider responses.
//!
//! The provider has moved fields around between API revisions, so each value
//! is looked up along a fixed list of paths and the first usable hit wins.

use serde_json::Value;

const STATUS_PATHS: &[&[&str]] = &[&["status"], &["result", "status"], &["data", "status"]];

const VIDEO_URL_PATHS: &[&[&str]] = &[
    &["content", "video_url"],
    &["result", "content", "video_url"],
    &["data", "content", "video_url"],
    &["video_url"],
    &["result", "video_url"],
    &["data", "video_url"],
    &["output", "video_url"],
];

const TASK_ID_PATHS: &[&[&str]] = &[&["id"], &["Result", "id"]];

/// Normalized task status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed,
    /// Still running, queued, or anything we do not recognise (including no status at all).
    Pending(String),
}

impl TaskStatus {
    fn from_raw(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        match lower.as_str() {
            "succeeded" | "success" => TaskStatus::Succeeded,
            "failed" | "error" | "canceled" | "cancelled" => TaskStatus::Failed,
            _ => TaskStatus::Pending(lower),
        }
    }
}

/// First non-empty string (or number, rendered as a string) along `paths`.
pub fn first_string(value: &Value, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| {
        let found = path.iter().try_fold(value, |node, key| node.get(key))?;
        match found {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    })
}

pub fn task_status(response: &Value) -> TaskStatus {
    first_string(response, STATUS_PATHS)
        .map(|raw| TaskStatus::from_raw(&raw))
        .unwrap_or_else(|| TaskStatus::Pending("processing".to_string()))
}

pub fn video_url(response: &Value) -> Option<String> {
    first_string(response, VIDEO_URL_PATHS)
}

pub fn task_id(response: &Value) -> Option<String> {
    first_string(response, TASK_ID_PATHS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_top_level_wins_over_nested() {
        let resp = json!({ "status": "Succeeded", "data": { "status": "failed" } });
        assert_eq!(task_status(&resp), TaskStatus::Succeeded);
    }

    #[test]
    fn status_from_result_then_data() {
        assert_eq!(
            task_status(&json!({ "result": { "status": "ERROR" } })),
            TaskStatus::Failed
        );
        assert_eq!(
            task_status(&json!({ "data": { "status": "success" } })),
            TaskStatus::Succeeded
        );
    }

    #[test]
    fn blank_top_level_status_falls_through() {
        let resp = json!({ "status": "", "result": { "status": "canceled" } });
        assert_eq!(task_status(&resp), TaskStatus::Failed);
    }

    #[test]
    fn missing_status_is_pending() {
        assert_eq!(
            task_status(&json!({ "id": "t" })),
            TaskStatus::Pending("processing".into())
        );
        assert_eq!(
            task_status(&json!({ "status": "queued" })),
            TaskStatus::Pending("queued".into())
        );
    }

    #[test]
    fn video_url_precedence() {
        let resp = json!({
            "content": { "video_url": "http://first" },
            "data": { "video_url": "http://later" }
        });
        assert_eq!(video_url(&resp).as_deref(), Some("http://first"));

        let nested = json!({ "result": { "content": { "video_url": "http://nested" } } });
        assert_eq!(video_url(&nested).as_deref(), Some("http://nested"));

        let output = json!({ "output": { "video_url": "http://output" } });
        assert_eq!(video_url(&output).as_deref(), Some("http://output"));
    }

    #[test]
    fn video_url_absent() {
        assert_eq!(video_url(&json!({ "status": "succeeded", "content": {} })), None);
        assert_eq!(video_url(&json!({ "content": { "video_url": null } })), None);
    }

    #[test]
    fn task_id_from_either_shape() {
        assert_eq!(task_id(&json!({ "id": "cgt-1" })).as_deref(), Some("cgt-1"));
        assert_eq!(
            task_id(&json!({ "Result": { "id": "cgt-2" } })).as_deref(),
            Some("cgt-2")
        );
        assert_eq!(task_id(&json!({ "Result": { "id": 77 } })).as_deref(), Some("77"));
        assert_eq!(task_id(&json!({ "error": "quota" })), None);
    }
}
