use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::DispatchError;

/// Result of handing one ready video to the store's archival step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveOutcome {
    pub photo_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArchiveOutcome {
    pub fn archived(photo_id: &str, file_id: Option<String>) -> Self {
        Self {
            photo_id: photo_id.to_string(),
            ok: true,
            file_id,
            error: None,
        }
    }

    pub fn failed(photo_id: &str, error: impl Into<String>) -> Self {
        Self {
            photo_id: photo_id.to_string(),
            ok: false,
            file_id: None,
            error: Some(error.into()),
        }
    }
}

/// Summary of a single tick.
///
/// `errors` keeps the order in which non-fatal failures were hit, so a reader
/// can line it up with the tick's log output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub tick_id: String,
    /// Jobs resolved to `ready_url` this tick.
    pub processed: u32,
    /// Jobs admitted from `queued` to `processing` this tick.
    pub started: u32,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub archives: Vec<ArchiveOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl TickReport {
    pub fn begin() -> Self {
        let now = Utc::now();
        Self {
            tick_id: Uuid::new_v4().to_string(),
            processed: 0,
            started: 0,
            errors: Vec::new(),
            archives: Vec::new(),
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        }
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Failed archival is also surfaced in `errors`.
    pub fn record_archive(&mut self, outcome: ArchiveOutcome) {
        if let Some(error) = &outcome.error {
            self.errors
                .push(format!("archive {}: {error}", outcome.photo_id));
        }
        self.archives.push(outcome);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.duration_ms = (self.finished_at - self.started_at).num_milliseconds();
        self
    }
}

/// Payload returned to whoever triggered the tick.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TickResponse {
    Success { ok: bool, report: TickReport },
    Fault { ok: bool, error: String, code: String },
}

impl TickResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, TickResponse::Success { .. })
    }
}

impl From<Result<TickReport, DispatchError>> for TickResponse {
    fn from(result: Result<TickReport, DispatchError>) -> Self {
        match result {
            Ok(report) => TickResponse::Success { ok: true, report },
            Err(err) => TickResponse::Fault {
                ok: false,
                code: err.fault_code().to_string(),
                error: err.to_string(),
            },
        }
    }
}
