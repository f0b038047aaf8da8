use thiserror::Error;

use crate::store::StoreError;

/// Errors that abort a whole tick.
///
/// Everything scoped to a single job is recovered inside the dispatcher and
/// lands in [`TickReport::errors`](crate::queue::TickReport) instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot fetch failed: {0}")]
    Snapshot(#[from] StoreError),

    #[error("tick exceeded its {0}s budget")]
    Timeout(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Stable code carried in the trigger's error payload.
    pub fn fault_code(&self) -> &'static str {
        match self {
            DispatchError::Config(_) => "CONFIG",
            DispatchError::Snapshot(_) => "SNAPSHOT_FAILED",
            DispatchError::Timeout(_) => "TICK_TIMEOUT",
            DispatchError::Internal(_) => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_codes_are_stable() {
        assert_eq!(DispatchError::Config("x".into()).fault_code(), "CONFIG");
        assert_eq!(DispatchError::Timeout(30).fault_code(), "TICK_TIMEOUT");
        assert_eq!(DispatchError::Internal("x".into()).fault_code(), "INTERNAL");
        let snapshot = DispatchError::from(StoreError::ApiError {
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(snapshot.fault_code(), "SNAPSHOT_FAILED");
    }

    #[test]
    fn timeout_display() {
        assert_eq!(
            DispatchError::Timeout(240).to_string(),
            "tick exceeded its 240s budget"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DispatchError>();
    }
}
