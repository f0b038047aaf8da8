use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::provider::{GenerationRequest, TaskProvider, TaskStatus, extract};
use crate::queue::{ArchiveOutcome, Job, TickReport, VideoStatus};
use crate::store::{FinalizeUpload, JobStore, StatusUpdate};

/// Advances the job sheet one tick at a time.
///
/// A tick reads a fresh snapshot, polls the provider for every in-flight job,
/// then admits queued jobs into whatever concurrency budget the *snapshot*
/// leaves free. Calls are made one job at a time. Nothing here locks the
/// store: overlapping ticks can over-admit, and the next tick corrects it.
pub struct TickDispatcher<S, P> {
    store: Arc<S>,
    provider: P,
    config: DispatchConfig,
    /// Archival uploads running detached when `archive_in_background` is set.
    archivals: JoinSet<ArchiveOutcome>,
}

/// Snapshot counts for the `status` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSummary {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub active: usize,
    pub free_slots: usize,
}

impl<S, P> TickDispatcher<S, P>
where
    S: JobStore + 'static,
    P: TaskProvider,
{
    pub fn new(store: S, provider: P, config: DispatchConfig) -> Self {
        Self {
            store: Arc::new(store),
            provider,
            config,
            archivals: JoinSet::new(),
        }
    }

    pub fn pending_archivals(&self) -> usize {
        self.archivals.len()
    }

    /// Run one tick.
    ///
    /// Only a failed snapshot aborts the tick. Every per-job failure is logged,
    /// appended to the report, and left for the next tick to retry.
    pub async fn run(&mut self) -> Result<TickReport, DispatchError> {
        let mut report = TickReport::begin();
        let span = tracing::info_span!("tick", tick_id = %report.tick_id);

        async {
            let jobs = self.store.list_jobs().await.map_err(|e| {
                tracing::error!(error = %e, "snapshot fetch failed, aborting tick");
                DispatchError::Snapshot(e)
            })?;

            // Only once this tick is sure to return a report; until then
            // finished uploads stay joinable on the set.
            self.collect_finished_archivals(&mut report);

            // Taken from the snapshot before reconciliation: resolutions written
            // below may not be visible yet, so a job resolved this tick still
            // holds its slot until the next one.
            let active = count_active(&jobs);
            tracing::debug!(jobs = jobs.len(), active, "snapshot loaded");

            for job in jobs.iter().filter(|job| job.is_in_flight()) {
                self.reconcile(job, &mut report).await;
            }

            let slots = self.config.max_concurrent.saturating_sub(active);
            if slots == 0 {
                tracing::debug!(active, cap = self.config.max_concurrent, "no free slots");
            }
            for job in jobs.iter().filter(|job| job.is_queued()).take(slots) {
                self.admit(job, &mut report).await;
            }

            let report = report.finish();
            tracing::info!(
                processed = report.processed,
                started = report.started,
                errors = report.errors.len(),
                duration_ms = report.duration_ms,
                "tick complete"
            );
            Ok::<_, DispatchError>(report)
        }
        .instrument(span)
        .await
    }

    /// Fetch a snapshot and count it. Makes no writes.
    pub async fn summarize(&self) -> Result<QueueSummary, DispatchError> {
        let jobs = self.store.list_jobs().await?;
        let mut by_status = BTreeMap::new();
        for job in &jobs {
            *by_status
                .entry(job.video_status.to_string())
                .or_insert(0) += 1;
        }
        let active = count_active(&jobs);
        Ok(QueueSummary {
            total: jobs.len(),
            by_status,
            active,
            free_slots: self.config.max_concurrent.saturating_sub(active),
        })
    }

    /// Wait for every detached archival and return their outcomes.
    pub async fn shutdown(&mut self) -> Vec<ArchiveOutcome> {
        let mut outcomes = Vec::new();
        while let Some(joined) = self.archivals.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(error = %e, "archival task did not complete"),
            }
        }
        outcomes
    }

    async fn reconcile(&mut self, job: &Job, report: &mut TickReport) {
        let Some(task_id) = job.video_task_id.as_deref() else {
            return;
        };

        let response = match self.provider.get_task(task_id).await {
            Ok(response) => response,
            Err(e) if e.is_non_ok_response() => {
                tracing::warn!(photo_id = %job.id, task_id, error = %e, "status query not ok, re-polling next tick");
                return;
            }
            Err(e) => {
                tracing::warn!(photo_id = %job.id, task_id, error = %e, "status query failed");
                report.record_error(format!("status {}: {e}", job.id));
                return;
            }
        };

        match extract::task_status(&response) {
            TaskStatus::Succeeded => {
                let Some(url) = extract::video_url(&response) else {
                    tracing::debug!(photo_id = %job.id, task_id, "succeeded without a video url");
                    return;
                };

                // Publish the URL first so consumers are not held up by archival.
                let update = StatusUpdate::ready_url(&job.id, &url);
                if let Err(e) = self.store.update_video_status(&update).await {
                    tracing::error!(photo_id = %job.id, error = %e, "ready_url write failed");
                    report.record_error(format!("ready_url {}: {e}", job.id));
                    return;
                }
                tracing::info!(photo_id = %job.id, task_id, url = %url, "video ready");
                report.processed += 1;

                self.archive(job, &url, report).await;
            }
            TaskStatus::Failed => {
                match self
                    .store
                    .update_video_status(&StatusUpdate::failed(&job.id))
                    .await
                {
                    Ok(()) => tracing::info!(photo_id = %job.id, task_id, "generation failed"),
                    Err(e) => {
                        tracing::error!(photo_id = %job.id, error = %e, "failed status write did not land");
                        report.record_error(format!("failed {}: {e}", job.id));
                    }
                }
            }
            TaskStatus::Pending(status) => {
                tracing::debug!(photo_id = %job.id, task_id, status = %status, "still running");
            }
        }
    }

    async fn archive(&mut self, job: &Job, url: &str, report: &mut TickReport) {
        let upload = FinalizeUpload::new(&job.id, url, job.session_folder_id.as_deref());

        if self.config.archive_in_background {
            let store = Arc::clone(&self.store);
            self.archivals
                .spawn(async move { finalize(store.as_ref(), &upload).await });
        } else {
            report.record_archive(finalize(self.store.as_ref(), &upload).await);
        }
    }

    async fn admit(&self, job: &Job, report: &mut TickReport) {
        let request = GenerationRequest::for_job(job, &self.config);

        let response = match self.provider.create_task(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(photo_id = %job.id, error = %e, "task creation failed, job stays queued");
                report.record_error(format!("create {}: {e}", job.id));
                return;
            }
        };

        let Some(task_id) = extract::task_id(&response) else {
            tracing::warn!(photo_id = %job.id, "task creation returned no task id, job stays queued");
            report.record_error(format!("create {}: no task id in response", job.id));
            return;
        };

        match self
            .store
            .update_video_status(&StatusUpdate::processing(&job.id, &task_id))
            .await
        {
            Ok(()) => {
                tracing::info!(photo_id = %job.id, task_id = %task_id, model = %request.model, "job admitted");
                report.started += 1;
            }
            Err(e) => {
                // The provider task keeps running without a row pointing at it.
                tracing::error!(photo_id = %job.id, task_id = %task_id, error = %e, "processing write failed");
                report.record_error(format!("processing {}: {e}", job.id));
            }
        }
    }

    fn collect_finished_archivals(&mut self, report: &mut TickReport) {
        while let Some(joined) = self.archivals.try_join_next() {
            match joined {
                Ok(outcome) => report.record_archive(outcome),
                Err(e) => report.record_error(format!("archival task: {e}")),
            }
        }
    }
}

fn count_active(jobs: &[Job]) -> usize {
    jobs.iter()
        .filter(|job| job.video_status == VideoStatus::Processing)
        .count()
}

async fn finalize<S: JobStore>(store: &S, upload: &FinalizeUpload) -> ArchiveOutcome {
    match store.finalize_video_upload(upload).await {
        Ok(file_id) => {
            tracing::info!(photo_id = %upload.photo_id, file_id = ?file_id, "video archived");
            ArchiveOutcome::archived(&upload.photo_id, file_id)
        }
        Err(e) => {
            tracing::warn!(photo_id = %upload.photo_id, error = %e, "archival failed, status stays ready_url");
            ArchiveOutcome::failed(&upload.photo_id, e.to_string())
        }
    }
}
