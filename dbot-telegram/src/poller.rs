//! One poll cycle: fetch a batch, drop stale updates, dispatch the rest, advance the offset.
//!
//! The offset cursor is a private field mutated only by [`PollCycle::process_batch`]; `&mut self`
//! guarantees two cycles never share it concurrently.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dbot_core::{BasicResponse, BotApi, Update};
use handler_chain::{Dispatch, HandlerRegistry, RegistrySnapshot};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::PollConfig;

/// What one cycle did. Offsets are the cursor before the fetch and after the advance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub offset_before: i64,
    pub offset_after: i64,
    pub fetched: usize,
    pub commands: usize,
    pub claimed: usize,
    pub unclaimed: usize,
    pub stale: usize,
    pub failed: usize,
    /// Fetch returned not-ok or no result.
    pub transport_failed: bool,
}

/// Fetch-filter-dispatch-advance unit of work. Owns the offset cursor.
pub struct PollCycle {
    api: Arc<dyn BotApi>,
    registry: Arc<HandlerRegistry>,
    config: PollConfig,
    offset: i64,
}

impl PollCycle {
    /// Creates a cycle starting at offset 0 (the platform then returns the oldest pending update).
    pub fn new(api: Arc<dyn BotApi>, registry: Arc<HandlerRegistry>, config: PollConfig) -> Self {
        Self {
            api,
            registry,
            config,
            offset: 0,
        }
    }

    /// Seeds the cursor.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Current cursor: exclusive lower bound for the next fetch.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Runs one cycle. Never fails: transport failures end the cycle early and handler failures
    /// are isolated per update; both are logged and counted in the report.
    pub async fn run_once(&mut self) -> CycleReport {
        let response = self.fetch().await;
        self.process_batch(response).await
    }

    /// Long-polls for the next batch at the current cursor. Leaves the cursor untouched, so
    /// dropping this future loses nothing.
    #[instrument(skip(self), fields(offset = self.offset))]
    pub async fn fetch(&self) -> BasicResponse<Vec<Update>> {
        self.api
            .get_updates(
                self.offset,
                self.config.batch_size,
                self.config.poll_timeout_secs,
            )
            .await
    }

    /// Dispatches a fetched batch and advances the cursor past it. Once a batch has been
    /// fetched this must run to completion.
    #[instrument(skip_all, fields(offset = self.offset))]
    pub async fn process_batch(&mut self, response: BasicResponse<Vec<Update>>) -> CycleReport {
        let mut report = CycleReport {
            offset_before: self.offset,
            ..CycleReport::default()
        };

        let updates = match response {
            BasicResponse {
                ok: true,
                result: Some(updates),
                ..
            } => updates,
            failed => {
                error!(
                    offset = self.offset,
                    description = failed.description.as_deref().unwrap_or("no result"),
                    "Update failed"
                );
                report.transport_failed = true;
                if let Some(partial) = failed.result.as_deref() {
                    self.advance(partial);
                }
                report.offset_after = self.offset;
                return report;
            }
        };

        report.fetched = updates.len();
        let snapshot = self.registry.snapshot();
        let cutoff = self.stale_cutoff();

        for update in &updates {
            self.process(&snapshot, update, cutoff, &mut report).await;
        }

        self.advance(&updates);
        report.offset_after = self.offset;

        if report.fetched > 0 {
            info!(
                fetched = report.fetched,
                commands = report.commands,
                claimed = report.claimed,
                unclaimed = report.unclaimed,
                stale = report.stale,
                failed = report.failed,
                offset = self.offset,
                "Batch processed"
            );
        } else {
            trace!("Empty batch");
        }
        report
    }

    async fn process(
        &self,
        snapshot: &RegistrySnapshot,
        update: &Update,
        cutoff: Option<DateTime<Utc>>,
        report: &mut CycleReport,
    ) {
        if cutoff.is_some_and(|cutoff| update.is_outdated(cutoff)) {
            debug!(update_id = update.update_id, "Outdated update skipped");
            report.stale += 1;
            return;
        }

        match snapshot.dispatch(update).await {
            Ok(Dispatch::Command(_)) => report.commands += 1,
            Ok(Dispatch::Claimed(_)) => report.claimed += 1,
            Ok(Dispatch::Unclaimed) => {
                debug!(update_id = update.update_id, "Update not claimed, dropped");
                report.unclaimed += 1;
            }
            Err(e) => {
                error!(
                    update_id = update.update_id,
                    handler = %e.handler,
                    error = %e.source,
                    "Exception during update processing"
                );
                report.failed += 1;
            }
        }
    }

    /// Messages sent before this instant are stale. `None` disables the filter (threshold too
    /// large to represent).
    fn stale_cutoff(&self) -> Option<DateTime<Utc>> {
        chrono::Duration::from_std(self.config.update_expiration)
            .ok()
            .and_then(|expiration| Utc::now().checked_sub_signed(expiration))
    }

    /// Moves the cursor past the highest id in `updates`. The maximum is taken over the whole
    /// batch since the transport does not promise ordering; the cursor never moves back.
    fn advance(&mut self, updates: &[Update]) {
        let Some(max_id) = updates.iter().map(|u| u.update_id).max() else {
            return;
        };
        let next = max_id.saturating_add(1);
        if next > self.offset {
            trace!(from = self.offset, to = next, "offset advanced");
            self.offset = next;
        } else {
            warn!(
                offset = self.offset,
                max_id, "Batch contained only already-acknowledged updates"
            );
        }
    }
}
