//! Reconciliation loop
//!
//! Each record is classified against the current instant and dispatched to
//! one of three branches: skip, refresh from the oracle, or run the
//! transition handler. Records are handled one at a time, in input order,
//! with a pacing delay between them. Per-record failures are logged and the
//! record is left as it was.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::DstError;
use crate::invoker::ActionInvoker;
use crate::offset;
use crate::oracle::TransitionOracle;
use crate::record::TimezoneRecord;

/// Default classification window in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Default delay between consecutive records.
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Transition is more than the tolerance ahead
    FarFuture,
    /// Transition is more than the tolerance behind
    Stale,
    /// Transition is within the tolerance either side of now
    Imminent,
}

/// Classify a stored transition instant.
///
/// `now + tolerance` itself is far-future (strict `>`); `now - tolerance`
/// itself is imminent (stale requires strict `<`).
pub fn classify(next_transition_epoch: i64, now: i64, tolerance_secs: i64) -> Classification {
    if next_transition_epoch > now.saturating_add(tolerance_secs) {
        Classification::FarFuture
    } else if next_transition_epoch < now.saturating_sub(tolerance_secs) {
        Classification::Stale
    } else {
        Classification::Imminent
    }
}

/// What happened to one record during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Skipped,
    Refreshed,
    RefreshFailed(String),
    InvalidLocation,
    HandlerSucceeded,
    HandlerFailed(String),
}

/// Tally of outcomes for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub skipped: usize,
    pub refreshed: usize,
    pub refresh_failed: usize,
    pub invalid_location: usize,
    pub handler_succeeded: usize,
    pub handler_failed: usize,
}

impl RunReport {
    pub fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Skipped => self.skipped += 1,
            RecordOutcome::Refreshed => self.refreshed += 1,
            RecordOutcome::RefreshFailed(_) => self.refresh_failed += 1,
            RecordOutcome::InvalidLocation => self.invalid_location += 1,
            RecordOutcome::HandlerSucceeded => self.handler_succeeded += 1,
            RecordOutcome::HandlerFailed(_) => self.handler_failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.skipped
            + self.refreshed
            + self.refresh_failed
            + self.invalid_location
            + self.handler_succeeded
            + self.handler_failed
    }

    /// Per-record problems seen this run.
    pub fn failures(&self) -> usize {
        self.refresh_failed + self.invalid_location + self.handler_failed
    }
}

/// Loop settings, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileSettings {
    pub tolerance_secs: i64,
    pub pacing_delay: Duration,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
            pacing_delay: DEFAULT_PACING_DELAY,
        }
    }
}

/// Result of reconciling a record set.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub records: Vec<TimezoneRecord>,
    pub outcomes: Vec<RecordOutcome>,
    pub report: RunReport,
}

pub struct Reconciler<O, I> {
    oracle: O,
    invoker: I,
    settings: ReconcileSettings,
}

impl<O, I> Reconciler<O, I>
where
    O: TransitionOracle,
    I: ActionInvoker,
{
    pub fn new(oracle: O, invoker: I, settings: ReconcileSettings) -> Self {
        Self {
            oracle,
            invoker,
            settings,
        }
    }

    /// Reconcile every record against `now` (epoch seconds).
    ///
    /// Membership and order of the record set never change; only the
    /// transition fields of successfully refreshed records do.
    pub async fn reconcile(&self, mut records: Vec<TimezoneRecord>, now: i64) -> Reconciled {
        let mut outcomes = Vec::with_capacity(records.len());
        let mut report = RunReport::default();

        for (index, record) in records.iter_mut().enumerate() {
            if index > 0 && !self.settings.pacing_delay.is_zero() {
                sleep(self.settings.pacing_delay).await;
            }

            let outcome = self.process(record, now).await;
            report.record(&outcome);
            outcomes.push(outcome);
        }

        info!(
            "Reconciled {} records: {} skipped, {} refreshed, {} refresh failed, {} invalid, {} handler ok, {} handler failed",
            report.total(),
            report.skipped,
            report.refreshed,
            report.refresh_failed,
            report.invalid_location,
            report.handler_succeeded,
            report.handler_failed
        );

        Reconciled {
            records,
            outcomes,
            report,
        }
    }

    async fn process(&self, record: &mut TimezoneRecord, now: i64) -> RecordOutcome {
        let tolerance = self.settings.tolerance_secs;

        match classify(record.next_transition_epoch, now, tolerance) {
            Classification::FarFuture => {
                info!(
                    "{}: transition more than {}s ahead, skipping",
                    record.location, tolerance
                );
                RecordOutcome::Skipped
            }
            Classification::Stale => {
                info!(
                    "{}: transition more than {}s behind, querying oracle",
                    record.location, tolerance
                );
                self.refresh(record).await
            }
            Classification::Imminent => {
                info!(
                    "{}: transition within {}s, running handler",
                    record.location, tolerance
                );
                self.run_handler(record).await
            }
        }
    }

    async fn refresh(&self, record: &mut TimezoneRecord) -> RecordOutcome {
        let key = match offset::resolve(&record.location) {
            Ok(key) => key,
            Err(e) => {
                warn!("{}", e);
                return RecordOutcome::InvalidLocation;
            }
        };

        match self.oracle.lookup(&key).await {
            Ok(info) => {
                record.apply(&info);
                info!(
                    "{}: next transition {} (direction {}, offset {}h)",
                    record.location,
                    format_epoch(info.next_transition_epoch),
                    info.direction,
                    info.offset_hours
                );
                RecordOutcome::Refreshed
            }
            Err(e) => {
                warn!("{}: refresh failed: {}", record.location, e);
                RecordOutcome::RefreshFailed(e.to_string())
            }
        }
    }

    async fn run_handler(&self, record: &TimezoneRecord) -> RecordOutcome {
        let result = self
            .invoker
            .invoke(
                &record.location,
                record.transition_direction,
                record.current_offset_hours,
            )
            .await;

        match result {
            Ok(status) if status.success() => {
                info!("{}: handler completed", record.location);
                RecordOutcome::HandlerSucceeded
            }
            Ok(status) => {
                let err = DstError::InvokerFailure(match status.code {
                    Some(code) => format!("exited with status {}", code),
                    None => "terminated by signal".to_string(),
                });
                warn!("{}: {}", record.location, err);
                RecordOutcome::HandlerFailed(err.to_string())
            }
            Err(e) => {
                error!("{}: {}", record.location, e);
                RecordOutcome::HandlerFailed(e.to_string())
            }
        }
    }
}

/// Render epoch seconds as RFC 3339 for log lines.
pub fn format_epoch(epoch: i64) -> String {
    chrono::DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}
