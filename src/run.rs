//! One complete run: load, reconcile, back up, save.

use tracing::{error, info};

use crate::config::Config;
use crate::error::{DstError, Result};
use crate::invoker::{ActionInvoker, ProcessInvoker};
use crate::oracle::{TimeZoneDbOracle, TransitionOracle};
use crate::reconcile::{Reconciler, RunReport};
use crate::store::RecordStore;

/// Run against the configured store, TimeZoneDB and handler at the current time.
pub async fn run_once(config: &Config) -> Result<RunReport> {
    let reconciler = Reconciler::new(
        TimeZoneDbOracle::from_config(config),
        ProcessInvoker::new(config.transition_batch.clone()),
        config.reconcile_settings(),
    );
    let now = chrono::Utc::now().timestamp();
    run_with(&config.store(), &reconciler, now).await
}

/// Load the full record set, reconcile it at `now`, then persist it.
///
/// A store that cannot be read aborts before any record is touched. A store
/// that cannot be written is reported as [`DstError::NotSaved`] after the
/// records were processed.
pub async fn run_with<O, I>(
    store: &RecordStore,
    reconciler: &Reconciler<O, I>,
    now: i64,
) -> Result<RunReport>
where
    O: TransitionOracle,
    I: ActionInvoker,
{
    let records = store.load()?;
    info!(
        "Loaded {} records from {}",
        records.len(),
        store.path().display()
    );

    let reconciled = reconciler.reconcile(records, now).await;

    if let Err(e) = store.persist(&reconciled.records) {
        if let DstError::NotSaved { .. } = e {
            error!(
                "Processed {} records but did not save them",
                reconciled.report.total()
            );
        }
        return Err(e);
    }

    Ok(reconciled.report)
}
