//! Background job scheduler.
//!
//! Runs the legacy price repair on `CATALOG_REPAIR_CRON` when configured.
//! List requests repair on demand regardless, so the job only keeps stored
//! documents clean between reads.

use std::sync::Arc;

use catalog_db::ProductStore;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression does not parse, or the scheduler fails to start.
pub async fn build_scheduler(
    store: Arc<dyn ProductStore>,
    repair_cron: Option<&str>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    if let Some(cron) = repair_cron {
        register_repair_job(&scheduler, store, cron).await?;
        tracing::info!(cron, "scheduler: price repair job registered");
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_repair_job(
    scheduler: &JobScheduler,
    store: Arc<dyn ProductStore>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let store = Arc::clone(&store);

        Box::pin(async move {
            match store.repair_prices().await {
                Ok(0) => tracing::debug!("scheduler: no legacy prices to repair"),
                Ok(repaired) => tracing::info!(repaired, "scheduler: repaired legacy prices"),
                Err(e) => tracing::error!(error = %e, "scheduler: price repair failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
