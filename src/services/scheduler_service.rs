use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::error::Result;
use crate::services::ingestion_service::IngestionPipeline;

/// Registers the periodic ingestion job and starts the scheduler.
///
/// The returned scheduler must be kept alive for the job to keep firing.
pub async fn start_ingestion_scheduler(
    pipeline: Arc<IngestionPipeline>,
    search_query: String,
    interval: Duration,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let pipeline = pipeline.clone();
        let search_query = search_query.clone();
        Box::pin(async move {
            match pipeline.run(&search_query).await {
                Ok(report) => info!(
                    found = report.found,
                    added = report.added,
                    "Scheduled ingestion finished"
                ),
                Err(e) => error!(error = %e, "Scheduled ingestion failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!(interval_secs = interval.as_secs(), "Ingestion scheduler started");
    Ok(scheduler)
}
