use aws_config::BehaviorVersion;
use lambda_runtime::{run, service_fn, Error as LambdaError, LambdaEvent};
use std::time::Duration;
use tracing::field::Empty;
use tracing::{info, warn, Span};

mod common;
use crate::common::config::{Config, MAX_LAMBDA_TIMEOUT};
use crate::common::datasync::{DataSyncStatusSource, TaskStatusSource};
use crate::common::errors::Error;
use crate::common::logging::{self, SOURCE_TAG};
use crate::common::scheduler::{ContinuationScheduler, DelayedScheduler, LambdaInvoker};
use crate::common::status::TaskState;
use crate::common::store::{JobContext, JobStore, PgConnector, StoreConnector};
use crate::common::PollRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollOutcome {
    Finished(TaskState),
    Continued,
}

/// One step of the poll loop: read the task status, persist it, then either
/// finalize the job or hand the request back to the scheduler.
struct Poller<C, T, S> {
    connector: C,
    status_source: T,
    scheduler: S,
    polling_interval: Duration,
}

impl<C, T, S> Poller<C, T, S>
where
    C: StoreConnector,
    T: TaskStatusSource,
    S: ContinuationScheduler,
{
    fn new(connector: C, status_source: T, scheduler: S, polling_interval: Duration) -> Self {
        Self {
            connector,
            status_source,
            scheduler,
            polling_interval,
        }
    }

    #[tracing::instrument(
        name = "poll",
        skip_all,
        fields(
            source = SOURCE_TAG,
            id = %request.id,
            task_execution_arn = %request.task_execution_arn,
            client_ip = Empty,
            destination = Empty,
            jti = Empty,
            query = Empty,
            cross_bucket_region = Empty,
            requestId = Empty,
        )
    )]
    async fn handle(&self, request: PollRequest) -> Result<PollOutcome, Error> {
        request.validate()?;

        let mut store = self.connector.connect().await?;
        match store.job_context(&request.id).await {
            Ok(Some(context)) => record_context(&context),
            Ok(None) => warn!("No job record found"),
            Err(err) => warn!(error = %err, "Could not read job context"),
        }

        let status = self
            .status_source
            .task_status(&request.region_name, &request.task_execution_arn)
            .await?;
        info!("Polling jobstatus: {}", status);

        let state = TaskState::from_remote(&status);
        if let Some(job_status) = state.job_status() {
            info!("Updating jobstatus: {}", job_status);
            let updated = store.finalize(&request.id, &status, job_status).await?;
            warn_if_unmatched(updated);
            store.close().await?;

            return Ok(PollOutcome::Finished(state));
        }

        let updated = store.record_transfer_state(&request.id, &status).await?;
        warn_if_unmatched(updated);
        drop(store);

        self.scheduler
            .schedule_continuation(&request, self.polling_interval)
            .await?;

        Ok(PollOutcome::Continued)
    }
}

fn record_context(context: &JobContext) {
    let span = Span::current();
    span.record("client_ip", context.client_ip.as_deref());
    span.record("destination", context.destination.as_deref());
    span.record("jti", context.jti.as_deref());
    span.record("query", context.query.as_deref());
    span.record("cross_bucket_region", context.cross_bucket_region.as_deref());
    span.record("requestId", context.request_id.as_deref());
}

fn warn_if_unmatched(rows_affected: u64) {
    if rows_affected == 0 {
        warn!("Status update matched no job record");
    }
}

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    logging::init();

    let config = Config::from_env().map_err(Error::from)?;
    let polling_interval = config.polling_interval();
    if polling_interval >= MAX_LAMBDA_TIMEOUT {
        warn!(
            source = SOURCE_TAG,
            "POLLING_INTERVAL of {}s cannot fit in a Lambda invocation",
            polling_interval.as_secs()
        );
    }

    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let lambda_client = aws_sdk_lambda::Client::new(&aws_config);
    let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

    let poller = Poller::new(
        PgConnector::new(config.connect_options(), config.db_id_type),
        DataSyncStatusSource::new(aws_config),
        DelayedScheduler::new(LambdaInvoker::new(lambda_client, secrets_client, config.secrets)),
        polling_interval,
    );

    run(service_fn(|event: LambdaEvent<PollRequest>| async {
        poller
            .handle(event.payload)
            .await
            .map(|_| ())
            .map_err(LambdaError::from)
    }))
    .await
}
