use async_trait::async_trait;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

use crate::common::errors::Error;
use crate::common::utils::extract_secret_field;
use crate::common::PollRequest;

const POLLING_FUNCTION_ARN_KEY: &str = "POLLING_FUNCTION_ARN";

/// Delivers the next poll step for a request after `delay`.
#[async_trait]
pub trait ContinuationScheduler: Send + Sync {
    async fn schedule_continuation(
        &self,
        request: &PollRequest,
        delay: Duration,
    ) -> Result<(), Error>;
}

/// Fire-and-forget delivery of a serialized request to a function.
#[async_trait]
pub trait EventInvoker: Send + Sync {
    /// Identifier of the function that receives the continuation.
    async fn target(&self) -> Result<String, Error>;

    async fn invoke_event(&self, target: &str, payload: Vec<u8>) -> Result<(), Error>;
}

/// Sleeps inside the current invocation, then hands the unchanged request to
/// the invoker. The target is resolved before sleeping so a broken secret
/// fails the invocation without spending the interval.
pub struct DelayedScheduler<I> {
    invoker: I,
}

impl<I: EventInvoker> DelayedScheduler<I> {
    pub fn new(invoker: I) -> Self {
        Self { invoker }
    }
}

#[async_trait]
impl<I: EventInvoker> ContinuationScheduler for DelayedScheduler<I> {
    async fn schedule_continuation(
        &self,
        request: &PollRequest,
        delay: Duration,
    ) -> Result<(), Error> {
        let target = self.invoker.target().await?;
        let payload = serde_json::to_vec(request)?;

        info!("Sleeping for {} seconds", delay.as_secs());
        sleep(delay).await;

        info!("Performing recursive invocation");
        self.invoker.invoke_event(&target, payload).await
    }
}

/// Invokes the polling function with `InvocationType::Event`, reading its ARN
/// from the Secrets Manager bundle on every call.
pub struct LambdaInvoker {
    lambda_client: aws_sdk_lambda::Client,
    secrets_client: aws_sdk_secretsmanager::Client,
    secret_id: String,
}

impl LambdaInvoker {
    pub fn new(
        lambda_client: aws_sdk_lambda::Client,
        secrets_client: aws_sdk_secretsmanager::Client,
        secret_id: impl Into<String>,
    ) -> Self {
        Self {
            lambda_client,
            secrets_client,
            secret_id: secret_id.into(),
        }
    }
}

#[async_trait]
impl EventInvoker for LambdaInvoker {
    async fn target(&self) -> Result<String, Error> {
        let output = self
            .secrets_client
            .get_secret_value()
            .secret_id(&self.secret_id)
            .send()
            .await
            .map_err(|err| Error::aws("SecretsManager", err))?;

        extract_secret_field(&self.secret_id, output.secret_string(), POLLING_FUNCTION_ARN_KEY)
    }

    async fn invoke_event(&self, target: &str, payload: Vec<u8>) -> Result<(), Error> {
        let output = self
            .lambda_client
            .invoke()
            .function_name(target)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|err| Error::aws("Lambda", err))?;

        info!(status_code = output.status_code(), "Recursive invocation queued");

        Ok(())
    }
}
