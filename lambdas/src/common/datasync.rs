use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_datasync::config::Region;

use crate::common::errors::Error;

#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    /// Raw status string of the task execution, e.g. `TRANSFERRING` or `SUCCESS`.
    async fn task_status(
        &self,
        region_name: &str,
        task_execution_arn: &str,
    ) -> Result<String, Error>;
}

/// Reads task execution status from DataSync in whichever region the request names.
pub struct DataSyncStatusSource {
    sdk_config: SdkConfig,
}

impl DataSyncStatusSource {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    fn client(&self, region_name: &str) -> aws_sdk_datasync::Client {
        let config = aws_sdk_datasync::config::Builder::from(&self.sdk_config)
            .region(Region::new(region_name.to_owned()))
            .build();

        aws_sdk_datasync::Client::from_conf(config)
    }
}

#[async_trait]
impl TaskStatusSource for DataSyncStatusSource {
    async fn task_status(
        &self,
        region_name: &str,
        task_execution_arn: &str,
    ) -> Result<String, Error> {
        let output = self
            .client(region_name)
            .describe_task_execution()
            .task_execution_arn(task_execution_arn)
            .send()
            .await
            .map_err(|err| Error::aws("DataSync", err))?;

        output
            .status()
            .map(|status| status.as_str().to_owned())
            .ok_or_else(|| Error::MissingTaskStatus(task_execution_arn.to_owned()))
    }
}
