use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

use crate::common::store::IdColumnType;

/// Longest timeout a Lambda function can be configured with.
pub const MAX_LAMBDA_TIMEOUT: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub db_user: String,
    pub db_password: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,

    /// Declared type of `emr_job_details.id`; unset compares the column as text
    #[serde(default)]
    pub db_id_type: Option<IdColumnType>,

    /// Secrets Manager id of the bundle holding `POLLING_FUNCTION_ARN`
    pub secrets: String,

    /// Seconds to wait before re-invoking
    pub polling_interval: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval)
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
    }
}
