use async_trait::async_trait;
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Row};
use std::sync::Arc;

use crate::common::errors::Error;

/// Declared type of `emr_job_details.id`. Ids arrive as strings, so the bound
/// parameter is cast to the column type to keep the primary key index usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdColumnType {
    Text,
    Integer,
    Bigint,
    Uuid,
}

impl IdColumnType {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Bigint => "bigint",
            Self::Uuid => "uuid",
        }
    }
}

/// Without a declared type the column is compared as text, which matches any
/// key type at the cost of a sequential scan.
fn id_predicate(id_type: Option<IdColumnType>, param: &str) -> String {
    match id_type {
        Some(id_type) => format!("id = {param}::{}", id_type.as_sql()),
        None => format!("id::text = {param}"),
    }
}

#[derive(Debug)]
struct Queries {
    context: String,
    transfer_state_update: String,
    job_status_update: String,
}

impl Queries {
    fn new(id_type: Option<IdColumnType>) -> Self {
        Self {
            context: format!(
                r#"
                SELECT client_ip::text AS client_ip,
                       destination::text AS destination,
                       jti::text AS jti,
                       query::text AS query,
                       cross_bucket_region::text AS cross_bucket_region,
                       "requestId"::text AS request_id
                FROM emr_job_details
                WHERE {}
                "#,
                id_predicate(id_type, "$1")
            ),
            transfer_state_update: format!(
                "UPDATE emr_job_details SET data_transfer_state = $1 WHERE {}",
                id_predicate(id_type, "$2")
            ),
            job_status_update: format!(
                "UPDATE emr_job_details SET jobstatus = $1 WHERE {}",
                id_predicate(id_type, "$2")
            ),
        }
    }
}

/// Columns of a job record that are only used to annotate logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobContext {
    pub client_ip: Option<String>,
    pub destination: Option<String>,
    pub jti: Option<String>,
    pub query: Option<String>,
    pub cross_bucket_region: Option<String>,
    pub request_id: Option<String>,
}

#[async_trait]
pub trait StoreConnector: Send + Sync {
    type Store: JobStore;

    async fn connect(&self) -> Result<Self::Store, Error>;
}

/// Writes against `emr_job_details`. Update methods return the number of rows
/// matched by the id so callers can report a missing record.
#[async_trait]
pub trait JobStore: Send {
    async fn job_context(&mut self, id: &str) -> Result<Option<JobContext>, Error>;

    /// Single auto-committed write of the raw remote status.
    async fn record_transfer_state(&mut self, id: &str, state: &str) -> Result<u64, Error>;

    /// Writes the raw remote status and the final job status in one transaction.
    async fn finalize(&mut self, id: &str, state: &str, job_status: &str) -> Result<u64, Error>;

    async fn close(self) -> Result<(), Error>;
}

pub struct PgConnector {
    options: PgConnectOptions,
    queries: Arc<Queries>,
}

impl PgConnector {
    pub fn new(options: PgConnectOptions, id_type: Option<IdColumnType>) -> Self {
        Self {
            options,
            queries: Arc::new(Queries::new(id_type)),
        }
    }
}

#[async_trait]
impl StoreConnector for PgConnector {
    type Store = PgJobStore;

    async fn connect(&self) -> Result<PgJobStore, Error> {
        let conn = PgConnection::connect_with(&self.options).await?;
        Ok(PgJobStore {
            conn,
            queries: self.queries.clone(),
        })
    }
}

pub struct PgJobStore {
    conn: PgConnection,
    queries: Arc<Queries>,
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn job_context(&mut self, id: &str) -> Result<Option<JobContext>, Error> {
        let row = sqlx::query(&self.queries.context)
            .bind(id)
            .fetch_optional(&mut self.conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(JobContext {
            client_ip: row.try_get("client_ip")?,
            destination: row.try_get("destination")?,
            jti: row.try_get("jti")?,
            query: row.try_get("query")?,
            cross_bucket_region: row.try_get("cross_bucket_region")?,
            request_id: row.try_get("request_id")?,
        }))
    }

    async fn record_transfer_state(&mut self, id: &str, state: &str) -> Result<u64, Error> {
        let result = sqlx::query(&self.queries.transfer_state_update)
            .bind(state)
            .bind(id)
            .execute(&mut self.conn)
            .await?;

        Ok(result.rows_affected())
    }

    async fn finalize(&mut self, id: &str, state: &str, job_status: &str) -> Result<u64, Error> {
        let mut tx = self.conn.begin().await?;

        let result = sqlx::query(&self.queries.transfer_state_update)
            .bind(state)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(&self.queries.job_status_update)
            .bind(job_status)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn close(self) -> Result<(), Error> {
        self.conn.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_id_type_casts_the_parameter() {
        assert_eq!(id_predicate(Some(IdColumnType::Bigint), "$2"), "id = $2::bigint");
        assert_eq!(id_predicate(Some(IdColumnType::Uuid), "$1"), "id = $1::uuid");
        assert_eq!(id_predicate(None, "$1"), "id::text = $1");
    }

    // The tests below run against a real server when DATABASE_URL is set.
    // Each one works on a temporary table that shadows `emr_job_details` for
    // its own connection only.

    async fn seeded_store(id_type: Option<IdColumnType>) -> Option<PgJobStore> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping");
            return None;
        };
        let mut conn = PgConnection::connect(&url).await.unwrap();

        sqlx::query(
            r#"
            CREATE TEMPORARY TABLE emr_job_details (
                id BIGINT PRIMARY KEY,
                jobstatus TEXT,
                data_transfer_state TEXT,
                client_ip TEXT,
                destination TEXT,
                jti TEXT,
                query TEXT,
                cross_bucket_region TEXT,
                "requestId" TEXT
            )
            "#,
        )
        .execute(&mut conn)
        .await
        .unwrap();

        sqlx::query(
            r#"
            INSERT INTO emr_job_details (id, jobstatus, client_ip, "requestId")
            VALUES (42, 'RUNNING', '10.0.0.7', 'req-9')
            "#,
        )
        .execute(&mut conn)
        .await
        .unwrap();

        Some(PgJobStore {
            conn,
            queries: Arc::new(Queries::new(id_type)),
        })
    }

    async fn stored_row(store: &mut PgJobStore) -> (Option<String>, Option<String>) {
        sqlx::query_as("SELECT data_transfer_state, jobstatus FROM emr_job_details WHERE id = 42")
            .fetch_one(&mut store.conn)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn finalize_commits_state_and_job_status() {
        let Some(mut store) = seeded_store(Some(IdColumnType::Bigint)).await else {
            return;
        };

        let updated = store.finalize("42", "ERROR", "FAILED").await.unwrap();

        assert_eq!(updated, 1);
        assert_eq!(
            stored_row(&mut store).await,
            (Some("ERROR".to_string()), Some("FAILED".to_string()))
        );
    }

    #[tokio::test]
    async fn transfer_state_update_leaves_job_status_alone() {
        let Some(mut store) = seeded_store(None).await else {
            return;
        };

        let updated = store.record_transfer_state("42", "TRANSFERRING").await.unwrap();

        assert_eq!(updated, 1);
        assert_eq!(
            stored_row(&mut store).await,
            (Some("TRANSFERRING".to_string()), Some("RUNNING".to_string()))
        );
    }

    #[tokio::test]
    async fn unknown_id_matches_no_rows() {
        for id_type in [None, Some(IdColumnType::Bigint)] {
            let Some(mut store) = seeded_store(id_type).await else {
                return;
            };

            assert_eq!(store.record_transfer_state("7", "QUEUED").await.unwrap(), 0);
            assert_eq!(store.finalize("7", "SUCCESS", "SUCCESS").await.unwrap(), 0);
            assert_eq!(store.job_context("7").await.unwrap(), None);
            assert_eq!(stored_row(&mut store).await, (None, Some("RUNNING".to_string())));
        }
    }

    #[tokio::test]
    async fn context_reads_logging_columns() {
        let Some(mut store) = seeded_store(Some(IdColumnType::Bigint)).await else {
            return;
        };

        let context = store.job_context("42").await.unwrap().unwrap();

        assert_eq!(context.client_ip.as_deref(), Some("10.0.0.7"));
        assert_eq!(context.request_id.as_deref(), Some("req-9"));
        assert_eq!(context.destination, None);
    }
}
