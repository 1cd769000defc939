pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] envy::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),

    #[error("secret {secret_id}: {reason}")]
    Secret { secret_id: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{service} request failed: {source}")]
    Aws {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("task execution {0} returned no status")]
    MissingTaskStatus(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    pub fn aws(service: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Aws {
            service,
            source: source.into(),
        }
    }

    pub fn secret(secret_id: &str, reason: impl Into<String>) -> Self {
        Self::Secret {
            secret_id: secret_id.into(),
            reason: reason.into(),
        }
    }
}
