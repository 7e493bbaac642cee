use async_trait::async_trait;
use thiserror::Error;

use nola_core::domain::customer::CustomerRecord;
use nola_core::domain::metric::MetricPoint;
use nola_core::errors::ApplicationError;
use nola_core::query::{MetricQuery, SegmentQuery};

pub mod mart;
pub mod memory;

pub use mart::{MartStatus, PgMartRepository};
pub use memory::InMemoryMartRepository;

/// SQLSTATE `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";
/// SQLSTATE class `connection_exception`.
const CONNECTION_EXCEPTION_CLASS: &str = "08";
/// Server shutting down, restarting, or refusing new sessions.
const UNAVAILABLE_STATES: [&str; 4] = ["57P01", "57P02", "57P03", "53300"];

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("relation `{relation}` does not exist")]
    SchemaMissing { relation: String },
    #[error("database unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl RepositoryError {
    /// Sorts a driver error by what the caller can do about it. `relation` is the mart the
    /// failing statement read from.
    pub fn classify(error: sqlx::Error, relation: &str) -> Self {
        let state = match &error {
            sqlx::Error::Database(database) => database.code().map(|code| code.into_owned()),
            _ => None,
        };
        match state.as_deref() {
            Some(UNDEFINED_TABLE) => {
                return Self::SchemaMissing { relation: relation.to_string() };
            }
            Some(code) if is_unavailable_state(code) => return Self::Unavailable(error),
            _ => {}
        }

        match error {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => Self::Unavailable(error),
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => Self::Decode(error.to_string()),
            other => Self::Database(other),
        }
    }
}

fn is_unavailable_state(code: &str) -> bool {
    code.starts_with(CONNECTION_EXCEPTION_CLASS) || UNAVAILABLE_STATES.contains(&code)
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::SchemaMissing { relation } => Self::SchemaMissing { relation },
            RepositoryError::Unavailable(error) => Self::Unavailable(error.to_string()),
            RepositoryError::Database(error) => Self::Persistence(error.to_string()),
            RepositoryError::Decode(message) => Self::Persistence(message),
        }
    }
}

/// Read access to the two analytics marts.
#[async_trait]
pub trait MartRepository: Send + Sync {
    async fn customers_in_segment(
        &self,
        query: &SegmentQuery,
    ) -> Result<Vec<CustomerRecord>, RepositoryError>;

    async fn metric_points(
        &self,
        query: &MetricQuery,
    ) -> Result<Vec<MetricPoint>, RepositoryError>;
}
