// src/error.rs

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::queries::QueryId;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("query {query} failed: {source}")]
    Query {
        query: QueryId,
        #[source]
        source: sqlx::Error,
    },
    #[error("query {query} returned unreadable data: {detail}")]
    Decode { query: QueryId, detail: String },
}

impl DashboardError {
    pub fn query(query: QueryId) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| DashboardError::Query { query, source }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
