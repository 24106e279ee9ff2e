// src/db/mod.rs

use std::time::Duration;

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

use crate::config::DbConfig;
use crate::error::{DashboardError, DashboardResult};

pub mod queries;

/// SQL flavour of the connected database. Only date bucketing differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("sqlite:") {
            Dialect::Sqlite
        } else {
            Dialect::Postgres
        }
    }

    /// Expression yielding the calendar day of `column` as `YYYY-MM-DD` text.
    pub fn day_of(&self, column: &str) -> String {
        match self {
            Dialect::Postgres => format!("CAST(CAST({column} AS DATE) AS TEXT)"),
            Dialect::Sqlite => format!("date({column})"),
        }
    }
}

#[derive(Clone)]
pub struct Database {
    pub pool: AnyPool,
    pub dialect: Dialect,
}

pub fn connect(cfg: &DbConfig) -> DashboardResult<Database> {
    let db = connect_url(&cfg.connection_url(), cfg.max_connections, cfg.acquire_timeout)?;
    tracing::info!(server = %cfg.server, database = %cfg.database, "database pool ready");
    Ok(db)
}

/// Builds the pool without opening a connection; an unreachable server
/// surfaces on the first `acquire`, inside a refresh cycle.
pub fn connect_url(
    url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> DashboardResult<Database> {
    sqlx::any::install_default_drivers();

    let pool = AnyPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(acquire_timeout)
        .connect_lazy(url)
        .map_err(|e| {
            tracing::error!(error = %e, "invalid database connection settings");
            DashboardError::Connection(e)
        })?;

    Ok(Database { pool, dialect: Dialect::from_url(url) })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use chrono::NaiveDate;
    use sqlx::any::AnyPoolOptions;

    use super::{Database, Dialect};

    const SCHEMA: &str = include_str!("../../sql/schema.sql");

    /// Fresh in-memory SQLite database with the dashboard schema applied.
    pub async fn memory_db() -> Database {
        sqlx::any::install_default_drivers();
        // a single long-lived connection keeps the in-memory database alive
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(5))
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let db = Database { pool, dialect: Dialect::Sqlite };
        exec_all(&db, SCHEMA).await;
        db
    }

    pub async fn exec_all(db: &Database, script: &str) {
        for stmt in script.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(stmt).execute(&db.pool).await.unwrap();
        }
    }

    /// 2 customers in 2 cities, 3 orders totalling $49, one of them a delivery.
    pub async fn seeded_db() -> Database {
        let db = memory_db().await;
        exec_all(
            &db,
            r#"
            INSERT INTO customers (cust_id, cust_name) VALUES (1, 'Ada'), (2, 'Linus');
            INSERT INTO address (add_id, delivery_address, delivery_city) VALUES
                (1, '1 Main St', 'Springfield'),
                (2, '9 Elm Rd', 'Shelbyville');
            INSERT INTO item (item_id, item_name, price) VALUES
                (1, 'Margherita', 10), (2, 'Garlic Bread', 5), (3, 'Calzone', 8);
            INSERT INTO "order" (order_id, cust_id, item_id, quantity, delivery, add_id, created_at) VALUES
                (1, 1, 1, 1, 1, 1, '2024-03-04 12:00:00'),
                (2, 2, 2, 3, 0, 2, '2024-03-04 18:30:00'),
                (3, 2, 3, 3, 0, 2, '2024-03-05 19:00:00');
            INSERT INTO review (review_id, rating, created_at) VALUES
                (1, 4, '2024-03-04 20:00:00'),
                (2, 5, '2024-03-05 20:00:00'),
                (3, 0, '2024-03-05 21:00:00'),
                (4, 9, '2024-03-12 20:00:00'),
                (5, 8, '2024-03-13 20:00:00');
            "#,
        )
        .await;
        db
    }

    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }
}
