// src/refresh.rs
//
// Fetch → render → wait, until cancelled. Each cycle runs every catalog
// query on one pooled connection and publishes the rendered view.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::cache::ResultCache;
use crate::db::queries::{self, QueryId};
use crate::db::Database;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{Aggregate, Snapshot};
use crate::render::{build_view, DashboardView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Starting,
    Fetching,
    Rendering,
    Waiting,
    Stopped,
}

/// What the HTTP side sees. A failed cycle keeps the last good view.
#[derive(Debug, Clone)]
pub struct RefreshState {
    pub cycle: u64,
    pub phase: Phase,
    pub snapshot: Option<Arc<Snapshot>>,
    pub view: Option<Arc<DashboardView>>,
    pub last_error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for RefreshState {
    fn default() -> Self {
        RefreshState {
            cycle: 0,
            phase: Phase::Starting,
            snapshot: None,
            view: None,
            last_error: None,
            updated_at: None,
        }
    }
}

pub struct RefreshLoop {
    db: Database,
    cache: ResultCache,
    interval: Duration,
    tx: watch::Sender<RefreshState>,
}

impl RefreshLoop {
    pub fn new(
        db: Database,
        cache: ResultCache,
        interval: Duration,
    ) -> (Self, watch::Receiver<RefreshState>) {
        let (tx, rx) = watch::channel(RefreshState::default());
        (RefreshLoop { db, cache, interval, tx }, rx)
    }

    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(interval_secs = self.interval.as_secs_f64(), "refresh loop started");
        loop {
            self.run_cycle().await;

            self.set_phase(Phase::Waiting);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        self.set_phase(Phase::Stopped);
        tracing::info!("refresh loop stopped");
    }

    /// One full cycle. Errors are recorded on the published state, never panicked.
    pub async fn run_cycle(&self) {
        let started = Instant::now();
        let cycle = self.tx.borrow().cycle + 1;

        self.set_phase(Phase::Fetching);
        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                self.set_phase(Phase::Rendering);
                let unchanged = self
                    .tx
                    .borrow()
                    .snapshot
                    .as_ref()
                    .is_some_and(|prev| prev.same_data(&snapshot));
                let view = build_view(&snapshot);
                self.tx.send_modify(|state| {
                    state.cycle = cycle;
                    state.snapshot = Some(Arc::new(snapshot));
                    state.view = Some(Arc::new(view));
                    state.last_error = None;
                    state.updated_at = Some(Utc::now());
                });
                tracing::debug!(
                    cycle,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    unchanged,
                    "refresh cycle finished"
                );
            }
            Err(e) => {
                tracing::error!(cycle, error = %e, "refresh cycle failed");
                self.tx.send_modify(|state| {
                    state.cycle = cycle;
                    state.last_error = Some(e.to_string());
                });
            }
        }
    }

    /// FETCHING: all catalog queries, sequentially, on a single connection.
    pub async fn fetch_snapshot(&self) -> DashboardResult<Snapshot> {
        let mut conn = None;
        let mut results = Vec::with_capacity(QueryId::ALL.len());

        for id in QueryId::ALL {
            if let Some(hit) = self.cache.get(id) {
                results.push(hit);
                continue;
            }
            // released on drop, including when a query fails
            let mut c = match conn.take() {
                Some(c) => c,
                None => self.db.pool.acquire().await.map_err(DashboardError::Connection)?,
            };
            let value = queries::fetch(&mut c, self.db.dialect, id).await?;
            conn = Some(c);
            self.cache.insert(id, value.clone());
            results.push(value);
        }

        assemble(results)
    }

    fn set_phase(&self, phase: Phase) {
        self.tx.send_modify(|state| state.phase = phase);
    }
}

fn assemble(results: Vec<Aggregate>) -> DashboardResult<Snapshot> {
    let mut snapshot = Snapshot {
        cities: vec![],
        foods: vec![],
        deliveries: vec![],
        average_order_value: None,
        total_revenue: None,
        total_customers: 0,
        daily_sales: vec![],
        weekly_ratings: vec![],
        fetched_at: Utc::now(),
    };

    for (id, value) in QueryId::ALL.into_iter().zip(results) {
        match (id, value) {
            (QueryId::CityCustomers, Aggregate::Cities(v)) => snapshot.cities = v,
            (QueryId::FoodSold, Aggregate::Foods(v)) => snapshot.foods = v,
            (QueryId::DeliveryByCity, Aggregate::Deliveries(v)) => snapshot.deliveries = v,
            (QueryId::AverageOrderValue, Aggregate::Scalar(v)) => snapshot.average_order_value = v,
            (QueryId::TotalRevenue, Aggregate::Scalar(v)) => snapshot.total_revenue = v,
            (QueryId::TotalCustomers, Aggregate::Count(v)) => snapshot.total_customers = v,
            (QueryId::DailySales, Aggregate::DailySales(v)) => snapshot.daily_sales = v,
            (QueryId::WeeklyRating, Aggregate::WeeklyRatings(v)) => snapshot.weekly_ratings = v,
            (query, other) => {
                return Err(DashboardError::Decode {
                    query,
                    detail: format!("unexpected result shape {other:?}"),
                })
            }
        }
    }
    Ok(snapshot)
}
