// src/cache.rs

use std::time::{Duration, Instant};

use moka::sync::Cache;
use moka::Expiry;

use crate::db::queries::QueryId;
use crate::models::Aggregate;

struct PerQueryTtl {
    default_ttl: Duration,
    rating_ttl: Duration,
}

impl Expiry<QueryId, Aggregate> for PerQueryTtl {
    fn expire_after_create(
        &self,
        key: &QueryId,
        _value: &Aggregate,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(key.ttl(self.default_ttl, self.rating_ttl))
    }
}

/// Short-lived query results keyed by query identity.
#[derive(Clone)]
pub struct ResultCache {
    inner: Option<Cache<QueryId, Aggregate>>,
}

impl ResultCache {
    /// Caching is disabled only when both TTLs are zero.
    pub fn new(default_ttl: Duration, rating_ttl: Duration) -> Self {
        if default_ttl.is_zero() && rating_ttl.is_zero() {
            return Self::disabled();
        }
        let inner = Cache::builder()
            .max_capacity(QueryId::ALL.len() as u64)
            .expire_after(PerQueryTtl { default_ttl, rating_ttl })
            .build();
        ResultCache { inner: Some(inner) }
    }

    pub fn disabled() -> Self {
        ResultCache { inner: None }
    }

    pub fn get(&self, id: QueryId) -> Option<Aggregate> {
        self.inner.as_ref()?.get(&id)
    }

    pub fn insert(&self, id: QueryId, value: Aggregate) {
        if let Some(cache) = &self.inner {
            cache.insert(id, value);
        }
    }
}
