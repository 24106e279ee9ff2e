// src/db/queries.rs
//
// Fixed, parameterless aggregation queries. Numeric columns are cast to
// BIGINT / DOUBLE PRECISION so they decode through the generic driver.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use sqlx::{query_as, query_scalar, AnyConnection};

use super::Dialect;
use crate::error::{DashboardError, DashboardResult};
use crate::metrics::Severity;
use crate::models::{
    Aggregate, CityCount, DailySales, DailySalesRow, DeliveryRevenue, FoodSold, RatingDayRow,
    WeeklyRating,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryId {
    CityCustomers,
    FoodSold,
    DeliveryByCity,
    AverageOrderValue,
    TotalRevenue,
    TotalCustomers,
    DailySales,
    WeeklyRating,
}

impl QueryId {
    /// Fetch order within a refresh cycle.
    pub const ALL: [QueryId; 8] = [
        QueryId::CityCustomers,
        QueryId::FoodSold,
        QueryId::DeliveryByCity,
        QueryId::AverageOrderValue,
        QueryId::TotalRevenue,
        QueryId::TotalCustomers,
        QueryId::DailySales,
        QueryId::WeeklyRating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryId::CityCustomers => "city_customers",
            QueryId::FoodSold => "food_sold",
            QueryId::DeliveryByCity => "delivery_by_city",
            QueryId::AverageOrderValue => "average_order_value",
            QueryId::TotalRevenue => "total_revenue",
            QueryId::TotalCustomers => "total_customers",
            QueryId::DailySales => "daily_sales",
            QueryId::WeeklyRating => "weekly_rating",
        }
    }

    /// Ratings move slowly and get the longer cache window.
    pub fn ttl(&self, default_ttl: Duration, rating_ttl: Duration) -> Duration {
        match self {
            QueryId::WeeklyRating => rating_ttl,
            _ => default_ttl,
        }
    }

    pub fn sql(&self, dialect: Dialect) -> String {
        match self {
            QueryId::CityCustomers => r#"
                SELECT COALESCE(delivery_city, '') AS delivery_city,
                       CAST(COUNT(*) AS BIGINT) AS city_count
                FROM address
                GROUP BY delivery_city
                ORDER BY city_count DESC, delivery_city"#
                .to_string(),
            QueryId::FoodSold => r#"
                SELECT i.item_name AS item_name,
                       CAST(COALESCE(SUM(o.quantity), 0) AS BIGINT) AS total_sold
                FROM "order" o
                JOIN item i ON o.item_id = i.item_id
                GROUP BY i.item_name
                ORDER BY total_sold DESC, item_name"#
                .to_string(),
            QueryId::DeliveryByCity => r#"
                SELECT COALESCE(a.delivery_city, '') AS delivery_city,
                       CAST(COALESCE(SUM(o.quantity * i.price), 0) AS DOUBLE PRECISION) AS total_revenue,
                       CAST(COUNT(o.order_id) AS BIGINT) AS delivery_count
                FROM "order" o
                JOIN item i ON o.item_id = i.item_id
                JOIN address a ON o.add_id = a.add_id
                WHERE o.delivery = 1
                GROUP BY a.delivery_city
                ORDER BY total_revenue DESC, delivery_city"#
                .to_string(),
            QueryId::AverageOrderValue => r#"
                SELECT CAST(AVG(o.quantity * i.price) AS DOUBLE PRECISION) AS average_order_value
                FROM "order" o
                JOIN item i ON o.item_id = i.item_id"#
                .to_string(),
            QueryId::TotalRevenue => r#"
                SELECT CAST(SUM(o.quantity * i.price) AS DOUBLE PRECISION) AS total_revenue
                FROM "order" o
                JOIN item i ON o.item_id = i.item_id"#
                .to_string(),
            QueryId::TotalCustomers => {
                "SELECT CAST(COUNT(*) AS BIGINT) AS customer_count FROM customers".to_string()
            }
            QueryId::DailySales => {
                let day = dialect.day_of("o.created_at");
                format!(
                    r#"
                SELECT {day} AS order_date,
                       CAST(COALESCE(SUM(o.quantity * i.price), 0) AS DOUBLE PRECISION) AS sales
                FROM "order" o
                JOIN item i ON o.item_id = i.item_id
                GROUP BY {day}
                ORDER BY order_date"#
                )
            }
            QueryId::WeeklyRating => {
                let day = dialect.day_of("created_at");
                format!(
                    r#"
                SELECT {day} AS review_date,
                       CAST(SUM(rating) AS DOUBLE PRECISION) AS rating_sum,
                       CAST(COUNT(rating) AS BIGINT) AS rating_count
                FROM review
                WHERE rating > 0
                GROUP BY {day}
                ORDER BY review_date"#
                )
            }
        }
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run one catalog query on `conn` and materialize the result.
pub async fn fetch(
    conn: &mut AnyConnection,
    dialect: Dialect,
    id: QueryId,
) -> DashboardResult<Aggregate> {
    let sql = id.sql(dialect);
    let err = DashboardError::query(id);

    let aggregate = match id {
        QueryId::CityCustomers => Aggregate::Cities(
            query_as::<_, CityCount>(&sql).fetch_all(&mut *conn).await.map_err(err)?,
        ),
        QueryId::FoodSold => Aggregate::Foods(
            query_as::<_, FoodSold>(&sql).fetch_all(&mut *conn).await.map_err(err)?,
        ),
        QueryId::DeliveryByCity => Aggregate::Deliveries(
            query_as::<_, DeliveryRevenue>(&sql).fetch_all(&mut *conn).await.map_err(err)?,
        ),
        QueryId::AverageOrderValue | QueryId::TotalRevenue => Aggregate::Scalar(
            query_scalar::<_, Option<f64>>(&sql)
                .fetch_optional(&mut *conn)
                .await
                .map_err(err)?
                .flatten(),
        ),
        QueryId::TotalCustomers => Aggregate::Count(
            query_scalar::<_, i64>(&sql).fetch_one(&mut *conn).await.map_err(err)?,
        ),
        QueryId::DailySales => {
            let rows = query_as::<_, DailySalesRow>(&sql)
                .fetch_all(&mut *conn)
                .await
                .map_err(err)?;
            Aggregate::DailySales(daily_sales(rows)?)
        }
        QueryId::WeeklyRating => {
            let rows = query_as::<_, RatingDayRow>(&sql)
                .fetch_all(&mut *conn)
                .await
                .map_err(err)?;
            Aggregate::WeeklyRatings(fold_weeks(rows)?)
        }
    };

    tracing::trace!(query = %id, "query finished");
    Ok(aggregate)
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn parse_day(query: QueryId, s: &str) -> DashboardResult<NaiveDate> {
    // Timestamps rendered by some drivers carry a time part; keep the date.
    let date_part = s.trim().get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| DashboardError::Decode {
        query,
        detail: format!("invalid date '{}': {}", s, e),
    })
}

fn daily_sales(rows: Vec<DailySalesRow>) -> DashboardResult<Vec<DailySales>> {
    rows.into_iter()
        .map(|r| {
            Ok(DailySales {
                order_date: parse_day(QueryId::DailySales, &r.order_date)?,
                sales: r.sales,
            })
        })
        .collect()
}

/// Fold per-day rating sums into ISO weeks, chronologically.
pub fn fold_weeks(rows: Vec<RatingDayRow>) -> DashboardResult<Vec<WeeklyRating>> {
    let mut weeks: BTreeMap<(i32, u32), (f64, i64)> = BTreeMap::new();
    for r in rows {
        let iso = parse_day(QueryId::WeeklyRating, &r.review_date)?.iso_week();
        let slot = weeks.entry((iso.year(), iso.week())).or_insert((0.0, 0));
        slot.0 += r.rating_sum;
        slot.1 += r.rating_count;
    }

    Ok(weeks
        .into_iter()
        .filter(|(_, (_, count))| *count > 0)
        .map(|((year, week), (sum, count))| {
            let avg_rating = sum / count as f64;
            WeeklyRating { year, week, avg_rating, severity: Severity::classify(avg_rating) }
        })
        .collect())
}
