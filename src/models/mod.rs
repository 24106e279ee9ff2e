// src/models/mod.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::metrics::Severity;

// ───────────────────────────────────────
// Query rows
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CityCount {
    pub delivery_city: String,
    pub city_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct FoodSold {
    pub item_name: String,
    pub total_sold: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DeliveryRevenue {
    pub delivery_city: String,
    pub total_revenue: f64,
    pub delivery_count: i64,
}

/// Raw daily row; the date arrives as `YYYY-MM-DD` text.
#[derive(Debug, FromRow)]
pub struct DailySalesRow {
    pub order_date: String,
    pub sales: f64,
}

/// Rated reviews for one calendar day, folded into ISO weeks afterwards.
#[derive(Debug, FromRow)]
pub struct RatingDayRow {
    pub review_date: String,
    pub rating_sum: f64,
    pub rating_count: i64,
}

// ───────────────────────────────────────
// Aggregates
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    pub order_date: NaiveDate,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyRating {
    pub year: i32,
    pub week: u32,
    pub avg_rating: f64,
    pub severity: Severity,
}

/// One query's materialized result, as stored in the result cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    Cities(Vec<CityCount>),
    Foods(Vec<FoodSold>),
    Deliveries(Vec<DeliveryRevenue>),
    Scalar(Option<f64>),
    Count(i64),
    DailySales(Vec<DailySales>),
    WeeklyRatings(Vec<WeeklyRating>),
}

/// Everything fetched during one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub cities: Vec<CityCount>,
    pub foods: Vec<FoodSold>,
    pub deliveries: Vec<DeliveryRevenue>,
    pub average_order_value: Option<f64>,
    pub total_revenue: Option<f64>,
    pub total_customers: i64,
    pub daily_sales: Vec<DailySales>,
    pub weekly_ratings: Vec<WeeklyRating>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn delivery_order_total(&self) -> i64 {
        self.deliveries.iter().map(|d| d.delivery_count).sum()
    }

    /// Same data, ignoring when it was fetched.
    pub fn same_data(&self, other: &Snapshot) -> bool {
        Snapshot { fetched_at: other.fetched_at, ..self.clone() } == *other
    }
}
