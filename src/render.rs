// src/render.rs
//
// Turns a Snapshot into metric tiles and Plotly figures for the browser.

use serde::Serialize;
use serde_json::{json, Value};

use crate::metrics::{gross_margin, net_profit, Severity};
use crate::models::Snapshot;

pub const PAGE_TITLE: &str = "Pizza House Dashboard";

const SEABORN: [&str; 6] = ["#4c72b0", "#dd8452", "#55a868", "#c44e52", "#8172b3", "#937860"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTile {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub id: &'static str,
    pub title: &'static str,
    /// Plotly figure: `{ data, layout }`
    pub figure: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: &'static str,
    pub tiles: Vec<MetricTile>,
    pub charts: Vec<Chart>,
}

pub fn build_view(snapshot: &Snapshot) -> DashboardView {
    DashboardView {
        title: PAGE_TITLE,
        tiles: tiles(snapshot),
        charts: charts(snapshot),
    }
}

fn tiles(s: &Snapshot) -> Vec<MetricTile> {
    let revenue = s.total_revenue.unwrap_or(0.0);
    vec![
        MetricTile { label: "Total Revenue", value: money(revenue) },
        MetricTile { label: "Total Delivery Orders", value: grouped(s.delivery_order_total()) },
        MetricTile { label: "Total Customers", value: grouped(s.total_customers) },
        MetricTile {
            label: "Average Per Ticket",
            value: money(s.average_order_value.unwrap_or(0.0)),
        },
        MetricTile { label: "Gross Margin", value: percent(gross_margin(revenue)) },
        MetricTile { label: "Net Profit", value: percent(net_profit(revenue)) },
    ]
}

fn layout(title: &str, title_x: f64) -> Value {
    json!({
        "title": { "text": title, "x": title_x },
        "colorway": SEABORN,
        "margin": { "t": 60, "l": 40, "r": 20, "b": 40 },
    })
}

fn charts(s: &Snapshot) -> Vec<Chart> {
    let city_title = "Number of Customers by City";
    let food_title = "Total Sold Items by Food Category";
    let delivery_title = "Delivery Orders and Revenue by City";
    let rating_title = "Average Rating Trends";
    let sales_title = "Sales Trends";
    let rating_line_title = "Weekly Average Rating";

    let cities: Vec<&str> = s.deliveries.iter().map(|d| d.delivery_city.as_str()).collect();
    let weeks: Vec<String> = s.weekly_ratings.iter().map(|w| week_label(w.year, w.week)).collect();

    // one trace per severity so the legend shows the classes
    let rating_traces: Vec<Value> = [Severity::Critical, Severity::Warning, Severity::Good]
        .iter()
        .filter_map(|sev| {
            let weeks: Vec<_> = s.weekly_ratings.iter().filter(|w| w.severity == *sev).collect();
            if weeks.is_empty() {
                return None;
            }
            Some(json!({
                "type": "bar",
                "name": sev.as_str(),
                "x": weeks.iter().map(|w| week_label(w.year, w.week)).collect::<Vec<_>>(),
                "y": weeks.iter().map(|w| w.avg_rating).collect::<Vec<_>>(),
                "marker": { "color": sev.color() },
            }))
        })
        .collect();

    vec![
        Chart {
            id: "customers_by_city",
            title: city_title,
            figure: json!({
                "data": [{
                    "type": "bar",
                    "x": s.cities.iter().map(|c| &c.delivery_city).collect::<Vec<_>>(),
                    "y": s.cities.iter().map(|c| c.city_count).collect::<Vec<_>>(),
                }],
                "layout": layout(city_title, 0.4),
            }),
        },
        Chart {
            id: "items_sold",
            title: food_title,
            figure: json!({
                "data": [{
                    "type": "pie",
                    "labels": s.foods.iter().map(|f| &f.item_name).collect::<Vec<_>>(),
                    "values": s.foods.iter().map(|f| f.total_sold).collect::<Vec<_>>(),
                }],
                "layout": layout(food_title, 0.4),
            }),
        },
        Chart {
            id: "delivery_by_city",
            title: delivery_title,
            figure: json!({
                "data": [
                    {
                        "type": "bar",
                        "name": "Total Revenue",
                        "x": cities,
                        "y": s.deliveries.iter().map(|d| d.total_revenue).collect::<Vec<_>>(),
                    },
                    {
                        "type": "bar",
                        "name": "Delivery Count",
                        "x": cities,
                        "y": s.deliveries.iter().map(|d| d.delivery_count).collect::<Vec<_>>(),
                    },
                ],
                "layout": merge(layout(delivery_title, 0.3), json!({
                    "barmode": "group",
                    "xaxis": { "title": { "text": "City" } },
                })),
            }),
        },
        Chart {
            id: "rating_by_week",
            title: rating_title,
            figure: json!({
                "data": rating_traces,
                "layout": merge(layout(rating_title, 0.4), json!({
                    // traces are split by severity; keep the axis chronological
                    "xaxis": {
                        "title": { "text": "week" },
                        "type": "category",
                        "categoryorder": "array",
                        "categoryarray": weeks,
                    },
                    "yaxis": { "range": [0, 10] },
                })),
            }),
        },
        Chart {
            id: "daily_sales",
            title: sales_title,
            figure: json!({
                "data": [{
                    "type": "scatter",
                    "mode": "lines",
                    "x": s.daily_sales.iter().map(|d| d.order_date.to_string()).collect::<Vec<_>>(),
                    "y": s.daily_sales.iter().map(|d| d.sales).collect::<Vec<_>>(),
                }],
                "layout": layout(sales_title, 0.4),
            }),
        },
        Chart {
            id: "rating_trend",
            title: rating_line_title,
            figure: json!({
                "data": [{
                    "type": "scatter",
                    "mode": "lines+markers",
                    "x": weeks,
                    "y": s.weekly_ratings.iter().map(|w| w.avg_rating).collect::<Vec<_>>(),
                    "marker": {
                        "color": s.weekly_ratings.iter().map(|w| w.severity.color()).collect::<Vec<_>>(),
                    },
                }],
                "layout": layout(rating_line_title, 0.4),
            }),
        },
    ]
}

fn merge(mut base: Value, extra: Value) -> Value {
    if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
        base.extend(extra);
    }
    base
}

fn week_label(year: i32, week: u32) -> String {
    format!("{year}-W{week:02}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Number formatting
// ─────────────────────────────────────────────────────────────────────────────

fn with_commas(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234` → `1,234`
pub fn grouped(n: i64) -> String {
    let digits = with_commas(&n.unsigned_abs().to_string());
    if n < 0 {
        format!("-{digits}")
    } else {
        digits
    }
}

/// `1234.5` → `$1,234.50`
pub fn money(v: f64) -> String {
    let fixed = format!("{:.2}", v.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if v < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${}.{frac}", with_commas(int))
}

pub fn percent(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}%"),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CityCount, DeliveryRevenue, WeeklyRating};
    use chrono::Utc;

    fn empty_snapshot() -> Snapshot {
        Snapshot {
            cities: vec![],
            foods: vec![],
            deliveries: vec![],
            average_order_value: None,
            total_revenue: None,
            total_customers: 0,
            daily_sales: vec![],
            weekly_ratings: vec![],
            fetched_at: Utc::now(),
        }
    }

    fn tile<'a>(view: &'a DashboardView, label: &str) -> &'a str {
        &view.tiles.iter().find(|t| t.label == label).unwrap().value
    }

    #[test]
    fn formats_numbers() {
        assert_eq!(grouped(0), "0");
        assert_eq!(grouped(1234567), "1,234,567");
        assert_eq!(grouped(-1000), "-1,000");
        assert_eq!(money(49.0), "$49.00");
        assert_eq!(money(16.333333), "$16.33");
        assert_eq!(money(1234567.891), "$1,234,567.89");
        assert_eq!(money(-0.001), "$0.00");
        assert_eq!(percent(Some(26.7)), "26.70%");
        assert_eq!(percent(None), "N/A");
    }

    #[test]
    fn empty_data_renders_zeroes() {
        let view = build_view(&empty_snapshot());
        assert_eq!(view.tiles.len(), 6);
        assert_eq!(view.charts.len(), 6);
        assert_eq!(tile(&view, "Total Revenue"), "$0.00");
        assert_eq!(tile(&view, "Average Per Ticket"), "$0.00");
        assert_eq!(tile(&view, "Total Delivery Orders"), "0");
        assert_eq!(tile(&view, "Gross Margin"), "N/A");
        assert_eq!(tile(&view, "Net Profit"), "N/A");
    }

    #[test]
    fn tiles_and_charts_follow_snapshot() {
        let snapshot = Snapshot {
            cities: vec![
                CityCount { delivery_city: "Springfield".into(), city_count: 3 },
                CityCount { delivery_city: "Shelbyville".into(), city_count: 1 },
            ],
            deliveries: vec![DeliveryRevenue {
                delivery_city: "Springfield".into(),
                total_revenue: 10.0,
                delivery_count: 1,
            }],
            total_revenue: Some(49.0),
            average_order_value: Some(49.0 / 3.0),
            total_customers: 4,
            weekly_ratings: vec![WeeklyRating {
                year: 2024,
                week: 10,
                avg_rating: 4.5,
                severity: Severity::Critical,
            }],
            ..empty_snapshot()
        };
        let view = build_view(&snapshot);

        assert_eq!(tile(&view, "Total Revenue"), "$49.00");
        assert_eq!(tile(&view, "Average Per Ticket"), "$16.33");
        assert_eq!(tile(&view, "Total Customers"), "4");
        assert_eq!(tile(&view, "Gross Margin"), "26.70%");
        assert_eq!(tile(&view, "Net Profit"), "13.80%");

        let city = &view.charts[0].figure["data"][0];
        assert_eq!(city["x"], json!(["Springfield", "Shelbyville"]));
        assert_eq!(city["y"], json!([3, 1]));

        let delivery = &view.charts[2].figure;
        assert_eq!(delivery["layout"]["barmode"], "group");
        assert_eq!(delivery["data"].as_array().unwrap().len(), 2);

        let rating = &view.charts[3].figure["data"];
        assert_eq!(rating.as_array().unwrap().len(), 1);
        assert_eq!(rating[0]["marker"]["color"], "red");
        assert_eq!(rating[0]["x"], json!(["2024-W10"]));
    }

    #[test]
    fn rating_weeks_stay_chronological_across_severities() {
        let week = |week, avg_rating| WeeklyRating {
            year: 2024,
            week,
            avg_rating,
            severity: Severity::classify(avg_rating),
        };
        let snapshot = Snapshot {
            weekly_ratings: vec![week(10, 8.0), week(11, 4.0), week(12, 6.0)],
            ..empty_snapshot()
        };
        let view = build_view(&snapshot);
        let figure = &view.charts[3].figure;

        let xaxis = &figure["layout"]["xaxis"];
        assert_eq!(xaxis["categoryorder"], "array");
        assert_eq!(xaxis["categoryarray"], json!(["2024-W10", "2024-W11", "2024-W12"]));

        // one trace per severity, critical first
        let names: Vec<_> = figure["data"].as_array().unwrap().iter().map(|t| t["name"].clone()).collect();
        assert_eq!(names, vec![json!("critical"), json!("warning"), json!("good")]);
        assert_eq!(view.charts[5].figure["data"][0]["x"], xaxis["categoryarray"]);
    }
}
