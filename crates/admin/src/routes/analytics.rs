//! Analytics page: monthly revenue, order statuses, best sellers, and sign-ups.
//!
//! Bars are rendered with `<meter>` elements, so each series carries a
//! percentage of its largest (or total) value.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::instrument;

use elegance_core::{Money, OrderStatus};

use crate::db::analytics::MONTHS;
use crate::db::{
    AnalyticsRepository, CategorySales, MonthlyCount, MonthlyRevenue, StatusCount, TopProduct,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::Layout;

/// Best sellers listed.
const TOP_PRODUCTS: i64 = 10;

/// One bar of a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bar {
    pub label: String,
    pub value: String,
    /// 0-100.
    pub percent: u32,
}

/// Orders in one status.
#[derive(Debug, Clone)]
pub struct StatusBar {
    pub status: OrderStatus,
    pub count: i64,
    pub percent: u32,
}

/// A best-selling product.
#[derive(Debug, Clone)]
pub struct TopProductView {
    pub name: String,
    pub units: i64,
    pub revenue: String,
}

/// Twelve-month headline numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSummary {
    pub revenue: String,
    pub orders: i64,
    pub average_order: String,
    pub signups: i64,
}

/// Analytics template.
#[derive(Template, WebTemplate)]
#[template(path = "analytics.html")]
pub struct AnalyticsTemplate {
    pub layout: Layout,
    pub months: i32,
    pub summary: PeriodSummary,
    pub revenue: Vec<Bar>,
    pub signups: Vec<Bar>,
    pub statuses: Vec<StatusBar>,
    pub categories: Vec<Bar>,
    pub top_products: Vec<TopProductView>,
}

/// Build the analytics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/analytics", get(index))
}

/// Sales reports.
///
/// GET /analytics
#[instrument(skip(state, layout, admin), fields(admin_id = %admin.id))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    layout: Layout,
) -> Result<AnalyticsTemplate> {
    let analytics = AnalyticsRepository::new(state.pool());
    let (revenue, signups, statuses, top, categories) = tokio::try_join!(
        analytics.monthly_revenue(),
        analytics.monthly_signups(),
        analytics.orders_by_status(),
        analytics.top_products(TOP_PRODUCTS),
        analytics.sales_by_category(),
    )?;

    Ok(AnalyticsTemplate {
        layout,
        months: MONTHS,
        summary: summarize(&revenue, &signups),
        revenue: revenue_bars(&revenue),
        signups: signup_bars(&signups),
        statuses: status_bars(&statuses),
        categories: category_bars(&categories),
        top_products: top
            .iter()
            .map(|p: &TopProduct| TopProductView {
                name: p.product_name.clone(),
                units: p.units,
                revenue: p.revenue.to_string(),
            })
            .collect(),
    })
}

fn summarize(revenue: &[MonthlyRevenue], signups: &[MonthlyCount]) -> PeriodSummary {
    let total: Money = revenue.iter().map(|m| m.revenue).sum();
    let orders: i64 = revenue.iter().map(|m| m.orders).sum();
    let average = if orders > 0 {
        Money::new(total.amount() / Decimal::from(orders)).round()
    } else {
        Money::ZERO
    };
    PeriodSummary {
        revenue: total.to_string(),
        orders,
        average_order: average.to_string(),
        signups: signups.iter().map(|m| m.count).sum(),
    }
}

fn revenue_bars(months: &[MonthlyRevenue]) -> Vec<Bar> {
    let max = months
        .iter()
        .map(|m| m.revenue.amount())
        .max()
        .unwrap_or_default();
    months
        .iter()
        .map(|m| Bar {
            label: m.month.format("%b %Y").to_string(),
            value: format!("{} ({} orders)", m.revenue, m.orders),
            percent: percent(m.revenue.amount(), max),
        })
        .collect()
}

fn signup_bars(months: &[MonthlyCount]) -> Vec<Bar> {
    let max = months.iter().map(|m| m.count).max().unwrap_or_default();
    months
        .iter()
        .map(|m| Bar {
            label: m.month.format("%b %Y").to_string(),
            value: m.count.to_string(),
            percent: percent(Decimal::from(m.count), Decimal::from(max)),
        })
        .collect()
}

fn status_bars(counts: &[StatusCount]) -> Vec<StatusBar> {
    let total: i64 = counts.iter().map(|c| c.count).sum();
    counts
        .iter()
        .map(|c| StatusBar {
            status: c.status,
            count: c.count,
            percent: percent(Decimal::from(c.count), Decimal::from(total)),
        })
        .collect()
}

fn category_bars(sales: &[CategorySales]) -> Vec<Bar> {
    let total: Money = sales.iter().map(|s| s.revenue).sum();
    sales
        .iter()
        .map(|s| Bar {
            label: s.category.clone(),
            value: s.revenue.to_string(),
            percent: percent(s.revenue.amount(), total.amount()),
        })
        .collect()
}

/// `part` as a whole-number percentage of `whole`, 0 when `whole` is zero.
fn percent(part: Decimal, whole: Decimal) -> u32 {
    if whole <= Decimal::ZERO {
        return 0;
    }
    (part * Decimal::ONE_HUNDRED / whole)
        .round()
        .to_u32()
        .unwrap_or(0)
        .min(100)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn month(m: u32, cents: i64, orders: i64) -> MonthlyRevenue {
        MonthlyRevenue {
            month: Utc.with_ymd_and_hms(2025, m, 1, 0, 0, 0).unwrap(),
            revenue: Money::from_cents(cents),
            orders,
        }
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(Decimal::from(1), Decimal::from(3)), 33);
        assert_eq!(percent(Decimal::from(2), Decimal::from(3)), 67);
        assert_eq!(percent(Decimal::from(5), Decimal::ZERO), 0);
    }

    #[test]
    fn test_revenue_bars_scale_to_best_month() {
        let bars = revenue_bars(&[month(1, 50_000, 4), month(2, 100_000, 9), month(3, 0, 0)]);
        assert_eq!(bars.iter().map(|b| b.percent).collect::<Vec<_>>(), vec![50, 100, 0]);
        assert_eq!(bars.first().unwrap().label, "Jan 2025");
        assert_eq!(bars.first().unwrap().value, "$500.00 (4 orders)");
    }

    #[test]
    fn test_summary_average_order() {
        let summary = summarize(&[month(1, 30_000, 2), month(2, 15_000, 1)], &[]);
        assert_eq!(summary.orders, 3);
        assert_eq!(summary.revenue, "$450.00");
        assert_eq!(summary.average_order, "$150.00");
        assert_eq!(summary.signups, 0);
    }

    #[test]
    fn test_summary_without_orders() {
        let summary = summarize(&[month(1, 0, 0)], &[]);
        assert_eq!(summary.average_order, "$0.00");
    }

    #[test]
    fn test_status_bars_share_of_total() {
        let bars = status_bars(&[
            StatusCount { status: OrderStatus::Pending, count: 1 },
            StatusCount { status: OrderStatus::Delivered, count: 3 },
        ]);
        assert_eq!(bars.iter().map(|b| b.percent).collect::<Vec<_>>(), vec![25, 75]);
    }
}
