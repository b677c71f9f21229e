use chrono::{DateTime, Datelike, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice counts by shipping status, fleet-wide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingStatusCounts {
    pub pending_dispatch: u64,
    pub in_transit: u64,
    pub delivered: u64,
    pub returned: u64,
}

/// The current-month figures shown on the back-office landing page.
/// Revenue counts issued invoices except voided ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_revenue_month: Decimal,
    pub total_expenses_month: Decimal,
    pub net_income_month: Decimal,
    pub shipping_status_counts: ShippingStatusCounts,
}

impl DashboardStats {
    pub fn from_totals(
        total_revenue_month: Decimal,
        total_expenses_month: Decimal,
        shipping_status_counts: ShippingStatusCounts,
    ) -> Self {
        Self {
            total_revenue_month,
            total_expenses_month,
            net_income_month: total_revenue_month - total_expenses_month,
            shipping_status_counts,
        }
    }
}

/// Half-open UTC range `[start of this month, start of next month)` around
/// the given instant.
pub fn month_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let start = today.with_day(1).unwrap_or(today);
    let next = if start.month() == 12 {
        start
            .with_year(start.year() + 1)
            .and_then(|d| d.with_month(1))
    } else {
        start.with_month(start.month() + 1)
    }
    .unwrap_or(start);
    (
        DateTime::from_naive_utc_and_offset(start.and_time(NaiveTime::MIN), Utc),
        DateTime::from_naive_utc_and_offset(next.and_time(NaiveTime::MIN), Utc),
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn net_income_is_revenue_minus_expenses() {
        let stats = DashboardStats::from_totals(
            dec!(1500.00),
            dec!(420.50),
            ShippingStatusCounts::default(),
        );
        assert_eq!(stats.net_income_month, dec!(1079.50));
    }

    #[test]
    fn a_losing_month_goes_negative() {
        let stats =
            DashboardStats::from_totals(dec!(100), dec!(250), ShippingStatusCounts::default());
        assert_eq!(stats.net_income_month, dec!(-150));
    }

    #[test]
    fn month_window_brackets_the_instant() {
        let now = "2025-03-14T09:26:53Z".parse().unwrap();
        let (start, end) = month_window(now);
        assert_eq!(start.to_rfc3339(), "2025-03-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-04-01T00:00:00+00:00");
    }

    #[test]
    fn month_window_rolls_over_december() {
        let now = "2024-12-31T23:59:59Z".parse().unwrap();
        let (start, end) = month_window(now);
        assert_eq!(start.to_rfc3339(), "2024-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }
}
