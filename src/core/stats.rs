//! Statistics derivations over the in-memory sales collection.
//!
//! Everything here is a pure, synchronous function of its inputs: no
//! network calls, no shared state, no side effects. Calling any of these
//! twice on an unchanged sales collection yields identical results, which
//! is the property the tests pin down. Grouping uses ordered maps so the
//! output order is deterministic as well.

use crate::entities::{PaymentMethod, Role, sale, shift, user};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Per-seller slice of one day's sales.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerDayStats {
    /// Seller the slice belongs to; None for sales with no recorded seller
    pub seller_id: Option<i64>,
    /// Revenue the seller took that day
    pub amount: f64,
    /// Number of sales the seller made that day
    pub count: usize,
}

/// One calendar day's aggregated sales.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyStats {
    /// The calendar date (derived from creation timestamps)
    pub date: NaiveDate,
    /// Total revenue across all sellers that day
    pub total_amount: f64,
    /// Total number of sales that day
    pub count: usize,
    /// Per-seller breakdown, ordered by seller id
    pub sellers: Vec<SellerDayStats>,
}

/// Aggregates over the whole sales collection.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalStats {
    /// Total revenue
    pub total_amount: f64,
    /// Number of sales
    pub count: usize,
    /// Average sale amount; 0 when there are no sales
    pub average_sale: f64,
    /// The single day with the highest aggregate revenue; ties keep the
    /// first day encountered
    pub top_selling_day: Option<NaiveDate>,
    /// Revenue taken in cash
    pub cash_amount: f64,
    /// Revenue taken through the terminal
    pub terminal_amount: f64,
}

/// Aggregates for the current in-progress shift.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftStats {
    /// Shift start
    pub start: DateTime<Utc>,
    /// Window end: the shift's end timestamp, or `now` while still open
    pub end: DateTime<Utc>,
    /// Revenue inside the window
    pub total_amount: f64,
    /// Cash revenue inside the window
    pub cash_amount: f64,
    /// Terminal revenue inside the window
    pub terminal_amount: f64,
    /// Number of sales inside the window
    pub count: usize,
    /// Number of line items across those sales
    pub total_items: usize,
    /// Average check; 0 when there are no sales
    pub avg_check: f64,
}

/// Groups sales by calendar date and, within each date, by seller, summing
/// amount and count at both levels. The result is ordered by date
/// descending; seller slices are ordered by seller id.
#[must_use]
pub fn daily_sales_stats(sales: &[sale::Model]) -> Vec<DailyStats> {
    let mut by_day: BTreeMap<NaiveDate, BTreeMap<Option<i64>, (f64, usize)>> = BTreeMap::new();

    for sale in sales {
        let day = sale.created_at.date_naive();
        let slot = by_day
            .entry(day)
            .or_default()
            .entry(sale.seller_id)
            .or_insert((0.0, 0));
        slot.0 += sale.total_amount;
        slot.1 += 1;
    }

    by_day
        .into_iter()
        .rev()
        .map(|(date, sellers)| {
            let total_amount = sellers.values().map(|(amount, _)| amount).sum();
            let count = sellers.values().map(|(_, count)| count).sum();
            let sellers = sellers
                .into_iter()
                .map(|(seller_id, (amount, count))| SellerDayStats {
                    seller_id,
                    amount,
                    count,
                })
                .collect();
            DailyStats {
                date,
                total_amount,
                count,
                sellers,
            }
        })
        .collect()
}

/// Computes revenue, count, average, payment-method split, and the
/// top-selling day over the whole sales collection.
#[must_use]
pub fn total_stats(sales: &[sale::Model]) -> TotalStats {
    let mut day_totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut total_amount = 0.0;
    let mut cash_amount = 0.0;
    let mut terminal_amount = 0.0;

    for sale in sales {
        total_amount += sale.total_amount;
        match sale.payment_method {
            PaymentMethod::Cash => cash_amount += sale.total_amount,
            PaymentMethod::Terminal => terminal_amount += sale.total_amount,
        }
        *day_totals.entry(sale.created_at.date_naive()).or_insert(0.0) += sale.total_amount;
    }

    // Strictly-greater comparison in chronological order keeps the first
    // day encountered on ties
    let mut top_selling_day: Option<(NaiveDate, f64)> = None;
    for (day, amount) in &day_totals {
        if top_selling_day.is_none_or(|(_, best)| *amount > best) {
            top_selling_day = Some((*day, *amount));
        }
    }

    let count = sales.len();
    #[allow(clippy::cast_precision_loss)]
    let average_sale = if count == 0 {
        0.0
    } else {
        total_amount / count as f64
    };

    TotalStats {
        total_amount,
        count,
        average_sale,
        top_selling_day: top_selling_day.map(|(day, _)| day),
        cash_amount,
        terminal_amount,
    }
}

/// Computes total-stats-shaped aggregates filtered to the shift window
/// `[shift.start, now]`. Non-owner viewers see only their own sales in
/// their own store.
#[must_use]
pub fn shift_stats(
    sales: &[sale::Model],
    current: &shift::Model,
    viewer: &user::Model,
    now: DateTime<Utc>,
) -> ShiftStats {
    let start = current.start_time;
    let end = current.end_time.unwrap_or(now);

    let in_window = sales.iter().filter(|s| {
        s.created_at >= start
            && s.created_at <= end
            && (viewer.role == Role::Owner
                || (s.seller_id == Some(viewer.id) && s.store_id == current.store_id))
    });

    let mut total_amount = 0.0;
    let mut cash_amount = 0.0;
    let mut terminal_amount = 0.0;
    let mut count = 0;
    let mut total_items = 0;

    for sale in in_window {
        total_amount += sale.total_amount;
        match sale.payment_method {
            PaymentMethod::Cash => cash_amount += sale.total_amount,
            PaymentMethod::Terminal => terminal_amount += sale.total_amount,
        }
        count += 1;
        total_items += sale.items_data.0.len();
    }

    #[allow(clippy::cast_precision_loss)]
    let avg_check = if count == 0 {
        0.0
    } else {
        total_amount / count as f64
    };

    ShiftStats {
        start,
        end,
        total_amount,
        cash_amount,
        terminal_amount,
        count,
        total_items,
        avg_check,
    }
}

/// Elapsed working time of a shift as whole (hours, minutes).
#[must_use]
pub fn working_time(current: &shift::Model, now: DateTime<Utc>) -> (i64, i64) {
    let total_minutes = (now - current.start_time).num_minutes().max(0);
    (total_minutes / 60, total_minutes % 60)
}

/// Revenue per hour of the running shift; 0 before the first minute has
/// passed.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hourly_earnings(total_sales_amount: f64, current: &shift::Model, now: DateTime<Utc>) -> f64 {
    let total_minutes = (now - current.start_time).num_minutes().max(0);
    if total_minutes == 0 {
        return 0.0;
    }
    total_sales_amount / (total_minutes as f64 / 60.0)
}
