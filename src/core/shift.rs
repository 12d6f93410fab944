//! Shift business logic - start, close, restore, and the midnight boundary.
//!
//! A shift moves `NoShift → Active → NoShift`; there is no paused state.
//! Starting defends against double-starts by adopting an already-active
//! shift for the same user instead of inserting a second row. Closing
//! recomputes the final total from the source-of-truth sales table rather
//! than trusting any incrementally accumulated number. Every active shift
//! has an automatic closure boundary at local midnight of the day after its
//! start; evaluation of that boundary is a pure function so the session
//! controller can retry it until it succeeds.

use crate::{
    core::sale,
    entities::{Shift, shift},
    errors::Result,
};
use chrono::{DateTime, Duration, LocalResult, TimeZone, Utc};
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Finds the active shift for a user in any store.
///
/// Used by the double-start defense: a user never holds an active shift in
/// more than one store, so any hit is the shift to adopt.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_active_shift_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Option<shift::Model>> {
    Shift::find()
        .filter(shift::Column::UserId.eq(user_id))
        .filter(shift::Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the active shift for a (user, store) pair via the active flag.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_active_shift(
    db: &DatabaseConnection,
    user_id: i64,
    store_id: i64,
) -> Result<Option<shift::Model>> {
    Shift::find()
        .filter(shift::Column::UserId.eq(user_id))
        .filter(shift::Column::StoreId.eq(store_id))
        .filter(shift::Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Fallback restore query for backends whose schema predates the active
/// flag: an open shift is one with no end timestamp.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_open_shift_fallback(
    db: &DatabaseConnection,
    user_id: i64,
    store_id: i64,
) -> Result<Option<shift::Model>> {
    Shift::find()
        .filter(shift::Column::UserId.eq(user_id))
        .filter(shift::Column::StoreId.eq(store_id))
        .filter(shift::Column::EndTime.is_null())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Starts a shift for a user in a store.
///
/// A new shift starts with a clean visit board, so all existing visits for
/// the store are purged first. If the user already has an active shift
/// (duplicate click, stale client state) that shift is adopted instead of
/// creating a second row, preserving the single-active-shift invariant.
///
/// # Errors
/// Returns an error if any gateway call fails; no partial transition is
/// left behind and the call is safely retryable.
pub async fn start_shift(
    db: &DatabaseConnection,
    user_id: i64,
    store_id: i64,
) -> Result<shift::Model> {
    sale::purge_visits(db, store_id).await?;

    if let Some(existing) = find_active_shift_for_user(db, user_id).await? {
        info!(
            "User {user_id} already has active shift {}; adopting it",
            existing.id
        );
        return Ok(existing);
    }

    let now = Utc::now();
    let model = shift::ActiveModel {
        store_id: Set(store_id),
        user_id: Set(user_id),
        start_time: Set(now),
        end_time: Set(None),
        is_active: Set(true),
        total_sales: Set(0.0),
        created_at: Set(now),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!("Started shift {} for user {user_id} in store {store_id}", created.id);
    Ok(created)
}

/// Closes a shift and returns the updated row.
///
/// The final total is recomputed from all sales of this (store, seller)
/// whose creation timestamp falls within `[start, now]` — never accumulated
/// incrementally, so missed updates cannot cause drift. Visits for the
/// store are purged afterwards.
///
/// # Errors
/// Returns an error if any gateway call fails; the shift row is only
/// mutated once the total has been computed.
pub async fn close_shift(db: &DatabaseConnection, current: &shift::Model) -> Result<shift::Model> {
    let now = Utc::now();
    let sales =
        sale::sales_in_window(db, current.store_id, current.user_id, current.start_time, now)
            .await?;
    let total: f64 = sales.iter().map(|s| s.total_amount).sum();

    let mut active: shift::ActiveModel = current.clone().into();
    active.end_time = Set(Some(now));
    active.is_active = Set(false);
    active.total_sales = Set(total);
    let closed = active.update(db).await?;

    sale::purge_visits(db, current.store_id).await?;

    info!(
        "Closed shift {} with total {total} over {} sales",
        closed.id,
        sales.len()
    );
    Ok(closed)
}

/// Computes the automatic closure boundary for a shift started at `start`:
/// local midnight of the day *following* the start date, expressed in UTC.
///
/// The timezone is a parameter so tests can pin fixed offsets; production
/// passes [`chrono::Local`]. A nonexistent local midnight (DST gap) falls
/// back to 24 hours after the start.
#[must_use]
pub fn auto_close_boundary<Tz: TimeZone>(start: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let local_day = start.with_timezone(tz).date_naive();
    let Some(next_midnight) = local_day.succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)) else {
        return start + Duration::days(1);
    };

    match tz.from_local_datetime(&next_midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => start + Duration::days(1),
    }
}

/// Whether a shift has outlived its automatic closure boundary at `now`.
#[must_use]
pub fn is_past_auto_close<Tz: TimeZone>(
    current: &shift::Model,
    now: DateTime<Utc>,
    tz: &Tz,
) -> bool {
    now >= auto_close_boundary(current.start_time, tz)
}
