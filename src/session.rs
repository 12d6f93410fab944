//! Session state and controller - the single owner of shared client state.
//!
//! The source of truth for one signed-in session: the stores/users/products
//! directories, the in-memory sales and visits collections, and the current
//! shift. All mutation funnels through [`SessionController`] methods; the
//! state is never exposed as a free-floating global. The controller also
//! owns the offline gate, the debounce windows and in-flight guards that
//! absorb duplicate taps, the pending-auto-close obligation, and the
//! reconciliation that runs when connectivity returns.

use crate::{
    cache::LocalCache,
    core::{product, sale, shift, stats, store, user},
    diagnostics::DiagnosticsSink,
    entities::{PaymentMethod, Role, SaleItem, product as product_entity, sale as sale_entity,
        shift as shift_entity, store as store_entity, user as user_entity,
        visit as visit_entity},
    errors::{Error, Result},
};
use chrono::{DateTime, Local, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Minimum spacing between visit creations; absorbs duplicate taps.
const VISIT_COOLDOWN: Duration = Duration::from_secs(2);
/// Minimum spacing between sale completions; larger window because this
/// path does more work.
const SALE_COOLDOWN: Duration = Duration::from_secs(3);
/// Bounded retry budget for the store-list load.
const STORE_LOAD_ATTEMPTS: u32 = 5;
const STORE_LOAD_BASE_DELAY: Duration = Duration::from_millis(500);
const STORE_LOAD_MAX_DELAY: Duration = Duration::from_secs(8);
/// How often the session loop re-evaluates the auto-close boundary.
const AUTO_CLOSE_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Shared application state for one session.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    /// Known stores (network or cache)
    pub stores: Vec<store_entity::Model>,
    /// User directory, role-visible
    pub users: Vec<user_entity::Model>,
    /// Product catalog, role-scoped
    pub products: Vec<product_entity::Model>,
    /// Sales collection the aggregation engine reads
    pub sales: Vec<sale_entity::Model>,
    /// Open visit board for the current store
    pub visits: Vec<visit_entity::Model>,
    /// The active shift, if any
    pub current_shift: Option<shift_entity::Model>,
    /// Signed-in user
    pub current_user: Option<user_entity::Model>,
    /// Store selected at login; None for owners browsing all stores
    pub current_store: Option<store_entity::Model>,
    /// Running sum over the loaded sales collection
    pub total_sales_amount: f64,
}

/// Owns [`SessionState`] and funnels every mutation through its methods.
pub struct SessionController {
    db: DatabaseConnection,
    state: SessionState,
    connectivity: watch::Receiver<bool>,
    cache: LocalCache,
    diagnostics: DiagnosticsSink,
    last_visit_at: Option<Instant>,
    last_sale_at: Option<Instant>,
    visit_in_flight: bool,
    sale_in_flight: bool,
    pending_auto_close: bool,
}

fn check_cooldown(last: Option<Instant>, window: Duration) -> Result<()> {
    if let Some(last) = last {
        let elapsed = last.elapsed();
        if elapsed < window {
            let remaining = window - elapsed;
            return Err(Error::CooldownActive {
                remaining_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
            });
        }
    }
    Ok(())
}

/// Exponential backoff delay for the store-list load, capped.
fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    let delay = STORE_LOAD_BASE_DELAY.saturating_mul(2u32.saturating_pow(exp));
    delay.min(STORE_LOAD_MAX_DELAY)
}

impl SessionController {
    /// Creates a controller over an established backend connection.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        connectivity: watch::Receiver<bool>,
        cache: LocalCache,
        diagnostics: DiagnosticsSink,
    ) -> Self {
        Self {
            db,
            state: SessionState::default(),
            connectivity,
            cache,
            diagnostics,
            last_visit_at: None,
            last_sale_at: None,
            visit_in_flight: false,
            sale_in_flight: false,
            pending_auto_close: false,
        }
    }

    /// Read access to the shared state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current connectivity snapshot.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.connectivity.borrow()
    }

    fn ensure_online(&self) -> Result<()> {
        if self.is_online() { Ok(()) } else { Err(Error::Offline) }
    }

    fn current_user_id(&self) -> Result<i64> {
        self.state
            .current_user
            .as_ref()
            .map(|u| u.id)
            .ok_or(Error::NotAuthenticated)
    }

    /// Store the session acts on: the one selected at login, or the user's
    /// home store.
    fn active_store_id(&self) -> Result<i64> {
        self.state
            .current_store
            .as_ref()
            .map(|s| s.id)
            .or_else(|| self.state.current_user.as_ref().and_then(|u| u.store_id))
            .ok_or(Error::NoStoreSelected)
    }

    /// Store filter for reads: owners see everything, sellers their store.
    fn scope_store_id(&self) -> Option<i64> {
        match self.state.current_user.as_ref() {
            Some(u) if u.role == Role::Seller => self
                .state
                .current_store
                .as_ref()
                .map(|s| s.id)
                .or(u.store_id),
            _ => None,
        }
    }

    fn report_gateway_error(&self, operation: &'static str, err: &Error) {
        if let Error::Database(db_err) = err {
            self.diagnostics.report_gateway_error(operation, db_err);
        }
    }

    /// Signs a user in against the users table and loads the session data.
    ///
    /// # Errors
    /// Returns [`Error::Offline`] without touching the network when offline,
    /// [`Error::InvalidCredentials`] on a bad login/password pair, or a
    /// database error if a lookup fails.
    pub async fn login(
        &mut self,
        login_name: &str,
        password: &str,
        selected_store: Option<i64>,
    ) -> Result<()> {
        self.ensure_online()?;

        let account = user::verify_credentials(&self.db, login_name, password).await?;
        let store_to_load = selected_store.or(account.store_id);
        let resolved_store = match store_to_load {
            Some(id) => store::get_store_by_id(&self.db, id).await?,
            None => None,
        };

        info!("User {} ({:?}) logged in", account.login, account.role);
        self.state.current_user = Some(account);
        self.state.current_store = resolved_store;

        if let Err(e) = self.load_data().await {
            warn!("Initial data load after login failed: {e}");
        }
        Ok(())
    }

    /// Clears every piece of in-memory session state. The cached snapshots
    /// stay on disk for the next start.
    pub fn logout(&mut self) {
        self.state = SessionState::default();
        self.last_visit_at = None;
        self.last_sale_at = None;
        self.visit_in_flight = false;
        self.sale_in_flight = false;
        self.pending_auto_close = false;
        info!("Session cleared");
    }

    /// Registers a new seller account and refreshes the user directory.
    ///
    /// # Errors
    /// Returns [`Error::Offline`] when offline, [`Error::LoginTaken`] on a
    /// duplicate login, or a database error.
    pub async fn register(
        &mut self,
        login_name: &str,
        password: &str,
        name: String,
        store_id: Option<i64>,
    ) -> Result<user_entity::Model> {
        self.ensure_online()?;
        let created =
            user::register_user(&self.db, login_name, password, name, Role::Seller, store_id)
                .await?;
        self.state.users = user::list_users(&self.db).await?;
        Ok(created)
    }

    /// Deletes a user account and refreshes the user directory.
    ///
    /// # Errors
    /// Returns [`Error::Offline`] when offline or a database error.
    pub async fn delete_user(&mut self, user_id: i64) -> Result<()> {
        self.ensure_online()?;
        user::delete_user(&self.db, user_id).await?;
        self.state.users = user::list_users(&self.db).await?;
        Ok(())
    }

    /// Loads (or reloads) the session's working set: stores, users,
    /// products, sales, visits, and the active shift, scoped by role.
    ///
    /// Offline, reads degrade to the cached snapshots instead of erroring.
    /// This is also the reconciliation path when connectivity returns.
    ///
    /// # Errors
    /// Returns a database error if an online load fails partway; already
    /// loaded collections keep their last value.
    pub async fn load_data(&mut self) -> Result<()> {
        if !self.is_online() {
            self.state.stores = self.cache.load_stores();
            self.restore_shift().await?;
            return Ok(());
        }

        self.load_stores().await;
        self.state.users = user::list_users(&self.db).await?;

        let scope = self.scope_store_id();
        self.state.products = product::list_products(&self.db, scope).await?;
        self.state.sales = sale::list_sales(&self.db, scope).await?;
        self.state.visits = sale::list_visits(&self.db, scope).await?;
        self.state.total_sales_amount =
            self.state.sales.iter().map(|s| s.total_amount).sum();

        self.restore_shift().await?;
        Ok(())
    }

    /// Loads the store list with bounded exponential backoff, falling back
    /// to the cached copy when every attempt fails.
    async fn load_stores(&mut self) {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match store::list_stores(&self.db).await {
                Ok(stores) => {
                    self.cache.save_stores(&stores);
                    self.state.stores = stores;
                    return;
                }
                Err(e) => {
                    self.report_gateway_error("load_stores", &e);
                    if attempt >= STORE_LOAD_ATTEMPTS {
                        warn!(
                            "Store list load failed after {attempt} attempts: {e}; using cached copy"
                        );
                        self.state.stores = self.cache.load_stores();
                        return;
                    }
                    let delay = backoff_delay(attempt);
                    warn!("Store list load failed (attempt {attempt}): {e}; retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Restores the active shift for the signed-in user: by active flag,
    /// then by the null-end-timestamp fallback, then from the local cache
    /// snapshot. Leaves the state at `NoShift` when no candidate matches.
    ///
    /// # Errors
    /// Returns a database error if an online query fails.
    pub async fn restore_shift(&mut self) -> Result<()> {
        let Ok(user_id) = self.current_user_id() else {
            self.state.current_shift = None;
            return Ok(());
        };
        let Ok(store_id) = self.active_store_id() else {
            self.state.current_shift = None;
            return Ok(());
        };

        let mut restored = None;
        if self.is_online() {
            restored = shift::find_active_shift(&self.db, user_id, store_id).await?;
            if restored.is_none() {
                restored = shift::find_open_shift_fallback(&self.db, user_id, store_id).await?;
            }
        }

        if restored.is_none() {
            restored = self
                .cache
                .load_shift()
                .filter(|s| s.user_id == user_id && s.store_id == store_id && s.is_active);
            if restored.is_some() {
                info!("Restored shift from local cache snapshot");
            }
        }

        match &restored {
            Some(active) => self.cache.save_shift(active),
            None => self.cache.clear_shift(),
        }
        self.state.current_shift = restored;
        Ok(())
    }

    /// Whether a shift is currently active in this session.
    #[must_use]
    pub fn is_shift_active(&self) -> bool {
        self.state
            .current_shift
            .as_ref()
            .is_some_and(|s| s.is_active && s.end_time.is_none())
    }

    /// Starts a shift for the signed-in user in the active store.
    ///
    /// The visit board is purged, and an already-active shift on the
    /// backend is adopted rather than duplicated. On any gateway failure
    /// the session stays at `NoShift` and the call is retryable.
    ///
    /// # Errors
    /// Returns [`Error::Offline`] when offline,
    /// [`Error::ShiftAlreadyActive`] when this session already holds one,
    /// or a database error (state unchanged).
    pub async fn start_shift(&mut self) -> Result<()> {
        self.ensure_online()?;
        let user_id = self.current_user_id()?;
        let store_id = self.active_store_id()?;

        if let Some(active) = &self.state.current_shift {
            return Err(Error::ShiftAlreadyActive {
                shift_id: active.id,
            });
        }

        match shift::start_shift(&self.db, user_id, store_id).await {
            Ok(started) => {
                self.state.visits.retain(|v| v.store_id != store_id);
                self.cache.save_shift(&started);
                self.state.current_shift = Some(started);
                self.pending_auto_close = false;
                Ok(())
            }
            Err(e) => {
                error!("Failed to start shift: {e}");
                self.report_gateway_error("start_shift", &e);
                Err(e)
            }
        }
    }

    /// Ends the active shift, writing its recomputed total, and resets the
    /// session to `NoShift`.
    ///
    /// # Errors
    /// Returns [`Error::Offline`] when offline, [`Error::NoActiveShift`]
    /// when nothing is active, or a database error (state unchanged).
    pub async fn end_shift(&mut self) -> Result<shift_entity::Model> {
        self.ensure_online()?;
        let current = self
            .state
            .current_shift
            .clone()
            .ok_or(Error::NoActiveShift)?;

        match shift::close_shift(&self.db, &current).await {
            Ok(closed) => {
                self.state.current_shift = None;
                self.state.visits.clear();
                self.state.total_sales_amount = 0.0;
                self.pending_auto_close = false;
                self.cache.clear_shift();
                Ok(closed)
            }
            Err(e) => {
                error!("Failed to end shift {}: {e}", current.id);
                self.report_gateway_error("end_shift", &e);
                Err(e)
            }
        }
    }

    /// Opens a visit for the active store with a sequential display title.
    ///
    /// Debounced: calls within a 2-second window fail fast with a wait
    /// error, and an in-flight guard rejects overlapping invocations.
    ///
    /// # Errors
    /// Returns [`Error::Offline`], [`Error::CooldownActive`],
    /// [`Error::OperationInFlight`], or a database error.
    pub async fn create_visit(&mut self) -> Result<visit_entity::Model> {
        self.ensure_online()?;
        let user_id = self.current_user_id()?;
        let store_id = self.active_store_id()?;
        check_cooldown(self.last_visit_at, VISIT_COOLDOWN)?;
        if self.visit_in_flight {
            return Err(Error::OperationInFlight {
                operation: "visit creation",
            });
        }

        self.visit_in_flight = true;
        let result = sale::create_visit(&self.db, store_id, Some(user_id)).await;
        self.visit_in_flight = false;

        match result {
            Ok(created) => {
                self.last_visit_at = Some(Instant::now());
                self.state.visits.push(created.clone());
                Ok(created)
            }
            Err(e) => {
                self.report_gateway_error("create_visit", &e);
                Err(e)
            }
        }
    }

    /// Completes a sale against an open visit and refreshes the session's
    /// sales, products, and visits from source of truth.
    ///
    /// The receipt number is generated here, at the moment the user
    /// initiates completion. Debounced with a 3-second window plus an
    /// in-flight guard.
    ///
    /// # Errors
    /// Returns [`Error::Offline`], [`Error::CooldownActive`],
    /// [`Error::OperationInFlight`], a validation error, or a database
    /// error. Validation failures happen before any write.
    pub async fn complete_sale(
        &mut self,
        visit_id: i64,
        items: Vec<SaleItem>,
        total_amount: f64,
        discount: f64,
        payment_method: PaymentMethod,
    ) -> Result<sale_entity::Model> {
        self.ensure_online()?;
        let user_id = self.current_user_id()?;
        let store_id = self.active_store_id()?;
        check_cooldown(self.last_sale_at, SALE_COOLDOWN)?;
        if self.sale_in_flight {
            return Err(Error::OperationInFlight {
                operation: "sale creation",
            });
        }

        let draft = sale::SaleDraft {
            receipt_number: sale::generate_receipt_number(),
            items,
            total_amount,
            discount,
            payment_method,
        };

        self.sale_in_flight = true;
        let result = sale::complete_sale(&self.db, visit_id, store_id, Some(user_id), draft).await;
        self.sale_in_flight = false;

        match result {
            Ok(created) => {
                self.last_sale_at = Some(Instant::now());
                self.refresh_after_sale().await;
                Ok(created)
            }
            Err(e) => {
                self.report_gateway_error("complete_sale", &e);
                Err(e)
            }
        }
    }

    /// Refreshes sales, products, and visits after a completed sale. The
    /// sale itself already committed, so refresh failures only log.
    async fn refresh_after_sale(&mut self) {
        let scope = self.scope_store_id();
        match sale::list_sales(&self.db, scope).await {
            Ok(sales) => {
                self.state.total_sales_amount = sales.iter().map(|s| s.total_amount).sum();
                self.state.sales = sales;
            }
            Err(e) => warn!("Sales refresh after sale failed: {e}"),
        }
        match product::list_products(&self.db, scope).await {
            Ok(products) => self.state.products = products,
            Err(e) => warn!("Product refresh after sale failed: {e}"),
        }
        match sale::list_visits(&self.db, scope).await {
            Ok(visits) => self.state.visits = visits,
            Err(e) => warn!("Visit refresh after sale failed: {e}"),
        }
    }

    /// Drops a visit from the in-memory list after it has been viewed.
    /// The backend row is untouched; rows are purged when the shift ends.
    pub fn remove_visit(&mut self, visit_id: i64) {
        self.state.visits.retain(|v| v.id != visit_id);
    }

    /// Adds a product to the catalog and mirrors it in memory.
    ///
    /// # Errors
    /// Returns [`Error::Offline`] when offline or a database error.
    pub async fn add_product(&mut self, mut input: product::ProductInput) -> Result<()> {
        self.ensure_online()?;
        if input.store_id.is_none() {
            input.store_id = self.active_store_id().ok();
        }
        let created = product::create_product(&self.db, input).await?;
        self.state.products.push(created);
        Ok(())
    }

    /// Applies a partial update to a product and mirrors it in memory.
    ///
    /// # Errors
    /// Returns [`Error::Offline`] when offline or a database error.
    pub async fn update_product(
        &mut self,
        product_id: i64,
        patch: product::ProductPatch,
    ) -> Result<()> {
        self.ensure_online()?;
        if let Some(updated) = product::update_product(&self.db, product_id, patch).await? {
            if let Some(existing) = self
                .state
                .products
                .iter_mut()
                .find(|p| p.id == product_id)
            {
                *existing = updated;
            }
        }
        Ok(())
    }

    /// Deletes a product from the catalog and from memory.
    ///
    /// # Errors
    /// Returns [`Error::Offline`] when offline or a database error.
    pub async fn delete_product(&mut self, product_id: i64) -> Result<()> {
        self.ensure_online()?;
        product::delete_product(&self.db, product_id).await?;
        self.state.products.retain(|p| p.id != product_id);
        Ok(())
    }

    /// Daily per-seller statistics over the loaded sales collection.
    #[must_use]
    pub fn daily_sales_stats(&self) -> Vec<stats::DailyStats> {
        stats::daily_sales_stats(&self.state.sales)
    }

    /// Aggregate statistics over the loaded sales collection.
    #[must_use]
    pub fn total_stats(&self) -> stats::TotalStats {
        stats::total_stats(&self.state.sales)
    }

    /// Statistics for the in-progress shift; None without an active shift
    /// or a signed-in user.
    #[must_use]
    pub fn shift_stats(&self) -> Option<stats::ShiftStats> {
        let current = self.state.current_shift.as_ref()?;
        let viewer = self.state.current_user.as_ref()?;
        Some(stats::shift_stats(
            &self.state.sales,
            current,
            viewer,
            Utc::now(),
        ))
    }

    /// Elapsed (hours, minutes) of the active shift.
    #[must_use]
    pub fn working_time(&self) -> Option<(i64, i64)> {
        self.state
            .current_shift
            .as_ref()
            .map(|s| stats::working_time(s, Utc::now()))
    }

    /// Revenue per worked hour of the active shift; 0 without one.
    #[must_use]
    pub fn hourly_earnings(&self) -> f64 {
        self.state.current_shift.as_ref().map_or(0.0, |s| {
            stats::hourly_earnings(self.state.total_sales_amount, s, Utc::now())
        })
    }

    /// Evaluates the automatic midnight closure boundary.
    ///
    /// Once the boundary has passed (or a deferred closure is pending),
    /// closure is attempted immediately when online; offline, the
    /// obligation is recorded and retried on every poll and on every
    /// connectivity-regained event until it succeeds.
    pub async fn evaluate_auto_close<Tz: TimeZone>(&mut self, now: DateTime<Utc>, tz: &Tz) {
        let Some(current) = &self.state.current_shift else {
            self.pending_auto_close = false;
            return;
        };
        let shift_id = current.id;
        if !(self.pending_auto_close || shift::is_past_auto_close(current, now, tz)) {
            return;
        }

        if !self.is_online() {
            if !self.pending_auto_close {
                info!("Shift {shift_id} passed its closure boundary while offline; deferring");
            }
            self.pending_auto_close = true;
            return;
        }

        match self.end_shift().await {
            Ok(closed) => info!("Auto-closed shift {} at its daily boundary", closed.id),
            Err(e) => {
                warn!("Auto-close of shift {shift_id} failed: {e}; will retry");
                self.pending_auto_close = true;
            }
        }
    }

    /// Whether a deferred auto-close is waiting for connectivity.
    #[must_use]
    pub fn has_pending_auto_close(&self) -> bool {
        self.pending_auto_close
    }

    /// Reacts to a connectivity transition: on regaining connectivity, a
    /// deferred auto-close is retried first, then the working set is
    /// reconciled from source of truth.
    pub async fn handle_connectivity_change(&mut self, online: bool) {
        if !online {
            return;
        }
        if self.pending_auto_close {
            self.evaluate_auto_close(Utc::now(), &Local).await;
        }
        if self.state.current_user.is_some() {
            if let Err(e) = self.load_data().await {
                warn!("Reconciliation after reconnect failed: {e}");
            }
        }
    }

    /// Drives the session until shutdown: periodic auto-close evaluation,
    /// connectivity reactions, and SIGINT handling. Dropping out of this
    /// loop tears the schedule down with it; no timer outlives the session.
    pub async fn run(mut self) {
        let mut connectivity = self.connectivity.clone();
        let mut ticker = tokio::time::interval(AUTO_CLOSE_POLL_INTERVAL);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.evaluate_auto_close(Utc::now(), &Local).await;
                }
                changed = connectivity.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let online = *connectivity.borrow_and_update();
                    self.handle_connectivity_change(online).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received; stopping session loop");
                    break;
                }
            }
        }
    }

    /// Test seam: force a signed-in session without the online login flow.
    #[cfg(test)]
    pub(crate) fn set_session(
        &mut self,
        account: user_entity::Model,
        selected: Option<store_entity::Model>,
    ) {
        self.state.current_user = Some(account);
        self.state.current_store = selected;
    }
}
