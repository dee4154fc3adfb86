//! One browsing context: the cart and theme models plus its view hooks.
//!
//! Every operation reads the record from the store, applies its change, and
//! writes the whole record back while holding the context's operation lock,
//! so no two operations of the same context interleave. Nothing is cached
//! between operations.
//!
//! None of the operations fail observably. Unreadable records read as their
//! defaults (see [`crate::store`]); failed writes are logged and the
//! operation completes.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use beelivery_core::{
    Cart, CurrencyCode, Price, Product, ProductId, QuantityChange, QuantityOutcome, Theme,
};
use tracing::{debug, error, instrument, trace};
use url::Url;

use crate::config::StorefrontConfig;
use crate::error::StoreError;
use crate::hooks::{CartSummary, Notice, Subscribers};
use crate::store::RecordStore;
use crate::sync::{ContextId, Origin, StorageEvent, StorageScope};

/// A browsing context bound to a storage scope.
///
/// Cheaply cloneable via `Arc`; clones are the same context.
#[derive(Clone)]
pub struct BrowsingContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    id: ContextId,
    scope: StorageScope,
    records: RecordStore,
    checkout_url: Url,
    currency: CurrencyCode,
    notice_duration: Duration,
    op_lock: Mutex<()>,
    subscribers: Subscribers,
}

impl fmt::Debug for BrowsingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowsingContext")
            .field("id", &self.inner.id)
            .field("keys", self.inner.records.keys())
            .field("subscribers", &self.inner.subscribers)
            .finish_non_exhaustive()
    }
}

impl BrowsingContext {
    /// Open a new context on `scope`.
    #[must_use]
    pub fn open(scope: &StorageScope, config: &StorefrontConfig) -> Self {
        let id = ContextId::new();
        debug!(context_id = %id, "Opening browsing context");
        Self {
            inner: Arc::new(ContextInner {
                id,
                scope: scope.clone(),
                records: RecordStore::new(scope.backend(), config.keys.clone()),
                checkout_url: config.checkout_url.clone(),
                currency: config.currency,
                notice_duration: config.notice_duration,
                op_lock: Mutex::new(()),
                subscribers: Subscribers::default(),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    #[must_use]
    pub fn scope(&self) -> &StorageScope {
        &self.inner.scope
    }

    #[must_use]
    pub fn records(&self) -> &RecordStore {
        &self.inner.records
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add one unit of `product` and return the line's quantity in the store.
    ///
    /// When the write fails no notice is raised and the stored quantity
    /// (0 for an absent line) is returned.
    #[instrument(skip(self, product), fields(context_id = %self.id(), product_id = %product.id))]
    pub fn add_item(&self, product: &Product) -> u32 {
        let (quantity, written) = self.mutate_cart(|cart| cart.add(product));
        if !written {
            return self
                .cart_snapshot()
                .line(&product.id)
                .map_or(0, |line| line.quantity);
        }
        debug!(quantity, "Item added");
        self.notify(format!("{} added", product.name));
        quantity
    }

    /// Apply `change` to the line for `id`.
    ///
    /// An absent id changes nothing; the cart is persisted either way. When
    /// the write fails the stored line is reported instead.
    #[instrument(skip(self), fields(context_id = %self.id()))]
    pub fn change_quantity(&self, id: &ProductId, change: QuantityChange) -> QuantityOutcome {
        let (outcome, written) = self.mutate_cart(|cart| cart.change_quantity(id, change));
        if !written {
            return self
                .cart_snapshot()
                .line(id)
                .map_or(QuantityOutcome::Missing, |line| {
                    QuantityOutcome::Updated(line.quantity)
                });
        }
        debug!(?outcome, "Quantity changed");
        outcome
    }

    /// Discard every line. Persists an empty cart rather than deleting the record.
    #[instrument(skip(self), fields(context_id = %self.id()))]
    pub fn clear_cart(&self) {
        if self.mutate_cart(Cart::clear).1 {
            self.notify("Cart cleared");
        }
    }

    /// Empty the cart and return the link the customer continues on.
    #[instrument(skip(self), fields(context_id = %self.id()))]
    pub fn checkout(&self) -> Url {
        if self.mutate_cart(Cart::clear).1 {
            self.notify("Redirecting to checkout...");
        }
        self.inner.checkout_url.clone()
    }

    /// Raise a notice with the product's name and price. Touches no record.
    pub fn view_product(&self, product: &Product) {
        self.notify(format!(
            "{} — {}",
            product.name,
            product.price.format(self.inner.currency)
        ));
    }

    /// The current cart, read from the store.
    #[must_use]
    pub fn cart_snapshot(&self) -> Cart {
        self.inner.records.read_cart()
    }

    /// The current cart with its totals.
    #[must_use]
    pub fn cart_summary(&self) -> CartSummary {
        CartSummary::from(self.cart_snapshot())
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.cart_snapshot().total_count()
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.cart_snapshot().total_price()
    }

    // =========================================================================
    // Theme
    // =========================================================================

    /// The stored theme; light when unset or unreadable.
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.inner.records.read_theme()
    }

    /// Flip the theme, persist it, and return the theme now in the store.
    #[instrument(skip(self), fields(context_id = %self.id()))]
    pub fn toggle_theme(&self) -> Theme {
        let written = {
            let _guard = self.lock();
            let next = self.inner.records.read_theme().toggled();
            let written = self.inner.records.write_theme(next);
            self.after_write(&self.inner.records.keys().theme, written)
        };
        let theme = self.emit_theme_changed();
        if written {
            self.notify("Theme changed");
        }
        theme
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Call `hook` after every cart change, local or from another context.
    pub fn on_cart_changed(&self, hook: impl Fn(&CartSummary) + Send + Sync + 'static) {
        self.inner.subscribers.add_cart(Arc::new(hook));
    }

    /// Call `hook` after every theme change, local or from another context.
    pub fn on_theme_changed(&self, hook: impl Fn(Theme) + Send + Sync + 'static) {
        self.inner.subscribers.add_theme(Arc::new(hook));
    }

    /// Call `hook` for every notice this context raises.
    pub fn on_notice(&self, hook: impl Fn(&Notice) + Send + Sync + 'static) {
        self.inner.subscribers.add_notice(Arc::new(hook));
    }

    // =========================================================================
    // Synchronization
    // =========================================================================

    /// React to a change made elsewhere in the scope.
    ///
    /// Events this context produced are ignored. For the cart or theme key
    /// the record is re-read and the matching hooks run; other keys are
    /// ignored.
    pub fn handle_notification(&self, event: &StorageEvent) {
        if event.is_from(self.id()) {
            return;
        }

        let keys = self.inner.records.keys();
        if event.key == keys.cart {
            debug!(
                context_id = %self.id(),
                origin = ?event.origin,
                changed_at = %event.at,
                "Cart changed elsewhere"
            );
            self.emit_cart_changed();
        } else if event.key == keys.theme {
            debug!(
                context_id = %self.id(),
                origin = ?event.origin,
                changed_at = %event.at,
                "Theme changed elsewhere"
            );
            self.emit_theme_changed();
        } else {
            trace!(context_id = %self.id(), key = %event.key, "Ignoring unrelated key");
        }
    }

    /// Re-read both records and run every cart and theme hook.
    pub fn resync(&self) {
        self.emit_cart_changed();
        self.emit_theme_changed();
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.inner
            .op_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Read, mutate, and write the cart under the operation lock, then run
    /// the cart hooks with a fresh read. Also returns whether the write
    /// succeeded.
    fn mutate_cart<R>(&self, mutate: impl FnOnce(&mut Cart) -> R) -> (R, bool) {
        let (result, written) = {
            let _guard = self.lock();
            let mut cart = self.inner.records.read_cart();
            let result = mutate(&mut cart);
            let written = self.inner.records.write_cart(&cart);
            (result, self.after_write(&self.inner.records.keys().cart, written))
        };
        self.emit_cart_changed();
        (result, written)
    }

    fn after_write(&self, key: &str, written: Result<(), StoreError>) -> bool {
        match written {
            Ok(()) => {
                self.inner
                    .scope
                    .publish(StorageEvent::new(key, Origin::Context(self.id())));
                true
            }
            Err(e) => {
                error!(context_id = %self.id(), key, error = %e, "Failed to persist record");
                false
            }
        }
    }

    fn emit_cart_changed(&self) {
        let summary = self.cart_summary();
        self.inner.subscribers.emit_cart(&summary);
    }

    fn emit_theme_changed(&self) -> Theme {
        let theme = self.theme();
        self.inner.subscribers.emit_theme(theme);
        theme
    }

    fn notify(&self, message: impl Into<String>) {
        let notice = Notice {
            message: message.into(),
            duration: self.inner.notice_duration,
        };
        debug!(context_id = %self.id(), message = %notice.message, "Notice");
        self.inner.subscribers.emit_notice(&notice);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::store::KeyValueStore;

    fn product(id: &str) -> Product {
        Catalog::builtin()
            .find(&ProductId::parse(id).unwrap())
            .unwrap()
            .clone()
    }

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn config() -> StorefrontConfig {
        StorefrontConfig::defaults().unwrap()
    }

    fn open() -> BrowsingContext {
        BrowsingContext::open(&StorageScope::in_memory(), &config())
    }

    #[derive(Debug)]
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> crate::error::Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> crate::error::Result<()> {
            Err(StoreError::io(
                key,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ))
        }
    }

    #[test]
    fn test_add_twice_scenario() {
        let ctx = open();
        ctx.add_item(&product("p1"));
        ctx.add_item(&product("p1"));

        let cart = ctx.cart_snapshot();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].id.as_str(), "p1");
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(ctx.total_price(), Price::from_cents(1980));
        assert_eq!(ctx.total_count(), 2);
    }

    #[test]
    fn test_increment_then_decrements_remove_line() {
        let ctx = open();
        ctx.add_item(&product("p2"));
        assert_eq!(
            ctx.change_quantity(&id("p2"), QuantityChange::Increment),
            QuantityOutcome::Updated(2)
        );
        ctx.change_quantity(&id("p2"), QuantityChange::Decrement);
        assert_eq!(
            ctx.change_quantity(&id("p2"), QuantityChange::Decrement),
            QuantityOutcome::Removed
        );
        assert!(ctx.cart_snapshot().is_empty());
    }

    #[test]
    fn test_remove_sentinel_is_idempotent() {
        let ctx = open();
        for _ in 0..3 {
            ctx.add_item(&product("p3"));
        }
        ctx.change_quantity(&id("p3"), QuantityChange::Remove);
        assert_eq!(
            ctx.change_quantity(&id("p3"), QuantityChange::Remove),
            QuantityOutcome::Missing
        );
        assert_eq!(ctx.total_count(), 0);
    }

    #[test]
    fn test_missing_id_still_persists() {
        let ctx = open();
        let outcome = ctx.change_quantity(&id("p9"), QuantityChange::Decrement);
        assert_eq!(outcome, QuantityOutcome::Missing);
        let raw = ctx.scope().backend().get("beelivery_cart_v1").unwrap();
        assert_eq!(raw.as_deref(), Some("[]"));
    }

    #[test]
    fn test_clear_cart() {
        let ctx = open();
        ctx.add_item(&product("p1"));
        ctx.add_item(&product("p4"));
        ctx.clear_cart();
        assert_eq!(ctx.total_count(), 0);
        assert!(ctx.cart_snapshot().is_empty());
    }

    #[test]
    fn test_corrupt_store_reads_empty() {
        let scope = StorageScope::in_memory();
        scope.backend().set("beelivery_cart_v1", "][").unwrap();
        let ctx = BrowsingContext::open(&scope, &config());
        assert!(ctx.cart_snapshot().is_empty());

        // A mutation on top of corrupt data starts from an empty cart.
        assert_eq!(ctx.add_item(&product("p5")), 1);
        assert_eq!(ctx.total_count(), 1);
    }

    #[test]
    fn test_toggle_theme() {
        let ctx = open();
        assert_eq!(ctx.theme(), Theme::Light);
        assert_eq!(ctx.toggle_theme(), Theme::Dark);
        assert_eq!(ctx.theme(), Theme::Dark);
        assert_eq!(ctx.toggle_theme(), Theme::Light);
        assert_eq!(ctx.theme(), Theme::Light);
    }

    #[test]
    fn test_checkout_clears_and_returns_link() {
        let ctx = open();
        ctx.add_item(&product("p1"));
        let url = ctx.checkout();
        assert_eq!(url.as_str(), "https://wa.link/nazqhe");
        assert!(ctx.cart_snapshot().is_empty());
    }

    #[test]
    fn test_cart_hook_sees_fresh_totals() {
        let ctx = open();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ctx.on_cart_changed(move |summary| {
            sink.lock().unwrap().push(summary.total_count);
        });

        ctx.add_item(&product("p1"));
        ctx.add_item(&product("p5"));
        ctx.change_quantity(&id("p1"), QuantityChange::Remove);
        ctx.clear_cart();

        assert_eq!(*seen.lock().unwrap(), [1, 2, 1, 0]);
    }

    #[test]
    fn test_notices() {
        let ctx = open();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ctx.on_notice(move |notice| {
            sink.lock().unwrap().push(notice.message.clone());
        });

        ctx.add_item(&product("p1"));
        ctx.toggle_theme();
        ctx.clear_cart();

        assert_eq!(
            *seen.lock().unwrap(),
            ["Cupcake Morango added", "Theme changed", "Cart cleared"]
        );
    }

    #[test]
    fn test_view_product_notice() {
        let scope = StorageScope::in_memory();
        let mut receiver = scope.subscribe();
        let ctx = BrowsingContext::open(&scope, &config());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ctx.on_notice(move |notice| sink.lock().unwrap().push(notice.clone()));

        ctx.view_product(&product("p5"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message, "Brownie (un) — R$ 6.50");
        assert_eq!(seen[0].duration, Duration::from_millis(1400));
        assert!(ctx.cart_snapshot().is_empty());
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_notification_from_other_context_reruns_hooks() {
        let scope = StorageScope::in_memory();
        let a = BrowsingContext::open(&scope, &config());
        let b = BrowsingContext::open(&scope, &config());

        let counts = Arc::new(Mutex::new(Vec::new()));
        let sink = counts.clone();
        b.on_cart_changed(move |summary| sink.lock().unwrap().push(summary.total_count));

        a.add_item(&product("p1"));
        b.handle_notification(&StorageEvent::new("beelivery_cart_v1", Origin::Context(a.id())));

        assert_eq!(*counts.lock().unwrap(), [1]);
    }

    #[test]
    fn test_own_and_unrelated_notifications_ignored() {
        let ctx = open();
        let calls = Arc::new(Mutex::new(0));
        let sink = calls.clone();
        ctx.on_cart_changed(move |_| *sink.lock().unwrap() += 1);
        ctx.on_theme_changed({
            let sink = calls.clone();
            move |_| *sink.lock().unwrap() += 1
        });

        ctx.handle_notification(&StorageEvent::new("beelivery_cart_v1", Origin::Context(ctx.id())));
        ctx.handle_notification(&StorageEvent::new("something_else", Origin::External));

        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_theme_notification_reruns_theme_hooks() {
        let scope = StorageScope::in_memory();
        let a = BrowsingContext::open(&scope, &config());
        let b = BrowsingContext::open(&scope, &config());

        let themes = Arc::new(Mutex::new(Vec::new()));
        let sink = themes.clone();
        b.on_theme_changed(move |theme| sink.lock().unwrap().push(theme));

        a.toggle_theme();
        b.handle_notification(&StorageEvent::new("beelivery_theme_v1", Origin::External));

        assert_eq!(*themes.lock().unwrap(), [Theme::Dark]);
    }

    #[test]
    fn test_writes_publish_events() {
        let scope = StorageScope::in_memory();
        let mut receiver = scope.subscribe();
        let ctx = BrowsingContext::open(&scope, &config());

        ctx.add_item(&product("p1"));
        ctx.toggle_theme();

        let first = receiver.try_recv().unwrap();
        assert_eq!(first.key, "beelivery_cart_v1");
        assert!(first.is_from(ctx.id()));
        assert_eq!(receiver.try_recv().unwrap().key, "beelivery_theme_v1");
    }

    #[test]
    fn test_failed_write_reports_stored_state() {
        let scope = StorageScope::new(Arc::new(ReadOnlyStore));
        let mut receiver = scope.subscribe();
        let ctx = BrowsingContext::open(&scope, &config());
        let notices = Arc::new(Mutex::new(Vec::new()));
        let sink = notices.clone();
        ctx.on_notice(move |notice| sink.lock().unwrap().push(notice.message.clone()));

        assert_eq!(ctx.add_item(&product("p1")), 0);
        assert_eq!(
            ctx.change_quantity(&id("p1"), QuantityChange::Increment),
            QuantityOutcome::Missing
        );
        assert!(ctx.cart_snapshot().is_empty());
        assert_eq!(ctx.toggle_theme(), Theme::Light);
        ctx.clear_cart();
        assert_eq!(ctx.checkout().as_str(), "https://wa.link/nazqhe");

        assert!(notices.lock().unwrap().is_empty());
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_out_of_range_record_reads_empty() {
        let scope = StorageScope::in_memory();
        scope
            .backend()
            .set(
                "beelivery_cart_v1",
                r#"[{"id":"p1","name":"x","price":50000000000000000000000000000,"imageRef":"a","quantity":2}]"#,
            )
            .unwrap();
        let ctx = BrowsingContext::open(&scope, &config());

        assert!(ctx.cart_snapshot().is_empty());
        assert_eq!(ctx.total_price(), Price::ZERO);
        assert_eq!(ctx.add_item(&product("p1")), 1);
        assert_eq!(ctx.total_price(), Price::from_cents(990));
    }
}
