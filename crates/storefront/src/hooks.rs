//! View recompute hooks.
//!
//! External renderers register callbacks here; a context invokes them after
//! every local mutation and after every notification from another context.
//! Callbacks always receive a value re-read from the store.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use beelivery_core::{Cart, Price, Theme};

/// Callback for cart changes.
pub type CartHook = Arc<dyn Fn(&CartSummary) + Send + Sync>;
/// Callback for theme changes.
pub type ThemeHook = Arc<dyn Fn(Theme) + Send + Sync>;
/// Callback for transient notices.
pub type NoticeHook = Arc<dyn Fn(&Notice) + Send + Sync>;

/// A freshly read cart with its derived totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub cart: Cart,
    pub total_count: u64,
    pub total_price: Price,
}

impl From<Cart> for CartSummary {
    fn from(cart: Cart) -> Self {
        Self {
            total_count: cart.total_count(),
            total_price: cart.total_price(),
            cart,
        }
    }
}

/// A short-lived message for the user, the equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub duration: Duration,
}

/// Registered callbacks of one context.
#[derive(Default)]
pub struct Subscribers {
    cart: RwLock<Vec<CartHook>>,
    theme: RwLock<Vec<ThemeHook>>,
    notice: RwLock<Vec<NoticeHook>>,
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("cart", &snapshot(&self.cart).len())
            .field("theme", &snapshot(&self.theme).len())
            .field("notice", &snapshot(&self.notice).len())
            .finish()
    }
}

impl Subscribers {
    pub fn add_cart(&self, hook: CartHook) {
        push(&self.cart, hook);
    }

    pub fn add_theme(&self, hook: ThemeHook) {
        push(&self.theme, hook);
    }

    pub fn add_notice(&self, hook: NoticeHook) {
        push(&self.notice, hook);
    }

    pub fn emit_cart(&self, summary: &CartSummary) {
        for hook in snapshot(&self.cart) {
            hook(summary);
        }
    }

    pub fn emit_theme(&self, theme: Theme) {
        for hook in snapshot(&self.theme) {
            hook(theme);
        }
    }

    pub fn emit_notice(&self, notice: &Notice) {
        for hook in snapshot(&self.notice) {
            hook(notice);
        }
    }
}

fn push<T>(hooks: &RwLock<Vec<T>>, hook: T) {
    hooks
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(hook);
}

/// Clone the hook list so callbacks run without the lock held and may
/// register further hooks.
fn snapshot<T: Clone>(hooks: &RwLock<Vec<T>>) -> Vec<T> {
    hooks
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
