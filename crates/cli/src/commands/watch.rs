//! Follow changes made by other processes.

use beelivery_storefront::views::{CartView, theme_icon};
use beelivery_storefront::{ScopeWatcher, sync};
use tracing::info;

use super::{Storefront, render_cart};

/// Render the cart and theme, then re-render on every change until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the data directory cannot be watched.
pub async fn run(app: &Storefront) -> Result<(), Box<dyn std::error::Error>> {
    let _watcher = ScopeWatcher::start(&app.store, app.context.scope())?;

    let currency = app.config.currency;
    app.context
        .on_cart_changed(move |summary| render_cart(&CartView::new(summary, currency)));
    app.context
        .on_theme_changed(|theme| info!("Theme: {theme} {}", theme_icon(theme)));

    let listener = sync::spawn_listener(app.context.clone());
    app.context.resync();

    shutdown_signal().await;
    listener.shutdown().await;
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, stopping watch");
}
