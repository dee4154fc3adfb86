//! Theme commands.

use beelivery_storefront::views::theme_icon;
use tracing::info;

use super::Storefront;

pub fn show(app: &Storefront) {
    let theme = app.context.theme();
    info!("Theme: {theme} {}", theme_icon(theme));
}

pub fn toggle(app: &Storefront) {
    let theme = app.context.toggle_theme();
    info!("Theme: {theme} {}", theme_icon(theme));
}
