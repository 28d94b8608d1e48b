//! Route tracking across in-page navigations
//!
//! The storefront rewrites history without reloading, so the route is
//! re-checked on `popstate` and on a fixed interval (`pushState` fires no
//! event). Pipelines start only when the route changes.

use std::cell::RefCell;

use am_core::{Route, RouteWatcher};

use crate::timers::{listen, set_timeout};
use crate::{config, current_route, homepage, search};

thread_local! {
    static WATCHER: RefCell<RouteWatcher> = RefCell::new(RouteWatcher::new());
}

pub fn watch() {
    check();
    if let Some(window) = web_sys::window() {
        listen(&window, "popstate", |_| check());
    }
    schedule_check();
}

fn schedule_check() {
    set_timeout(config().timings.product_poll(), || {
        check();
        schedule_check();
    });
}

/// Re-classify the current location and boot the pipelines for a new route.
pub fn check() {
    let route = current_route();
    let Some(route) = WATCHER.with(|w| w.borrow_mut().observe(route)) else {
        return;
    };
    log::debug!("route: {}", route.as_str());

    homepage::boot(route);
    if route == Route::SearchResults {
        search::boot();
    }
}
