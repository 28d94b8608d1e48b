//! Route classification
//!
//! Decides which facility owns the current page. Pure function of the
//! location; callers recompute it on every navigation because the host page
//! rewrites history without reloading.

use crate::config::Marketplace;

// =============================================================================
// Route
// =============================================================================

/// Which pipeline a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Route {
    /// Storefront root, replaced by the minimal interface
    Home,
    /// Search results, filtered by the product engine
    SearchResults,
    /// Anything else, left untouched
    Other,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::SearchResults => "search-results",
            Self::Other => "other",
        }
    }
}

/// Classify a host/path pair against a marketplace.
pub fn classify(marketplace: &Marketplace, host: &str, path: &str) -> Route {
    if is_home(marketplace, host, path) {
        return Route::Home;
    }
    if is_search(marketplace, path) {
        return Route::SearchResults;
    }
    Route::Other
}

/// Home requires the bare or `www.` host and the root (or nav-logo) path.
pub fn is_home(marketplace: &Marketplace, host: &str, path: &str) -> bool {
    is_marketplace_host(marketplace, host)
        && (path == "/" || path == marketplace.nav_logo_path)
}

/// Search requires the search segment anywhere in the path.
pub fn is_search(marketplace: &Marketplace, path: &str) -> bool {
    let segment = marketplace.search_path.trim_matches('/');
    if segment.is_empty() {
        return false;
    }
    path.split('/').any(|part| part == segment)
}

fn is_marketplace_host(marketplace: &Marketplace, host: &str) -> bool {
    let domain = marketplace.domain.as_str();
    if host.eq_ignore_ascii_case(domain) {
        return true;
    }
    match host.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("www.") => {
            host[4..].eq_ignore_ascii_case(domain)
        }
        _ => false,
    }
}

// =============================================================================
// Location
// =============================================================================

/// Borrowed host and path of a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    pub host: &'a str,
    pub path: &'a str,
}

impl<'a> Location<'a> {
    pub fn new(host: &'a str, path: &'a str) -> Self {
        Self { host, path }
    }

    /// Split a full URL without allocating.
    /// Returns None when the URL has no `scheme://`.
    pub fn parse(url: &'a str) -> Option<Self> {
        let scheme_end = get_scheme_end(url)?;
        let rest = &url[scheme_end..];

        let authority_end = rest
            .find(|c| c == '/' || c == '?' || c == '#')
            .unwrap_or(rest.len());
        let authority = &rest[..authority_end];

        // Drop userinfo and port
        let host = match authority.rfind('@') {
            Some(at) => &authority[at + 1..],
            None => authority,
        };
        let host = match host.find(':') {
            Some(colon) => &host[..colon],
            None => host,
        };

        let after = &rest[authority_end..];
        let path = if after.starts_with('/') {
            let end = after.find(|c| c == '?' || c == '#').unwrap_or(after.len());
            &after[..end]
        } else {
            "/"
        };

        Some(Self { host, path })
    }

    pub fn route(&self, marketplace: &Marketplace) -> Route {
        classify(marketplace, self.host, self.path)
    }
}

// =============================================================================
// Navigation
// =============================================================================

/// Tracks the route across in-page navigations. The host rewrites history
/// without reloading, so the content script re-checks on every navigation
/// signal and only dispatches when the route actually changed.
#[derive(Debug, Clone, Default)]
pub struct RouteWatcher {
    current: Option<Route>,
}

impl RouteWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        self.current
    }

    /// Record the route seen now. Returns it when it differs from the last
    /// one observed; the first observation always does.
    pub fn observe(&mut self, route: Route) -> Option<Route> {
        if self.current == Some(route) {
            return None;
        }
        self.current = Some(route);
        Some(route)
    }
}

/// Get the position after "://".
#[inline]
fn get_scheme_end(url: &str) -> Option<usize> {
    let colon = url.find("://")?;
    if colon == 0 {
        return None;
    }
    Some(colon + 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uk() -> Marketplace {
        Marketplace::default()
    }

    #[test]
    fn test_home_on_both_hosts() {
        let m = uk();
        for host in ["amazon.co.uk", "www.amazon.co.uk", "WWW.Amazon.co.uk"] {
            assert_eq!(classify(&m, host, "/"), Route::Home, "{host}");
            assert_eq!(classify(&m, host, "/ref=nav_logo"), Route::Home, "{host}");
        }
    }

    #[test]
    fn test_non_home_hosts_and_paths() {
        let m = uk();
        assert_ne!(classify(&m, "smile.amazon.co.uk", "/"), Route::Home);
        assert_ne!(classify(&m, "www.amazon.com", "/"), Route::Home);
        assert_ne!(classify(&m, "evilamazon.co.uk", "/"), Route::Home);
        assert_ne!(classify(&m, "www.amazon.co.uk", "/gp/css/order-history"), Route::Home);
        assert_ne!(classify(&m, "www.amazon.co.uk", ""), Route::Home);
    }

    #[test]
    fn test_search_segment() {
        let m = uk();
        assert_eq!(classify(&m, "www.amazon.co.uk", "/s"), Route::SearchResults);
        assert_eq!(classify(&m, "www.amazon.co.uk", "/s/ref=nb_sb_noss"), Route::SearchResults);
        assert_eq!(classify(&m, "www.amazon.co.uk", "/stores/page"), Route::Other);
        assert_eq!(classify(&m, "www.amazon.co.uk", "/dp/B000000"), Route::Other);
    }

    #[test]
    fn test_location_parse() {
        let loc = Location::parse("https://www.amazon.co.uk/s?k=kettle#top").unwrap();
        assert_eq!(loc.host, "www.amazon.co.uk");
        assert_eq!(loc.path, "/s");

        let loc = Location::parse("https://user@amazon.co.uk:443").unwrap();
        assert_eq!(loc.host, "amazon.co.uk");
        assert_eq!(loc.path, "/");

        let loc = Location::parse("https://amazon.co.uk?x=1").unwrap();
        assert_eq!(loc.path, "/");

        assert!(Location::parse("amazon.co.uk/").is_none());
    }

    #[test]
    fn test_location_route() {
        let m = uk();
        let loc = Location::parse("https://www.amazon.co.uk/ref=nav_logo").unwrap();
        assert_eq!(loc.route(&m), Route::Home);
    }

    #[test]
    fn test_watcher_dispatches_on_change_only() {
        let m = uk();
        let mut watcher = RouteWatcher::new();
        let seen = |url: &str| Location::parse(url).unwrap().route(&m);

        assert_eq!(watcher.observe(seen("https://www.amazon.co.uk/gp/help")), Some(Route::Other));
        assert_eq!(watcher.observe(seen("https://www.amazon.co.uk/gp/help?x=1")), None);

        // pushState into results, then back to the storefront
        assert_eq!(watcher.observe(seen("https://www.amazon.co.uk/s?k=kettle")), Some(Route::SearchResults));
        assert_eq!(watcher.observe(seen("https://www.amazon.co.uk/s?k=toaster")), None);
        assert_eq!(watcher.observe(seen("https://www.amazon.co.uk/")), Some(Route::Home));
        assert_eq!(watcher.current(), Some(Route::Home));
    }
}
