//! Homepage replacer
//!
//! State machine that swaps the storefront root for the minimal interface.
//! The page is hidden by an injected stylesheet as early as possible, the
//! replacement is built on the first ready signal, and the stylesheet is
//! lifted on every way out of `run` so a failed or skipped build never
//! leaves the page blank.

use crate::config::Marketplace;
use crate::prefs::{Preferences, Stores, Theme};
use crate::route::Route;

/// Element ids owned by the replacer. Unique per page.
pub mod ids {
    pub const HIDE_STYLE: &str = "amazon-minimalist-hide-style";
    pub const CONTAINER: &str = "minimalist-amazon-container";
    pub const LOGO_CONTAINER: &str = "amazon-logo-container";
    pub const LOGO_LINK: &str = "amazon-logo-link";
    pub const LOGO_BACKGROUND: &str = "amazon-logo-background";
    pub const LOGO_IMAGE: &str = "amazon-minimalist-logo";
    pub const SEARCH_FORM: &str = "minimalist-search-form";
    pub const SEARCH_INPUT: &str = "minimalist-search-input";
    pub const QUICK_LINKS: &str = "quick-access-links";
    pub const FOOTER: &str = "minimalist-footer";
    pub const THEME_TOGGLE: &str = "theme-toggle";
}

/// Added to `html` and `body` to lift the suppression.
pub const READY_CLASS: &str = "minimalist-ready";
/// Added to `body` in dark mode.
pub const DARK_BODY_CLASS: &str = "dark-mode";
pub const QUICK_LINK_CLASS: &str = "quick-access-link";
/// Added to themed children in dark mode.
pub const DARK_CLASS: &str = "dark";

/// Body of the suppression stylesheet.
pub const SUPPRESSION_CSS: &str = "
html, body {
  visibility: hidden !important;
  opacity: 0 !important;
  transition: opacity 0.2s ease !important;
}

body.minimalist-ready, html.minimalist-ready {
  visibility: visible !important;
  opacity: 1 !important;
}
";

// =============================================================================
// Layout
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchForm {
    pub action: String,
    pub method: &'static str,
    pub field: String,
    pub placeholder: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkItem {
    pub title: String,
    pub url: String,
}

/// Face of the theme toggle for the current theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleFace {
    pub icon: &'static str,
    pub title: &'static str,
}

impl ToggleFace {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                icon: "\u{2600}\u{fe0f}",
                title: "Switch to Light Mode",
            },
            Theme::Light => Self {
                icon: "\u{1f319}",
                title: "Switch to Dark Mode",
            },
        }
    }
}

/// Everything the replacement shows, independent of how it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLayout {
    pub theme: Theme,
    /// Logo destination; clicks re-enter the pipeline here
    pub home_href: &'static str,
    pub logo_alt: &'static str,
    pub search: SearchForm,
    pub links: Vec<LinkItem>,
    pub link_separator: &'static str,
    pub restore_label: &'static str,
    pub toggle: ToggleFace,
}

impl HomeLayout {
    pub fn new(marketplace: &Marketplace, theme: Theme) -> Self {
        Self {
            theme,
            home_href: "/",
            logo_alt: "Amazon",
            search: SearchForm {
                action: marketplace.search_path.clone(),
                method: "get",
                field: marketplace.query_param.clone(),
                placeholder: marketplace.search_placeholder.clone(),
            },
            links: marketplace
                .quick_links
                .iter()
                .map(|link| LinkItem {
                    title: link.title.clone(),
                    url: marketplace.absolute_url(&link.path),
                })
                .collect(),
            link_separator: " \u{b7} ",
            restore_label: "Restore Original Amazon",
            toggle: ToggleFace::for_theme(theme),
        }
    }
}

// =============================================================================
// Page Seam
// =============================================================================

/// What the replacer needs from the page.
pub trait HomePage {
    fn has_element(&self, id: &str) -> bool;

    /// Insert the suppression stylesheet if it is not there yet.
    fn inject_suppression(&mut self);

    /// Remove the suppression stylesheet if present and add the ready class.
    fn lift_suppression(&mut self);

    /// Drop the original page content.
    fn clear_content(&mut self);

    fn apply_theme(&mut self, theme: Theme);

    /// Render the replacement under a new `ids::CONTAINER` root.
    fn mount(&mut self, layout: &HomeLayout);
}

// =============================================================================
// State Machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacerState {
    Idle,
    /// Original content hidden, waiting for a ready signal
    Suppressed,
    Building,
    /// Replacement visible
    Ready,
    /// Disabled or off-route; page left as is
    Skipped,
}

/// Result of one `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built,
    AlreadyPresent,
    Disabled,
    OffRoute,
}

pub struct HomepageReplacer {
    marketplace: Marketplace,
    state: ReplacerState,
}

impl HomepageReplacer {
    pub fn new(marketplace: Marketplace) -> Self {
        Self {
            marketplace,
            state: ReplacerState::Idle,
        }
    }

    pub fn state(&self) -> ReplacerState {
        self.state
    }

    pub fn marketplace(&self) -> &Marketplace {
        &self.marketplace
    }

    /// Called once at script start, before anything else touches the DOM.
    pub fn arm<P: HomePage>(&mut self, route: Route, page: &mut P) {
        if route == Route::Home {
            page.inject_suppression();
            self.state = ReplacerState::Suppressed;
        } else {
            // A stale stylesheet from a raced navigation must not survive
            lift_stale_suppression(page);
            self.state = ReplacerState::Skipped;
        }
    }

    /// Build if needed. Safe to call from every trigger (ready, load,
    /// external request); only the first build on a page does anything.
    pub fn run<P: HomePage>(
        &mut self,
        route: Route,
        page: &mut P,
        stores: &mut Stores<'_>,
        system_dark: bool,
    ) -> BuildOutcome {
        let outcome = self.build(route, page, stores, system_dark);
        page.lift_suppression();

        self.state = match outcome {
            BuildOutcome::Built | BuildOutcome::AlreadyPresent => ReplacerState::Ready,
            BuildOutcome::Disabled | BuildOutcome::OffRoute => ReplacerState::Skipped,
        };
        log::debug!("replacer run: {:?} -> {:?}", outcome, self.state);
        outcome
    }

    fn build<P: HomePage>(
        &mut self,
        route: Route,
        page: &mut P,
        stores: &mut Stores<'_>,
        system_dark: bool,
    ) -> BuildOutcome {
        if route != Route::Home {
            return BuildOutcome::OffRoute;
        }
        if page.has_element(ids::CONTAINER) {
            return BuildOutcome::AlreadyPresent;
        }
        if stores.is_disabled() {
            return BuildOutcome::Disabled;
        }

        self.state = ReplacerState::Building;
        let theme = Preferences::load(&*stores.page, system_dark).theme();

        page.clear_content();
        page.apply_theme(theme);
        page.mount(&HomeLayout::new(&self.marketplace, theme));

        log::info!("interface applied");
        BuildOutcome::Built
    }
}

/// Lift suppression only if the stylesheet is present. Pages that were never
/// suppressed keep their markup untouched.
pub fn lift_stale_suppression<P: HomePage>(page: &mut P) -> bool {
    if !page.has_element(ids::HIDE_STYLE) {
        return false;
    }
    page.lift_suppression();
    true
}

/// Restore control: disable in both stores. The caller reloads afterwards.
pub fn restore_original(stores: &mut Stores<'_>) {
    stores.set_disabled(true);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::prefs::{keys, KeyValueStore, MemoryStore};

    /// Page double that records what the replacer did.
    #[derive(Debug, Default)]
    pub(crate) struct FakePage {
        pub suppressed: bool,
        pub ready: bool,
        pub containers: usize,
        pub cleared: usize,
        pub theme: Option<Theme>,
        pub layout: Option<HomeLayout>,
    }

    impl HomePage for FakePage {
        fn has_element(&self, id: &str) -> bool {
            match id {
                ids::CONTAINER => self.containers > 0,
                ids::HIDE_STYLE => self.suppressed,
                _ => false,
            }
        }

        fn inject_suppression(&mut self) {
            self.suppressed = true;
        }

        fn lift_suppression(&mut self) {
            self.suppressed = false;
            self.ready = true;
        }

        fn clear_content(&mut self) {
            self.cleared += 1;
            self.containers = 0;
        }

        fn apply_theme(&mut self, theme: Theme) {
            self.theme = Some(theme);
        }

        fn mount(&mut self, layout: &HomeLayout) {
            self.containers += 1;
            self.layout = Some(layout.clone());
        }
    }

    fn replacer() -> HomepageReplacer {
        HomepageReplacer::new(Marketplace::default())
    }

    #[test]
    fn test_arm_on_home_suppresses() {
        let mut page = FakePage::default();
        let mut r = replacer();
        r.arm(Route::Home, &mut page);
        assert!(page.suppressed);
        assert_eq!(r.state(), ReplacerState::Suppressed);
    }

    #[test]
    fn test_arm_off_route_lifts_stale_style() {
        let mut page = FakePage {
            suppressed: true,
            ..FakePage::default()
        };
        let mut r = replacer();
        r.arm(Route::SearchResults, &mut page);
        assert!(!page.suppressed);
        assert!(page.ready);
        assert_eq!(r.state(), ReplacerState::Skipped);
    }

    #[test]
    fn test_arm_off_route_leaves_clean_page_alone() {
        let mut page = FakePage::default();
        let mut r = replacer();
        r.arm(Route::Other, &mut page);
        assert!(!page.ready);
        assert_eq!(r.state(), ReplacerState::Skipped);
        assert!(!lift_stale_suppression(&mut page));
    }

    #[test]
    fn test_builds_once() {
        let (mut ext, mut local) = (MemoryStore::new(), MemoryStore::new());
        let mut page = FakePage::default();
        let mut r = replacer();
        r.arm(Route::Home, &mut page);

        let mut stores = Stores::new(&mut ext, &mut local);
        assert_eq!(r.run(Route::Home, &mut page, &mut stores, false), BuildOutcome::Built);
        assert_eq!(r.run(Route::Home, &mut page, &mut stores, false), BuildOutcome::AlreadyPresent);

        assert_eq!(page.containers, 1);
        assert_eq!(page.cleared, 1);
        assert!(!page.suppressed);
        assert_eq!(r.state(), ReplacerState::Ready);
    }

    #[test]
    fn test_disabled_skips_and_reveals() {
        let mut ext = MemoryStore::new();
        let mut local = MemoryStore::new().with(keys::DISABLED, "true");
        let mut page = FakePage::default();
        let mut r = replacer();
        r.arm(Route::Home, &mut page);

        let mut stores = Stores::new(&mut ext, &mut local);
        assert_eq!(r.run(Route::Home, &mut page, &mut stores, false), BuildOutcome::Disabled);
        assert_eq!(page.containers, 0);
        assert!(!page.suppressed);
        assert!(page.ready);
        assert_eq!(ext.get(keys::EXTENSION_DISABLED).as_deref(), Some("true"));
    }

    #[test]
    fn test_off_route_run_reveals() {
        let (mut ext, mut local) = (MemoryStore::new(), MemoryStore::new());
        let mut page = FakePage {
            suppressed: true,
            ..FakePage::default()
        };
        let mut stores = Stores::new(&mut ext, &mut local);
        assert_eq!(replacer().run(Route::Other, &mut page, &mut stores, false), BuildOutcome::OffRoute);
        assert!(!page.suppressed);
    }

    #[test]
    fn test_theme_from_preferences() {
        let mut ext = MemoryStore::new();
        let mut local = MemoryStore::new().with(keys::DARK_MODE, "true");
        let mut page = FakePage::default();
        let mut stores = Stores::new(&mut ext, &mut local);
        replacer().run(Route::Home, &mut page, &mut stores, false);

        assert_eq!(page.theme, Some(Theme::Dark));
        let layout = page.layout.unwrap();
        assert_eq!(layout.toggle.title, "Switch to Light Mode");
    }

    #[test]
    fn test_layout_contents() {
        let layout = HomeLayout::new(&Marketplace::default(), Theme::Light);
        assert_eq!(layout.search.action, "/s");
        assert_eq!(layout.search.method, "get");
        assert_eq!(layout.search.field, "k");
        let titles: Vec<_> = layout.links.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Order History", "Buy Again", "Wish List"]);
        assert_eq!(layout.links[0].url, "https://www.amazon.co.uk/gp/css/order-history");
    }

    #[test]
    fn test_restore_then_rerun_is_skipped() {
        let (mut ext, mut local) = (MemoryStore::new(), MemoryStore::new());
        restore_original(&mut Stores::new(&mut ext, &mut local));

        // After the reload a fresh page and replacer see the flag
        let mut page = FakePage::default();
        let mut stores = Stores::new(&mut ext, &mut local);
        assert_eq!(replacer().run(Route::Home, &mut page, &mut stores, false), BuildOutcome::Disabled);
    }
}
