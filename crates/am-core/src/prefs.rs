//! Preference record and key-value stores
//!
//! Two mirrored backends hold preferences: the extension store
//! (authoritative for the disabled flag) and the page store, kept for older
//! installs. Both are plain string key-value stores; a missing key and a
//! failed read are the same thing and yield the default.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::FilterSettings;

/// Page-store keys.
pub mod keys {
    pub const DISABLED: &str = "amazon-minimalist-disabled";
    pub const DARK_MODE: &str = "amazon-minimalist-dark-mode";
    pub const FILTERS_ENABLED: &str = "amazon-minimalist-filters-enabled";
    pub const HIDE_SPONSORED: &str = "amazon-minimalist-hide-sponsored";
    pub const MIN_RATING: &str = "amazon-minimalist-min-rating";
    pub const MIN_REVIEWS: &str = "amazon-minimalist-min-reviews";

    /// Extension-store key for the disabled flag.
    pub const EXTENSION_DISABLED: &str = "minimalistDisabled";
}

pub const MAX_RATING: f32 = 5.0;

// =============================================================================
// Stores
// =============================================================================

/// String get/set by key. Writes are fire-and-forget.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store for tests and offline runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Both backends, borrowed for one pipeline run.
pub struct Stores<'a> {
    pub extension: &'a mut dyn KeyValueStore,
    pub page: &'a mut dyn KeyValueStore,
}

impl<'a> Stores<'a> {
    pub fn new(extension: &'a mut dyn KeyValueStore, page: &'a mut dyn KeyValueStore) -> Self {
        Self { extension, page }
    }

    /// Resolve the disabled flag. A page-store flag left by an older install
    /// is honoured and copied into the extension store.
    pub fn is_disabled(&mut self) -> bool {
        if read_bool(&*self.extension, keys::EXTENSION_DISABLED) == Some(true) {
            log::debug!("disabled via extension storage");
            return true;
        }

        if read_bool(&*self.page, keys::DISABLED) == Some(true) {
            log::debug!("disabled via page storage, syncing extension storage");
            self.extension.set(keys::EXTENSION_DISABLED, "true");
            return true;
        }

        false
    }

    /// Write the disabled flag to both backends.
    pub fn set_disabled(&mut self, disabled: bool) {
        let value = bool_str(disabled);
        self.page.set(keys::DISABLED, value);
        self.extension.set(keys::EXTENSION_DISABLED, value);
    }
}

// =============================================================================
// Encoding
// =============================================================================

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

pub fn read_bool(store: &dyn KeyValueStore, key: &str) -> Option<bool> {
    match store.get(key)?.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn read_f32(store: &dyn KeyValueStore, key: &str) -> Option<f32> {
    store.get(key)?.trim().parse().ok().filter(|v: &f32| v.is_finite())
}

fn read_u64(store: &dyn KeyValueStore, key: &str) -> Option<u64> {
    store.get(key)?.trim().parse().ok()
}

/// Clamp to `[0, 5]` and round to one decimal. NaN becomes 0.
pub fn normalize_rating(value: f32) -> f32 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    (value.min(MAX_RATING) * 10.0).round() / 10.0
}

// =============================================================================
// Preferences
// =============================================================================

/// Light or dark styling of injected surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark(dark: bool) -> Self {
        if dark {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn background(self) -> &'static str {
        match self {
            Self::Light => "#F7F7F7",
            Self::Dark => "#1E1E1E",
        }
    }

    /// Value for the root `color-scheme` property.
    pub fn color_scheme(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Snapshot of all persisted preferences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub disabled: bool,
    pub dark_mode: bool,
    pub filters_enabled: bool,
    pub hide_sponsored: bool,
    pub min_rating: f32,
    pub min_reviews: u64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            disabled: false,
            dark_mode: false,
            filters_enabled: true,
            hide_sponsored: false,
            min_rating: 0.0,
            min_reviews: 0,
        }
    }
}

impl Preferences {
    /// Read from the page store. `system_dark` is the `prefers-color-scheme`
    /// answer used when no theme was ever stored.
    pub fn load(store: &dyn KeyValueStore, system_dark: bool) -> Self {
        let defaults = Self::default();
        Self {
            disabled: read_bool(store, keys::DISABLED).unwrap_or(defaults.disabled),
            dark_mode: read_bool(store, keys::DARK_MODE).unwrap_or(system_dark),
            filters_enabled: read_bool(store, keys::FILTERS_ENABLED)
                .unwrap_or(defaults.filters_enabled),
            hide_sponsored: read_bool(store, keys::HIDE_SPONSORED)
                .unwrap_or(defaults.hide_sponsored),
            min_rating: read_f32(store, keys::MIN_RATING)
                .map(normalize_rating)
                .unwrap_or(defaults.min_rating),
            min_reviews: read_u64(store, keys::MIN_REVIEWS).unwrap_or(defaults.min_reviews),
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::from_dark(self.dark_mode)
    }

    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            enabled: self.filters_enabled,
            hide_sponsored: self.hide_sponsored,
            min_rating: self.min_rating,
            min_reviews: self.min_reviews,
        }
    }

    /// Persist the filter fields.
    pub fn save_filters(&self, store: &mut dyn KeyValueStore) {
        save_filters_enabled(store, self.filters_enabled);
        save_hide_sponsored(store, self.hide_sponsored);
        save_min_rating(store, self.min_rating);
        save_min_reviews(store, self.min_reviews);
    }
}

pub fn save_dark_mode(store: &mut dyn KeyValueStore, dark: bool) {
    store.set(keys::DARK_MODE, bool_str(dark));
}

pub fn save_filters_enabled(store: &mut dyn KeyValueStore, enabled: bool) {
    store.set(keys::FILTERS_ENABLED, bool_str(enabled));
}

pub fn save_hide_sponsored(store: &mut dyn KeyValueStore, hide: bool) {
    store.set(keys::HIDE_SPONSORED, bool_str(hide));
}

pub fn save_min_rating(store: &mut dyn KeyValueStore, rating: f32) {
    store.set(keys::MIN_RATING, &normalize_rating(rating).to_string());
}

pub fn save_min_reviews(store: &mut dyn KeyValueStore, reviews: u64) {
    store.set(keys::MIN_REVIEWS, &reviews.to_string());
}

/// Flip the stored theme and return the new one.
pub fn toggle_theme(store: &mut dyn KeyValueStore, system_dark: bool) -> Theme {
    let current = read_bool(store, keys::DARK_MODE).unwrap_or(system_dark);
    let next = Theme::from_dark(current).toggled();
    save_dark_mode(store, next.is_dark());
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_on_empty_store() {
        let store = MemoryStore::new();
        let prefs = Preferences::load(&store, false);
        assert_eq!(prefs, Preferences::default());
        assert!(Preferences::load(&store, true).dark_mode);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let store = MemoryStore::new()
            .with(keys::FILTERS_ENABLED, "yes")
            .with(keys::MIN_RATING, "four")
            .with(keys::MIN_REVIEWS, "-3");
        let prefs = Preferences::load(&store, false);
        assert!(prefs.filters_enabled);
        assert_eq!(prefs.min_rating, 0.0);
        assert_eq!(prefs.min_reviews, 0);
    }

    #[test]
    fn test_rating_is_clamped_on_load() {
        let store = MemoryStore::new().with(keys::MIN_RATING, "7.25");
        assert_eq!(Preferences::load(&store, false).min_rating, 5.0);
        let store = MemoryStore::new().with(keys::MIN_RATING, "NaN");
        assert_eq!(Preferences::load(&store, false).min_rating, 0.0);
    }

    #[test]
    fn test_threshold_write_then_read() {
        let mut store = MemoryStore::new();
        save_min_rating(&mut store, 4.3);
        save_min_reviews(&mut store, 5000);
        let prefs = Preferences::load(&store, false);
        assert_eq!(prefs.min_rating, 4.3);
        assert_eq!(prefs.min_reviews, 5000);
    }

    #[test]
    fn test_extension_store_is_authoritative() {
        let mut ext = MemoryStore::new().with(keys::EXTENSION_DISABLED, "true");
        let mut page = MemoryStore::new();
        assert!(Stores::new(&mut ext, &mut page).is_disabled());
    }

    #[test]
    fn test_page_flag_is_written_back() {
        let mut ext = MemoryStore::new();
        let mut page = MemoryStore::new().with(keys::DISABLED, "true");
        assert!(Stores::new(&mut ext, &mut page).is_disabled());
        assert_eq!(ext.get(keys::EXTENSION_DISABLED).as_deref(), Some("true"));
    }

    #[test]
    fn test_not_disabled_by_default() {
        let mut ext = MemoryStore::new();
        let mut page = MemoryStore::new();
        assert!(!Stores::new(&mut ext, &mut page).is_disabled());
        assert_eq!(ext.get(keys::EXTENSION_DISABLED), None);
    }

    #[test]
    fn test_set_disabled_writes_both() {
        let mut ext = MemoryStore::new();
        let mut page = MemoryStore::new();
        Stores::new(&mut ext, &mut page).set_disabled(true);
        assert_eq!(page.get(keys::DISABLED).as_deref(), Some("true"));
        assert_eq!(ext.get(keys::EXTENSION_DISABLED).as_deref(), Some("true"));
    }

    #[test]
    fn test_toggle_theme() {
        let mut store = MemoryStore::new();
        assert_eq!(toggle_theme(&mut store, true), Theme::Light);
        assert_eq!(toggle_theme(&mut store, true), Theme::Dark);
        assert!(Preferences::load(&store, false).dark_mode);
    }
}
