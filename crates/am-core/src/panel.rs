//! Floating control panel model
//!
//! The panel edits the filter preferences. Each input is normalised, written
//! to the page store and then read back by the next classification pass, so
//! the store stays the single source of truth.

use crate::prefs::{
    normalize_rating, save_filters_enabled, save_hide_sponsored, save_min_rating,
    save_min_reviews, KeyValueStore, Preferences, Theme,
};

pub const PANEL_ID: &str = "am-filter-panel";

/// One control on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelControl {
    Master,
    Sponsored,
    MinRating,
    MinReviews,
}

/// Attributes for a numeric input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberSpec {
    pub min: f32,
    pub max: Option<f32>,
    pub step: f32,
}

impl PanelControl {
    pub const ALL: [PanelControl; 4] = [Self::Master, Self::Sponsored, Self::MinRating, Self::MinReviews];

    pub fn id(self) -> &'static str {
        match self {
            Self::Master => "am-filter-enabled",
            Self::Sponsored => "am-filter-sponsored",
            Self::MinRating => "am-filter-min-rating",
            Self::MinReviews => "am-filter-min-reviews",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Master => "Enable filters",
            Self::Sponsored => "Hide sponsored",
            Self::MinRating => "Min rating",
            Self::MinReviews => "Min reviews",
        }
    }

    /// Numeric constraints; None for checkboxes.
    pub fn number_spec(self) -> Option<NumberSpec> {
        match self {
            Self::Master | Self::Sponsored => None,
            Self::MinRating => Some(NumberSpec {
                min: 0.0,
                max: Some(5.0),
                step: 0.1,
            }),
            Self::MinReviews => Some(NumberSpec {
                min: 0.0,
                max: None,
                step: 1.0,
            }),
        }
    }

    /// Controls that follow the master switch.
    pub fn is_dependent(self) -> bool {
        self != Self::Master
    }
}

/// A change event from the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelInput {
    Master(bool),
    Sponsored(bool),
    /// Raw `value` of the rating input
    MinRating(String),
    /// Raw `value` of the reviews input
    MinReviews(String),
}

impl PanelInput {
    pub fn control(&self) -> PanelControl {
        match self {
            Self::Master(_) => PanelControl::Master,
            Self::Sponsored(_) => PanelControl::Sponsored,
            Self::MinRating(_) => PanelControl::MinRating,
            Self::MinReviews(_) => PanelControl::MinReviews,
        }
    }

    /// Persist the change.
    pub fn apply(&self, store: &mut dyn KeyValueStore) {
        match self {
            Self::Master(enabled) => save_filters_enabled(store, *enabled),
            Self::Sponsored(hide) => save_hide_sponsored(store, *hide),
            Self::MinRating(raw) => save_min_rating(store, parse_rating_input(raw)),
            Self::MinReviews(raw) => save_min_reviews(store, parse_reviews_input(raw)),
        }
    }
}

/// Empty or unparsable input means no threshold.
pub fn parse_rating_input(raw: &str) -> f32 {
    raw.trim().parse::<f32>().map(normalize_rating).unwrap_or(0.0)
}

/// Negative values clamp to zero; fractions truncate.
pub fn parse_reviews_input(raw: &str) -> u64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
        _ => 0,
    }
}

/// What the panel displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelState {
    pub enabled: bool,
    pub hide_sponsored: bool,
    pub min_rating: f32,
    pub min_reviews: u64,
    /// Fixed at construction
    pub theme: Theme,
}

impl PanelState {
    pub fn from_prefs(prefs: &Preferences) -> Self {
        Self {
            enabled: prefs.filters_enabled,
            hide_sponsored: prefs.hide_sponsored,
            min_rating: prefs.min_rating,
            min_reviews: prefs.min_reviews,
            theme: prefs.theme(),
        }
    }

    /// Whether `control` accepts input.
    pub fn is_interactive(&self, control: PanelControl) -> bool {
        !control.is_dependent() || self.enabled
    }

    /// Display value for a numeric input.
    pub fn value_text(&self, control: PanelControl) -> Option<String> {
        match control {
            PanelControl::MinRating => Some(format!("{:.1}", self.min_rating)),
            PanelControl::MinReviews => Some(self.min_reviews.to_string()),
            _ => None,
        }
    }

    pub fn is_checked(&self, control: PanelControl) -> Option<bool> {
        match control {
            PanelControl::Master => Some(self.enabled),
            PanelControl::Sponsored => Some(self.hide_sponsored),
            _ => None,
        }
    }
}
