//! Core type definitions for the filter engine
//!
//! These types describe one classification pass: which predicates are
//! active, what was learned about an entry, and what was decided.

use serde::Serialize;

// =============================================================================
// Predicates
// =============================================================================

bitflags::bitflags! {
    /// Filter predicates. Used both for the active set and for the reasons
    /// an entry was hidden.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Predicates: u8 {
        /// Hide sponsored listings
        const SPONSORED = 1 << 0;
        /// Hide entries below a minimum star rating
        const MIN_RATING = 1 << 1;
        /// Hide entries below a minimum review count
        const MIN_REVIEWS = 1 << 2;
    }
}

impl Predicates {
    /// Stable names, for logs and reports.
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::SPONSORED) {
            names.push("sponsored");
        }
        if self.contains(Self::MIN_RATING) {
            names.push("min-rating");
        }
        if self.contains(Self::MIN_REVIEWS) {
            names.push("min-reviews");
        }
        names
    }
}

impl Serialize for Predicates {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

// =============================================================================
// Filter Settings
// =============================================================================

/// Thresholds for one pass, derived from the preference record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterSettings {
    /// Master switch; off bypasses every predicate
    pub enabled: bool,
    pub hide_sponsored: bool,
    pub min_rating: f32,
    pub min_reviews: u64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            hide_sponsored: false,
            min_rating: 0.0,
            min_reviews: 0,
        }
    }
}

impl FilterSettings {
    /// The active predicate set. Empty when the master switch is off.
    pub fn active(&self) -> Predicates {
        let mut active = Predicates::empty();
        if !self.enabled {
            return active;
        }
        if self.hide_sponsored {
            active |= Predicates::SPONSORED;
        }
        if self.min_rating > 0.0 {
            active |= Predicates::MIN_RATING;
        }
        if self.min_reviews > 0 {
            active |= Predicates::MIN_REVIEWS;
        }
        active
    }
}

// =============================================================================
// Classification Results
// =============================================================================

/// The signal that marked an entry as sponsored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SponsoredSignal {
    /// Structural ad class/attribute on the entry
    AdMarker,
    /// Component type attribute mentions sponsored
    ComponentType,
    /// Rendered text carries the sponsored label
    VisibleText,
    /// Impression logger with sponsored component props
    ImpressionLogger,
    /// Dedicated sponsored label element
    Label,
    /// Accessibility label mentions sponsored
    AriaLabel,
    /// A link routes through ad tracking
    TrackingLink,
}

/// What a pass learned about one entry. Facts for inactive predicates are
/// not computed and stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProductFacts {
    pub sponsored: Option<SponsoredSignal>,
    pub rating: Option<f32>,
    pub reviews: Option<u64>,
}

/// Decision for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub facts: ProductFacts,
    /// Predicates that asked to hide the entry
    pub hidden_by: Predicates,
}

impl Verdict {
    pub fn visible(facts: ProductFacts) -> Self {
        Self {
            facts,
            hidden_by: Predicates::empty(),
        }
    }

    pub fn should_hide(&self) -> bool {
        !self.hidden_by.is_empty()
    }
}

/// Counts from one apply phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub discovered: usize,
    pub hidden: usize,
    /// Previously hidden entries made visible on this pass, including
    /// marked nodes that are no longer discovered
    pub revealed: usize,
    /// Discovered entries left visible and unmarked
    pub unchanged: usize,
    /// Pagination controls forced visible
    pub pagination: usize,
}
