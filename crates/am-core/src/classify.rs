//! Product classifier
//!
//! Heuristics over one product entry's rendered markup. Every lookup here
//! is driven by the compiled rule table; there is no markup knowledge in the
//! control flow itself.

use crate::dom::Element;
use crate::rules::{first_value, CompiledPattern, CompiledRules, ExtractionRule, TextSource};
use crate::types::{FilterSettings, Predicates, ProductFacts, SponsoredSignal, Verdict};

pub struct Classifier<'r> {
    rules: &'r CompiledRules,
}

impl<'r> Classifier<'r> {
    pub fn new(rules: &'r CompiledRules) -> Self {
        Self { rules }
    }

    /// Decide one entry. Only facts for active predicates are computed.
    pub fn classify<E: Element>(&self, entry: &E, settings: &FilterSettings) -> Verdict {
        let active = settings.active();
        let mut verdict = Verdict::visible(ProductFacts::default());

        if active.contains(Predicates::SPONSORED) {
            verdict.facts.sponsored = self.sponsored_signal(entry);
            if verdict.facts.sponsored.is_some() {
                verdict.hidden_by |= Predicates::SPONSORED;
            }
        }

        if active.contains(Predicates::MIN_RATING) {
            verdict.facts.rating = self.rating(entry);
            // No rating at all does not meet the bar
            let below = verdict
                .facts
                .rating
                .map_or(true, |rating| rating < settings.min_rating);
            if below {
                verdict.hidden_by |= Predicates::MIN_RATING;
            }
        }

        if active.contains(Predicates::MIN_REVIEWS) {
            verdict.facts.reviews = self.review_count(entry);
            let below = verdict
                .facts
                .reviews
                .map_or(true, |reviews| reviews < settings.min_reviews);
            if below {
                verdict.hidden_by |= Predicates::MIN_REVIEWS;
            }
        }

        verdict
    }

    /// First sponsored signal found, checked cheapest-first.
    pub fn sponsored_signal<E: Element>(&self, entry: &E) -> Option<SponsoredSignal> {
        let rules = self.rules.sponsored();
        let keyword = rules.keyword.to_ascii_lowercase();
        let mentions = |value: &str| value.to_ascii_lowercase().contains(&keyword);

        if rules.ad_markers.iter().any(|marker| entry.matches(marker)) {
            return Some(SponsoredSignal::AdMarker);
        }

        if entry
            .attr(&rules.component_type_attr)
            .is_some_and(|value| mentions(&value))
        {
            return Some(SponsoredSignal::ComponentType);
        }

        if self.rules.sponsored_text().is_match(&entry.text()) {
            return Some(SponsoredSignal::VisibleText);
        }

        let logger = &rules.impression_logger;
        if entry
            .select(&logger.selector)
            .iter()
            .any(|el| el.attr(&logger.props_attr).is_some_and(|props| mentions(&props)))
        {
            return Some(SponsoredSignal::ImpressionLogger);
        }

        if rules.label_selectors.iter().any(|sel| entry.contains_match(sel)) {
            return Some(SponsoredSignal::Label);
        }

        let aria_hit = entry.attr("aria-label").is_some_and(|label| mentions(&label))
            || entry
                .select("[aria-label]")
                .iter()
                .any(|el| el.attr("aria-label").is_some_and(|label| mentions(&label)));
        if aria_hit {
            return Some(SponsoredSignal::AriaLabel);
        }

        let tracked = entry.select("a[href]").iter().any(|link| {
            link.attr("href").is_some_and(|href| {
                rules.tracking_markers.iter().any(|marker| href.contains(marker.as_str()))
            })
        });
        if tracked {
            return Some(SponsoredSignal::TrackingLink);
        }

        None
    }

    /// Star rating, if any rating rule yields one within range.
    pub fn rating<E: Element>(&self, entry: &E) -> Option<f32> {
        let max = f64::from(self.rules.max_rating());
        extract(
            entry,
            self.rules.rating_rules(),
            self.rules.rating_patterns(),
            |value| (0.0..=max).contains(&value),
        )
        .map(|value| value as f32)
    }

    /// Review count, if any review rule yields one.
    pub fn review_count<E: Element>(&self, entry: &E) -> Option<u64> {
        extract(
            entry,
            self.rules.review_rules(),
            self.rules.review_patterns(),
            |value| value >= 0.0,
        )
        .map(|value| value as u64)
    }
}

/// Walk rules, then matched sub-elements, then sources; the first accepted
/// value wins.
fn extract<E: Element>(
    entry: &E,
    rules: &[ExtractionRule],
    patterns: &[CompiledPattern],
    accept: impl Fn(f64) -> bool,
) -> Option<f64> {
    for rule in rules {
        for element in entry.select(&rule.selector) {
            for source in &rule.sources {
                let text = match source {
                    TextSource::Text => Some(element.text()),
                    TextSource::AriaLabel => element.attr("aria-label"),
                };
                let value = text
                    .and_then(|text| first_value(patterns, &text))
                    .filter(|value| accept(*value));
                if value.is_some() {
                    return value;
                }
            }
        }
    }
    None
}
