//! Search result filter engine
//!
//! One pass is two phases:
//!
//! 1. `plan`: discover entries and classify them. Reads the DOM only.
//! 2. `apply`: reconcile every entry's visibility with its verdict, then
//!    force pagination visible.
//!
//! Both phases are idempotent, so overlapping triggers (poll, scroll, panel
//! input) converge on the same state.

use crate::classify::Classifier;
use crate::dom::{Document, Element, VisibilityTarget};
use crate::rules::CompiledRules;
use crate::types::{FilterSettings, Predicates, RunReport, Verdict};

/// Classified entries in discovery order.
#[derive(Debug, Clone)]
pub struct FilterPlan<E> {
    pub active: Predicates,
    pub entries: Vec<(E, Verdict)>,
}

impl<E> FilterPlan<E> {
    pub fn hidden_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.should_hide()).count()
    }
}

pub struct FilterEngine {
    rules: CompiledRules,
}

impl FilterEngine {
    pub fn new(rules: CompiledRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    /// Product entries: every node matching any product selector, in
    /// document order, without pagination.
    pub fn discover<D: Document>(&self, doc: &D) -> Vec<D::Element> {
        let pagination = self.rules.pagination_selector();

        doc.query_all(self.rules.product_selector())
            .into_iter()
            // An entry wrapping pagination would hide it with itself
            .filter(|candidate| {
                candidate.closest(pagination).is_none() && !candidate.contains_match(pagination)
            })
            .collect()
    }

    /// Discover and classify.
    pub fn plan<D: Document>(&self, doc: &D, settings: &FilterSettings) -> FilterPlan<D::Element> {
        let classifier = Classifier::new(&self.rules);
        let entries = self
            .discover(doc)
            .into_iter()
            .map(|entry| {
                let verdict = classifier.classify(&entry, settings);
                (entry, verdict)
            })
            .collect();

        FilterPlan {
            active: settings.active(),
            entries,
        }
    }

    /// Reconcile visibility for every planned entry. Hidden entries are
    /// re-hidden; entries that no longer qualify are revealed only when they
    /// carry the marker, so page-owned styling is left alone.
    pub fn apply<E, T: VisibilityTarget<E>>(&self, plan: &FilterPlan<E>, target: &mut T) -> RunReport {
        let mut report = RunReport {
            discovered: plan.entries.len(),
            ..RunReport::default()
        };

        for (entry, verdict) in &plan.entries {
            if verdict.should_hide() {
                target.hide(entry);
                report.hidden += 1;
            } else if target.is_filtered(entry) {
                target.reveal(entry);
                report.revealed += 1;
            } else {
                report.unchanged += 1;
            }
        }

        report
    }

    /// Reveal marked nodes that this pass no longer hides, including ones
    /// that stopped matching any product selector.
    pub fn sweep_stale<D, T>(&self, doc: &D, plan: &FilterPlan<D::Element>, target: &mut T) -> usize
    where
        D: Document,
        T: VisibilityTarget<D::Element>,
    {
        let mut revealed = 0;
        for marked in target.filtered_in(doc) {
            let kept = plan
                .entries
                .iter()
                .any(|(entry, verdict)| verdict.should_hide() && entry.is_same(&marked));
            if !kept {
                target.reveal(&marked);
                revealed += 1;
            }
        }
        revealed
    }

    /// Pagination is never hidden, whatever happened to the entries.
    pub fn enforce_pagination<D, T>(&self, doc: &D, target: &mut T) -> usize
    where
        D: Document,
        T: VisibilityTarget<D::Element>,
    {
        let controls = doc.query_all(self.rules.pagination_selector());
        for control in &controls {
            target.force_visible(control);
        }
        controls.len()
    }

    /// One full pass.
    pub fn run<D, T>(&self, doc: &D, target: &mut T, settings: &FilterSettings) -> RunReport
    where
        D: Document,
        T: VisibilityTarget<D::Element>,
    {
        let plan = self.plan(doc, settings);
        let mut report = self.apply(&plan, target);
        report.revealed += self.sweep_stale(doc, &plan, target);
        report.pagination = self.enforce_pagination(doc, target);

        log::debug!(
            "filter pass [{}]: {} entries, {} hidden, {} revealed, {} unchanged",
            plan.active.names().join(","),
            report.discovered,
            report.hidden,
            report.revealed,
            report.unchanged
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{HtmlDocument, RecordingTarget};
    use crate::panel::PanelInput;
    use crate::prefs::{MemoryStore, Preferences};
    use crate::rules::RuleTable;
    use crate::types::SponsoredSignal;

    const FIXTURE: &str = include_str!("../testdata/search_results.html");

    fn engine() -> FilterEngine {
        FilterEngine::new(RuleTable::default().compile().unwrap())
    }

    fn ids<E: Element>(elements: &[E]) -> Vec<String> {
        elements.iter().filter_map(|e| e.attr("id")).collect()
    }

    fn settings(hide_sponsored: bool, min_rating: f32, min_reviews: u64) -> FilterSettings {
        FilterSettings {
            enabled: true,
            hide_sponsored,
            min_rating,
            min_reviews,
        }
    }

    #[test]
    fn test_discovery_order_and_exclusions() {
        let doc = HtmlDocument::parse(FIXTURE);
        let entries = engine().discover(&&doc);
        assert_eq!(ids(&entries), vec!["p1", "p2", "p3", "p4"]);
    }

    #[test]
    fn test_hide_sponsored() {
        let doc = HtmlDocument::parse(FIXTURE);
        let engine = engine();
        let plan = engine.plan(&&doc, &settings(true, 0.0, 0));
        assert_eq!(plan.entries[1].1.facts.sponsored, Some(SponsoredSignal::AdMarker));

        let mut target = RecordingTarget::new();
        let report = engine.run(&&doc, &mut target, &settings(true, 0.0, 0));
        assert_eq!(ids(target.hidden()), vec!["p2"]);
        assert_eq!(report.hidden, 1);
    }

    #[test]
    fn test_min_rating_hides_low_and_unknown() {
        let doc = HtmlDocument::parse(FIXTURE);
        let mut target = RecordingTarget::new();
        engine().run(&&doc, &mut target, &settings(false, 4.3, 0));
        assert_eq!(ids(target.hidden()), vec!["p3", "p4"]);
    }

    #[test]
    fn test_min_reviews_hides_low_and_unknown() {
        let doc = HtmlDocument::parse(FIXTURE);
        let mut target = RecordingTarget::new();
        engine().run(&&doc, &mut target, &settings(false, 0.0, 5000));
        assert_eq!(ids(target.hidden()), vec!["p3", "p4"]);
    }

    #[test]
    fn test_relaxing_thresholds_reveals() {
        let doc = HtmlDocument::parse(FIXTURE);
        let engine = engine();
        let mut target = RecordingTarget::new();

        engine.run(&&doc, &mut target, &settings(true, 4.3, 0));
        assert_eq!(ids(target.hidden()), vec!["p2", "p3", "p4"]);

        let report = engine.run(&&doc, &mut target, &settings(false, 4.0, 0));
        assert_eq!(ids(target.hidden()), vec!["p4"]);
        assert_eq!(report.revealed, 2);
    }

    #[test]
    fn test_master_switch_restores_everything() {
        let doc = HtmlDocument::parse(FIXTURE);
        let engine = engine();
        let mut target = RecordingTarget::new();

        engine.run(&&doc, &mut target, &settings(true, 5.0, 100_000));
        assert_eq!(target.hidden().len(), 4);

        let off = FilterSettings {
            enabled: false,
            ..settings(true, 5.0, 100_000)
        };
        let report = engine.run(&&doc, &mut target, &off);
        assert!(target.hidden().is_empty());
        assert_eq!(report.revealed, 4);
        assert_eq!(report.hidden, 0);
    }

    #[test]
    fn test_master_off_reveals_entries_no_longer_discovered() {
        let doc = HtmlDocument::parse(
            r#"<html><body><div id="a" class="legacy-result"><span>Kettle</span></div></body></html>"#,
        );
        let engine = engine();
        let mut target = RecordingTarget::new();

        // Hidden by an earlier pass, then the page re-rendered it unmatched
        let stale = (&doc).query_first("#a").unwrap();
        target.hide(&stale);
        assert!(engine.discover(&&doc).is_empty());

        let off = FilterSettings {
            enabled: false,
            ..settings(false, 4.0, 0)
        };
        let report = engine.run(&&doc, &mut target, &off);
        assert!(!target.is_hidden(&stale));
        assert_eq!(report.revealed, 1);
    }

    #[test]
    fn test_panel_change_reflected_in_next_pass() {
        let doc = HtmlDocument::parse(FIXTURE);
        let engine = engine();
        let mut store = MemoryStore::new();
        let mut target = RecordingTarget::new();

        engine.run(&&doc, &mut target, &Preferences::load(&store, false).filter_settings());
        assert!(target.hidden().is_empty());

        PanelInput::MinReviews("5000".to_string()).apply(&mut store);
        let settings = Preferences::load(&store, false).filter_settings();
        assert_eq!(settings.min_reviews, 5000);
        engine.run(&&doc, &mut target, &settings);
        assert_eq!(ids(target.hidden()), vec!["p3", "p4"]);

        PanelInput::Master(false).apply(&mut store);
        let report = engine.run(&&doc, &mut target, &Preferences::load(&store, false).filter_settings());
        assert!(target.hidden().is_empty());
        assert_eq!(report.revealed, 2);
    }

    #[test]
    fn test_pagination_survives_every_pass() {
        let doc = HtmlDocument::parse(FIXTURE);
        let engine = engine();
        let mut target = RecordingTarget::new();

        let strip = (&doc).query_first(".s-pagination-strip").unwrap();
        target.hide(&strip);

        let report = engine.run(&&doc, &mut target, &settings(true, 5.0, 100_000));
        assert_eq!(report.hidden, 4);
        assert_eq!(report.pagination, 1);
        assert!(!target.is_hidden(&strip));
        assert_eq!(target.forced_count(), 1);
    }

    #[test]
    fn test_repeated_passes_are_stable() {
        let doc = HtmlDocument::parse(FIXTURE);
        let engine = engine();
        let mut target = RecordingTarget::new();
        let s = settings(false, 4.3, 0);

        let first = engine.run(&&doc, &mut target, &s);
        let hidden_after_first = ids(target.hidden());
        let second = engine.run(&&doc, &mut target, &s);

        assert_eq!(ids(target.hidden()), hidden_after_first);
        assert_eq!(first.hidden, second.hidden);
        assert_eq!(second.revealed, 0);
    }

    #[test]
    fn test_unmarked_entries_are_not_touched() {
        let doc = HtmlDocument::parse(FIXTURE);
        let engine = engine();
        let mut target = RecordingTarget::new();
        let report = engine.run(&&doc, &mut target, &FilterSettings::default());
        assert_eq!(
            report,
            RunReport {
                discovered: 4,
                hidden: 0,
                revealed: 0,
                unchanged: 4,
                pagination: 1,
            }
        );
    }
}
