//! HTML-backed DOM
//!
//! Runs the engine over a saved page: `scraper` parses the markup and
//! [`RecordingTarget`] stands in for the browser's style mutations.

use scraper::{ElementRef, Html, Selector};

use crate::dom::{Document, Element, VisibilityTarget};

/// A parsed HTML document.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }
}

impl<'a> Document for &'a HtmlDocument {
    type Element = HtmlElement<'a>;

    fn query_all(&self, selector: &str) -> Vec<HtmlElement<'a>> {
        let doc: &'a HtmlDocument = *self;
        match Selector::parse(selector) {
            Ok(selector) => doc.html.select(&selector).map(HtmlElement::new).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Element handle borrowed from an [`HtmlDocument`].
#[derive(Debug, Clone, Copy)]
pub struct HtmlElement<'a> {
    inner: ElementRef<'a>,
}

impl<'a> HtmlElement<'a> {
    fn new(inner: ElementRef<'a>) -> Self {
        Self { inner }
    }

    pub fn tag_name(&self) -> &'a str {
        self.inner.value().name()
    }
}

impl<'a> Element for HtmlElement<'a> {
    fn attr(&self, name: &str) -> Option<String> {
        self.inner.value().attr(name).map(str::to_string)
    }

    fn text(&self) -> String {
        self.inner.text().collect()
    }

    fn matches(&self, selector: &str) -> bool {
        Selector::parse(selector)
            .map(|selector| selector.matches(&self.inner))
            .unwrap_or(false)
    }

    fn select(&self, selector: &str) -> Vec<Self> {
        match Selector::parse(selector) {
            Ok(selector) => self.inner.select(&selector).map(HtmlElement::new).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn closest(&self, selector: &str) -> Option<Self> {
        let selector = Selector::parse(selector).ok()?;
        std::iter::once(self.inner)
            .chain(self.inner.ancestors().filter_map(ElementRef::wrap))
            .find(|el| selector.matches(el))
            .map(HtmlElement::new)
    }

    fn is_same(&self, other: &Self) -> bool {
        self.inner.id() == other.inner.id()
    }
}

// =============================================================================
// Recording Target
// =============================================================================

/// Visibility target that records hidden elements instead of styling them.
#[derive(Debug, Default)]
pub struct RecordingTarget<'a> {
    hidden: Vec<HtmlElement<'a>>,
    forced: usize,
}

impl<'a> RecordingTarget<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hidden(&self) -> &[HtmlElement<'a>] {
        &self.hidden
    }

    pub fn is_hidden(&self, element: &HtmlElement<'a>) -> bool {
        self.hidden.iter().any(|h| h.is_same(element))
    }

    /// How many times visibility was forced on (pagination).
    pub fn forced_count(&self) -> usize {
        self.forced
    }
}

impl<'a> VisibilityTarget<HtmlElement<'a>> for RecordingTarget<'a> {
    fn is_filtered(&self, element: &HtmlElement<'a>) -> bool {
        self.is_hidden(element)
    }

    fn hide(&mut self, element: &HtmlElement<'a>) {
        if !self.is_hidden(element) {
            self.hidden.push(*element);
        }
    }

    fn reveal(&mut self, element: &HtmlElement<'a>) {
        self.hidden.retain(|h| !h.is_same(element));
    }

    fn force_visible(&mut self, element: &HtmlElement<'a>) {
        self.forced += 1;
        self.reveal(element);
    }

    // Parsed markup is never mutated, so the marker lives here
    fn filtered_in<D: Document<Element = HtmlElement<'a>>>(&self, _doc: &D) -> Vec<HtmlElement<'a>> {
        self.hidden.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div id="outer" class="wrap a-section">
            <span class="label" aria-label="Hello">Hi <b>there</b></span>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_query_and_attrs() {
        let doc = HtmlDocument::parse(PAGE);
        let outer = (&doc).query_first("#outer").unwrap();
        assert!(outer.has_class("wrap"));
        assert!(!outer.has_class("wra"));
        let label = outer.select_first(".label").unwrap();
        assert_eq!(label.attr("aria-label").as_deref(), Some("Hello"));
        assert_eq!(label.text(), "Hi there");
        assert_eq!(label.tag_name(), "span");
    }

    #[test]
    fn test_closest_includes_self() {
        let doc = HtmlDocument::parse(PAGE);
        let label = (&doc).query_first("b").unwrap();
        let outer = label.closest(".wrap").unwrap();
        assert_eq!(outer.attr("id").as_deref(), Some("outer"));
        assert!(outer.closest("#outer").unwrap().is_same(&outer));
        assert!(label.closest(".missing").is_none());
    }

    #[test]
    fn test_invalid_selector_is_a_miss() {
        let doc = HtmlDocument::parse(PAGE);
        assert!((&doc).query_all("div[").is_empty());
        let outer = (&doc).query_first("#outer").unwrap();
        assert!(!outer.matches("::::"));
    }

    #[test]
    fn test_recording_target_keeps_one_entry() {
        let doc = HtmlDocument::parse(PAGE);
        let outer = (&doc).query_first("#outer").unwrap();
        let mut target = RecordingTarget::new();
        target.hide(&outer);
        target.hide(&outer);
        assert_eq!(target.hidden().len(), 1);
        target.reveal(&outer);
        assert!(!target.is_filtered(&outer));
    }
}
