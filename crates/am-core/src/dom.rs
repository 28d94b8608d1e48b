//! DOM seams
//!
//! The engine never touches a browser directly. It reads through
//! [`Element`]/[`Document`] and writes visibility through
//! [`VisibilityTarget`]; `am-wasm` implements these over `web_sys`, and
//! [`crate::html`] implements the read side over parsed HTML.
//!
//! Query failures (bad selector, detached node) are reported as "nothing
//! found", never as errors.

/// Marker attribute carried by every entry the engine has hidden.
pub const FILTERED_ATTR: &str = "data-am-filtered";

/// Read-only handle to one element.
pub trait Element: Clone {
    /// Attribute value, if present.
    fn attr(&self, name: &str) -> Option<String>;

    /// Concatenated rendered text of the subtree.
    fn text(&self) -> String;

    /// Does this element match `selector`?
    fn matches(&self, selector: &str) -> bool;

    /// Descendants matching `selector`, in document order.
    fn select(&self, selector: &str) -> Vec<Self>;

    /// This element or its nearest ancestor matching `selector`.
    fn closest(&self, selector: &str) -> Option<Self>;

    /// Node identity.
    fn is_same(&self, other: &Self) -> bool;

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|value| value.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn select_first(&self, selector: &str) -> Option<Self> {
        self.select(selector).into_iter().next()
    }

    fn contains_match(&self, selector: &str) -> bool {
        self.select_first(selector).is_some()
    }
}

/// A queryable page.
pub trait Document {
    type Element: Element;

    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<Self::Element>;

    fn query_first(&self, selector: &str) -> Option<Self::Element> {
        self.query_all(selector).into_iter().next()
    }
}

/// Write side of product visibility.
///
/// Implementations keep the filtered marker and the hiding style together:
/// `hide` sets both, `reveal` clears both. `is_filtered` reports the marker.
pub trait VisibilityTarget<E> {
    fn is_filtered(&self, element: &E) -> bool;

    fn hide(&mut self, element: &E);

    fn reveal(&mut self, element: &E);

    /// Clear any display suppression regardless of the marker.
    fn force_visible(&mut self, element: &E) {
        self.reveal(element);
    }

    /// Every node currently carrying the marker, discovered or not.
    fn filtered_in<D: Document<Element = E>>(&self, doc: &D) -> Vec<E> {
        doc.query_all(&format!("[{FILTERED_ATTR}]"))
    }
}
