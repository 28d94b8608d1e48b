//! `web_sys` implementations of the core DOM seams

use am_core::dom::{Document, Element, VisibilityTarget, FILTERED_ATTR};
use wasm_bindgen::JsCast;
use web_sys::NodeList;

#[derive(Debug, Clone)]
pub struct WebElement(pub web_sys::Element);

impl Element for WebElement {
    fn attr(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn text(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn matches(&self, selector: &str) -> bool {
        self.0.matches(selector).unwrap_or(false)
    }

    fn select(&self, selector: &str) -> Vec<Self> {
        self.0
            .query_selector_all(selector)
            .map(elements)
            .unwrap_or_default()
    }

    fn closest(&self, selector: &str) -> Option<Self> {
        self.0.closest(selector).ok().flatten().map(WebElement)
    }

    fn is_same(&self, other: &Self) -> bool {
        self.0.is_same_node(Some(other.0.as_ref()))
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }
}

pub struct WebDocument(pub web_sys::Document);

impl WebDocument {
    pub fn current() -> Option<Self> {
        web_sys::window()?.document().map(WebDocument)
    }
}

impl Document for WebDocument {
    type Element = WebElement;

    fn query_all(&self, selector: &str) -> Vec<WebElement> {
        self.0
            .query_selector_all(selector)
            .map(elements)
            .unwrap_or_default()
    }
}

fn elements(list: NodeList) -> Vec<WebElement> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
        .map(WebElement)
        .collect()
}

/// Hides entries with an inline `display: none !important` plus the marker.
pub struct StyleTarget;

impl StyleTarget {
    fn style(element: &WebElement) -> Option<web_sys::CssStyleDeclaration> {
        element
            .0
            .dyn_ref::<web_sys::HtmlElement>()
            .map(|el| el.style())
    }
}

impl VisibilityTarget<WebElement> for StyleTarget {
    fn is_filtered(&self, element: &WebElement) -> bool {
        element.0.has_attribute(FILTERED_ATTR)
    }

    fn hide(&mut self, element: &WebElement) {
        let Some(style) = Self::style(element) else {
            return;
        };
        if style
            .set_property_with_priority("display", "none", "important")
            .is_ok()
        {
            let _ = element.0.set_attribute(FILTERED_ATTR, "true");
        }
    }

    fn reveal(&mut self, element: &WebElement) {
        if let Some(style) = Self::style(element) {
            let _ = style.remove_property("display");
        }
        let _ = element.0.remove_attribute(FILTERED_ATTR);
    }
}
