//! Browser tests. Run with `wasm-pack test --headless --chrome crates/am-wasm`.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const FIXTURE: &str = include_str!("../../am-core/testdata/search_results.html");
const MIN_REVIEWS_KEY: &str = "amazon-minimalist-min-reviews";

fn document() -> web_sys::Document {
    web_sys::window().and_then(|w| w.document()).unwrap()
}

fn display_of(id: &str) -> String {
    document()
        .get_element_by_id(id)
        .unwrap()
        .dyn_into::<web_sys::HtmlElement>()
        .unwrap()
        .style()
        .get_property_value("display")
        .unwrap()
}

#[wasm_bindgen_test]
fn test_classify_url_in_browser() {
    assert_eq!(am_wasm::classify_url("https://www.amazon.co.uk/ref=nav_logo"), "home");
}

#[wasm_bindgen_test]
fn test_rerun_filters_hides_low_review_entries() {
    let storage = web_sys::window().unwrap().local_storage().unwrap().unwrap();
    storage.set_item(MIN_REVIEWS_KEY, "5000").unwrap();
    document().body().unwrap().set_inner_html(FIXTURE);

    let report = am_wasm::rerun_filters().unwrap();
    let hidden = js_sys::Reflect::get(&report, &"hidden".into()).unwrap();
    assert_eq!(hidden.as_f64(), Some(2.0));

    assert_eq!(display_of("p1"), "");
    assert_eq!(display_of("p3"), "none");
    assert_eq!(display_of("p4"), "none");
    assert_ne!(display_of("pagination-wrap"), "none");
    assert!(document().get_element_by_id("am-filter-status").is_some());

    storage.remove_item(MIN_REVIEWS_KEY).unwrap();
    let report = am_wasm::rerun_filters().unwrap();
    let revealed = js_sys::Reflect::get(&report, &"revealed".into()).unwrap();
    assert_eq!(revealed.as_f64(), Some(2.0));
    assert_eq!(display_of("p3"), "");
}
