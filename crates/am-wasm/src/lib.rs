//! WebAssembly content script for Amazon Minimalist
//!
//! Loaded at document start on every marketplace page. Home pages get the
//! replacer, search result pages get the filter engine, and every page
//! listens for settings notifications. The route is re-checked on every
//! in-page navigation.

use std::sync::OnceLock;

use am_core::{EngineConfig, FilterEngine, Location, Route};
use wasm_bindgen::prelude::*;

mod dom;
mod homepage;
mod logger;
mod messages;
mod navigation;
mod search;
mod storage;
mod timers;

static CONFIG: OnceLock<EngineConfig> = OnceLock::new();
static ENGINE: OnceLock<Option<FilterEngine>> = OnceLock::new();

pub(crate) fn config() -> &'static EngineConfig {
    CONFIG.get_or_init(EngineConfig::default)
}

/// Compiled rule table; None if the table failed to compile.
pub(crate) fn engine() -> Option<&'static FilterEngine> {
    ENGINE
        .get_or_init(|| match config().compile_rules() {
            Ok(rules) => Some(FilterEngine::new(rules)),
            Err(e) => {
                log::error!("rule table rejected: {}", e);
                None
            }
        })
        .as_ref()
}

pub(crate) fn current_route() -> Route {
    let Some(location) = web_sys::window().map(|w| w.location()) else {
        return Route::Other;
    };
    let host = location.hostname().unwrap_or_default();
    let path = location.pathname().unwrap_or_default();
    Location::new(&host, &path).route(&config().marketplace)
}

pub(crate) fn system_prefers_dark() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-color-scheme: dark)").ok().flatten())
        .map(|query| query.matches())
        .unwrap_or(false)
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logger::init();

    navigation::watch();
    messages::listen();
}

/// Route name for a URL, as the content script would classify it.
#[wasm_bindgen]
pub fn classify_url(url: &str) -> String {
    Location::parse(url)
        .map(|loc| loc.route(&config().marketplace))
        .unwrap_or(Route::Other)
        .as_str()
        .to_string()
}

/// Run one filter pass now and return its report.
#[wasm_bindgen]
pub fn rerun_filters() -> Result<JsValue, JsValue> {
    let report = search::run_pass().ok_or_else(|| JsValue::from_str("Filter engine unavailable"))?;
    serde_wasm_bindgen::to_value(&report).map_err(|e| JsValue::from_str(&format!("Failed to encode report: {}", e)))
}

/// The active configuration as JSON.
#[wasm_bindgen]
pub fn get_config_json() -> Result<String, JsValue> {
    config()
        .to_json_pretty()
        .map_err(|e| JsValue::from_str(&format!("Failed to encode config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_url() {
        assert_eq!(classify_url("https://www.amazon.co.uk/"), "home");
        assert_eq!(classify_url("https://amazon.co.uk/s?k=kettle"), "search-results");
        assert_eq!(classify_url("https://www.example.com/"), "other");
        assert_eq!(classify_url("not a url"), "other");
    }

    #[test]
    fn test_default_engine_compiles() {
        assert!(engine().is_some());
    }
}
