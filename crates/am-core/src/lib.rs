//! Amazon Minimalist Core Library
//!
//! Browser-independent logic for the Amazon Minimalist content script: the
//! homepage replacer and the search result filter engine.
//!
//! # Architecture
//!
//! Nothing here touches a browser. The DOM is reached through the traits in
//! [`dom`], storage through [`prefs::KeyValueStore`], and the homepage
//! through [`homepage::HomePage`]. `am-wasm` implements those seams over
//! `web_sys`; the `html` feature implements the DOM seam over parsed HTML for
//! offline runs and tests.
//!
//! # Modules
//!
//! - `route`: Home / SearchResults / Other classification
//! - `config`: Marketplace, timing and rule configuration
//! - `rules`: Data-driven selector and pattern table
//! - `dom`: Element, Document and visibility seams
//! - `classify`: Per-entry sponsored / rating / review heuristics
//! - `engine`: Discovery, classification and visibility reconciliation
//! - `prefs`: Preference record over two mirrored stores
//! - `homepage`: Replacer state machine
//! - `messages`: Notification channel handling
//! - `panel` / `status`: Control panel and overlay models
//! - `schedule`: Debounce and poll bookkeeping
//! - `types`: Shared type definitions

pub mod classify;
pub mod config;
pub mod dom;
pub mod engine;
pub mod homepage;
#[cfg(any(test, feature = "html"))]
pub mod html;
pub mod messages;
pub mod panel;
pub mod prefs;
pub mod route;
pub mod rules;
pub mod schedule;
pub mod status;
pub mod types;

// Re-export commonly used types
pub use classify::Classifier;
pub use config::{ConfigError, EngineConfig, Marketplace, Timings};
pub use engine::{FilterEngine, FilterPlan};
pub use homepage::{BuildOutcome, HomePage, HomepageReplacer, ReplacerState};
pub use messages::{Message, MessageEffect};
pub use prefs::{KeyValueStore, MemoryStore, Preferences, Stores, Theme};
pub use route::{Location, Route, RouteWatcher};
pub use rules::{CompiledRules, RuleError, RuleTable};
pub use types::{FilterSettings, Predicates, ProductFacts, RunReport, SponsoredSignal, Verdict};
