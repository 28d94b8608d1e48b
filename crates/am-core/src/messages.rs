//! Inbound notifications from the settings UI
//!
//! Messages are alternate entry points into the replacer; handling one only
//! updates stores and tells the caller what to schedule.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Timings;
use crate::prefs::Stores;
use crate::route::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Message {
    /// Re-run the replacer
    #[serde(rename = "apply", alias = "applyMinimalist")]
    Apply,
    /// Enable or disable the replacer. A missing flag means disable.
    #[serde(rename = "toggle", alias = "toggleMinimalist")]
    Toggle {
        #[serde(default)]
        enabled: bool,
    },
}

/// Follow-up the caller must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageEffect {
    /// Run the replacer pipeline after this delay
    Reapply(Duration),
    /// Remove the suppression stylesheet now
    LiftSuppression,
    None,
}

impl Message {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn handle(&self, route: Route, stores: &mut Stores<'_>, timings: &Timings) -> MessageEffect {
        match *self {
            Self::Apply if route == Route::Home => MessageEffect::Reapply(timings.reapply_delay()),
            Self::Apply => MessageEffect::LiftSuppression,
            Self::Toggle { enabled } => {
                log::debug!("toggle received: {}", if enabled { "enabled" } else { "disabled" });
                stores.set_disabled(!enabled);
                if enabled && route == Route::Home {
                    MessageEffect::Reapply(timings.reapply_delay())
                } else {
                    MessageEffect::None
                }
            }
        }
    }
}
