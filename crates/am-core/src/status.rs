//! Status overlay model

use crate::types::FilterSettings;

pub const STATUS_ID: &str = "am-filter-status";

/// Lines shown in the fixed overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusOverlay {
    pub title: &'static str,
    pub lines: Vec<String>,
}

impl StatusOverlay {
    /// None when no predicate is active; the overlay is hidden then.
    pub fn for_settings(settings: &FilterSettings) -> Option<Self> {
        let active = settings.active();
        if active.is_empty() {
            return None;
        }

        let mut lines = Vec::new();
        if settings.hide_sponsored {
            lines.push("Hiding sponsored".to_string());
        }
        if settings.min_rating > 0.0 {
            lines.push(format!("Min rating: {:.1}\u{2605}", settings.min_rating));
        }
        if settings.min_reviews > 0 {
            lines.push(format!("Min reviews: {}", group_thousands(settings.min_reviews)));
        }

        Some(Self {
            title: "Filters active",
            lines,
        })
    }
}

/// `12345` -> `12,345`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
