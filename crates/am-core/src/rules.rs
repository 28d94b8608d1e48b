//! Data-driven rule table
//!
//! Selectors and value patterns used by discovery and classification. The
//! table is plain data (serde) so new marketplace markup can be handled by
//! editing JSON; `compile` turns it into regexes once per page.
//!
//! Order is significant everywhere: rules and patterns are evaluated in the
//! order they are declared and the first hit wins.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Error type for rule compilation.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Pattern '{pattern}' needs {needed} capture group(s) for {converter:?}")]
    MissingCapture {
        pattern: String,
        converter: Converter,
        needed: usize,
    },
    #[error("Empty selector list: {0}")]
    EmptySelectors(&'static str),
}

// =============================================================================
// Table Types
// =============================================================================

/// Where an extraction rule reads text from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Rendered text content
    Text,
    /// `aria-label` attribute
    AriaLabel,
}

/// A prioritized sub-element lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub selector: String,
    pub sources: Vec<TextSource>,
}

impl ExtractionRule {
    fn new(selector: &str, sources: &[TextSource]) -> Self {
        Self {
            selector: selector.to_string(),
            sources: sources.to_vec(),
        }
    }
}

/// Unit conversion applied to a pattern's captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Converter {
    /// Capture 1 is a decimal, `,` accepted as the separator
    Decimal,
    /// Capture 1 is an integer with optional `,` thousands grouping
    Grouped,
    /// Capture 1 is a decimal, capture 2 a `K`/`M` suffix
    Abbreviated,
}

impl Converter {
    fn captures_needed(self) -> usize {
        match self {
            Self::Decimal | Self::Grouped => 1,
            Self::Abbreviated => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    pub converter: Converter,
}

impl PatternRule {
    fn new(pattern: &str, converter: Converter) -> Self {
        Self {
            pattern: pattern.to_string(),
            converter,
        }
    }
}

/// Sub-element whose component props carry an ad tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpressionLoggerRule {
    pub selector: String,
    pub props_attr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SponsoredRules {
    /// Structural markers matched against the entry itself
    pub ad_markers: Vec<String>,
    pub component_type_attr: String,
    /// Case-insensitive keyword for attribute signals
    pub keyword: String,
    /// Pattern over the entry's rendered text
    pub text_pattern: String,
    pub impression_logger: ImpressionLoggerRule,
    pub label_selectors: Vec<String>,
    /// Substrings of a link destination that mark ad tracking
    pub tracking_markers: Vec<String>,
}

impl Default for SponsoredRules {
    fn default() -> Self {
        Self {
            ad_markers: strings(&[".AdHolder", "[data-component-type='sp-sponsored-result']"]),
            component_type_attr: "data-component-type".to_string(),
            keyword: "sponsored".to_string(),
            text_pattern: r"\bSponsored\b".to_string(),
            impression_logger: ImpressionLoggerRule {
                selector: "[data-component-type='s-impression-logger']".to_string(),
                props_attr: "data-component-props".to_string(),
            },
            label_selectors: strings(&[
                ".puis-sponsored-label-text",
                ".s-sponsored-label-text",
                ".puis-label-popover-default",
                ".s-label-popover-default",
            ]),
            tracking_markers: strings(&["/sspa/click", "sp_csd="]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTable {
    /// Product entry selectors, unioned in this order
    pub product_selectors: Vec<String>,
    /// Pagination controls; never hidden
    pub pagination_selectors: Vec<String>,
    pub sponsored: SponsoredRules,
    pub rating_rules: Vec<ExtractionRule>,
    pub rating_patterns: Vec<PatternRule>,
    /// Ratings above this are treated as noise
    pub max_rating: f32,
    pub review_rules: Vec<ExtractionRule>,
    pub review_patterns: Vec<PatternRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        use TextSource::{AriaLabel, Text};

        Self {
            product_selectors: strings(&[
                "[data-component-type='s-search-result']",
                "[data-asin]:not([data-asin=''])",
                ".s-result-item",
                ".AdHolder",
            ]),
            pagination_selectors: strings(&[
                ".s-pagination-container",
                ".s-pagination-strip",
                "[data-component-type='s-pagination']",
            ]),
            sponsored: SponsoredRules::default(),
            rating_rules: vec![
                ExtractionRule::new("i.a-icon-star-small span.a-icon-alt", &[Text]),
                ExtractionRule::new("i.a-icon-star span.a-icon-alt", &[Text]),
                ExtractionRule::new("span.a-icon-alt", &[Text]),
                ExtractionRule::new("[aria-label*='out of 5']", &[AriaLabel]),
                ExtractionRule::new("[aria-label*='star']", &[AriaLabel, Text]),
            ],
            rating_patterns: vec![
                PatternRule::new(r"(?i)\b(\d(?:[.,]\d{1,2})?)\s*out\s+of\s*5\b", Converter::Decimal),
                PatternRule::new(r"(?i)\b(\d(?:[.,]\d{1,2})?)\s*stars?\b", Converter::Decimal),
                PatternRule::new(r"\b(\d(?:[.,]\d{1,2})?)\s*/\s*5\b", Converter::Decimal),
            ],
            max_rating: 5.0,
            review_rules: vec![
                ExtractionRule::new("a[href*='customerReviews'] span", &[Text, AriaLabel]),
                ExtractionRule::new("span.a-size-base.s-underline-text", &[Text]),
                ExtractionRule::new("[aria-label*='rating']", &[AriaLabel]),
                ExtractionRule::new("[aria-label*='review']", &[AriaLabel]),
                ExtractionRule::new("span.a-color-secondary", &[Text]),
            ],
            review_patterns: vec![
                PatternRule::new(
                    r"(?i)\b(\d{1,3}(?:,\d{3})+|\d+)\s*(?:ratings?|reviews?|bought)\b",
                    Converter::Grouped,
                ),
                PatternRule::new(r"\((\d{1,3}(?:,\d{3})+|\d+)\)", Converter::Grouped),
                PatternRule::new(r"(?i)\b(\d+(?:\.\d+)?)\s*([KM])\b", Converter::Abbreviated),
                PatternRule::new(r"^\s*(\d{1,3}(?:,\d{3})+|\d+)\s*$", Converter::Grouped),
            ],
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Compilation
// =============================================================================

/// A pattern ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    converter: Converter,
}

impl CompiledPattern {
    pub fn compile(rule: &PatternRule) -> Result<Self, RuleError> {
        let regex = Regex::new(&rule.pattern).map_err(|source| RuleError::InvalidPattern {
            pattern: rule.pattern.clone(),
            source,
        })?;

        let needed = rule.converter.captures_needed();
        // captures_len counts the implicit whole-match group
        if regex.captures_len() < needed + 1 {
            return Err(RuleError::MissingCapture {
                pattern: rule.pattern.clone(),
                converter: rule.converter,
                needed,
            });
        }

        Ok(Self {
            regex,
            converter: rule.converter,
        })
    }

    /// First match in `text`, converted to a number.
    pub fn extract(&self, text: &str) -> Option<f64> {
        let caps = self.regex.captures(text)?;
        let number = caps.get(1)?.as_str();

        match self.converter {
            Converter::Decimal => number.replace(',', ".").parse().ok(),
            Converter::Grouped => number.replace(',', "").parse::<u64>().ok().map(|n| n as f64),
            Converter::Abbreviated => {
                let base: f64 = number.parse().ok()?;
                let factor = match caps.get(2)?.as_str() {
                    "k" | "K" => 1_000.0,
                    "m" | "M" => 1_000_000.0,
                    _ => return None,
                };
                Some((base * factor).round())
            }
        }
    }
}

/// Try patterns in order; the first that yields a value wins.
pub fn first_value(patterns: &[CompiledPattern], text: &str) -> Option<f64> {
    patterns.iter().find_map(|p| p.extract(text))
}

/// A rule table with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub table: RuleTable,
    product_selector: String,
    pagination_selector: String,
    sponsored_text: Regex,
    rating_patterns: Vec<CompiledPattern>,
    review_patterns: Vec<CompiledPattern>,
}

impl RuleTable {
    pub fn compile(&self) -> Result<CompiledRules, RuleError> {
        if self.product_selectors.is_empty() {
            return Err(RuleError::EmptySelectors("product_selectors"));
        }
        if self.pagination_selectors.is_empty() {
            return Err(RuleError::EmptySelectors("pagination_selectors"));
        }

        let sponsored_text =
            Regex::new(&self.sponsored.text_pattern).map_err(|source| RuleError::InvalidPattern {
                pattern: self.sponsored.text_pattern.clone(),
                source,
            })?;

        let rating_patterns = self
            .rating_patterns
            .iter()
            .map(CompiledPattern::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let review_patterns = self
            .review_patterns
            .iter()
            .map(CompiledPattern::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledRules {
            table: self.clone(),
            product_selector: self.product_selectors.join(", "),
            pagination_selector: self.pagination_selectors.join(", "),
            sponsored_text,
            rating_patterns,
            review_patterns,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, crate::config::ConfigError> {
        let table: Self = serde_json::from_str(text)?;
        table.compile()?;
        Ok(table)
    }
}

impl CompiledRules {
    /// Individual product selectors in priority order.
    pub fn product_selectors(&self) -> &[String] {
        &self.table.product_selectors
    }

    /// All product selectors as one selector list.
    pub fn product_selector(&self) -> &str {
        &self.product_selector
    }

    /// All pagination selectors as one selector list.
    pub fn pagination_selector(&self) -> &str {
        &self.pagination_selector
    }

    pub fn sponsored(&self) -> &SponsoredRules {
        &self.table.sponsored
    }

    pub fn sponsored_text(&self) -> &Regex {
        &self.sponsored_text
    }

    pub fn rating_rules(&self) -> &[ExtractionRule] {
        &self.table.rating_rules
    }

    pub fn rating_patterns(&self) -> &[CompiledPattern] {
        &self.rating_patterns
    }

    pub fn max_rating(&self) -> f32 {
        self.table.max_rating
    }

    pub fn review_rules(&self) -> &[ExtractionRule] {
        &self.table.review_rules
    }

    pub fn review_patterns(&self) -> &[CompiledPattern] {
        &self.review_patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> CompiledRules {
        RuleTable::default().compile().unwrap()
    }

    #[test]
    fn test_default_table_compiles() {
        let rules = rules();
        assert_eq!(rules.product_selectors().len(), 4);
        assert!(rules.pagination_selector().contains(".s-pagination-strip"));
    }

    #[test]
    fn test_rating_patterns() {
        let rules = rules();
        let p = rules.rating_patterns();
        assert_eq!(first_value(p, "4.5 out of 5 stars"), Some(4.5));
        assert_eq!(first_value(p, "4.2 stars"), Some(4.2));
        assert_eq!(first_value(p, "Rated 3/5"), Some(3.0));
        assert_eq!(first_value(p, "4,7 out of 5"), Some(4.7));
        assert_eq!(first_value(p, "no rating here"), None);
    }

    #[test]
    fn test_rating_ignores_grouped_counts() {
        let rules = rules();
        assert_eq!(first_value(rules.rating_patterns(), "1,234 stars"), None);
    }

    #[test]
    fn test_review_patterns() {
        let rules = rules();
        let p = rules.review_patterns();
        assert_eq!(first_value(p, "12.3K"), Some(12_300.0));
        assert_eq!(first_value(p, "1M"), Some(1_000_000.0));
        assert_eq!(first_value(p, "1.2m"), Some(1_200_000.0));
        assert_eq!(first_value(p, "1,234"), Some(1_234.0));
        assert_eq!(first_value(p, "1,234 ratings"), Some(1_234.0));
        assert_eq!(first_value(p, "(87)"), Some(87.0));
        assert_eq!(first_value(p, "(12.3K)"), Some(12_300.0));
        assert_eq!(first_value(p, "1K+ bought in past month"), Some(1_000.0));
        assert_eq!(first_value(p, "Only 3 left"), None);
    }

    #[test]
    fn test_pattern_priority() {
        let rules = rules();
        // Word-suffixed count outranks the parenthesized one
        assert_eq!(first_value(rules.review_patterns(), "(5) 2,000 reviews"), Some(2_000.0));
    }

    #[test]
    fn test_missing_capture() {
        let err = CompiledPattern::compile(&PatternRule::new(r"(\d+)K", Converter::Abbreviated))
            .unwrap_err();
        assert!(matches!(err, RuleError::MissingCapture { needed: 2, .. }));
    }

    #[test]
    fn test_empty_selectors() {
        let table = RuleTable {
            product_selectors: Vec::new(),
            ..RuleTable::default()
        };
        assert!(matches!(table.compile(), Err(RuleError::EmptySelectors("product_selectors"))));
    }

    #[test]
    fn test_from_json_falls_back_to_defaults() {
        let table = RuleTable::from_json(r#"{ "max_rating": 10.0 }"#).unwrap();
        assert_eq!(table.max_rating, 10.0);
        assert_eq!(table.review_patterns, RuleTable::default().review_patterns);
    }
}
