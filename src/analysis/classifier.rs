//! Keyword-driven commit complexity classification.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::types::ComplexityTier;

/// Built-in keyword lists.
pub static DEFAULT_KEYWORDS: Lazy<KeywordTable> = Lazy::new(|| KeywordTable {
    high: words(&[
        "refactor",
        "architecture",
        "implement",
        "integrat",
        "system",
        "pipeline",
        "migration",
    ]),
    medium: words(&["feat", "feature", "enhance", "improve", "add", "update"]),
    low: words(&["fix", "bug", "typo", "cleanup", "doc", "chore"]),
});

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

/// Substring keywords for each tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTable {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl KeywordTable {
    pub fn keywords(&self, tier: ComplexityTier) -> &[String] {
        match tier {
            ComplexityTier::High => &self.high,
            ComplexityTier::Medium => &self.medium,
            ComplexityTier::Low => &self.low,
        }
    }

    /// Append keywords to one tier
    pub fn extend<I, S>(&mut self, tier: ComplexityTier, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = match tier {
            ComplexityTier::High => &mut self.high,
            ComplexityTier::Medium => &mut self.medium,
            ComplexityTier::Low => &mut self.low,
        };
        list.extend(keywords.into_iter().map(Into::into));
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        DEFAULT_KEYWORDS.clone()
    }
}

/// Maps commit messages to a [`ComplexityTier`].
///
/// Tiers are tried in priority order (high, medium, low); the first tier with
/// a keyword contained in the lowercased message wins. Messages matching
/// nothing are low complexity.
#[derive(Debug, Clone)]
pub struct ComplexityClassifier {
    tiers: Vec<(ComplexityTier, Vec<String>)>,
}

impl ComplexityClassifier {
    pub fn new(table: &KeywordTable) -> Self {
        let tiers = ComplexityTier::ALL
            .iter()
            .map(|&tier| {
                let keywords = table
                    .keywords(tier)
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (tier, keywords)
            })
            .collect();
        Self { tiers }
    }

    pub fn classify(&self, message: &str) -> ComplexityTier {
        let message = message.to_lowercase();
        self.tiers
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| message.contains(k.as_str())))
            .map(|(tier, _)| *tier)
            .unwrap_or(ComplexityTier::Low)
    }
}

impl Default for ComplexityClassifier {
    fn default() -> Self {
        Self::new(&DEFAULT_KEYWORDS)
    }
}
