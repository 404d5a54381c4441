//! Task complexity estimation
//!
//! Buckets a request into one of five tiers from its text and the depth of
//! the conversation. Keyword groups are tested from the most severe tier
//! down; length and depth heuristics apply when nothing matches.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::RouterError;
use crate::orchestrator::catalog::QualityTier;

/// Estimated task difficulty, ordered from easiest to hardest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Trivial,
    Simple,
    Moderate,
    Complex,
    Expert,
}

impl ComplexityTier {
    /// Pattern evaluation order
    pub const BY_SEVERITY: [ComplexityTier; 5] = [
        ComplexityTier::Expert,
        ComplexityTier::Complex,
        ComplexityTier::Moderate,
        ComplexityTier::Simple,
        ComplexityTier::Trivial,
    ];

    /// Quality tiers a model needs to be considered for this complexity
    pub fn accepted_qualities(&self) -> &'static [QualityTier] {
        match self {
            ComplexityTier::Trivial => &[QualityTier::Basic, QualityTier::Good],
            ComplexityTier::Simple | ComplexityTier::Moderate => {
                &[QualityTier::Good, QualityTier::Excellent]
            }
            ComplexityTier::Complex | ComplexityTier::Expert => {
                &[QualityTier::Excellent, QualityTier::Frontier]
            }
        }
    }

    /// Router confidence for an automatic decision at this tier
    pub fn confidence(&self) -> f64 {
        match self {
            ComplexityTier::Trivial => 0.95,
            ComplexityTier::Expert => 0.7,
            _ => 0.85,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityTier::Trivial => "trivial",
            ComplexityTier::Simple => "simple",
            ComplexityTier::Moderate => "moderate",
            ComplexityTier::Complex => "complex",
            ComplexityTier::Expert => "expert",
        }
    }

    /// Parse a tier name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "trivial" => Some(ComplexityTier::Trivial),
            "simple" => Some(ComplexityTier::Simple),
            "moderate" => Some(ComplexityTier::Moderate),
            "complex" => Some(ComplexityTier::Complex),
            "expert" => Some(ComplexityTier::Expert),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const TRIVIAL_PATTERNS: &[&str] = &[
    // ASCII word boundary; a non-ASCII letter does not extend the greeting
    r"^(hi|hallo|hey|danke|ok|ja|nein)((?-i:[^A-Za-z0-9_])|$)",
    r"^was ist .{3,20}\??$",
    r"^(uebersetze|translate)",
];

const SIMPLE_PATTERNS: &[&str] = &[
    "zusammenfass",
    "erklaer",
    "schreib.*kurz",
    "liste.*auf",
    "was bedeutet",
    "formatier",
];

const MODERATE_PATTERNS: &[&str] = &[
    "schreib.*artikel",
    "erstell.*email",
    "marketing.*text",
    "blog.*post",
    "analysier",
    "vergleich",
];

const COMPLEX_PATTERNS: &[&str] = &[
    "implementier",
    "programmier",
    "code.*schreib",
    "architektur",
    "debug",
    "refactor",
    "strategie.*entwickl",
    "business.*plan",
];

const EXPERT_PATTERNS: &[&str] = &[
    "system.*design",
    "multi.*agent",
    "pipeline.*bau",
    "vollstaendig.*implementier",
    "komplexe.*analyse",
    "security.*audit",
];

fn default_patterns(tier: ComplexityTier) -> &'static [&'static str] {
    match tier {
        ComplexityTier::Trivial => TRIVIAL_PATTERNS,
        ComplexityTier::Simple => SIMPLE_PATTERNS,
        ComplexityTier::Moderate => MODERATE_PATTERNS,
        ComplexityTier::Complex => COMPLEX_PATTERNS,
        ComplexityTier::Expert => EXPERT_PATTERNS,
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, RouterError> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p.as_ref())
                .case_insensitive(true)
                .build()
                .map_err(|source| RouterError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
        })
        .collect()
}

static DEFAULT_SIGNALS: LazyLock<ComplexitySignals> = LazyLock::new(|| {
    ComplexitySignals::from_overrides(&HashMap::new())
        .expect("built-in complexity patterns are valid")
});

/// Keyword groups per tier, held in evaluation order (most severe first)
#[derive(Debug, Clone)]
pub struct ComplexitySignals {
    groups: Vec<(ComplexityTier, Vec<Regex>)>,
}

impl ComplexitySignals {
    /// Built-in German keyword groups
    pub fn builtin() -> Self {
        DEFAULT_SIGNALS.clone()
    }

    /// Start from the built-in groups and replace any tier named in
    /// `overrides` (keys are tier names such as `"expert"`)
    pub fn from_overrides(overrides: &HashMap<String, Vec<String>>) -> Result<Self, RouterError> {
        for key in overrides.keys() {
            if ComplexityTier::from_name(key).is_none() {
                return Err(RouterError::Validation(format!(
                    "unknown complexity tier '{}' in pattern overrides",
                    key
                )));
            }
        }

        let mut groups = Vec::with_capacity(ComplexityTier::BY_SEVERITY.len());
        for tier in ComplexityTier::BY_SEVERITY {
            let custom = overrides
                .iter()
                .find(|(name, _)| ComplexityTier::from_name(name) == Some(tier))
                .map(|(_, patterns)| patterns);
            let regexes = match custom {
                Some(patterns) => compile(patterns)?,
                None => compile(default_patterns(tier))?,
            };
            groups.push((tier, regexes));
        }
        Ok(Self { groups })
    }

    /// First tier, in severity order, with a pattern matching `input`
    pub fn matching_tier(&self, input: &str) -> Option<ComplexityTier> {
        self.groups
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(input)))
            .map(|(tier, _)| *tier)
    }

    /// Estimate the complexity of `input` given `message_count` prior messages
    pub fn classify(&self, input: &str, message_count: usize) -> ComplexityTier {
        let len = input.chars().count();

        if len < 20 {
            return ComplexityTier::Trivial;
        }
        if len < 60 && message_count < 3 {
            return ComplexityTier::Simple;
        }

        if let Some(tier) = self.matching_tier(input) {
            return tier;
        }

        if len > 500 || message_count > 15 {
            ComplexityTier::Complex
        } else if len > 200 || message_count > 8 {
            ComplexityTier::Moderate
        } else if len > 80 {
            ComplexityTier::Simple
        } else {
            ComplexityTier::Trivial
        }
    }
}

impl Default for ComplexitySignals {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Classify with the built-in keyword groups
pub fn classify_complexity(input: &str, message_count: usize) -> ComplexityTier {
    DEFAULT_SIGNALS.classify(input, message_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_boundary_is_ascii() {
        let signals = ComplexitySignals::builtin();
        assert_eq!(signals.matching_tier("halloé, wie geht es dir heute?"), Some(ComplexityTier::Trivial));
        assert_eq!(signals.matching_tier("Hallo"), Some(ComplexityTier::Trivial));
        assert_eq!(signals.matching_tier("Hallo_welt wie geht es dir heute"), None);
        assert_eq!(signals.matching_tier("okay, wie geht es dir heute"), None);
    }

    #[test]
    fn test_short_input_is_trivial() {
        assert_eq!(classify_complexity("Hallo", 0), ComplexityTier::Trivial);
        // Length wins over keywords below 20 chars
        assert_eq!(classify_complexity("debug das", 40), ComplexityTier::Trivial);
    }

    #[test]
    fn test_medium_input_early_conversation_is_simple() {
        let input = "Kannst du mir bei meinem Problem helfen?";
        assert!(input.chars().count() >= 20 && input.chars().count() < 60);
        assert_eq!(classify_complexity(input, 0), ComplexityTier::Simple);
        assert_eq!(classify_complexity(input, 2), ComplexityTier::Simple);
    }

    #[test]
    fn test_expert_beats_complex() {
        let input = "Bitte vollstaendig implementieren: ein verteiltes System mit Queue";
        assert_eq!(classify_complexity(input, 5), ComplexityTier::Expert);
    }

    #[test]
    fn test_complex_pattern() {
        let input = "Implementiere eine REST API mit Authentifizierung und Rate Limiting in TypeScript";
        assert_eq!(classify_complexity(input, 2), ComplexityTier::Complex);
    }

    #[test]
    fn test_patterns_are_case_insensitive() {
        let input = "Wir brauchen ein SECURITY AUDIT fuer unsere gesamte Infrastruktur bitte";
        assert_eq!(classify_complexity(input, 0), ComplexityTier::Expert);
    }

    #[test]
    fn test_moderate_and_simple_patterns() {
        let moderate = "Vergleiche bitte die beiden Angebote der Lieferanten fuer unser Buero";
        assert_eq!(classify_complexity(moderate, 3), ComplexityTier::Moderate);
        let simple = "Kannst du mir bitte die wichtigsten Punkte dieses Textes zusammenfassen";
        assert_eq!(classify_complexity(simple, 3), ComplexityTier::Simple);
    }

    #[test]
    fn test_trivial_pattern_anchored_at_start() {
        let input = "Danke, das hat mir sehr geholfen, ich melde mich spaeter wieder bei dir";
        assert_eq!(classify_complexity(input, 4), ComplexityTier::Trivial);
    }

    #[test]
    fn test_length_and_depth_fallback() {
        let filler = "lorem ipsum dolor sit amet ";
        let long = filler.repeat(20);
        assert!(long.chars().count() > 500);
        assert_eq!(classify_complexity(&long, 0), ComplexityTier::Complex);

        let medium = filler.repeat(9);
        assert!(medium.chars().count() > 200);
        assert_eq!(classify_complexity(&medium, 0), ComplexityTier::Moderate);

        let short = filler.repeat(4);
        assert!(short.chars().count() > 80);
        assert_eq!(classify_complexity(&short, 0), ComplexityTier::Simple);
        assert_eq!(classify_complexity(&short, 9), ComplexityTier::Moderate);
        assert_eq!(classify_complexity(&short, 16), ComplexityTier::Complex);
    }

    #[test]
    fn test_overrides_replace_one_tier() {
        let mut overrides = HashMap::new();
        overrides.insert("expert".to_string(), vec!["quantenphysik".to_string()]);
        let signals = ComplexitySignals::from_overrides(&overrides).unwrap();

        let input = "Erklaere mir bitte die Grundlagen der Quantenphysik ausfuehrlich";
        assert_eq!(signals.classify(input, 3), ComplexityTier::Expert);
        // Built-in expert patterns are gone
        assert_eq!(signals.matching_tier("system design"), None);
        // Other tiers keep their defaults
        assert_eq!(signals.matching_tier("bitte refactor"), Some(ComplexityTier::Complex));
    }

    #[test]
    fn test_overrides_reject_bad_input() {
        let mut unknown = HashMap::new();
        unknown.insert("legendary".to_string(), vec!["x".to_string()]);
        assert!(matches!(
            ComplexitySignals::from_overrides(&unknown),
            Err(RouterError::Validation(_))
        ));

        let mut invalid = HashMap::new();
        invalid.insert("simple".to_string(), vec!["(unclosed".to_string()]);
        assert!(matches!(
            ComplexitySignals::from_overrides(&invalid),
            Err(RouterError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ComplexityTier::Trivial < ComplexityTier::Simple);
        assert!(ComplexityTier::Complex < ComplexityTier::Expert);
        assert_eq!(ComplexityTier::from_name("MODERATE"), Some(ComplexityTier::Moderate));
    }
}
