//! Keyword-overlap relevance scoring.
//!
//! Used both to rank files/chunks against a rule and to pick out the
//! documentation sections worth sending to an evaluator. Kept as explicit
//! parameterized functions so the thresholds stay tunable and testable.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::catalog::Rule;

const MAX_KEYWORDS: usize = 10;

/// Generic filler words that carry no signal about what a rule checks.
const STOP_WORDS: &[&str] = &[
    "must", "have", "that", "this", "with", "from", "should", "shall", "will", "when", "then",
    "there", "their", "them", "they", "each", "every", "into", "only", "also", "such", "which",
    "file", "files", "code", "function", "contain", "contains", "include", "includes", "present",
    "repository", "project",
];

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[a-zA-Z]{4,}\b").expect("static regex"))
}

/// Extracts up to ten distinctive keywords from a rule's description and
/// explanation, stop-word filtered, preserving first-seen order.
pub fn extract_rule_keywords(rule: &Rule) -> Vec<String> {
    let text = format!(
        "{} {}",
        rule.description,
        rule.explanation.as_deref().unwrap_or("")
    );

    let mut seen = BTreeSet::new();
    let mut keywords = Vec::new();

    for word in word_pattern().find_iter(&text.to_lowercase()) {
        let word = word.as_str();
        if STOP_WORDS.contains(&word) || !seen.insert(word.to_string()) {
            continue;
        }
        keywords.push(word.to_string());
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }

    keywords
}

/// Fraction of `keywords` found in `content`, clamped to 1.0.
/// An empty keyword set scores a neutral 0.5 so ranking still works.
pub fn relevance_score(content: &str, keywords: &[String]) -> f32 {
    if keywords.is_empty() {
        return 0.5;
    }
    let content_lower = content.to_lowercase();
    let matches = keywords
        .iter()
        .filter(|keyword| content_lower.contains(keyword.as_str()))
        .count();
    (matches as f32 / keywords.len() as f32).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Criticality, RuleType};

    fn rule(description: &str, explanation: Option<&str>) -> Rule {
        Rule {
            id: "R1".to_string(),
            description: description.to_string(),
            rule_type: RuleType::Semantic,
            criticality: Criticality::Medium,
            references: Vec::new(),
            explanation: explanation.map(String::from),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_keywords_filter_stop_words() {
        let rule = rule(
            "Documentation must describe the deployment architecture",
            None,
        );
        let keywords = extract_rule_keywords(&rule);
        assert!(keywords.contains(&"documentation".to_string()));
        assert!(keywords.contains(&"architecture".to_string()));
        assert!(!keywords.contains(&"must".to_string()));
    }

    #[test]
    fn test_keywords_deduplicated_and_capped() {
        let rule = rule(
            "testing testing testing alpha beta gamma delta epsilon zeta eta theta iota kappa",
            None,
        );
        let keywords = extract_rule_keywords(&rule);
        assert_eq!(
            keywords.iter().filter(|k| *k == "testing").count(),
            1
        );
        assert!(keywords.len() <= 10);
    }

    #[test]
    fn test_relevance_score_fraction() {
        let keywords = vec!["deploy".to_string(), "terraform".to_string()];
        assert!((relevance_score("how to deploy with docker", &keywords) - 0.5).abs() < f32::EPSILON);
        assert!((relevance_score("deploy via terraform", &keywords) - 1.0).abs() < f32::EPSILON);
        assert_eq!(relevance_score("nothing related", &keywords), 0.0);
    }

    #[test]
    fn test_empty_keywords_neutral() {
        assert!((relevance_score("anything", &[]) - 0.5).abs() < f32::EPSILON);
    }
}
