use serde::{Deserialize, Serialize};

use crate::catalog::{Criticality, Rule, RuleType};
use crate::config::SelectorConfig;
use crate::selector::tiers::EvaluatorTier;

/// How the selector trades cost against quality when picking a tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    CostOptimized,
    QualityOptimized,
    #[default]
    Balanced,
    SpeedOptimized,
}

impl SelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CostOptimized => "cost_optimized",
            Self::QualityOptimized => "quality_optimized",
            Self::Balanced => "balanced",
            Self::SpeedOptimized => "speed_optimized",
        }
    }
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The selector's answer for one rule: which tier to call and why.
#[derive(Debug, Clone, Serialize)]
pub struct TierRecommendation {
    pub tier: EvaluatorTier,
    pub confidence: f32,
    pub reasoning: String,
    pub estimated_cost: f64,
    pub estimated_secs: f64,
    /// Cheaper tier to retry with when the primary call fails.
    pub fallback: Option<EvaluatorTier>,
    /// Set when a cost ceiling forced a cheaper tier than the strategy chose.
    pub downgraded: bool,
}

impl TierRecommendation {
    pub(crate) fn new(
        tier: EvaluatorTier,
        confidence: f32,
        reasoning: impl Into<String>,
        content_size: usize,
        config: &SelectorConfig,
    ) -> Self {
        let profile = tier.profile();
        Self {
            tier,
            confidence,
            reasoning: reasoning.into(),
            estimated_cost: profile.estimate_cost(
                content_size,
                config.estimated_output_tokens,
                config.chars_per_token,
            ),
            estimated_secs: profile.avg_response_secs,
            fallback: None,
            downgraded: false,
        }
    }

    pub(crate) fn with_fallback(mut self, fallback: EvaluatorTier) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

const CONTENT_KEYWORDS: &[&str] = &[
    "pattern",
    "regex",
    "algorithm",
    "structure",
    "format",
    "validation",
];

const SEMANTIC_KEYWORDS: &[&str] = &[
    "architecture",
    "patterns",
    "design",
    "quality",
    "practices",
    "maintainability",
    "scalability",
    "performance",
    "security",
    "documentation",
    "style",
    "conventions",
    "structure",
];

/// Complexity of a content rule in `[0, 1]`: size, keyword density of the
/// description, and explanation length, weighted 0.4/0.3/0.3.
pub(crate) fn content_complexity(rule: &Rule, content_size: usize, config: &SelectorConfig) -> f32 {
    let size_factor = (content_size as f32 / config.content_size_norm as f32).min(1.0);

    let description = rule.description.to_lowercase();
    let keyword_hits = CONTENT_KEYWORDS
        .iter()
        .filter(|keyword| description.contains(*keyword))
        .count();
    let keyword_factor = keyword_hits as f32 / CONTENT_KEYWORDS.len() as f32;

    let explanation_factor = (rule.explanation.as_deref().unwrap_or("").len() as f32
        / config.explanation_norm as f32)
        .min(1.0);

    0.4 * size_factor + 0.3 * keyword_factor + 0.3 * explanation_factor
}

/// Complexity of a semantic rule in `[0, 1]`: size, semantic keyword
/// matches (saturating at three), and criticality weight, 0.3/0.4/0.3.
pub(crate) fn semantic_complexity(rule: &Rule, content_size: usize, config: &SelectorConfig) -> f32 {
    let size_factor = (content_size as f32 / config.semantic_size_norm as f32).min(1.0);

    let description = rule.description.to_lowercase();
    let matches = SEMANTIC_KEYWORDS
        .iter()
        .filter(|keyword| description.contains(*keyword))
        .count();
    let keyword_factor = (matches as f32 / 3.0).min(1.0);

    0.3 * size_factor + 0.4 * keyword_factor + 0.3 * rule.criticality.complexity_weight()
}

pub(crate) fn recommend_cost_optimized(
    rule: &Rule,
    content_size: usize,
    config: &SelectorConfig,
) -> TierRecommendation {
    match rule.rule_type {
        RuleType::Structural => TierRecommendation::new(
            EvaluatorTier::Programmatic,
            0.95,
            "structural rule resolved programmatically at zero cost",
            content_size,
            config,
        ),
        RuleType::Content => TierRecommendation::new(
            EvaluatorTier::Economy,
            0.85,
            "content rule handled by the economy tier",
            content_size,
            config,
        ),
        RuleType::Semantic => {
            if rule.criticality == Criticality::Low
                && content_size < config.economy_semantic_size_limit
            {
                TierRecommendation::new(
                    EvaluatorTier::Economy,
                    0.70,
                    "low-criticality semantic rule on small content",
                    content_size,
                    config,
                )
            } else {
                TierRecommendation::new(
                    EvaluatorTier::Premium,
                    0.90,
                    "semantic rule requires the premium tier",
                    content_size,
                    config,
                )
            }
        }
    }
}

pub(crate) fn recommend_quality_optimized(
    rule: &Rule,
    content_size: usize,
    config: &SelectorConfig,
) -> TierRecommendation {
    if rule.rule_type == RuleType::Structural {
        return TierRecommendation::new(
            EvaluatorTier::Programmatic,
            0.95,
            "structural rule resolved programmatically",
            content_size,
            config,
        );
    }
    if rule.rule_type == RuleType::Content
        && content_size < config.small_content_limit
        && rule.criticality == Criticality::Low
    {
        TierRecommendation::new(
            EvaluatorTier::Economy,
            0.80,
            "small low-criticality content rule, economy tier is sufficient",
            content_size,
            config,
        )
    } else {
        TierRecommendation::new(
            EvaluatorTier::Premium,
            0.95,
            "quality-optimized selection defaults to the premium tier",
            content_size,
            config,
        )
    }
}

pub(crate) fn recommend_balanced(
    rule: &Rule,
    content_size: usize,
    config: &SelectorConfig,
) -> TierRecommendation {
    match rule.rule_type {
        RuleType::Structural => TierRecommendation::new(
            EvaluatorTier::Programmatic,
            0.95,
            "structural rule resolved programmatically",
            content_size,
            config,
        ),
        RuleType::Content => {
            let complexity = content_complexity(rule, content_size, config);
            if complexity < config.content_complexity_threshold {
                TierRecommendation::new(
                    EvaluatorTier::Economy,
                    0.85,
                    format!("content complexity {:.2} below threshold", complexity),
                    content_size,
                    config,
                )
            } else {
                TierRecommendation::new(
                    EvaluatorTier::Premium,
                    0.90,
                    format!("content complexity {:.2} warrants the premium tier", complexity),
                    content_size,
                    config,
                )
            }
        }
        RuleType::Semantic => {
            let complexity = semantic_complexity(rule, content_size, config);
            if rule.criticality == Criticality::High
                || complexity > config.semantic_premium_threshold
            {
                TierRecommendation::new(
                    EvaluatorTier::Premium,
                    0.90,
                    format!(
                        "{} criticality, semantic complexity {:.2}",
                        rule.criticality, complexity
                    ),
                    content_size,
                    config,
                )
            } else if rule.criticality == Criticality::Medium
                && complexity > config.semantic_medium_threshold
            {
                TierRecommendation::new(
                    EvaluatorTier::Premium,
                    0.85,
                    format!(
                        "medium criticality with semantic complexity {:.2}",
                        complexity
                    ),
                    content_size,
                    config,
                )
                .with_fallback(EvaluatorTier::Economy)
            } else {
                TierRecommendation::new(
                    EvaluatorTier::Economy,
                    0.75,
                    format!("semantic complexity {:.2} fits the economy tier", complexity),
                    content_size,
                    config,
                )
            }
        }
    }
}

pub(crate) fn recommend_speed_optimized(
    rule: &Rule,
    content_size: usize,
    config: &SelectorConfig,
) -> TierRecommendation {
    if rule.rule_type == RuleType::Structural {
        return TierRecommendation::new(
            EvaluatorTier::Programmatic,
            0.95,
            "structural rule resolved programmatically",
            content_size,
            config,
        );
    }
    if rule.rule_type == RuleType::Semantic && rule.criticality == Criticality::High {
        let complexity = semantic_complexity(rule, content_size, config);
        if complexity > config.speed_premium_threshold {
            return TierRecommendation::new(
                EvaluatorTier::Premium,
                0.85,
                format!(
                    "high-criticality semantic rule too complex ({:.2}) for the fast tier",
                    complexity
                ),
                content_size,
                config,
            );
        }
    }
    TierRecommendation::new(
        EvaluatorTier::Economy,
        0.80,
        "speed-optimized selection prefers the fastest paid tier",
        content_size,
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(rule_type: RuleType, criticality: Criticality, description: &str) -> Rule {
        Rule {
            id: "R1".to_string(),
            description: description.to_string(),
            rule_type,
            criticality,
            references: Vec::new(),
            explanation: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_cost_optimized_structural_is_programmatic() {
        let rule = rule(RuleType::Structural, Criticality::High, "README exists");
        let rec = recommend_cost_optimized(&rule, 10_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Programmatic);
        assert_eq!(rec.estimated_cost, 0.0);
    }

    #[test]
    fn test_cost_optimized_small_low_semantic_uses_economy() {
        let rule = rule(RuleType::Semantic, Criticality::Low, "style applied");
        let rec = recommend_cost_optimized(&rule, 10_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Economy);

        let rec = recommend_cost_optimized(&rule, 90_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Premium);
    }

    #[test]
    fn test_balanced_high_criticality_semantic_goes_premium() {
        let rule = rule(RuleType::Semantic, Criticality::High, "architecture sound");
        let rec = recommend_balanced(&rule, 1_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Premium);
    }

    #[test]
    fn test_balanced_medium_semantic_carries_fallback() {
        // Medium criticality, enough keyword matches to clear 0.4.
        let rule = rule(
            RuleType::Semantic,
            Criticality::Medium,
            "design patterns and architecture quality",
        );
        let rec = recommend_balanced(&rule, 1_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Premium);
        assert_eq!(rec.fallback, Some(EvaluatorTier::Economy));
    }

    #[test]
    fn test_balanced_simple_content_uses_economy() {
        let rule = rule(RuleType::Content, Criticality::Low, "changelog entries dated");
        let rec = recommend_balanced(&rule, 1_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Economy);
    }

    #[test]
    fn test_quality_optimized_defaults_premium() {
        let rule = rule(RuleType::Semantic, Criticality::Medium, "anything");
        let rec = recommend_quality_optimized(&rule, 50_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Premium);

        let small = rule_small_content();
        let rec = recommend_quality_optimized(&small, 1_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Economy);
    }

    fn rule_small_content() -> Rule {
        rule(RuleType::Content, Criticality::Low, "notes exist")
    }

    #[test]
    fn test_quality_optimized_structural_is_programmatic() {
        let rule = rule(RuleType::Structural, Criticality::High, "README exists");
        let rec = recommend_quality_optimized(&rule, 10_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Programmatic);
    }

    #[test]
    fn test_speed_optimized_structural_is_programmatic() {
        let rule = rule(RuleType::Structural, Criticality::High, "README exists");
        let rec = recommend_speed_optimized(&rule, 10_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Programmatic);
    }

    #[test]
    fn test_speed_optimized_prefers_economy() {
        let rule = rule(RuleType::Content, Criticality::High, "format check");
        let rec = recommend_speed_optimized(&rule, 100_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Economy);
    }

    #[test]
    fn test_speed_optimized_escalates_complex_critical_semantic() {
        let rule = rule(
            RuleType::Semantic,
            Criticality::High,
            "architecture design quality practices security performance",
        );
        let rec = recommend_speed_optimized(&rule, 200_000, &SelectorConfig::default());
        assert_eq!(rec.tier, EvaluatorTier::Premium);
    }

    #[test]
    fn test_complexity_bounded() {
        let rule = rule(
            RuleType::Semantic,
            Criticality::High,
            "architecture patterns design quality practices maintainability",
        );
        let complexity = semantic_complexity(&rule, 10_000_000, &SelectorConfig::default());
        assert!(complexity <= 1.0);
    }
}
