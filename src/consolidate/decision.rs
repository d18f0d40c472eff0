use serde::Serialize;
use tracing::info;

use crate::catalog::Criticality;
use crate::config::ConsolidationConfig;
use crate::consolidate::analysis::OutcomeAnalysis;
use crate::consolidate::metrics::{build_recommendations, DecisionMetrics};
use crate::dispatch::{Confidence, ValidationOutcome};
use crate::error::{GateError, Result};
use crate::selector::CostAnalysis;

/// Whether a decision factor blocks approval outright or only lowers
/// confidence in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorImpact {
    Reject,
    Concern,
}

/// One reason contributing to the final pass/fail call, ordered by
/// priority (1 is most severe).
#[derive(Debug, Clone, Serialize)]
pub struct DecisionFactor {
    pub name: &'static str,
    pub value: usize,
    pub impact: FactorImpact,
    pub priority: u8,
    pub reason: String,
}

/// Run-scoped context the dispatcher hands to consolidation.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub system_errors: usize,
    pub execution_time_ms: u64,
    pub cost: Option<CostAnalysis>,
}

/// The engine's final answer for one repository run.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedDecision {
    pub passed: bool,
    pub message: String,
    pub confidence: Confidence,
    pub total_rules: usize,
    pub critical_failures: usize,
    pub medium_failures: usize,
    pub low_failures: usize,
    pub system_errors: usize,
    pub execution_time_ms: u64,
    pub factors: Vec<DecisionFactor>,
    pub metrics: DecisionMetrics,
}

/// Applies the failure-tolerance cascade to a set of outcomes.
pub struct Consolidator {
    config: ConsolidationConfig,
}

impl Consolidator {
    pub fn new(config: ConsolidationConfig) -> Self {
        Self { config }
    }

    pub fn consolidate(
        &self,
        outcomes: &[ValidationOutcome],
        context: &RunContext,
    ) -> Result<ConsolidatedDecision> {
        if outcomes.is_empty() {
            return Err(GateError::EmptyOutcomeSet);
        }

        let analysis = OutcomeAnalysis::analyze(outcomes, &self.config);
        let critical_failures = analysis.failures_at(Criticality::High);
        let medium_failures = analysis.failures_at(Criticality::Medium);
        let low_failures = analysis.failures_at(Criticality::Low);

        let mut factors = Vec::new();

        if critical_failures > self.config.critical_failure_threshold {
            factors.push(DecisionFactor {
                name: "critical_failures",
                value: critical_failures,
                impact: FactorImpact::Reject,
                priority: 1,
                reason: format!(
                    "{} critical rule(s) failed; the tolerance is {}",
                    critical_failures, self.config.critical_failure_threshold
                ),
            });
        }
        if medium_failures > self.config.medium_failure_threshold {
            factors.push(DecisionFactor {
                name: "medium_failures",
                value: medium_failures,
                impact: FactorImpact::Reject,
                priority: 2,
                reason: format!(
                    "{} medium-criticality rule(s) failed; the tolerance is {}",
                    medium_failures, self.config.medium_failure_threshold
                ),
            });
        }
        if low_failures > self.config.low_failure_threshold {
            factors.push(DecisionFactor {
                name: "low_failures",
                value: low_failures,
                impact: FactorImpact::Reject,
                priority: 3,
                reason: format!(
                    "{} low-criticality rule(s) failed; the tolerance is {}",
                    low_failures, self.config.low_failure_threshold
                ),
            });
        }
        if !analysis.confidence.threshold_met {
            factors.push(DecisionFactor {
                name: "low_confidence",
                value: analysis.confidence.low_confidence_rules.len(),
                impact: FactorImpact::Concern,
                priority: 4,
                reason: format!(
                    "average confidence {:.2} is below the {:.1} minimum",
                    analysis.confidence.average_score, self.config.min_confidence_score
                ),
            });
        }

        factors.sort_by_key(|factor| factor.priority);

        let passed = !factors
            .iter()
            .any(|factor| factor.impact == FactorImpact::Reject);

        let message = match factors.first() {
            Some(factor) if !passed => format!("validation rejected: {}", factor.reason),
            Some(factor) => format!("validation passed with concerns: {}", factor.reason),
            None => "validation passed: all rules within tolerance".to_string(),
        };

        let confidence = if factors.iter().any(|f| f.priority == 1) {
            Confidence::High
        } else if passed && factors.is_empty() {
            Confidence::High
        } else {
            Confidence::Medium
        };

        let recommendations = build_recommendations(&analysis, context.cost.as_ref());
        let metrics = DecisionMetrics::build(&analysis, context, recommendations);

        info!(
            passed,
            critical_failures,
            medium_failures,
            low_failures,
            confidence = %confidence,
            "consolidated decision"
        );

        Ok(ConsolidatedDecision {
            passed,
            message,
            confidence,
            total_rules: analysis.total,
            critical_failures,
            medium_failures,
            low_failures,
            system_errors: context.system_errors,
            execution_time_ms: context.execution_time_ms,
            factors,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RuleType;
    use crate::dispatch::Verdict;
    use crate::selector::EvaluatorTier;

    fn outcome(id: &str, criticality: Criticality, verdict: Verdict) -> ValidationOutcome {
        ValidationOutcome {
            rule_id: id.to_string(),
            rule_type: RuleType::Content,
            criticality,
            verdict,
            confidence: Confidence::High,
            explanation: "test".to_string(),
            content_size_analyzed: 1_000,
            tier: EvaluatorTier::Economy,
            chunks_processed: 0,
        }
    }

    fn consolidator() -> Consolidator {
        Consolidator::new(ConsolidationConfig::default())
    }

    #[test]
    fn test_empty_outcomes_is_an_error() {
        let result = consolidator().consolidate(&[], &RunContext::default());
        assert!(matches!(result, Err(GateError::EmptyOutcomeSet)));
    }

    #[test]
    fn test_single_critical_failure_rejects() {
        let outcomes = vec![
            outcome("R1", Criticality::High, Verdict::Fails),
            outcome("R2", Criticality::Low, Verdict::Complies),
        ];
        let decision = consolidator()
            .consolidate(&outcomes, &RunContext::default())
            .unwrap();
        assert!(!decision.passed);
        assert_eq!(decision.confidence, Confidence::High);
        assert_eq!(decision.factors[0].name, "critical_failures");
        assert!(decision.message.contains("critical"));
    }

    #[test]
    fn test_medium_failures_within_tolerance_pass() {
        let outcomes = vec![
            outcome("R1", Criticality::Medium, Verdict::Fails),
            outcome("R2", Criticality::Medium, Verdict::Fails),
            outcome("R3", Criticality::Medium, Verdict::Complies),
        ];
        let decision = consolidator()
            .consolidate(&outcomes, &RunContext::default())
            .unwrap();
        assert!(decision.passed);
    }

    #[test]
    fn test_medium_failures_over_tolerance_reject() {
        let outcomes = vec![
            outcome("R1", Criticality::Medium, Verdict::Fails),
            outcome("R2", Criticality::Medium, Verdict::Fails),
            outcome("R3", Criticality::Medium, Verdict::Fails),
        ];
        let decision = consolidator()
            .consolidate(&outcomes, &RunContext::default())
            .unwrap();
        assert!(!decision.passed);
        assert_eq!(decision.factors[0].name, "medium_failures");
        assert_eq!(decision.confidence, Confidence::Medium);
    }

    #[test]
    fn test_low_failures_over_tolerance_reject() {
        let mut outcomes: Vec<ValidationOutcome> = (0..6)
            .map(|i| outcome(&format!("R{}", i), Criticality::Low, Verdict::Fails))
            .collect();
        outcomes.push(outcome("R9", Criticality::High, Verdict::Complies));
        let decision = consolidator()
            .consolidate(&outcomes, &RunContext::default())
            .unwrap();
        assert!(!decision.passed);
        assert!(decision
            .factors
            .iter()
            .any(|f| f.name == "low_failures"
                && f.impact == FactorImpact::Reject
                && f.priority == 3));
        assert!(decision.message.contains("rejected"));
    }

    #[test]
    fn test_low_failures_within_tolerance_pass() {
        let mut outcomes: Vec<ValidationOutcome> = (0..5)
            .map(|i| outcome(&format!("R{}", i), Criticality::Low, Verdict::Fails))
            .collect();
        outcomes.push(outcome("R9", Criticality::High, Verdict::Complies));
        let decision = consolidator()
            .consolidate(&outcomes, &RunContext::default())
            .unwrap();
        assert!(decision.passed);
        assert!(!decision.factors.iter().any(|f| f.name == "low_failures"));
    }

    #[test]
    fn test_clean_run_approves_with_high_confidence() {
        let outcomes = vec![
            outcome("R1", Criticality::High, Verdict::Complies),
            outcome("R2", Criticality::Medium, Verdict::Complies),
        ];
        let decision = consolidator()
            .consolidate(&outcomes, &RunContext::default())
            .unwrap();
        assert!(decision.passed);
        assert!(decision.factors.is_empty());
        assert_eq!(decision.confidence, Confidence::High);
    }

    #[test]
    fn test_low_confidence_outcomes_flagged() {
        let mut weak = outcome("R1", Criticality::Low, Verdict::Complies);
        weak.confidence = Confidence::Low;
        let mut weak2 = outcome("R2", Criticality::Low, Verdict::Complies);
        weak2.confidence = Confidence::Low;
        let decision = consolidator()
            .consolidate(&[weak, weak2], &RunContext::default())
            .unwrap();
        assert!(decision.passed);
        assert!(decision.factors.iter().any(|f| f.name == "low_confidence"));
        assert_eq!(decision.confidence, Confidence::Medium);
    }
}
