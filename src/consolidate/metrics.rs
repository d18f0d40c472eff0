use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::consolidate::analysis::OutcomeAnalysis;
use crate::consolidate::decision::RunContext;
use crate::dispatch::Verdict;
use crate::selector::{CostAnalysis, EvaluatorTier};

/// Full report payload attached to every decision: rates, breakdowns,
/// execution and cost summaries, plus actionable follow-ups.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionMetrics {
    pub generated_at: DateTime<Utc>,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub partial_rate: f64,
    pub analysis: OutcomeAnalysis,
    pub execution_time_ms: u64,
    pub system_errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostAnalysis>,
    pub recommendations: Vec<String>,
}

impl DecisionMetrics {
    pub fn build(
        analysis: &OutcomeAnalysis,
        context: &RunContext,
        recommendations: Vec<String>,
    ) -> Self {
        let total = analysis.total.max(1) as f64;
        Self {
            generated_at: Utc::now(),
            success_rate: analysis.verdict_count(Verdict::Complies) as f64 / total,
            failure_rate: analysis.verdict_count(Verdict::Fails) as f64 / total,
            partial_rate: analysis.verdict_count(Verdict::Partial) as f64 / total,
            analysis: analysis.clone(),
            execution_time_ms: context.execution_time_ms,
            system_errors: context.system_errors,
            cost: context.cost.clone(),
            recommendations,
        }
    }
}

const TYPE_FAILURE_RATE_LIMIT: f64 = 0.3;
const CHUNKED_RULE_LIMIT: usize = 5;
const REVIEW_CONFIDENCE_FLOOR: f64 = 2.5;

/// Derives follow-up suggestions from the analysis. Purely advisory; the
/// pass/fail call never depends on these.
pub(crate) fn build_recommendations(
    analysis: &OutcomeAnalysis,
    cost: Option<&CostAnalysis>,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if analysis.confidence.average_score < REVIEW_CONFIDENCE_FLOOR && analysis.total > 0 {
        recommendations.push(format!(
            "average confidence is {:.2}; manually review the {} low-confidence result(s)",
            analysis.confidence.average_score,
            analysis.confidence.low_confidence_rules.len()
        ));
    }

    let critical_failures = analysis.failures_at(crate::catalog::Criticality::High);
    if critical_failures > 0 {
        recommendations.push(format!(
            "{} critical failure(s) require urgent attention before re-running",
            critical_failures
        ));
    }

    if let Some(cost) = cost {
        let premium = cost.tier_cost(EvaluatorTier::Premium);
        let economy = cost.tier_cost(EvaluatorTier::Economy);
        if premium > economy * 2.0 && premium > 0.0 {
            recommendations.push(
                "premium tier spend dominates; consider the cost-optimized selection strategy"
                    .to_string(),
            );
        }
    }

    if analysis.execution.chunked_rules > CHUNKED_RULE_LIMIT {
        recommendations.push(format!(
            "{} rules needed chunking; narrowing rule references would reduce chunk overhead",
            analysis.execution.chunked_rules
        ));
    }

    for (rule_type, breakdown) in &analysis.by_type {
        if breakdown.failure_rate() > TYPE_FAILURE_RATE_LIMIT && breakdown.total > 1 {
            recommendations.push(format!(
                "{} rules fail at {:.0}%; review whether those rules or the repository need fixing",
                rule_type,
                breakdown.failure_rate() * 100.0
            ));
        }
    }

    recommendations
}
