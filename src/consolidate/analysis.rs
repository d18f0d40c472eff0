use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::{Criticality, RuleType};
use crate::config::ConsolidationConfig;
use crate::dispatch::{Confidence, ValidationOutcome, Verdict};
use crate::selector::EvaluatorTier;

/// Verdict counts within one slice of the outcomes.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct VerdictBreakdown {
    pub total: usize,
    pub complies: usize,
    pub fails: usize,
    pub partial: usize,
}

impl VerdictBreakdown {
    fn record(&mut self, verdict: Verdict) {
        self.total += 1;
        match verdict {
            Verdict::Complies => self.complies += 1,
            Verdict::Fails => self.fails += 1,
            Verdict::Partial => self.partial += 1,
        }
    }

    pub fn failure_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.fails as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceAnalysis {
    pub distribution: BTreeMap<Confidence, usize>,
    pub average_score: f64,
    pub low_confidence_rules: Vec<String>,
    /// Whether the average clears the configured minimum.
    pub threshold_met: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionAnalysis {
    pub tier_usage: BTreeMap<EvaluatorTier, usize>,
    pub total_chunks: usize,
    pub chunked_rules: usize,
    pub total_content_analyzed: usize,
    pub average_content_analyzed: usize,
    pub max_content_analyzed: usize,
}

/// Statistical view over a full set of outcomes, feeding both the final
/// decision and the report metrics.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeAnalysis {
    pub total: usize,
    pub verdict_counts: BTreeMap<Verdict, usize>,
    pub by_criticality: BTreeMap<Criticality, VerdictBreakdown>,
    pub by_type: BTreeMap<RuleType, VerdictBreakdown>,
    pub confidence: ConfidenceAnalysis,
    pub execution: ExecutionAnalysis,
}

impl OutcomeAnalysis {
    pub fn analyze(outcomes: &[ValidationOutcome], config: &ConsolidationConfig) -> Self {
        let mut verdict_counts = BTreeMap::new();
        let mut by_criticality: BTreeMap<Criticality, VerdictBreakdown> = BTreeMap::new();
        let mut by_type: BTreeMap<RuleType, VerdictBreakdown> = BTreeMap::new();
        let mut distribution: BTreeMap<Confidence, usize> = BTreeMap::new();
        let mut low_confidence_rules = Vec::new();
        let mut execution = ExecutionAnalysis::default();
        let mut score_sum = 0.0;

        for outcome in outcomes {
            *verdict_counts.entry(outcome.verdict).or_insert(0) += 1;
            by_criticality
                .entry(outcome.criticality)
                .or_default()
                .record(outcome.verdict);
            by_type
                .entry(outcome.rule_type)
                .or_default()
                .record(outcome.verdict);

            *distribution.entry(outcome.confidence).or_insert(0) += 1;
            score_sum += outcome.confidence.score();
            if outcome.confidence == Confidence::Low {
                low_confidence_rules.push(outcome.rule_id.clone());
            }

            *execution.tier_usage.entry(outcome.tier).or_insert(0) += 1;
            execution.total_chunks += outcome.chunks_processed;
            if outcome.chunks_processed > 0 {
                execution.chunked_rules += 1;
            }
            execution.total_content_analyzed += outcome.content_size_analyzed;
            execution.max_content_analyzed = execution
                .max_content_analyzed
                .max(outcome.content_size_analyzed);
        }

        let average_score = if outcomes.is_empty() {
            0.0
        } else {
            score_sum / outcomes.len() as f64
        };
        execution.average_content_analyzed = if outcomes.is_empty() {
            0
        } else {
            execution.total_content_analyzed / outcomes.len()
        };

        Self {
            total: outcomes.len(),
            verdict_counts,
            by_criticality,
            by_type,
            confidence: ConfidenceAnalysis {
                distribution,
                average_score,
                low_confidence_rules,
                threshold_met: average_score >= f64::from(config.min_confidence_score),
            },
            execution,
        }
    }

    pub fn verdict_count(&self, verdict: Verdict) -> usize {
        self.verdict_counts.get(&verdict).copied().unwrap_or(0)
    }

    /// Failing rules of exactly this criticality.
    pub fn failures_at(&self, criticality: Criticality) -> usize {
        self.by_criticality
            .get(&criticality)
            .map(|b| b.fails)
            .unwrap_or(0)
    }
}
