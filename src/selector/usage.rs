use std::collections::BTreeMap;

use serde::Serialize;

use crate::selector::tiers::EvaluatorTier;

/// Per-tier call accounting, accumulated across one engine run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TierUsage {
    pub validations: usize,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageTracker {
    by_tier: BTreeMap<EvaluatorTier, TierUsage>,
}

impl UsageTracker {
    pub fn record(&mut self, tier: EvaluatorTier, estimated_cost: f64) {
        let usage = self.by_tier.entry(tier).or_default();
        usage.validations += 1;
        usage.estimated_cost += estimated_cost;
    }

    pub fn total_validations(&self) -> usize {
        self.by_tier.values().map(|u| u.validations).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.by_tier.values().map(|u| u.estimated_cost).sum()
    }

    pub fn analysis(&self) -> CostAnalysis {
        let total_validations = self.total_validations();
        let total_cost = self.total_cost();
        let average_cost = if total_validations > 0 {
            total_cost / total_validations as f64
        } else {
            0.0
        };
        CostAnalysis {
            total_validations,
            total_estimated_cost: total_cost,
            average_cost_per_validation: average_cost,
            by_tier: self.by_tier.clone(),
            efficiency: CostEfficiency::rate(average_cost),
        }
    }
}

/// Cost summary exposed in the final report.
#[derive(Debug, Clone, Serialize)]
pub struct CostAnalysis {
    pub total_validations: usize,
    pub total_estimated_cost: f64,
    pub average_cost_per_validation: f64,
    pub by_tier: BTreeMap<EvaluatorTier, TierUsage>,
    pub efficiency: CostEfficiency,
}

impl CostAnalysis {
    pub fn tier_cost(&self, tier: EvaluatorTier) -> f64 {
        self.by_tier
            .get(&tier)
            .map(|u| u.estimated_cost)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostEfficiency {
    High,
    Medium,
    Low,
}

impl CostEfficiency {
    fn rate(average_cost: f64) -> Self {
        if average_cost > 0.1 {
            Self::Low
        } else if average_cost > 0.05 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_accumulates_per_tier() {
        let mut tracker = UsageTracker::default();
        tracker.record(EvaluatorTier::Economy, 0.01);
        tracker.record(EvaluatorTier::Economy, 0.02);
        tracker.record(EvaluatorTier::Premium, 0.10);

        let analysis = tracker.analysis();
        assert_eq!(analysis.total_validations, 3);
        assert!((analysis.total_estimated_cost - 0.13).abs() < 1e-9);
        assert!((analysis.tier_cost(EvaluatorTier::Economy) - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_efficiency_bands() {
        assert_eq!(CostEfficiency::rate(0.2), CostEfficiency::Low);
        assert_eq!(CostEfficiency::rate(0.07), CostEfficiency::Medium);
        assert_eq!(CostEfficiency::rate(0.01), CostEfficiency::High);
    }

    #[test]
    fn test_empty_tracker_analysis() {
        let analysis = UsageTracker::default().analysis();
        assert_eq!(analysis.total_validations, 0);
        assert_eq!(analysis.average_cost_per_validation, 0.0);
        assert_eq!(analysis.efficiency, CostEfficiency::High);
    }
}
