//! Evaluator tier selection.
//!
//! Every rule gets a [`TierRecommendation`] before dispatch: which tier to
//! call, the confidence in that pick, a human-readable reason, and cost
//! estimates. Strategy functions make the initial pick; post-selection
//! adjustments enforce token limits and the per-validation cost ceiling.

mod strategy;
mod tiers;
mod usage;

pub use strategy::{SelectionStrategy, TierRecommendation};
pub use tiers::{EvaluatorTier, TierProfile};
pub use usage::{CostAnalysis, CostEfficiency, TierUsage, UsageTracker};

use parking_lot::Mutex;
use tracing::debug;

use crate::catalog::{Criticality, Rule};
use crate::config::SelectorConfig;

pub struct TierSelector {
    config: SelectorConfig,
    strategy: SelectionStrategy,
    usage: Mutex<UsageTracker>,
}

impl TierSelector {
    pub fn new(config: SelectorConfig, strategy: SelectionStrategy) -> Self {
        Self {
            config,
            strategy,
            usage: Mutex::new(UsageTracker::default()),
        }
    }

    /// Picks a tier for one rule, applies limit adjustments, and records
    /// the projected usage.
    pub fn recommend(&self, rule: &Rule, content_size: usize) -> TierRecommendation {
        let mut recommendation = match self.strategy {
            SelectionStrategy::CostOptimized => {
                strategy::recommend_cost_optimized(rule, content_size, &self.config)
            }
            SelectionStrategy::QualityOptimized => {
                strategy::recommend_quality_optimized(rule, content_size, &self.config)
            }
            SelectionStrategy::Balanced => {
                strategy::recommend_balanced(rule, content_size, &self.config)
            }
            SelectionStrategy::SpeedOptimized => {
                strategy::recommend_speed_optimized(rule, content_size, &self.config)
            }
        };

        self.adjust_for_limits(rule, content_size, &mut recommendation);

        debug!(
            rule_id = %rule.id,
            tier = %recommendation.tier,
            confidence = recommendation.confidence,
            cost = recommendation.estimated_cost,
            reason = %recommendation.reasoning,
            "tier recommendation"
        );

        self.usage
            .lock()
            .record(recommendation.tier, recommendation.estimated_cost);
        recommendation
    }

    /// Upgrades out of token overflow and downgrades out of the cost
    /// ceiling. High-criticality rules are never downgraded.
    fn adjust_for_limits(
        &self,
        rule: &Rule,
        content_size: usize,
        recommendation: &mut TierRecommendation,
    ) {
        let estimated_tokens = content_size.div_ceil(self.config.chars_per_token.max(1));

        if recommendation.tier == EvaluatorTier::Economy
            && estimated_tokens > EvaluatorTier::Economy.profile().max_tokens
        {
            recommendation.tier = EvaluatorTier::Premium;
            recommendation.estimated_cost = EvaluatorTier::Premium.profile().estimate_cost(
                content_size,
                self.config.estimated_output_tokens,
                self.config.chars_per_token,
            );
            recommendation.estimated_secs = EvaluatorTier::Premium.profile().avg_response_secs;
            recommendation
                .reasoning
                .push_str("; upgraded: content exceeds the economy token limit");
        }

        if recommendation.tier == EvaluatorTier::Premium
            && recommendation.estimated_cost > self.config.max_cost_per_validation
            && rule.criticality != Criticality::High
        {
            recommendation.tier = EvaluatorTier::Economy;
            recommendation.estimated_cost = EvaluatorTier::Economy.profile().estimate_cost(
                content_size,
                self.config.estimated_output_tokens,
                self.config.chars_per_token,
            );
            recommendation.estimated_secs = EvaluatorTier::Economy.profile().avg_response_secs;
            recommendation.downgraded = true;
            recommendation
                .reasoning
                .push_str("; downgraded: estimated cost exceeds the per-validation ceiling");
        }
    }

    /// Conservative recommendation used when selection context is missing
    /// or a prior recommendation cannot be reused.
    pub fn fallback_recommendation(&self, content_size: usize) -> TierRecommendation {
        TierRecommendation::new(
            EvaluatorTier::Premium,
            0.70,
            "fallback selection, defaulting to the premium tier",
            content_size,
            &self.config,
        )
        .with_fallback(EvaluatorTier::Economy)
    }

    /// Records a call the dispatcher resolved without a recommendation,
    /// such as a programmatic structural check.
    pub(crate) fn record_direct(&self, tier: EvaluatorTier, estimated_cost: f64) {
        self.usage.lock().record(tier, estimated_cost);
    }

    pub fn cost_analysis(&self) -> CostAnalysis {
        self.usage.lock().analysis()
    }
}
