//! Decision consolidation: turns per-rule outcomes into one pass/fail
//! answer with a failure-tolerance cascade, plus the report metrics and
//! improvement recommendations that accompany it.

mod analysis;
mod decision;
mod metrics;

pub use analysis::{ConfidenceAnalysis, ExecutionAnalysis, OutcomeAnalysis, VerdictBreakdown};
pub use decision::{ConsolidatedDecision, Consolidator, DecisionFactor, FactorImpact, RunContext};
pub use metrics::DecisionMetrics;
