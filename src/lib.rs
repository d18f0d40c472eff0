//! Repository validation decision engine.
//!
//! Takes a catalog of validation rules and a repository's file contents,
//! dispatches each rule to the cheapest evaluator tier that can answer it
//! (programmatic checks, or external evaluators via the [`Evaluator`]
//! trait), and consolidates the per-rule outcomes into a single
//! pass/fail decision with metrics and follow-up recommendations.

pub mod catalog;
pub mod config;
pub mod consolidate;
pub mod content;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod selector;
pub mod sources;
pub mod utils;

pub use catalog::{CatalogProcessor, CatalogReport, Criticality, ProcessedCatalog, Rule, RuleType};
pub use config::EngineConfig;
pub use consolidate::{ConsolidatedDecision, Consolidator, DecisionMetrics, RunContext};
pub use content::{ChunkPlan, ContentChunker};
pub use dispatch::{
    Confidence, DispatchStats, Dispatcher, EvaluationRequest, Evaluator, ValidationOutcome,
    Verdict,
};
pub use engine::{ValidationEngine, ValidationRun};
pub use error::{GateError, Result};
pub use selector::{EvaluatorTier, SelectionStrategy, TierRecommendation, TierSelector};
pub use sources::{ContentSource, ReportSink, RuleSource};
