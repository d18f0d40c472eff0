use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{CatalogProcessor, CatalogReport};
use crate::config::EngineConfig;
use crate::consolidate::{ConsolidatedDecision, Consolidator, RunContext};
use crate::dispatch::{DispatchStats, Dispatcher, Evaluator, ValidationOutcome};
use crate::error::Result;
use crate::sources::{ContentSource, ReportSink, RuleSource};

/// Everything one engine run produced, decision first.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRun {
    pub decision: ConsolidatedDecision,
    pub outcomes: Vec<ValidationOutcome>,
    pub catalog_report: CatalogReport,
    pub stats: DispatchStats,
}

/// Top-level orchestrator: catalog processing, content fetch, dispatch,
/// and consolidation, in that order. Stateless across runs; usage and
/// execution counters start fresh each call.
pub struct ValidationEngine {
    config: EngineConfig,
    evaluator: Arc<dyn Evaluator>,
}

impl ValidationEngine {
    pub fn new(config: EngineConfig, evaluator: Arc<dyn Evaluator>) -> Result<Self> {
        config
            .validate()
            .map_err(crate::error::GateError::Config)?;
        Ok(Self { config, evaluator })
    }

    pub async fn run(
        &self,
        rules: &dyn RuleSource,
        content: &dyn ContentSource,
    ) -> Result<ValidationRun> {
        let started = Instant::now();

        let raw_rules = rules.load_rules().await?;
        let catalog = CatalogProcessor::default().process(&raw_rules)?;
        if catalog.report.has_warnings() {
            warn!(
                parse_errors = catalog.report.parse_errors.len(),
                duplicates = catalog.report.duplicate_ids.len(),
                "catalog processed with warnings"
            );
        }
        info!(
            structural = catalog.structural.len(),
            content = catalog.content.len(),
            semantic = catalog.semantic.len(),
            "catalog ready"
        );

        let files = content.fetch(&catalog.required_files).await?;

        let dispatcher = Dispatcher::new(Arc::clone(&self.evaluator), self.config.clone());
        let outcomes = dispatcher.run(&catalog, &files).await;
        let stats = dispatcher.stats();

        let context = RunContext {
            system_errors: stats.failed,
            execution_time_ms: started.elapsed().as_millis() as u64,
            cost: Some(dispatcher.cost_analysis()),
        };
        let decision =
            Consolidator::new(self.config.consolidation.clone()).consolidate(&outcomes, &context)?;

        info!(
            passed = decision.passed,
            rules = decision.total_rules,
            elapsed_ms = context.execution_time_ms,
            "validation run complete"
        );

        Ok(ValidationRun {
            decision,
            outcomes,
            catalog_report: catalog.report,
            stats,
        })
    }

    /// Runs a validation and pushes the decision to a sink.
    pub async fn run_and_publish(
        &self,
        rules: &dyn RuleSource,
        content: &dyn ContentSource,
        sink: &dyn ReportSink,
    ) -> Result<ValidationRun> {
        let run = self.run(rules, content).await?;
        sink.publish(&run.decision).await?;
        Ok(run)
    }
}
