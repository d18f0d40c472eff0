use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{Criticality, ProcessedCatalog, Rule, RuleType};
use crate::config::EngineConfig;
use crate::content::{Chunk, ContentChunker};
use crate::dispatch::responses::{parse_reply, EvaluationRequest, Evaluator};
use crate::dispatch::structural::run_structural_check;
use crate::dispatch::types::{Confidence, ValidationOutcome, Verdict};
use crate::selector::{CostAnalysis, EvaluatorTier, TierSelector};

/// Run-level execution counters, reported alongside the outcomes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub tier_usage: BTreeMap<EvaluatorTier, usize>,
    pub execution_times_ms: Vec<u64>,
}

impl DispatchStats {
    fn record(&mut self, outcome: &ValidationOutcome, elapsed_ms: u64, errored: bool) {
        self.total += 1;
        if errored {
            self.failed += 1;
        } else {
            self.successful += 1;
        }
        *self.tier_usage.entry(outcome.tier).or_insert(0) += 1;
        self.execution_times_ms.push(elapsed_ms);
    }
}

/// Fans every rule in the catalog out to its evaluator concurrently and
/// collects one [`ValidationOutcome`] per rule. Evaluator failures are
/// absorbed into failing outcomes; `run` itself never errors.
pub struct Dispatcher {
    evaluator: Arc<dyn Evaluator>,
    selector: TierSelector,
    chunker: ContentChunker,
    config: EngineConfig,
    stats: Mutex<DispatchStats>,
}

impl Dispatcher {
    pub fn new(evaluator: Arc<dyn Evaluator>, config: EngineConfig) -> Self {
        Self {
            evaluator,
            selector: TierSelector::new(config.selector.clone(), config.strategy),
            chunker: ContentChunker::new(config.chunking.clone()),
            config,
            stats: Mutex::new(DispatchStats::default()),
        }
    }

    pub async fn run(
        &self,
        catalog: &ProcessedCatalog,
        content: &BTreeMap<String, String>,
    ) -> Vec<ValidationOutcome> {
        let rules: Vec<&Rule> = catalog.all_rules().collect();
        info!(rules = rules.len(), files = content.len(), "dispatching validations");

        let futures = rules
            .into_iter()
            .map(|rule| self.validate_rule(rule, content))
            .collect::<Vec<_>>();
        let outcomes = join_all(futures).await;

        let stats = self.stats.lock();
        info!(
            total = stats.total,
            successful = stats.successful,
            failed = stats.failed,
            "dispatch complete"
        );
        outcomes
    }

    async fn validate_rule(
        &self,
        rule: &Rule,
        content: &BTreeMap<String, String>,
    ) -> ValidationOutcome {
        let started = Instant::now();
        let relevant = extract_relevant_content(rule, content);
        let content_size: usize = relevant.values().map(String::len).sum();

        let (outcome, errored) = if relevant.is_empty() && rule.rule_type != RuleType::Structural {
            (self.missing_content_outcome(rule), false)
        } else if rule.rule_type == RuleType::Structural {
            (self.structural_outcome(rule, &relevant), false)
        } else {
            self.evaluated_outcome(rule, &relevant, content_size).await
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.stats.lock().record(&outcome, elapsed_ms, errored);
        debug!(
            rule_id = %rule.id,
            verdict = %outcome.verdict,
            tier = %outcome.tier,
            elapsed_ms,
            "rule validated"
        );
        outcome
    }

    /// Non-structural rules with nothing to analyze fail outright.
    fn missing_content_outcome(&self, rule: &Rule) -> ValidationOutcome {
        ValidationOutcome {
            rule_id: rule.id.clone(),
            rule_type: rule.rule_type,
            criticality: rule.criticality,
            verdict: Verdict::Fails,
            confidence: Confidence::High,
            explanation: format!(
                "no content found for references: {}",
                if rule.references.is_empty() {
                    "(none declared)".to_string()
                } else {
                    rule.references.join(", ")
                }
            ),
            content_size_analyzed: 0,
            tier: EvaluatorTier::Programmatic,
            chunks_processed: 0,
        }
    }

    fn structural_outcome(
        &self,
        rule: &Rule,
        relevant: &BTreeMap<String, String>,
    ) -> ValidationOutcome {
        let (verdict, confidence, explanation) =
            run_structural_check(rule, relevant, &self.config.structural);
        self.selector.record_direct(EvaluatorTier::Programmatic, 0.0);
        ValidationOutcome {
            rule_id: rule.id.clone(),
            rule_type: rule.rule_type,
            criticality: rule.criticality,
            verdict,
            confidence,
            explanation,
            content_size_analyzed: relevant.values().map(String::len).sum(),
            tier: EvaluatorTier::Programmatic,
            chunks_processed: 0,
        }
    }

    async fn evaluated_outcome(
        &self,
        rule: &Rule,
        relevant: &BTreeMap<String, String>,
        content_size: usize,
    ) -> (ValidationOutcome, bool) {
        let recommendation = self.selector.recommend(rule, content_size);
        let plan = self.chunker.plan(rule, relevant);

        if !plan.requires_chunking {
            let chunk = &plan.chunks[0];
            match self.evaluate_chunk(rule, chunk, recommendation.tier, None).await {
                Ok((verdict, confidence, explanation)) => (
                    ValidationOutcome {
                        rule_id: rule.id.clone(),
                        rule_type: rule.rule_type,
                        criticality: rule.criticality,
                        verdict,
                        confidence,
                        explanation,
                        content_size_analyzed: content_size,
                        tier: recommendation.tier,
                        chunks_processed: 0,
                    },
                    false,
                ),
                Err(message) => {
                    warn!(rule_id = %rule.id, error = %message, "evaluation failed");
                    (
                        ValidationOutcome {
                            rule_id: rule.id.clone(),
                            rule_type: rule.rule_type,
                            criticality: rule.criticality,
                            verdict: Verdict::Fails,
                            confidence: Confidence::Low,
                            explanation: format!("evaluation error: {}", message),
                            content_size_analyzed: content_size,
                            tier: recommendation.tier,
                            chunks_processed: 0,
                        },
                        true,
                    )
                }
            }
        } else {
            let total = plan.chunks.len();
            let futures = plan
                .chunks
                .iter()
                .enumerate()
                .map(|(index, chunk)| {
                    self.evaluate_chunk(rule, chunk, recommendation.tier, Some((index + 1, total)))
                })
                .collect::<Vec<_>>();
            let results = join_all(futures).await;

            let mut chunk_verdicts = Vec::with_capacity(total);
            let mut errors = 0usize;
            for (index, result) in results.into_iter().enumerate() {
                match result {
                    Ok((verdict, confidence, explanation)) => {
                        chunk_verdicts.push((
                            verdict,
                            confidence,
                            format!("[Chunk {}] {}", index + 1, explanation),
                        ));
                    }
                    Err(message) => {
                        warn!(
                            rule_id = %rule.id,
                            chunk = index + 1,
                            error = %message,
                            "chunk evaluation failed"
                        );
                        errors += 1;
                    }
                }
            }

            let (verdict, confidence, explanation) =
                consolidate_chunk_verdicts(rule.criticality, &chunk_verdicts, errors, total);
            (
                ValidationOutcome {
                    rule_id: rule.id.clone(),
                    rule_type: rule.rule_type,
                    criticality: rule.criticality,
                    verdict,
                    confidence,
                    explanation,
                    content_size_analyzed: content_size,
                    tier: recommendation.tier,
                    chunks_processed: total,
                },
                errors == total,
            )
        }
    }

    async fn evaluate_chunk(
        &self,
        rule: &Rule,
        chunk: &Chunk,
        tier: EvaluatorTier,
        chunk_position: Option<(usize, usize)>,
    ) -> std::result::Result<(Verdict, Confidence, String), String> {
        let request = EvaluationRequest {
            rule_id: rule.id.clone(),
            description: rule.description.clone(),
            criticality: rule.criticality.to_string(),
            explanation: rule.explanation.clone(),
            content: chunk.content.clone(),
            tier,
            chunk: chunk_position,
        };

        match self.evaluator.evaluate(&request).await {
            Ok(raw) => Ok(parse_reply(&raw)),
            Err(error) => Err(error.to_string()),
        }
    }

    pub fn cost_analysis(&self) -> CostAnalysis {
        self.selector.cost_analysis()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats.lock().clone()
    }
}

/// Rules with references see only matching files; rules without see the
/// whole map.
fn extract_relevant_content(
    rule: &Rule,
    content: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    if rule.references.is_empty() {
        return content.clone();
    }
    content
        .iter()
        .filter(|(path, _)| rule.matches_file(path))
        .map(|(path, text)| (path.clone(), text.clone()))
        .collect()
}

/// Merges per-chunk verdicts into one rule verdict.
///
/// High-criticality rules require unanimous compliance. Lower criticality
/// rules follow the majority, with confidence dropping to medium when the
/// majority is thin or the rule fails.
fn consolidate_chunk_verdicts(
    criticality: Criticality,
    chunk_verdicts: &[(Verdict, Confidence, String)],
    errors: usize,
    total: usize,
) -> (Verdict, Confidence, String) {
    if chunk_verdicts.is_empty() {
        return (
            Verdict::Fails,
            Confidence::Low,
            format!("all {} chunks failed to evaluate", total),
        );
    }

    let explanations: Vec<&str> = chunk_verdicts
        .iter()
        .map(|(_, _, explanation)| explanation.as_str())
        .collect();
    let mut explanation = explanations.join("; ");
    if errors > 0 {
        explanation.push_str(&format!("; {} of {} chunks failed to evaluate", errors, total));
    }

    let complies = chunk_verdicts
        .iter()
        .filter(|(verdict, _, _)| *verdict == Verdict::Complies)
        .count();
    let fails = chunk_verdicts
        .iter()
        .filter(|(verdict, _, _)| *verdict == Verdict::Fails)
        .count();
    let partial = chunk_verdicts.len() - complies - fails;

    if criticality == Criticality::High {
        let unanimous = complies == chunk_verdicts.len() && errors == 0;
        let verdict = if unanimous { Verdict::Complies } else { Verdict::Fails };
        let all_agree = complies == chunk_verdicts.len()
            || fails == chunk_verdicts.len()
            || partial == chunk_verdicts.len();
        let confidence = if all_agree && errors == 0 {
            Confidence::High
        } else {
            Confidence::Medium
        };
        return (verdict, confidence, explanation);
    }

    let (verdict, majority) = if fails >= complies && fails >= partial {
        (Verdict::Fails, fails)
    } else if partial > complies {
        (Verdict::Partial, partial)
    } else {
        (Verdict::Complies, complies)
    };

    let share = majority as f32 / chunk_verdicts.len() as f32;
    let confidence = if verdict != Verdict::Fails && share > 0.7 && errors == 0 {
        Confidence::High
    } else {
        Confidence::Medium
    };

    (verdict, confidence, explanation)
}
