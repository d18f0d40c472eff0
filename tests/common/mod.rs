#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use repogate::{
    ConsolidatedDecision, ContentSource, EvaluationRequest, Evaluator, GateError, ReportSink,
    Result, RuleSource,
};

/// Evaluator whose replies are driven by a closure over the request.
pub struct ScriptedEvaluator {
    script: Box<dyn Fn(&EvaluationRequest) -> Result<String> + Send + Sync>,
}

impl ScriptedEvaluator {
    pub fn new(
        script: impl Fn(&EvaluationRequest) -> Result<String> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
        })
    }

    /// Replies with the same verdict and confidence for every request.
    pub fn always(verdict: &str, confidence: &str) -> Arc<Self> {
        let reply = format!(
            "VERDICT: {}\nCONFIDENCE: {}\nEXPLANATION: scripted reply",
            verdict, confidence
        );
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Complies everywhere except the listed 1-based chunk indices.
    pub fn failing_chunks(failing: &[usize]) -> Arc<Self> {
        let failing: Vec<usize> = failing.to_vec();
        Self::new(move |request| {
            let fails = request
                .chunk
                .map(|(index, _)| failing.contains(&index))
                .unwrap_or(false);
            if fails {
                Ok("VERDICT: FAILS\nCONFIDENCE: HIGH\nEXPLANATION: chunk violates the rule"
                    .to_string())
            } else {
                Ok("VERDICT: COMPLIES\nCONFIDENCE: HIGH\nEXPLANATION: chunk complies".to_string())
            }
        })
    }

    /// Every call errors, exercising the dispatcher's absorption path.
    pub fn erroring() -> Arc<Self> {
        Self::new(|_| Err(GateError::Evaluator("simulated outage".to_string())))
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<String> {
        (self.script)(request)
    }
}

pub struct StaticRuleSource {
    pub rules: Vec<Value>,
}

impl StaticRuleSource {
    pub fn new(rules: Vec<Value>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl RuleSource for StaticRuleSource {
    async fn load_rules(&self) -> Result<Vec<Value>> {
        Ok(self.rules.clone())
    }
}

pub struct StaticContentSource {
    pub files: BTreeMap<String, String>,
}

impl StaticContentSource {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            files: entries
                .iter()
                .map(|(path, text)| (path.to_string(), text.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl ContentSource for StaticContentSource {
    async fn fetch(&self, _required: &BTreeSet<String>) -> Result<BTreeMap<String, String>> {
        Ok(self.files.clone())
    }
}

/// Sink that remembers the last published decision.
#[derive(Default)]
pub struct CapturingSink {
    pub published: Mutex<Option<ConsolidatedDecision>>,
}

#[async_trait]
impl ReportSink for CapturingSink {
    async fn publish(&self, decision: &ConsolidatedDecision) -> Result<()> {
        *self.published.lock() = Some(decision.clone());
        Ok(())
    }
}
