//! Integration seams. The engine core stays independent of where rules
//! come from, where repository content is read, and where reports go;
//! callers supply these three traits.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde_json::Value;

use crate::consolidate::ConsolidatedDecision;
use crate::error::Result;

/// Supplies the raw rule records to validate against.
#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn load_rules(&self) -> Result<Vec<Value>>;
}

/// Supplies repository file contents keyed by path. The `required` set
/// is advisory: sources may return more files than asked for, and rules
/// without references see everything returned.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, required: &BTreeSet<String>) -> Result<BTreeMap<String, String>>;
}

/// Receives the final decision. Publishing failures are the caller's
/// problem to surface; the decision itself is already made.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn publish(&self, decision: &ConsolidatedDecision) -> Result<()>;
}
