use serde::{Deserialize, Serialize};

use crate::catalog::{Criticality, RuleType};
use crate::selector::EvaluatorTier;

/// Three-valued compliance verdict for one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Complies,
    Fails,
    Partial,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complies => "COMPLIES",
            Self::Fails => "FAILS",
            Self::Partial => "PARTIAL",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Numeric weight used when averaging confidence across outcomes.
    pub fn score(&self) -> f64 {
        match self {
            Self::High => 3.0,
            Self::Medium => 2.0,
            Self::Low => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule's validated result, the unit the consolidator works on.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub rule_id: String,
    pub rule_type: RuleType,
    pub criticality: Criticality,
    pub verdict: Verdict,
    pub confidence: Confidence,
    pub explanation: String,
    pub content_size_analyzed: usize,
    pub tier: EvaluatorTier,
    /// Zero when the rule was validated without chunking.
    pub chunks_processed: usize,
}

impl ValidationOutcome {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Complies
    }

    pub fn failed(&self) -> bool {
        self.verdict == Verdict::Fails
    }
}
