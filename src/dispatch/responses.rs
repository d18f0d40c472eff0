//! Evaluator request/reply shapes and the tolerant reply parser.
//!
//! Replies are accepted in two forms: a JSON object matching
//! [`EvaluatorReply`], or labeled plain-text lines (`VERDICT:`,
//! `CONFIDENCE:`, `EXPLANATION:`). Anything else parses to a conservative
//! failure rather than an error, so one malformed reply never takes down
//! a run.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dispatch::types::{Confidence, Verdict};
use crate::error::Result;
use crate::selector::EvaluatorTier;

/// What the dispatcher hands to an evaluator for one call.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct EvaluationRequest {
    pub rule_id: String,
    pub description: String,
    pub criticality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub content: String,
    pub tier: EvaluatorTier,
    /// `(index, total)` when this call covers one chunk of a larger rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<(usize, usize)>,
}

/// The structured form evaluators are asked to reply with.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EvaluatorReply {
    pub verdict: String,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Anything capable of answering an [`EvaluationRequest`] with raw text.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<String>;
}

/// Parses a raw evaluator reply into verdict, confidence, and explanation.
pub fn parse_reply(raw: &str) -> (Verdict, Confidence, String) {
    if let Ok(reply) = serde_json::from_str::<EvaluatorReply>(raw) {
        let verdict = verdict_from_text(&reply.verdict);
        let confidence = reply
            .confidence
            .as_deref()
            .map(confidence_from_text)
            .unwrap_or(Confidence::Medium);
        let explanation = reply
            .explanation
            .unwrap_or_else(|| "no explanation provided".to_string());
        return (verdict, confidence, explanation);
    }

    let mut verdict_line = None;
    let mut confidence_line = None;
    let mut explanation_line = None;

    for line in raw.lines() {
        let trimmed = line.trim();
        if let Some(rest) = strip_label(trimmed, "VERDICT:") {
            verdict_line = Some(rest.to_string());
        } else if let Some(rest) = strip_label(trimmed, "CONFIDENCE:") {
            confidence_line = Some(rest.to_string());
        } else if let Some(rest) = strip_label(trimmed, "EXPLANATION:") {
            explanation_line = Some(rest.to_string());
        }
    }

    match verdict_line {
        Some(text) => {
            let verdict = verdict_from_text(&text);
            let confidence = confidence_line
                .as_deref()
                .map(confidence_from_text)
                .unwrap_or(Confidence::Medium);
            let explanation =
                explanation_line.unwrap_or_else(|| "no explanation provided".to_string());
            (verdict, confidence, explanation)
        }
        None => (
            Verdict::Fails,
            Confidence::Low,
            "response could not be parsed".to_string(),
        ),
    }
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    if line.len() >= label.len() && line[..label.len()].eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim())
    } else {
        None
    }
}

/// COMPLIES wins only when FAILS is absent; PARTIAL comes next; anything
/// else reads as a failure.
fn verdict_from_text(text: &str) -> Verdict {
    let upper = text.to_uppercase();
    if upper.contains("COMPLIES") && !upper.contains("FAILS") {
        Verdict::Complies
    } else if upper.contains("PARTIAL") {
        Verdict::Partial
    } else {
        Verdict::Fails
    }
}

fn confidence_from_text(text: &str) -> Confidence {
    let upper = text.to_uppercase();
    if upper.contains("HIGH") {
        Confidence::High
    } else if upper.contains("LOW") {
        Confidence::Low
    } else {
        Confidence::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labeled_reply() {
        let raw = "VERDICT: COMPLIES\nCONFIDENCE: HIGH\nEXPLANATION: all references present";
        let (verdict, confidence, explanation) = parse_reply(raw);
        assert_eq!(verdict, Verdict::Complies);
        assert_eq!(confidence, Confidence::High);
        assert_eq!(explanation, "all references present");
    }

    #[test]
    fn test_parse_json_reply() {
        let raw = r#"{"verdict": "PARTIAL", "confidence": "medium", "explanation": "some sections missing"}"#;
        let (verdict, confidence, explanation) = parse_reply(raw);
        assert_eq!(verdict, Verdict::Partial);
        assert_eq!(confidence, Confidence::Medium);
        assert_eq!(explanation, "some sections missing");
    }

    #[test]
    fn test_unparseable_reply_fails_conservatively() {
        let (verdict, confidence, explanation) = parse_reply("I think it looks fine overall.");
        assert_eq!(verdict, Verdict::Fails);
        assert_eq!(confidence, Confidence::Low);
        assert_eq!(explanation, "response could not be parsed");
    }

    #[test]
    fn test_complies_loses_to_fails_in_same_line() {
        let (verdict, _, _) = parse_reply("VERDICT: COMPLIES in parts but FAILS overall");
        assert_eq!(verdict, Verdict::Fails);
    }

    #[test]
    fn test_labels_case_insensitive() {
        let (verdict, confidence, _) = parse_reply("verdict: partial\nconfidence: low");
        assert_eq!(verdict, Verdict::Partial);
        assert_eq!(confidence, Confidence::Low);
    }

    #[test]
    fn test_missing_confidence_defaults_medium() {
        let (verdict, confidence, _) = parse_reply("VERDICT: COMPLIES");
        assert_eq!(verdict, Verdict::Complies);
        assert_eq!(confidence, Confidence::Medium);
    }
}
