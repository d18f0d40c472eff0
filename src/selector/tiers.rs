use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Evaluator capability tiers, cheapest to most capable.
///
/// `Programmatic` is the in-process checker used for structural rules; the
/// other two are external evaluators with real per-token cost.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorTier {
    Programmatic,
    Economy,
    Premium,
}

impl EvaluatorTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Programmatic => "programmatic",
            Self::Economy => "economy",
            Self::Premium => "premium",
        }
    }

    pub fn profile(&self) -> TierProfile {
        match self {
            Self::Programmatic => TierProfile {
                max_tokens: usize::MAX,
                cost_per_1k_input: 0.0,
                cost_per_1k_output: 0.0,
                avg_response_secs: 0.1,
                quality_score: 0.90,
            },
            Self::Economy => TierProfile {
                max_tokens: 200_000,
                cost_per_1k_input: 0.00025,
                cost_per_1k_output: 0.00125,
                avg_response_secs: 2.5,
                quality_score: 0.75,
            },
            Self::Premium => TierProfile {
                max_tokens: 200_000,
                cost_per_1k_input: 0.003,
                cost_per_1k_output: 0.015,
                avg_response_secs: 5.0,
                quality_score: 0.95,
            },
        }
    }
}

impl std::fmt::Display for EvaluatorTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cost/latency/quality characteristics of one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierProfile {
    pub max_tokens: usize,
    pub cost_per_1k_input: f64,
    pub cost_per_1k_output: f64,
    pub avg_response_secs: f64,
    pub quality_score: f64,
}

impl TierProfile {
    /// Estimated dollars for one call: input tokens derived from content
    /// size at the configured character ratio, plus a fixed output
    /// allowance.
    pub fn estimate_cost(
        &self,
        content_size: usize,
        output_tokens: usize,
        chars_per_token: usize,
    ) -> f64 {
        let input_tokens = content_size.div_ceil(chars_per_token.max(1));
        (input_tokens as f64 / 1000.0) * self.cost_per_1k_input
            + (output_tokens as f64 / 1000.0) * self.cost_per_1k_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programmatic_is_free() {
        let profile = EvaluatorTier::Programmatic.profile();
        assert_eq!(profile.estimate_cost(1_000_000, 200, 4), 0.0);
    }

    #[test]
    fn test_premium_costs_more_than_economy() {
        let size = 40_000;
        let economy = EvaluatorTier::Economy.profile().estimate_cost(size, 200, 4);
        let premium = EvaluatorTier::Premium.profile().estimate_cost(size, 200, 4);
        assert!(premium > economy);
        assert!(economy > 0.0);
    }

    #[test]
    fn test_cost_scales_with_content_size() {
        let profile = EvaluatorTier::Economy.profile();
        assert!(profile.estimate_cost(100_000, 200, 4) > profile.estimate_cost(10_000, 200, 4));
    }

    #[test]
    fn test_cost_tracks_token_ratio() {
        let profile = EvaluatorTier::Economy.profile();
        // A tighter ratio means more tokens for the same content.
        assert!(profile.estimate_cost(100_000, 200, 1) > profile.estimate_cost(100_000, 200, 4));
    }
}
