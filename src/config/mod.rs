use serde::{Deserialize, Serialize};

use crate::selector::SelectionStrategy;

fn validate_ratio(value: f32, name: &str) -> Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "{} must be between 0.0 and 1.0, got {}",
            name, value
        ))
    }
}

fn validate_nonzero(value: usize, name: &str) -> Result<(), String> {
    if value == 0 {
        Err(format!("{} must be greater than zero", name))
    } else {
        Ok(())
    }
}

/// Top-level configuration for a validation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub strategy: SelectionStrategy,
    pub chunking: ChunkingConfig,
    pub selector: SelectorConfig,
    pub structural: StructuralThresholds,
    pub consolidation: ConsolidationConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.chunking.validate()?;
        self.selector.validate()?;
        self.structural.validate()?;
        self.consolidation.validate()?;
        Ok(())
    }
}

// CHUNKING
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Token budget per chunk.
    pub max_chunk_tokens: usize,
    /// Heuristic conversion ratio for token estimation.
    pub chars_per_token: usize,
    /// Hard cap on chunks dispatched per rule.
    pub max_chunks_per_rule: usize,
    /// Chunks with less useful content than this are dropped.
    pub min_chunk_chars: usize,
    /// Markdown section count above which structure-based splitting wins.
    pub section_split_threshold: usize,
    /// Code file count above which code-structure splitting wins.
    pub code_split_threshold: usize,
    /// Oversized file count above which relevance ranking wins.
    pub oversized_split_threshold: usize,
    /// Minimum keyword-overlap score for a documentation section to be kept.
    pub section_relevance_floor: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: 8000,
            chars_per_token: 4,
            max_chunks_per_rule: 10,
            min_chunk_chars: 50,
            section_split_threshold: 5,
            code_split_threshold: 3,
            oversized_split_threshold: 2,
            section_relevance_floor: 0.3,
        }
    }
}

impl ChunkingConfig {
    /// Character budget of a single chunk.
    pub fn max_chunk_chars(&self) -> usize {
        self.max_chunk_tokens * self.chars_per_token.max(1)
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_nonzero(self.max_chunk_tokens, "max_chunk_tokens")?;
        validate_nonzero(self.chars_per_token, "chars_per_token")?;
        validate_nonzero(self.max_chunks_per_rule, "max_chunks_per_rule")?;
        validate_ratio(self.section_relevance_floor, "section_relevance_floor")?;
        Ok(())
    }
}

// TIER SELECTION
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Estimated cost ceiling (USD) for a single rule validation.
    pub max_cost_per_validation: f64,
    /// Conversion ratio for token estimates in capacity and cost checks.
    /// Keep in step with the chunking ratio so tier limits and chunk
    /// budgets agree.
    pub chars_per_token: usize,
    /// Content size (chars) that normalizes to full size complexity for
    /// content rules.
    pub content_size_norm: usize,
    /// Same normalization for semantic rules, which tolerate more context.
    pub semantic_size_norm: usize,
    /// Explanation length (chars) treated as maximally detailed.
    pub explanation_norm: usize,
    /// Content rules above this complexity escalate to the premium tier
    /// under the balanced strategy.
    pub content_complexity_threshold: f32,
    /// Semantic complexity above which the balanced strategy always picks
    /// premium.
    pub semantic_premium_threshold: f32,
    /// Semantic complexity above which medium-criticality rules escalate.
    pub semantic_medium_threshold: f32,
    /// Semantic complexity above which even the speed strategy pays for
    /// premium on high-criticality rules.
    pub speed_premium_threshold: f32,
    /// Semantic content at or above this size needs premium even when
    /// optimizing for cost.
    pub economy_semantic_size_limit: usize,
    /// Content below this size counts as small for quality-optimized
    /// downgrades.
    pub small_content_limit: usize,
    /// Expected output tokens per evaluation, for cost estimates.
    pub estimated_output_tokens: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_cost_per_validation: 0.05,
            chars_per_token: 4,
            content_size_norm: 100_000,
            semantic_size_norm: 150_000,
            explanation_norm: 500,
            content_complexity_threshold: 0.5,
            semantic_premium_threshold: 0.7,
            semantic_medium_threshold: 0.4,
            speed_premium_threshold: 0.8,
            economy_semantic_size_limit: 50_000,
            small_content_limit: 10_000,
            estimated_output_tokens: 200,
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_ratio(
            self.content_complexity_threshold,
            "content_complexity_threshold",
        )?;
        validate_ratio(self.semantic_premium_threshold, "semantic_premium_threshold")?;
        validate_ratio(self.semantic_medium_threshold, "semantic_medium_threshold")?;
        validate_ratio(self.speed_premium_threshold, "speed_premium_threshold")?;
        if self.max_cost_per_validation <= 0.0 {
            return Err("max_cost_per_validation must be positive".to_string());
        }
        validate_nonzero(self.chars_per_token, "chars_per_token")?;
        Ok(())
    }
}

// STRUCTURAL CHECKS
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralThresholds {
    /// Share of files under directories for a COMPLIES organization verdict.
    pub good_organization: f32,
    /// Share of files under directories for a PARTIAL organization verdict.
    pub partial_organization: f32,
    /// Share of cleanly named files for a COMPLIES naming verdict.
    pub excellent_naming: f32,
    /// Share of cleanly named files for a PARTIAL naming verdict.
    pub acceptable_naming: f32,
    pub max_filename_length: usize,
}

impl Default for StructuralThresholds {
    fn default() -> Self {
        Self {
            good_organization: 0.7,
            partial_organization: 0.4,
            excellent_naming: 0.9,
            acceptable_naming: 0.7,
            max_filename_length: 50,
        }
    }
}

impl StructuralThresholds {
    pub fn validate(&self) -> Result<(), String> {
        validate_ratio(self.good_organization, "good_organization")?;
        validate_ratio(self.partial_organization, "partial_organization")?;
        validate_ratio(self.excellent_naming, "excellent_naming")?;
        validate_ratio(self.acceptable_naming, "acceptable_naming")?;
        if self.partial_organization > self.good_organization {
            return Err("partial_organization must not exceed good_organization".to_string());
        }
        if self.acceptable_naming > self.excellent_naming {
            return Err("acceptable_naming must not exceed excellent_naming".to_string());
        }
        Ok(())
    }
}

// CONSOLIDATION
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Critical failures above this count reject the repository.
    /// Zero means any critical failure rejects.
    pub critical_failure_threshold: usize,
    /// Medium-criticality failures tolerated before rejection.
    pub medium_failure_threshold: usize,
    /// Low-criticality failures tolerated before rejection.
    pub low_failure_threshold: usize,
    /// Minimum average confidence score (High=3, Medium=2, Low=1) before a
    /// low-confidence concern is recorded.
    pub min_confidence_score: f32,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            critical_failure_threshold: 0,
            medium_failure_threshold: 2,
            low_failure_threshold: 5,
            min_confidence_score: 2.0,
        }
    }
}

impl ConsolidationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1.0..=3.0).contains(&self.min_confidence_score) {
            return Err(format!(
                "min_confidence_score must be between 1.0 and 3.0, got {}",
                self.min_confidence_score
            ));
        }
        Ok(())
    }
}
