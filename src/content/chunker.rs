use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::Rule;
use crate::config::ChunkingConfig;
use crate::content::analysis::ContentAnalysis;
use crate::content::relevance::{extract_rule_keywords, relevance_score};
use crate::content::strategies::{file_section, Chunk, ChunkKind, ChunkStrategy};
use crate::utils::{estimate_tokens, truncate_to_tokens};

/// The chunking outcome for one rule. `requires_chunking == false` means
/// the single chunk carries all matched content joined together.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkPlan {
    pub requires_chunking: bool,
    pub chunks: Vec<Chunk>,
    pub analysis: ContentAnalysis,
    pub strategy_used: ChunkStrategy,
    pub original_size: usize,
}

impl ChunkPlan {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Splits rule content into evaluator-sized chunks. Planning never fails:
/// a strategy that produces nothing falls back to size-based splitting,
/// and every returned chunk fits the token budget.
#[derive(Debug, Clone, Default)]
pub struct ContentChunker {
    config: ChunkingConfig,
}

impl ContentChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn plan(&self, rule: &Rule, content: &BTreeMap<String, String>) -> ChunkPlan {
        let analysis = ContentAnalysis::analyze(content, rule, &self.config);

        if analysis.total_size <= self.config.max_chunk_chars() {
            let combined = content
                .iter()
                .map(|(path, text)| file_section(path, text))
                .collect::<Vec<_>>()
                .join("\n\n");
            let size_tokens = estimate_tokens(&combined, self.config.chars_per_token);
            return ChunkPlan {
                requires_chunking: false,
                chunks: vec![Chunk {
                    content: combined,
                    kind: ChunkKind::SizeBased,
                    size_tokens,
                    rule_focus: false,
                }],
                analysis,
                strategy_used: ChunkStrategy::BySize,
                original_size: content.values().map(String::len).sum(),
            };
        }

        let mut strategy = analysis.recommended_strategy;
        let mut chunks = strategy.splitter().split(content, rule, &self.config);

        if chunks.is_empty() && strategy != ChunkStrategy::BySize {
            warn!(
                rule_id = %rule.id,
                strategy = %strategy,
                "strategy produced no chunks, falling back to size-based splitting"
            );
            strategy = ChunkStrategy::BySize;
            chunks = strategy.splitter().split(content, rule, &self.config);
        }

        let chunks = self.optimize(chunks, rule, strategy);

        debug!(
            rule_id = %rule.id,
            strategy = %strategy,
            chunks = chunks.len(),
            total_size = analysis.total_size,
            "planned chunked validation"
        );

        ChunkPlan {
            requires_chunking: true,
            chunks,
            analysis,
            strategy_used: strategy,
            original_size: content.values().map(String::len).sum(),
        }
    }

    /// Enforces the per-chunk token budget, drops fragments too small to
    /// carry signal, and caps the chunk count per rule.
    fn optimize(&self, chunks: Vec<Chunk>, rule: &Rule, strategy: ChunkStrategy) -> Vec<Chunk> {
        let mut optimized: Vec<Chunk> = Vec::with_capacity(chunks.len());

        for mut chunk in chunks {
            if chunk.size_tokens > self.config.max_chunk_tokens {
                chunk.content = truncate_to_tokens(
                    &chunk.content,
                    self.config.max_chunk_tokens,
                    self.config.chars_per_token,
                );
                chunk.size_tokens = self.config.max_chunk_tokens;
            }
            if chunk.content.len() < self.config.min_chunk_chars {
                continue;
            }
            optimized.push(chunk);
        }

        if optimized.len() > self.config.max_chunks_per_rule {
            match strategy {
                // These strategies carry relevance intent, so keep the
                // chunks that best match the rule.
                ChunkStrategy::ByRelevance | ChunkStrategy::Hybrid => {
                    let keywords = extract_rule_keywords(rule);
                    optimized.sort_by(|a, b| {
                        let score_a = relevance_score(&a.content, &keywords);
                        let score_b = relevance_score(&b.content, &keywords);
                        score_b
                            .partial_cmp(&score_a)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    });
                }
                _ => {}
            }
            optimized.truncate(self.config.max_chunks_per_rule);
        }

        optimized
    }
}
