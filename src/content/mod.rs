mod analysis;
mod chunker;
mod relevance;
mod strategies;

pub use analysis::{ContentAnalysis, FileKind};
pub use chunker::{ChunkPlan, ContentChunker};
pub use relevance::{extract_rule_keywords, relevance_score};
pub use strategies::{Chunk, ChunkKind, ChunkStrategy, SplitStrategy};
