use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::{Rule, RuleType};
use crate::config::ChunkingConfig;
use crate::content::strategies::ChunkStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Markdown,
    Code,
    Config,
    Other,
}

impl FileKind {
    pub fn classify(path: &str) -> Self {
        let lower = path.to_lowercase();
        if lower.ends_with(".md") {
            Self::Markdown
        } else if crate::catalog::types::CODE_EXTENSIONS
            .iter()
            .any(|ext| lower.ends_with(ext))
        {
            Self::Code
        } else if crate::catalog::types::CONFIG_EXTENSIONS
            .iter()
            .any(|ext| lower.ends_with(ext))
        {
            Self::Config
        } else {
            Self::Other
        }
    }
}

pub(crate) fn markdown_header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^#{1,6}\s+(.+)$").expect("static regex"))
}

pub(crate) fn documentation_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(README|CHANGELOG|CONTRIBUTING|INSTALL|SETUP)").expect("static regex")
    })
}

/// Pre-chunking content survey: sizes, file-kind histogram, document
/// structure signals, and the strategy recommendation derived from them.
#[derive(Debug, Clone, Serialize)]
pub struct ContentAnalysis {
    pub total_size: usize,
    pub file_count: usize,
    pub kind_counts: BTreeMap<FileKind, usize>,
    pub markdown_sections: usize,
    pub code_files: usize,
    pub documentation_files: usize,
    /// Files larger than twice the chunk budget.
    pub oversized_files: Vec<String>,
    pub recommended_strategy: ChunkStrategy,
    pub estimated_chunks: usize,
}

impl ContentAnalysis {
    pub fn analyze(content: &BTreeMap<String, String>, rule: &Rule, config: &ChunkingConfig) -> Self {
        let mut analysis = Self {
            total_size: content.values().map(String::len).sum(),
            file_count: content.len(),
            kind_counts: BTreeMap::new(),
            markdown_sections: 0,
            code_files: 0,
            documentation_files: 0,
            oversized_files: Vec::new(),
            recommended_strategy: ChunkStrategy::BySize,
            estimated_chunks: 1,
        };

        for (path, text) in content {
            let kind = FileKind::classify(path);
            *analysis.kind_counts.entry(kind).or_insert(0) += 1;

            match kind {
                FileKind::Markdown => {
                    analysis.markdown_sections +=
                        markdown_header_pattern().find_iter(text).count();
                    if documentation_name_pattern().is_match(path) {
                        analysis.documentation_files += 1;
                    }
                }
                FileKind::Code => analysis.code_files += 1,
                _ => {}
            }

            if text.len() > config.max_chunk_chars() * 2 {
                analysis.oversized_files.push(path.clone());
            }
        }

        analysis.recommended_strategy = analysis.pick_strategy(rule, config);
        analysis.estimated_chunks = analysis.estimate_chunks(config);
        analysis
    }

    /// Strategy selection combines rule type, description keywords,
    /// dominant content kind, and oversized-file count.
    fn pick_strategy(&self, rule: &Rule, config: &ChunkingConfig) -> ChunkStrategy {
        let description = rule.description.to_lowercase();

        if rule.rule_type == RuleType::Semantic {
            if description.contains("documentation")
                && (self.documentation_files > 0
                    || self.kind_counts.get(&FileKind::Markdown).copied().unwrap_or(0) > 0)
            {
                return ChunkStrategy::DocumentPriority;
            }
            if description.contains("architecture") && self.code_files > 0 {
                return ChunkStrategy::ByCodeStructure;
            }
            if description.contains("quality") || description.contains("practices") {
                return ChunkStrategy::Hybrid;
            }
        }

        let dominant = self
            .kind_counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(kind, _)| *kind)
            .unwrap_or(FileKind::Other);

        if dominant == FileKind::Markdown && self.markdown_sections > config.section_split_threshold
        {
            ChunkStrategy::ByDocumentStructure
        } else if dominant == FileKind::Code && self.code_files > config.code_split_threshold {
            ChunkStrategy::ByCodeStructure
        } else if self.oversized_files.len() > config.oversized_split_threshold {
            ChunkStrategy::ByRelevance
        } else {
            ChunkStrategy::BySize
        }
    }

    fn estimate_chunks(&self, config: &ChunkingConfig) -> usize {
        let mut estimated = (self.total_size / config.max_chunk_chars().max(1)).max(1);
        match self.recommended_strategy {
            ChunkStrategy::ByDocumentStructure => {
                estimated = estimated.max(self.markdown_sections / 3);
            }
            ChunkStrategy::ByCodeStructure => {
                estimated = estimated.max(self.code_files);
            }
            _ => {}
        }
        estimated.min(config.max_chunks_per_rule)
    }
}
