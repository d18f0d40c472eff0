use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::Rule;
use crate::config::ChunkingConfig;
use crate::content::analysis::{documentation_name_pattern, markdown_header_pattern, FileKind};
use crate::content::relevance::{extract_rule_keywords, relevance_score};
use crate::utils::estimate_tokens;

/// Available splitting strategies. Each tag maps to one [`SplitStrategy`]
/// implementation via [`ChunkStrategy::splitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    BySize,
    ByDocumentStructure,
    ByCodeStructure,
    DocumentPriority,
    ByRelevance,
    Hybrid,
}

impl ChunkStrategy {
    pub fn splitter(self) -> Box<dyn SplitStrategy> {
        match self {
            Self::BySize => Box::new(BySizeSplitter),
            Self::ByDocumentStructure => Box::new(DocumentStructureSplitter),
            Self::ByCodeStructure => Box::new(CodeStructureSplitter),
            Self::DocumentPriority => Box::new(DocumentPrioritySplitter),
            Self::ByRelevance => Box::new(RelevanceSplitter),
            Self::Hybrid => Box::new(HybridSplitter),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BySize => "by_size",
            Self::ByDocumentStructure => "by_document_structure",
            Self::ByCodeStructure => "by_code_structure",
            Self::DocumentPriority => "document_priority",
            Self::ByRelevance => "by_relevance",
            Self::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag describing how a chunk was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    SizeBased,
    DocumentSections,
    CodeBlocks,
    DocumentationSection,
    RelevanceRanked,
    /// Whole file carried as-is inside a structure-aware strategy because
    /// the strategy's splitting rules do not apply to it.
    CarriedWhole,
}

/// A bounded slice of a rule's content, consumed once by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub kind: ChunkKind,
    pub size_tokens: usize,
    /// Set when the chunk was shaped around the rule (sections, ranked
    /// files) rather than cut blindly by size.
    pub rule_focus: bool,
}

impl Chunk {
    fn new(content: String, kind: ChunkKind, size_tokens: usize, rule_focus: bool) -> Self {
        Self {
            content,
            kind,
            size_tokens,
            rule_focus,
        }
    }
}

pub trait SplitStrategy: Send + Sync {
    fn split(
        &self,
        content: &BTreeMap<String, String>,
        rule: &Rule,
        config: &ChunkingConfig,
    ) -> Vec<Chunk>;
}

pub(crate) fn file_section(path: &str, text: &str) -> String {
    format!("--- {} ---\n{}", path, text)
}

/// Greedy bin-packing of whole files into token-bounded chunks, in input
/// order. The baseline every other strategy falls back to.
pub struct BySizeSplitter;

impl SplitStrategy for BySizeSplitter {
    fn split(
        &self,
        content: &BTreeMap<String, String>,
        _rule: &Rule,
        config: &ChunkingConfig,
    ) -> Vec<Chunk> {
        pack_sections(
            content
                .iter()
                .map(|(path, text)| {
                    (
                        file_section(path, text),
                        estimate_tokens(text, config.chars_per_token),
                    )
                })
                .collect(),
            config.max_chunk_tokens,
            ChunkKind::SizeBased,
            false,
        )
    }
}

fn pack_sections(
    sections: Vec<(String, usize)>,
    max_tokens: usize,
    kind: ChunkKind,
    rule_focus: bool,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_tokens = 0;

    for (section, tokens) in sections {
        if current_tokens + tokens > max_tokens && !current.is_empty() {
            chunks.push(Chunk::new(current.join("\n\n"), kind, current_tokens, rule_focus));
            current = vec![section];
            current_tokens = tokens;
        } else {
            current.push(section);
            current_tokens += tokens;
        }
    }

    if !current.is_empty() {
        chunks.push(Chunk::new(current.join("\n\n"), kind, current_tokens, rule_focus));
    }

    chunks
}

/// Splits markdown files by section headers; non-markdown files are
/// carried whole when they fit a chunk.
pub struct DocumentStructureSplitter;

impl SplitStrategy for DocumentStructureSplitter {
    fn split(
        &self,
        content: &BTreeMap<String, String>,
        _rule: &Rule,
        config: &ChunkingConfig,
    ) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (path, text) in content {
            if FileKind::classify(path) != FileKind::Markdown {
                let tokens = estimate_tokens(text, config.chars_per_token);
                if tokens <= config.max_chunk_tokens {
                    chunks.push(Chunk::new(
                        file_section(path, text),
                        ChunkKind::CarriedWhole,
                        tokens,
                        false,
                    ));
                }
                continue;
            }

            let sections: Vec<(String, usize)> = extract_markdown_sections(text)
                .into_iter()
                .map(|section| {
                    let tokens = estimate_tokens(&section.body, config.chars_per_token);
                    (format!("## {}\n{}", section.title, section.body), tokens)
                })
                .collect();

            for mut chunk in pack_sections(
                sections,
                config.max_chunk_tokens,
                ChunkKind::DocumentSections,
                true,
            ) {
                chunk.content = format!("--- {} ---\n{}", path, chunk.content);
                chunks.push(chunk);
            }
        }

        chunks
    }
}

/// Splits code files on function/class boundaries; non-code files are
/// carried whole when they fit.
pub struct CodeStructureSplitter;

impl SplitStrategy for CodeStructureSplitter {
    fn split(
        &self,
        content: &BTreeMap<String, String>,
        _rule: &Rule,
        config: &ChunkingConfig,
    ) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (path, text) in content {
            if FileKind::classify(path) != FileKind::Code {
                let tokens = estimate_tokens(text, config.chars_per_token);
                if tokens <= config.max_chunk_tokens {
                    chunks.push(Chunk::new(
                        file_section(path, text),
                        ChunkKind::CarriedWhole,
                        tokens,
                        false,
                    ));
                }
                continue;
            }

            let blocks: Vec<(String, usize)> = extract_code_blocks(text, path)
                .into_iter()
                .map(|block| {
                    let tokens = estimate_tokens(&block.body, config.chars_per_token);
                    (
                        format!("// {}: {}\n{}", block.kind, block.name, block.body),
                        tokens,
                    )
                })
                .collect();

            for mut chunk in pack_sections(
                blocks,
                config.max_chunk_tokens,
                ChunkKind::CodeBlocks,
                true,
            ) {
                chunk.content = format!("--- {} ---\n{}", path, chunk.content);
                chunks.push(chunk);
            }
        }

        chunks
    }
}

/// Documentation files first, each relevant section its own chunk, then
/// code fills whatever chunk budget remains.
pub struct DocumentPrioritySplitter;

impl SplitStrategy for DocumentPrioritySplitter {
    fn split(
        &self,
        content: &BTreeMap<String, String>,
        rule: &Rule,
        config: &ChunkingConfig,
    ) -> Vec<Chunk> {
        let keywords = extract_rule_keywords(rule);
        let mut chunks = Vec::new();
        let mut code_content = BTreeMap::new();

        for (path, text) in content {
            let is_doc = FileKind::classify(path) == FileKind::Markdown
                || documentation_name_pattern().is_match(path);
            if !is_doc {
                code_content.insert(path.clone(), text.clone());
                continue;
            }

            for section in relevant_sections(text, &keywords, config.section_relevance_floor) {
                let tokens = estimate_tokens(&section.body, config.chars_per_token);
                if tokens <= config.max_chunk_tokens {
                    chunks.push(Chunk::new(
                        format!("--- {}: {} ---\n{}", path, section.title, section.body),
                        ChunkKind::DocumentationSection,
                        tokens,
                        true,
                    ));
                }
            }
        }

        let remaining = config.max_chunks_per_rule.saturating_sub(chunks.len());
        if remaining > 0 && !code_content.is_empty() {
            let code_chunks = BySizeSplitter.split(&code_content, rule, config);
            chunks.extend(code_chunks.into_iter().take(remaining));
        }

        chunks
    }
}

/// Packs files highest keyword-overlap first so the most relevant content
/// survives any later chunk-count cap.
pub struct RelevanceSplitter;

impl SplitStrategy for RelevanceSplitter {
    fn split(
        &self,
        content: &BTreeMap<String, String>,
        rule: &Rule,
        config: &ChunkingConfig,
    ) -> Vec<Chunk> {
        let keywords = extract_rule_keywords(rule);

        let mut scored: Vec<(f32, &String, &String)> = content
            .iter()
            .map(|(path, text)| (relevance_score(text, &keywords), path, text))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        pack_sections(
            scored
                .into_iter()
                .map(|(score, path, text)| {
                    (
                        format!("--- {} (relevance: {:.2}) ---\n{}", path, score, text),
                        estimate_tokens(text, config.chars_per_token),
                    )
                })
                .collect(),
            config.max_chunk_tokens,
            ChunkKind::RelevanceRanked,
            true,
        )
    }
}

/// Partitions content by file kind, applies the matching strategy to each
/// partition, then re-ranks everything by relevance when over the cap.
pub struct HybridSplitter;

impl SplitStrategy for HybridSplitter {
    fn split(
        &self,
        content: &BTreeMap<String, String>,
        rule: &Rule,
        config: &ChunkingConfig,
    ) -> Vec<Chunk> {
        let mut markdown = BTreeMap::new();
        let mut code = BTreeMap::new();
        let mut other = BTreeMap::new();

        for (path, text) in content {
            match FileKind::classify(path) {
                FileKind::Markdown => markdown.insert(path.clone(), text.clone()),
                FileKind::Code => code.insert(path.clone(), text.clone()),
                _ => other.insert(path.clone(), text.clone()),
            };
        }

        let mut chunks = Vec::new();
        if !markdown.is_empty() {
            chunks.extend(DocumentStructureSplitter.split(&markdown, rule, config));
        }
        if !code.is_empty() {
            chunks.extend(CodeStructureSplitter.split(&code, rule, config));
        }
        if !other.is_empty() {
            chunks.extend(RelevanceSplitter.split(&other, rule, config));
        }

        if chunks.len() > config.max_chunks_per_rule {
            let keywords = extract_rule_keywords(rule);
            chunks.sort_by(|a, b| {
                let score_a = relevance_score(&a.content, &keywords);
                let score_b = relevance_score(&b.content, &keywords);
                score_b
                    .partial_cmp(&score_a)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            chunks.truncate(config.max_chunks_per_rule);
        }

        chunks
    }
}

// --- markdown / code structure extraction ---

pub(crate) struct MarkdownSection {
    pub title: String,
    pub body: String,
}

pub(crate) fn extract_markdown_sections(text: &str) -> Vec<MarkdownSection> {
    let header = markdown_header_pattern();
    let mut sections = Vec::new();
    let mut title = "Preamble".to_string();
    let mut body = String::new();

    for line in text.lines() {
        if let Some(captures) = header.captures(line) {
            if !body.trim().is_empty() {
                sections.push(MarkdownSection {
                    title: std::mem::take(&mut title),
                    body: std::mem::take(&mut body),
                });
            } else {
                body.clear();
            }
            title = captures[1].to_string();
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }

    if !body.trim().is_empty() {
        sections.push(MarkdownSection { title, body });
    }

    sections
}

fn relevant_sections(
    text: &str,
    keywords: &[String],
    relevance_floor: f32,
) -> Vec<MarkdownSection> {
    let all = extract_markdown_sections(text);
    let total = all.len();

    let mut relevant: Vec<MarkdownSection> = Vec::new();
    let mut skipped: Vec<MarkdownSection> = Vec::new();
    for section in all {
        let scored_text = format!("{} {}", section.title, section.body);
        if relevance_score(&scored_text, keywords) > relevance_floor {
            relevant.push(section);
        } else {
            skipped.push(section);
        }
    }

    // Nothing matched: keep the leading sections rather than sending nothing.
    if relevant.is_empty() && total > 0 {
        return skipped.into_iter().take(2).collect();
    }

    relevant
}

struct CodeBlock {
    kind: &'static str,
    name: String,
    body: String,
}

fn code_boundary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(fn|def|function|class|interface|impl|struct)\s+(\w+)")
            .expect("static regex")
    })
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Splits a source file at function/class boundaries. For
/// indentation-significant files a block closes when indentation returns
/// to or below its opening level; elsewhere the next boundary closes it.
fn extract_code_blocks(text: &str, path: &str) -> Vec<CodeBlock> {
    let boundary = code_boundary_pattern();
    let indentation_significant = path.ends_with(".py");

    let mut blocks: Vec<CodeBlock> = Vec::new();
    let mut current: Option<(CodeBlock, usize, usize)> = None; // block, open indent, open line

    for (line_no, line) in text.lines().enumerate() {
        if let Some(captures) = boundary.captures(line) {
            if let Some((block, _, _)) = current.take() {
                blocks.push(block);
            }
            let kind = match &captures[1] {
                "class" => "class",
                "interface" => "interface",
                "impl" => "impl",
                "struct" => "struct",
                _ => "function",
            };
            current = Some((
                CodeBlock {
                    kind,
                    name: captures[2].to_string(),
                    body: format!("{}\n", line),
                },
                indent_of(line),
                line_no,
            ));
            continue;
        }

        let mut close = false;
        if let Some((block, open_indent, open_line)) = current.as_mut() {
            block.body.push_str(line);
            block.body.push('\n');
            close = indentation_significant
                && !line.trim().is_empty()
                && indent_of(line) <= *open_indent
                && line_no > *open_line + 1;
        }
        if close {
            if let Some((block, _, _)) = current.take() {
                blocks.push(block);
            }
        }
    }

    if let Some((block, _, _)) = current.take() {
        blocks.push(block);
    }

    blocks
}
