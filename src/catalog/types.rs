use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Rule record as delivered by a rule source, before validation.
/// Loose on purpose: unknown type/criticality strings are normalized
/// during catalog processing instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRule {
    pub id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default = "default_criticality")]
    pub criticality: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_criticality() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Structural,
    Content,
    Semantic,
}

impl RuleType {
    /// Normalizes the type synonyms rule authors actually write.
    /// Returns `None` for unrecognized values so the caller can warn and
    /// apply the content default.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "structural" | "structure" => Some(Self::Structural),
            "content" | "contents" => Some(Self::Content),
            "semantic" | "semantics" => Some(Self::Semantic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Content => "content",
            Self::Semantic => "semantic",
        }
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Low,
    Medium,
    High,
}

impl Criticality {
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" | "critical" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Weight used by semantic complexity scoring.
    pub fn complexity_weight(&self) -> f32 {
        match self {
            Self::High => 0.8,
            Self::Medium => 0.5,
            Self::Low => 0.2,
        }
    }
}

impl std::fmt::Display for Criticality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated rule from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub description: String,
    pub rule_type: RuleType,
    pub criticality: Criticality,
    /// File references, ordered; the first is the primary artifact.
    pub references: Vec<String>,
    pub explanation: Option<String>,
    pub tags: Vec<String>,
}

impl Rule {
    pub fn summary(&self) -> String {
        format!(
            "[{}] {} ({}, {})",
            self.id, self.description, self.rule_type, self.criticality
        )
    }

    pub fn primary_reference(&self) -> Option<&str> {
        self.references.first().map(String::as_str)
    }

    /// Whether `path` is covered by any of this rule's references.
    /// Wildcard references use glob semantics; plain references match when
    /// contained in the path or when the path ends with them.
    pub fn matches_file(&self, path: &str) -> bool {
        self.references
            .iter()
            .any(|reference| reference_matches(reference, path))
    }
}

pub(crate) fn reference_matches(reference: &str, path: &str) -> bool {
    if reference.contains('*') {
        Pattern::new(reference)
            .map(|pattern| pattern.matches(path))
            .unwrap_or(false)
    } else {
        path.contains(reference) || path.ends_with(reference)
    }
}

/// Shape class of a file reference, used to batch content fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternClass {
    MarkdownFiles,
    CodeFiles,
    ConfigFiles,
    Wildcard,
    PathSpecific,
    ExactName,
}

impl PatternClass {
    pub fn detect(reference: &str) -> Self {
        let lower = reference.to_lowercase();
        if lower.ends_with(".md") {
            Self::MarkdownFiles
        } else if CODE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            Self::CodeFiles
        } else if CONFIG_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            Self::ConfigFiles
        } else if reference.contains('*') {
            Self::Wildcard
        } else if reference.contains('/') {
            Self::PathSpecific
        } else {
            Self::ExactName
        }
    }
}

pub(crate) const CODE_EXTENSIONS: &[&str] = &[
    ".rs", ".py", ".js", ".ts", ".java", ".go", ".cpp", ".c", ".h",
];

pub(crate) const CONFIG_EXTENSIONS: &[&str] =
    &[".json", ".yaml", ".yml", ".toml", ".ini", ".conf"];
