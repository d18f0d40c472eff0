use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Catalog parse failed: {failed} of {total} rule records were rejected")]
    CatalogParse { failed: usize, total: usize },

    #[error("No validation outcomes to consolidate")]
    EmptyOutcomeSet,

    #[error("Evaluator call failed: {0}")]
    Evaluator(String),

    #[error("Rule source error: {0}")]
    RuleSource(String),

    #[error("Content source error: {0}")]
    ContentSource(String),

    #[error("Report sink error: {0}")]
    ReportSink(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GateError>;
