pub mod tokenizer;

pub use tokenizer::{estimate_tokens, truncate_to_tokens, TRUNCATION_MARKER};
