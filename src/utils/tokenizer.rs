//! Token estimation for chunk budgeting.
//!
//! Evaluator backends use proprietary tokenizers, so exact counts are
//! unavailable here. The character heuristic (~4 chars per token for
//! English-heavy repository text) is deliberately cheap: it runs once per
//! file per rule and only steers chunk boundaries, never billing.

/// Appended when a chunk is hard-truncated to fit a token budget.
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// Fast heuristic token estimation based on character count.
pub fn estimate_tokens(text: &str, chars_per_token: usize) -> usize {
    let chars_per_token = chars_per_token.max(1);
    text.len().div_ceil(chars_per_token)
}

/// Truncates `text` so its estimated token count fits `max_tokens`,
/// appending [`TRUNCATION_MARKER`]. Returns the text unchanged when it
/// already fits.
pub fn truncate_to_tokens(text: &str, max_tokens: usize, chars_per_token: usize) -> String {
    let chars_per_token = chars_per_token.max(1);
    let max_chars = max_tokens.saturating_mul(chars_per_token);

    if text.len() <= max_chars {
        return text.to_string();
    }

    let budget = max_chars.saturating_sub(TRUNCATION_MARKER.len());
    // Back off to a char boundary so multi-byte text never splits mid-char.
    let mut cut = budget.min(text.len());
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }

    let mut truncated = text[..cut].to_string();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
