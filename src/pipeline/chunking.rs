//! Segment-size heuristics and text segmentation helpers.
//!
//! The pipeline bounds each text segment by a token budget derived from the
//! configured generation model's context window, so that excerpts built from a
//! handful of segments stay well inside the prompt budget. Callers can override
//! the derived size via `TEXT_SPLITTER_CHUNK_SIZE`. Token counting prefers
//! `tiktoken-rs`; local model names without a known encoding fall back to the
//! `cl100k_base` estimate. Splitting itself is semantic (paragraphs, then
//! sentences, then words) and never breaks mid-word.

use semchunk_rs::Chunker;
use std::sync::Arc;
use tiktoken_rs::{cl100k_base, get_bpe_from_model};

use super::types::ChunkingError;

type TokenCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

const MIN_SEGMENT_TOKENS: usize = 256;
const MAX_SEGMENT_TOKENS: usize = 1024;

/// Determine the segment token budget, respecting an explicit override.
///
/// Without an override the budget is the model context window divided by 8,
/// clamped into `[256, 1024]`: prompt excerpts combine up to five segments plus
/// instructions and must fit the window comfortably.
pub(crate) fn determine_segment_size(override_size: Option<usize>, model: &str) -> usize {
    if let Some(explicit) = override_size {
        return explicit.max(1);
    }

    let window = generation_context_window(model);
    let base = (window / 8).max(1);
    base.clamp(MIN_SEGMENT_TOKENS, MAX_SEGMENT_TOKENS)
}

/// Look up the context window for a generation model served by Ollama.
///
/// Tags (e.g. `llama3.1:8b`) are stripped before matching. Unknown models get a
/// conservative 8k estimate.
pub(crate) fn generation_context_window(model: &str) -> usize {
    let normalized = model.to_lowercase();
    let name = normalized.split(':').next().unwrap_or(&normalized);
    match name {
        "llama3.1" | "llama3.2" | "llama3.3" => 131_072,
        "llama3" => 8_192,
        "llama2" => 4_096,
        "mistral" | "mistral-nemo" | "qwen2.5" => 32_768,
        "gemma2" => 8_192,
        "phi3" => 4_096,
        _ => {
            tracing::trace!(model, "Using default context window estimate");
            8_192
        }
    }
}

/// Split text into segments bounded by `segment_size` tokens.
///
/// - Segment order follows document order.
/// - `overlap` requests a sliding token overlap between adjacent segments; the
///   overlap is dropped for any pair where it would push the combined segment
///   past the budget.
/// - Returns an empty vector when the input is all whitespace.
pub(crate) fn chunk_text(
    text: &str,
    segment_size: usize,
    overlap: usize,
    model: &str,
) -> Result<Vec<String>, ChunkingError> {
    if segment_size == 0 {
        return Err(ChunkingError::InvalidSegmentSize);
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let token_counter = build_token_counter(model)?;
    Ok(chunk_text_with_counter(
        text,
        segment_size,
        overlap,
        token_counter,
    ))
}

/// Build a token counter for the given model.
///
/// Model names unknown to `tiktoken` (typical for Ollama aliases) fall back to
/// the `cl100k_base` encoding, which is a close-enough estimate for budget
/// enforcement.
pub(crate) fn build_token_counter(model: &str) -> Result<TokenCounter, ChunkingError> {
    let encoding = match get_bpe_from_model(model) {
        Ok(encoding) => encoding,
        Err(model_err) => {
            tracing::debug!(
                model,
                error = %model_err,
                "Tokenizer model lookup failed; using cl100k_base estimate"
            );
            cl100k_base().map_err(|source| ChunkingError::Tokenizer {
                model: model.to_string(),
                source,
            })?
        }
    };
    let encoding = Arc::new(encoding);

    Ok(Arc::new(move |segment: &str| {
        encoding.encode_ordinary(segment).len()
    }))
}

fn chunk_text_with_counter(
    text: &str,
    segment_size: usize,
    overlap: usize,
    token_counter: TokenCounter,
) -> Vec<String> {
    let counter_for_chunker = token_counter.clone();
    let chunker = Chunker::new(
        segment_size,
        Box::new(move |segment: &str| counter_for_chunker.as_ref()(segment)),
    );
    let segments = chunker.chunk(text);
    apply_overlap(segments, segment_size, overlap, &token_counter)
}

/// Prepend the token-limited tail of each previous segment to its successor.
fn apply_overlap(
    segments: Vec<String>,
    segment_size: usize,
    overlap: usize,
    token_counter: &TokenCounter,
) -> Vec<String> {
    let effective_overlap = overlap.min(segment_size.saturating_sub(1));
    if effective_overlap == 0 || segments.len() < 2 {
        return segments;
    }

    let mut overlapped = Vec::with_capacity(segments.len());
    overlapped.push(segments[0].clone());
    for pair in segments.windows(2) {
        overlapped.push(overlapped_segment(
            &pair[0],
            &pair[1],
            effective_overlap,
            segment_size,
            token_counter,
        ));
    }
    overlapped
}

fn overlapped_segment(
    previous: &str,
    current: &str,
    overlap: usize,
    segment_size: usize,
    token_counter: &TokenCounter,
) -> String {
    let tail = word_tail(previous, overlap, token_counter);
    if tail.is_empty() {
        return current.to_string();
    }

    let combined = format!("{tail} {current}");
    if token_counter.as_ref()(&combined) <= segment_size {
        combined
    } else {
        // The base segment already saturates the budget; keep it intact rather
        // than trimming its own content to make room for the overlap.
        current.to_string()
    }
}

/// Longest whole-word suffix of `text` that fits within `token_limit` tokens.
fn word_tail(text: &str, token_limit: usize, token_counter: &TokenCounter) -> String {
    if token_limit == 0 {
        return String::new();
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let mut tail = String::new();
    for take in 1..=words.len() {
        let candidate = words[words.len() - take..].join(" ");
        if token_counter.as_ref()(&candidate) > token_limit {
            break;
        }
        tail = candidate;
    }
    tail
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitespace_counter() -> TokenCounter {
        Arc::new(|segment: &str| segment.split_whitespace().count())
    }

    #[test]
    fn chunking_respects_segment_size() {
        let text = "one two three four five";
        let segments = chunk_text_with_counter(text, 2, 0, whitespace_counter());
        assert_eq!(segments, vec!["one two", "three four", "five"]);
    }

    #[test]
    fn chunking_handles_empty_input() {
        let segments = chunk_text("   \n  ", 4, 0, "llama3.1").expect("chunking succeeds");
        assert!(segments.is_empty());
    }

    #[test]
    fn chunking_rejects_zero_segment_size() {
        let error = chunk_text("hello", 0, 0, "llama3.1").expect_err("invalid size");
        assert!(matches!(error, ChunkingError::InvalidSegmentSize));
    }

    #[test]
    fn overlap_carries_tail_of_previous_segment() {
        let text = "one two three four five";
        let counter = whitespace_counter();
        let segments = chunk_text_with_counter(text, 3, 1, counter.clone());
        assert_eq!(segments, vec!["one two three", "three four five"]);
        for segment in &segments {
            assert!(counter.as_ref()(segment) <= 3);
        }
    }

    #[test]
    fn overlap_is_dropped_when_budget_is_saturated() {
        let counter = whitespace_counter();
        let result = overlapped_segment("alpha beta", "gamma delta", 1, 2, &counter);
        assert_eq!(result, "gamma delta");
    }

    #[test]
    fn word_tail_never_splits_words() {
        let counter = whitespace_counter();
        assert_eq!(word_tail("alpha beta gamma", 2, &counter), "beta gamma");
        assert_eq!(word_tail("alpha", 3, &counter), "alpha");
        assert_eq!(word_tail("alpha", 0, &counter), "");
    }

    #[test]
    fn segments_preserve_document_order() {
        let text = "First paragraph with some words.\n\nSecond paragraph follows.\n\nThird one closes.";
        let segments = chunk_text_with_counter(text, 6, 0, whitespace_counter());
        assert!(segments.len() > 1);
        let first_pos = text.find("First").expect("marker");
        let last_segment = segments.last().expect("non-empty");
        let last_pos = text.find(last_segment.split_whitespace().last().expect("word"));
        assert!(last_pos.expect("found") > first_pos);
    }

    #[test]
    fn determine_segment_size_prefers_override() {
        assert_eq!(determine_segment_size(Some(42), "llama3.1"), 42);
    }

    #[test]
    fn determine_segment_size_clamps_large_windows() {
        // 131072 / 8 far exceeds the cap.
        assert_eq!(determine_segment_size(None, "llama3.1"), 1024);
    }

    #[test]
    fn determine_segment_size_scales_with_smaller_windows() {
        assert_eq!(determine_segment_size(None, "llama2"), 512);
        assert_eq!(determine_segment_size(None, "llama3"), 1024);
    }

    #[test]
    fn context_window_strips_model_tags() {
        assert_eq!(generation_context_window("llama3.1:8b"), 131_072);
        assert_eq!(generation_context_window("unknown-model"), 8_192);
    }
}
