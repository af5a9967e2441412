//! Prompt construction for the metadata generation round-trips.
//!
//! Each metadata field gets its own prompt over an excerpt assembled from the
//! leading segments of the document. Titles and tags tend to live near the
//! front matter, so leading segments are a reasonable stand-in for retrieval.

/// Segments combined into the title excerpt.
pub(crate) const TITLE_SEGMENTS: usize = 2;
/// Segments combined into the detailed summary excerpt.
pub(crate) const SUMMARY_SEGMENTS: usize = 5;
/// Segments combined into the short summary excerpt.
pub(crate) const SHORT_SUMMARY_SEGMENTS: usize = 3;
/// Segments combined into the tags excerpt.
pub(crate) const TAG_SEGMENTS: usize = 3;

/// Join the leading `max_segments` segments into one excerpt.
pub(crate) fn excerpt(segments: &[String], max_segments: usize) -> String {
    segments
        .iter()
        .take(max_segments.max(1))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt for a concise document title.
pub(crate) fn title_prompt(excerpt: &str) -> String {
    format!(
        "Based on this excerpt from a document:\n{excerpt}\n\n\
         Generate a concise, descriptive title for the document (at most 10 words).\n\
         Return only the title, without any additional explanation."
    )
}

/// Prompt for the detailed summary.
pub(crate) fn summary_prompt(excerpt: &str) -> String {
    format!(
        "Based on the following sections of a document:\n{excerpt}\n\n\
         Write a detailed summary (roughly 200-300 words) that:\n\
         1. Identifies the document type\n\
         2. Describes the main topics and key points in detail\n\
         3. Summarizes the most important conclusions or results"
    )
}

/// Prompt for the two-to-three sentence short summary.
pub(crate) fn short_summary_prompt(excerpt: &str) -> String {
    format!(
        "Based on this excerpt from a document:\n{excerpt}\n\n\
         Condense the key statements into 2-3 concise sentences.\n\
         The summary must not exceed 50 words."
    )
}

/// Prompt for the comma-separated tag list.
pub(crate) fn tags_prompt(excerpt: &str) -> String {
    format!(
        "Based on these sections of a document:\n{excerpt}\n\n\
         Generate a list of 5-8 relevant keywords describing the main topics, \
         contents, and type of the document.\n\
         Return only the keywords, separated by commas."
    )
}

/// Parse a comma-separated tag completion into an ordered tag list.
pub(crate) fn parse_tags(completion: &str) -> Vec<String> {
    completion
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
