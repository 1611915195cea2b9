//! Context assembly from retrieval results.
//!
//! Filters retrieved chunks by a relevance threshold, ranks them by
//! similarity score (this sort is authoritative; the index's own
//! order is not trusted), and renders them into one text block with
//! provenance annotations for the prompt builder.

use crate::models::RetrievalResult;

/// Returned verbatim when nothing clears the threshold. A valid
/// outcome: downstream consumes it as literal context.
pub const NO_RELEVANT_DOCUMENTS: &str = "No relevant documents found for the query.";

/// Filter, rank, and render retrieval results into a context block.
///
/// Results scoring below `relevance_threshold` are dropped. Survivors
/// are sorted by score descending (stable, ties keep their incoming
/// order) and rendered as provenance header, chunk text, blank line.
pub fn assemble_context(results: &[RetrievalResult], relevance_threshold: f32) -> String {
    let mut relevant: Vec<&RetrievalResult> = results
        .iter()
        .filter(|r| r.score >= relevance_threshold)
        .collect();

    if relevant.is_empty() {
        return NO_RELEVANT_DOCUMENTS.to_string();
    }

    relevant.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut context = String::new();
    for result in relevant {
        context.push_str(&format!(
            "Source: {}, Chunk Index: {}, Similarity Score: {:.4}\n{}\n\n",
            result.metadata.source,
            result.metadata.chunk_index,
            result.score,
            result.metadata.text
        ));
    }
    context.trim_end().to_string()
}
