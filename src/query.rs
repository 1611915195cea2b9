//! User query normalization.
//!
//! Queries arrive as free text from a web form. Before retrieval they
//! are trimmed, stripped of angle brackets, quotes and slashes, and
//! whitespace-collapsed; anything shorter than five characters after
//! that is rejected.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::PipelineError;

/// Minimum query length (characters) after normalization.
const MIN_QUERY_CHARS: usize = 5;

lazy_static! {
    static ref FORBIDDEN: Regex = Regex::new(r#"[<>"'/\\]"#).unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize a raw user query, rejecting queries that are too short to
/// retrieve against.
pub fn parse_user_query(query: &str) -> Result<String, PipelineError> {
    let topic = query.trim();
    let topic = FORBIDDEN.replace_all(topic, "");
    let topic = WHITESPACE_RUN.replace_all(&topic, " ");
    let topic = topic.trim().to_string();

    if topic.chars().count() < MIN_QUERY_CHARS {
        return Err(PipelineError::Validation(
            "Query too short. Please provide a more detailed query.".to_string(),
        ));
    }
    Ok(topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_plain_query_through() {
        assert_eq!(
            parse_user_query("What is compound interest?").unwrap(),
            "What is compound interest?"
        );
    }

    #[test]
    fn strips_markup_and_quotes() {
        assert_eq!(
            parse_user_query("<b>'interest'</b> \\rates\" ").unwrap(),
            "binterestb rates"
        );
    }

    #[test]
    fn collapses_inner_whitespace() {
        assert_eq!(parse_user_query("  fixed \t\n deposit ").unwrap(), "fixed deposit");
    }

    #[test]
    fn rejects_short_query() {
        let err = parse_user_query("api").unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn rejects_query_that_shrinks_below_minimum() {
        // Ten characters of markup boil down to two.
        let err = parse_user_query("<<\"//ab\"\\>>").unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }
}
