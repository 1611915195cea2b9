//! Text cleaning stage.
//!
//! Normalizes extracted text before chunking: collapses whitespace
//! runs to single spaces, strips every character outside the allowed
//! punctuation/word/space set, and trims the ends. Idempotent.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
    /// Anything outside word characters, whitespace and the fixed
    /// punctuation allow-list `. , ! ? ; : - ' " ( )`.
    static ref DISALLOWED: Regex = Regex::new(r#"[^\w\s.,!?;:\-'"()]"#).unwrap();
    static ref SPACE_RUN: Regex = Regex::new(r" {2,}").unwrap();
}

/// Produce cleaned text: no whitespace runs, restricted character set,
/// no leading/trailing whitespace.
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text, " ");
    let stripped = DISALLOWED.replace_all(&collapsed, "");
    let squeezed = SPACE_RUN.replace_all(&stripped, " ");
    squeezed.trim().to_string()
}
