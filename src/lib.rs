//! # FinEduGuide
//!
//! A retrieval-augmented content generation service for banking and
//! financial education.
//!
//! Users upload documents (PDF or plain text); the service extracts,
//! cleans, and chunks the text, embeds each chunk through a hosted
//! embedding service, and upserts the vectors to an external index.
//! Later queries retrieve the most similar chunks, assemble them into
//! a context block, and prompt a hosted language model to explain a
//! concept, generate a quiz, or summarize.
//!
//! ## Architecture
//!
//! ```text
//! upload ──▶ Extract ──▶ Clean ──▶ Chunk ──▶ Embed ──▶ Index
//!                                              ▲
//! query ───────────────────────────────────────┘
//!   └─▶ Retrieve ──▶ Assemble ──▶ Prompt ──▶ Generate ──▶ text
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Pipeline error taxonomy |
//! | [`models`] | Core data types |
//! | [`extract`] | Text extraction (TXT, PDF, OCR dispatch) |
//! | [`ocr`] | OCR engine abstraction |
//! | [`clean`] | Text cleaning |
//! | [`chunk`] | Recursive separator chunking |
//! | [`query`] | User query normalization |
//! | [`embedding`] | Embedding service client |
//! | [`index`] | Vector index client and gateway |
//! | [`context`] | Context assembly and ranking |
//! | [`prompt`] | Task templates |
//! | [`generate`] | Generation gateway |
//! | [`storage`] | Object storage client |
//! | [`server`] | HTTP API |

pub mod chunk;
pub mod clean;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generate;
pub mod index;
pub mod models;
pub mod ocr;
pub mod prompt;
pub mod query;
pub mod server;
pub mod storage;
