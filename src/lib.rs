//! Cross-language Wikipedia comparison core.
//!
//! Search Wikipedia, resolve an article's language-edition variants, fetch
//! their plain-text content with graceful partial failure, and ask an LLM
//! for a comparative analysis of how the versions differ.

pub mod config;
pub mod error;
pub mod language;
pub mod openai;
pub mod prompt;
pub mod snippet;
pub mod wikipedia;
