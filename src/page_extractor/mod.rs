//! Job posting extraction module
//!
//! Selector-driven field extraction over the rendered page markup.

pub mod extractors;
pub mod rules;
pub mod schema;

// Re-export commonly used types
pub use extractors::{extract, extract_from_html};
pub use rules::{CompiledRules, SelectorRules};
pub use schema::{ExtractedFields, JobMetadata, JobPosting};
