//! FAQ dataset and prompt construction
//!
//! Loads the product FAQ file, selects the entries relevant to a question and
//! renders the compact prompt handed to the model.

pub mod dataset;
pub mod prompt;
pub mod relevance;

pub use dataset::{FaqDataset, FaqEntry, ProductFaqs};
pub use prompt::{build_prompt, compact_prompt};
pub use relevance::relevant_entries;

use thiserror::Error;

/// Errors raised while loading or querying the FAQ dataset
#[derive(Debug, Error)]
pub enum FaqError {
    #[error("Failed to read FAQ file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid FAQ JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid FAQ structure at {0}")]
    InvalidShape(String),
    #[error("Unknown product: {0}")]
    UnknownProduct(String),
}
