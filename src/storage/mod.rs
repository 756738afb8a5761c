//! Persistent storage
//!
//! This module handles settings persistence and locating or fetching the
//! model file.

pub mod huggingface;
pub mod model_source;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not determine the data directory")]
    NoDataDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Platform data directory of the application
///
/// Linux: ~/.local/share/llamafaq
/// macOS: ~/Library/Application Support/com.LlamaFaq.LlamaFaq
/// Windows: %APPDATA%\LlamaFaq\LlamaFaq\data
pub fn get_data_dir() -> Result<PathBuf, StorageError> {
    directories::ProjectDirs::from("com", "LlamaFaq", "LlamaFaq")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(StorageError::NoDataDir)
}
