//! Model types
//!
//! Defines metadata about the loaded model file.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Information about a loaded model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// File name of the GGUF model
    pub name: String,
    /// Path to the GGUF file
    pub path: String,
    /// Model size in bytes
    pub size_bytes: u64,
    /// Number of parameters reported by the model
    pub parameters: Option<u64>,
}

impl ModelInfo {
    pub fn from_path(path: &Path, parameters: Option<u64>) -> Self {
        Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            path: path.to_string_lossy().to_string(),
            size_bytes: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_reads_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.gguf");
        std::fs::write(&path, b"GGUF1234").unwrap();

        let info = ModelInfo::from_path(&path, Some(7));
        assert_eq!(info.name, "tiny.gguf");
        assert_eq!(info.size_bytes, 8);
        assert_eq!(info.parameters, Some(7));
    }
}
