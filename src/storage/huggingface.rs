//! Model URL resolution
//!
//! The model URL in the settings may be a plain `http(s)://` URL or a short
//! HuggingFace reference such as `TheBloke/Llama-2-7B-Chat-GGUF/llama-2-7b-chat.Q4_K_M.gguf`.

use crate::storage::model_source::DownloadError;

/// A file inside a HuggingFace repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuggingFaceRef {
    pub repo_id: String,
    pub filename: String,
    pub revision: String,
}

impl HuggingFaceRef {
    /// Parse `owner/repo/path/to/file.gguf`, optionally suffixed with `@revision`
    pub fn parse(reference: &str) -> Result<Self, DownloadError> {
        let reference = reference.trim().trim_matches('/');
        let (path, revision) = match reference.rsplit_once('@') {
            Some((path, revision)) if !revision.is_empty() => (path, revision),
            _ => (reference, "main"),
        };

        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        if parts.len() < 3 {
            return Err(DownloadError::InvalidUrl(format!(
                "{reference}: expected owner/repo/file"
            )));
        }

        Ok(Self {
            repo_id: format!("{}/{}", parts[0], parts[1]),
            filename: parts[2..].join("/"),
            revision: revision.to_string(),
        })
    }

    /// Direct download URL of the file
    pub fn download_url(&self) -> String {
        format!(
            "https://huggingface.co/{}/resolve/{}/{}",
            self.repo_id, self.revision, self.filename
        )
    }
}

/// Turn the configured model URL into something reqwest can fetch.
///
/// HuggingFace `blob` page links are rewritten to their `resolve` form so the
/// raw file is downloaded instead of the HTML page.
pub fn resolve_model_url(url: &str) -> Result<String, DownloadError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(DownloadError::InvalidUrl("empty model URL".to_string()));
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        if url.contains("huggingface.co/") && url.contains("/blob/") {
            return Ok(url.replacen("/blob/", "/resolve/", 1));
        }
        return Ok(url.to_string());
    }

    Ok(HuggingFaceRef::parse(url)?.download_url())
}

/// Get a human-readable size string
pub fn format_size(bytes: u64) -> String {
    let bytes = bytes as f64;
    if bytes < 1024.0 {
        format!("{} B", bytes as u64)
    } else if bytes < 1024.0 * 1024.0 {
        format!("{:.2} KB", bytes / 1024.0)
    } else if bytes < 1024.0 * 1024.0 * 1024.0 {
        format!("{:.2} MB", bytes / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_reference() {
        let parsed =
            HuggingFaceRef::parse("TheBloke/Llama-2-7B-Chat-GGUF/llama-2-7b-chat.Q4_K_M.gguf")
                .unwrap();
        assert_eq!(parsed.repo_id, "TheBloke/Llama-2-7B-Chat-GGUF");
        assert_eq!(parsed.filename, "llama-2-7b-chat.Q4_K_M.gguf");
        assert_eq!(parsed.revision, "main");
    }

    #[test]
    fn test_parse_reference_with_revision_and_subdir() {
        let parsed = HuggingFaceRef::parse("org/repo/q4/model.gguf@v2").unwrap();
        assert_eq!(parsed.filename, "q4/model.gguf");
        assert_eq!(
            parsed.download_url(),
            "https://huggingface.co/org/repo/resolve/v2/q4/model.gguf"
        );
    }

    #[test]
    fn test_parse_repo_only_is_rejected() {
        assert!(matches!(
            HuggingFaceRef::parse("TheBloke/Llama-2-7B-Chat-GGUF"),
            Err(DownloadError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_resolve_urls() {
        assert_eq!(
            resolve_model_url("https://example.com/m.gguf").unwrap(),
            "https://example.com/m.gguf"
        );
        assert_eq!(
            resolve_model_url("https://huggingface.co/a/b/blob/main/m.gguf").unwrap(),
            "https://huggingface.co/a/b/resolve/main/m.gguf"
        );
        assert_eq!(
            resolve_model_url("a/b/m.gguf").unwrap(),
            "https://huggingface.co/a/b/resolve/main/m.gguf"
        );
        assert!(resolve_model_url("  ").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
