//! LLM inference
//!
//! This module handles all interaction with llama-cpp for model loading and
//! streamed text generation.

pub mod engine;
pub mod streaming;

pub use engine::LlamaEngine;
pub use streaming::{StopSequenceFilter, StreamToken, TokenStream};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the inference layer
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Failed to initialize llama backend: {0}")]
    Backend(String),
    #[error("Model file not found: {0}")]
    ModelNotFound(String),
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    #[error("No model loaded")]
    ModelNotLoaded,
    #[error("Failed to create context: {0}")]
    Context(String),
    #[error("Tokenization failed: {0}")]
    Tokenize(String),
    #[error("Prompt too long: {tokens} tokens for a context of {context_size}")]
    PromptTooLong { tokens: usize, context_size: u32 },
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Failed to spawn generation thread: {0}")]
    Thread(String),
}

/// Settings applied when a model is loaded and a context is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Context window in tokens (prompt + answer)
    pub context_size: u32,
    /// Threads used for generation and prompt processing
    pub threads: u32,
    /// Maximum tokens decoded in one batch
    pub batch_size: u32,
    /// Number of layers offloaded to the GPU (0 = CPU only)
    pub gpu_layers: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            context_size: 512,
            threads: 6,
            batch_size: 512,
            gpu_layers: 32,
        }
    }
}

/// Sampling parameters for one answer
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Generation ends as soon as any of these appears; it is not emitted
    pub stop: Vec<String>,
    pub seed: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 128,
            temperature: 0.5,
            top_p: 0.9,
            stop: vec!["Q:".to_string(), "\n\n".to_string()],
            seed: 0,
        }
    }
}

/// Anything that can turn a prompt into a stream of text
pub trait TextGenerator {
    fn generate_stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<TokenStream, InferenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_config() {
        let config = ModelConfig::default();
        assert_eq!(config.context_size, 512);
        assert_eq!(config.threads, 6);
        assert_eq!(config.batch_size, 512);
        assert_eq!(config.gpu_layers, 32);
    }

    #[test]
    fn test_default_generation_params() {
        let params = GenerationParams::default();
        assert_eq!(params.max_tokens, 128);
        assert_eq!(params.temperature, 0.5);
        assert_eq!(params.top_p, 0.9);
        assert_eq!(params.stop, vec!["Q:", "\n\n"]);
    }
}
