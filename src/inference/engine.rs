//! llama.cpp engine
//!
//! Wraps `llama-cpp-2`: the backend is initialized once per process, the model
//! is loaded on demand and every answer gets a fresh context on a worker
//! thread.

use crate::inference::streaming::{self, StopSequenceFilter, StreamSender, Utf8Decoder};
use crate::inference::{GenerationParams, InferenceError, ModelConfig, TextGenerator, TokenStream};
use crate::types::ModelInfo;
use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel, Special};
use llama_cpp_2::sampling::LlamaSampler;
use once_cell::sync::OnceCell;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;

static BACKEND: OnceCell<LlamaBackend> = OnceCell::new();

/// llama.cpp allows a single backend per process
fn backend() -> Result<&'static LlamaBackend, InferenceError> {
    BACKEND.get_or_try_init(|| {
        llama_cpp_2::send_logs_to_tracing(llama_cpp_2::LogOptions::default());
        let backend = LlamaBackend::init().map_err(|e| InferenceError::Backend(e.to_string()))?;
        tracing::info!("llama backend initialized");
        Ok(backend)
    })
}

/// Owns the loaded model and the settings its contexts are created with
#[derive(Default)]
pub struct LlamaEngine {
    model: Option<Arc<LlamaModel>>,
    model_path: Option<PathBuf>,
    config: ModelConfig,
}

impl LlamaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Load a GGUF model, replacing any model already loaded
    pub fn load_model(
        &mut self,
        path: &Path,
        config: &ModelConfig,
    ) -> Result<ModelInfo, InferenceError> {
        if !path.is_file() {
            return Err(InferenceError::ModelNotFound(path.display().to_string()));
        }

        let backend = backend()?;
        self.unload_model();

        tracing::info!(
            "Loading model {} (gpu_layers={}, n_ctx={})",
            path.display(),
            config.gpu_layers,
            config.context_size
        );
        let model_params = LlamaModelParams::default().with_n_gpu_layers(config.gpu_layers);
        let model = LlamaModel::load_from_file(backend, path, &model_params)
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;

        let info = ModelInfo::from_path(path, Some(model.n_params()));
        self.model = Some(Arc::new(model));
        self.model_path = Some(path.to_path_buf());
        self.config = config.clone();

        tracing::info!("Model loaded: {}", info.name);
        Ok(info)
    }

    /// Apply new context settings without reloading the weights.
    ///
    /// GPU offload only changes on the next `load_model`.
    pub fn set_config(&mut self, config: &ModelConfig) {
        self.config = config.clone();
    }

    pub fn unload_model(&mut self) {
        if self.model.take().is_some() {
            tracing::info!("Model unloaded");
        }
        self.model_path = None;
    }
}

impl TextGenerator for LlamaEngine {
    fn generate_stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<TokenStream, InferenceError> {
        let model = self.model.clone().ok_or(InferenceError::ModelNotLoaded)?;
        let backend = backend()?;
        let config = self.config.clone();
        let params = params.clone();
        let prompt = prompt.to_string();

        let (sender, stream) = streaming::channel();
        std::thread::Builder::new()
            .name("llamafaq-generate".to_string())
            .spawn(move || {
                match run_generation(backend, &model, &config, &prompt, &params, &sender) {
                    Ok(generated) => {
                        tracing::info!("Answer finished after {} tokens", generated);
                        sender.finish();
                    }
                    Err(e) => {
                        tracing::error!("Generation failed: {}", e);
                        sender.fail(e);
                    }
                }
            })
            .map_err(|e| InferenceError::Thread(e.to_string()))?;

        Ok(stream)
    }
}

/// Decode the prompt and sample until a stop condition; returns tokens generated
fn run_generation(
    backend: &LlamaBackend,
    model: &LlamaModel,
    config: &ModelConfig,
    prompt: &str,
    params: &GenerationParams,
    sender: &StreamSender,
) -> Result<u32, InferenceError> {
    let threads = config.threads.max(1) as i32;
    let batch_size = config.batch_size.max(1);
    let ctx_params = LlamaContextParams::default()
        .with_n_ctx(NonZeroU32::new(config.context_size))
        .with_n_batch(batch_size)
        .with_n_threads(threads)
        .with_n_threads_batch(threads);
    let mut ctx = model
        .new_context(backend, ctx_params)
        .map_err(|e| InferenceError::Context(e.to_string()))?;
    let n_ctx = ctx.n_ctx() as usize;

    let tokens = model
        .str_to_token(prompt, AddBos::Always)
        .map_err(|e| InferenceError::Tokenize(e.to_string()))?;
    if tokens.is_empty() {
        return Err(InferenceError::Tokenize("empty prompt".to_string()));
    }
    if tokens.len() >= n_ctx {
        return Err(InferenceError::PromptTooLong {
            tokens: tokens.len(),
            context_size: config.context_size,
        });
    }
    tracing::debug!("Prompt is {} tokens", tokens.len());

    // prompt goes through in chunks of at most n_batch tokens
    let batch_size = batch_size as usize;
    let last = tokens.len() - 1;
    let mut batch = LlamaBatch::new(batch_size, 1);
    for (chunk_idx, chunk) in tokens.chunks(batch_size).enumerate() {
        batch.clear();
        for (offset, token) in chunk.iter().enumerate() {
            let pos = chunk_idx * batch_size + offset;
            batch
                .add(*token, pos as i32, &[0], pos == last)
                .map_err(|e| InferenceError::Decode(e.to_string()))?;
        }
        ctx.decode(&mut batch)
            .map_err(|e| InferenceError::Decode(e.to_string()))?;
    }

    let mut sampler = LlamaSampler::chain_simple([
        LlamaSampler::temp(params.temperature),
        LlamaSampler::top_p(params.top_p, 1),
        LlamaSampler::dist(params.seed),
    ]);

    let mut decoder = Utf8Decoder::new();
    let mut filter = StopSequenceFilter::new(&params.stop);
    let mut n_cur = tokens.len();
    let mut generated = 0u32;

    while generated < params.max_tokens && n_cur < n_ctx {
        if sender.is_cancelled() {
            tracing::info!("Generation cancelled");
            break;
        }

        let token = sampler.sample(&ctx, batch.n_tokens() - 1);
        if model.is_eog_token(token) {
            break;
        }
        generated += 1;

        let bytes = model
            .token_to_bytes(token, Special::Plaintext)
            .map_err(|e| InferenceError::Decode(e.to_string()))?;
        let text = filter.push(&decoder.push(&bytes));
        if !sender.send_text(text) {
            // receiver dropped, nobody is listening
            return Ok(generated);
        }
        if filter.is_stopped() {
            break;
        }

        batch.clear();
        batch
            .add(token, n_cur as i32, &[0], true)
            .map_err(|e| InferenceError::Decode(e.to_string()))?;
        ctx.decode(&mut batch)
            .map_err(|e| InferenceError::Decode(e.to_string()))?;
        n_cur += 1;
    }

    if !filter.is_stopped() {
        let mut rest = filter.push(&decoder.finish());
        rest.push_str(&filter.finish());
        sender.send_text(rest);
    }

    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_engine_has_no_model() {
        let engine = LlamaEngine::new();
        assert!(!engine.is_loaded());
        assert!(engine.model_path().is_none());
        assert_eq!(engine.config(), &ModelConfig::default());
    }

    #[test]
    fn test_generate_without_model() {
        let engine = LlamaEngine::new();
        let result = engine.generate_stream("Q: ciao", &GenerationParams::default());
        assert!(matches!(result, Err(InferenceError::ModelNotLoaded)));
    }

    #[test]
    fn test_load_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = LlamaEngine::new();
        let err = engine
            .load_model(&dir.path().join("missing.gguf"), &ModelConfig::default())
            .unwrap_err();
        assert!(matches!(err, InferenceError::ModelNotFound(_)));
        assert!(!engine.is_loaded());
    }

    #[test]
    fn test_set_config() {
        let mut engine = LlamaEngine::new();
        let config = ModelConfig {
            context_size: 2048,
            ..ModelConfig::default()
        };
        engine.set_config(&config);
        assert_eq!(engine.config().context_size, 2048);
    }
}
