//! Settings storage
//!
//! Manages persistence of user preferences and generation settings.

use crate::inference::{GenerationParams, ModelConfig};
use crate::storage::model_source::ModelSource;
use crate::storage::{get_data_dir, StorageError};
use crate::types::Language;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// JSON file with the product FAQs
    pub faq_path: PathBuf,
    /// Where the GGUF model is found or fetched from
    pub model: ModelSource,
    /// Context, threads, batch size and GPU offload
    pub model_config: ModelConfig,
    /// Maximum number of tokens in one answer
    pub max_tokens: u32,
    /// Temperature parameter for text generation (0.0 - 2.0)
    pub temperature: f32,
    /// Top-p (nucleus sampling) parameter (0.0 - 1.0)
    pub top_p: f32,
    /// Generation stops when one of these appears
    pub stop_sequences: Vec<String>,
    /// Seed for the sampler
    pub seed: u32,
    /// UI and answer language: "it" or "en"
    pub language: String,
    /// Fetch and load the model on startup
    pub auto_load_model: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        let params = GenerationParams::default();
        Self {
            faq_path: PathBuf::from("product_faq.json"),
            model: ModelSource::default(),
            model_config: ModelConfig::default(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            stop_sequences: params.stop,
            seed: params.seed,
            language: Language::default().code().to_string(),
            auto_load_model: true,
        }
    }
}

impl AppSettings {
    /// Validate settings values
    ///
    /// Ensures all parameters are within acceptable ranges.
    pub fn validate(&mut self) {
        self.temperature = self.temperature.clamp(0.0, 2.0);
        self.top_p = self.top_p.clamp(0.0, 1.0);

        let config = &mut self.model_config;
        config.context_size = config.context_size.max(64);
        config.threads = config.threads.max(1);
        config.batch_size = config.batch_size.max(1);

        // can't generate more than the context holds
        self.max_tokens = self.max_tokens.clamp(1, config.context_size);

        self.stop_sequences.retain(|s| !s.is_empty());

        // unknown codes fall back to Italian
        self.language = self.language().code().to_string();
    }

    /// Parse a form value and apply it with `set`, then validate.
    ///
    /// Returns false and leaves the settings untouched when `raw` doesn't parse.
    pub fn apply_input<T: FromStr>(&mut self, raw: &str, set: impl FnOnce(&mut Self, T)) -> bool {
        let Ok(value) = raw.trim().parse::<T>() else {
            return false;
        };
        set(self, value);
        self.validate();
        true
    }

    pub fn language(&self) -> Language {
        Language::from_code(&self.language)
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            stop: self.stop_sequences.clone(),
            seed: self.seed,
        }
    }
}

/// Get the settings file path
fn get_settings_path() -> Result<PathBuf, StorageError> {
    Ok(get_data_dir()?.join("settings.json"))
}

/// Load settings from disk
///
/// Returns default settings if the file doesn't exist or is corrupted
pub fn load_settings() -> AppSettings {
    match get_settings_path().and_then(|path| load_settings_from(&path)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            AppSettings::default()
        }
    }
}

/// Load and validate settings from a specific file
pub fn load_settings_from(path: &Path) -> Result<AppSettings, StorageError> {
    if !path.exists() {
        tracing::info!("Settings file not found, using defaults");
        return Ok(AppSettings::default());
    }

    let json = fs::read_to_string(path)?;
    let mut settings: AppSettings = serde_json::from_str(&json)?;
    settings.validate();

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Save settings to disk
pub fn save_settings(settings: &AppSettings) -> Result<(), StorageError> {
    save_settings_to(&get_settings_path()?, settings)
}

pub fn save_settings_to(path: &Path, settings: &AppSettings) -> Result<(), StorageError> {
    // Ensure the parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;

    tracing::debug!("Saved settings to {}", path.display());
    Ok(())
}
