//! Root Dioxus application component
//!
//! This module contains the main App component that serves as the root of the UI tree.

use crate::assistant;
use crate::faq::FaqDataset;
use crate::inference::LlamaEngine;
use crate::storage::model_source::ensure_model;
use crate::storage::settings::{load_settings, AppSettings};
use crate::types::ModelInfo;
use crate::ui::Layout;
use dioxus::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Minimum bytes between two progress updates of a download
const PROGRESS_STEP: u64 = 4 * 1024 * 1024;

/// Represents the current state of the model
#[derive(Clone, PartialEq, Debug)]
pub enum ModelState {
    NotLoaded,
    Fetching { downloaded: u64, total: Option<u64> },
    Loading,
    Loaded(ModelInfo),
    Error(String),
}

/// Global application state shared across components
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<LlamaEngine>>,
    pub dataset: Signal<Option<Arc<FaqDataset>>>,
    pub dataset_error: Signal<Option<String>>,
    pub selected_product: Signal<Option<String>>,
    pub settings: Signal<AppSettings>,
    pub model_state: Signal<ModelState>,
    pub stop_signal: Arc<AtomicBool>,
    pub is_generating: Signal<bool>,
    /// Answer being streamed, kept here so it survives switching views
    pub answer: Signal<String>,
    pub answer_error: Signal<Option<String>>,
}

impl AppState {
    pub fn new() -> Self {
        tracing::info!("AppState initialized");
        let settings = load_settings();
        let mut engine = LlamaEngine::new();
        engine.set_config(&settings.model_config);

        Self {
            engine: Arc::new(Mutex::new(engine)),
            dataset: Signal::new(None),
            dataset_error: Signal::new(None),
            selected_product: Signal::new(None),
            settings: Signal::new(settings),
            model_state: Signal::new(ModelState::NotLoaded),
            stop_signal: Arc::new(AtomicBool::new(false)),
            is_generating: Signal::new(false),
            answer: Signal::new(String::new()),
            answer_error: Signal::new(None),
        }
    }

    /// Start streaming an answer to `question` about the selected product.
    ///
    /// The task runs outside any view scope, so it keeps going (and clears
    /// `is_generating` when done) while the settings panel is open.
    pub fn start_answer(&mut self, question: String) {
        let Some(dataset) = self.dataset.read().clone() else {
            return;
        };
        let Some(product) = self.selected_product.read().clone() else {
            return;
        };
        let (language, params) = {
            let settings = self.settings.read();
            (settings.language(), settings.generation_params())
        };

        self.answer.set(String::new());
        self.answer_error.set(None);
        self.stop_signal.store(false, Ordering::Relaxed);
        self.is_generating.set(true);

        let mut app_state = self.clone();
        spawn_forever(async move {
            let started = {
                let engine = app_state.engine.lock().await;
                assistant::ask(&*engine, &dataset, &product, &question, language, &params)
            };

            let end = match started {
                Ok(stream) => {
                    let mut answer = app_state.answer;
                    assistant::stream_answer(stream, &app_state.stop_signal, |text| {
                        answer.write().push_str(text)
                    })
                    .await
                }
                Err(e) => {
                    tracing::warn!("Could not start answer: {}", e);
                    Err(e.to_string())
                }
            };
            if let Err(e) = end {
                app_state.answer_error.set(Some(e));
            }

            app_state.is_generating.set(false);
        });
    }

    /// Read the FAQ file named in the settings and select its first product
    pub fn load_dataset(&mut self) {
        let path = self.settings.read().faq_path.clone();
        match FaqDataset::load(&path) {
            Ok(dataset) => {
                let first = dataset.product_names().first().map(|name| name.to_string());
                self.dataset.set(Some(Arc::new(dataset)));
                self.dataset_error.set(None);

                let keep_selection = self
                    .selected_product
                    .read()
                    .as_deref()
                    .is_some_and(|name| self.has_product(name));
                if !keep_selection {
                    self.selected_product.set(first);
                }
            }
            Err(e) => {
                tracing::error!("Failed to load FAQ from {}: {}", path.display(), e);
                self.dataset.set(None);
                self.dataset_error.set(Some(e.to_string()));
            }
        }
    }

    fn has_product(&self, name: &str) -> bool {
        self.dataset
            .read()
            .as_ref()
            .is_some_and(|dataset| dataset.product(name).is_some())
    }
}

/// Fetch the model if needed, then load it into the engine
pub async fn prepare_model(app_state: AppState) {
    let (source, config) = {
        let settings = app_state.settings.read();
        (settings.model.clone(), settings.model_config.clone())
    };
    let mut model_state = app_state.model_state;

    model_state.set(ModelState::Fetching {
        downloaded: 0,
        total: None,
    });
    let mut last_reported = 0u64;
    let fetched = ensure_model(&source, |downloaded, total| {
        if downloaded - last_reported >= PROGRESS_STEP || Some(downloaded) == total {
            last_reported = downloaded;
            model_state.set(ModelState::Fetching { downloaded, total });
        }
    })
    .await;

    let path = match fetched {
        Ok(path) => path,
        Err(e) => {
            tracing::error!("Model not available: {}", e);
            model_state.set(ModelState::Error(e.to_string()));
            return;
        }
    };

    model_state.set(ModelState::Loading);
    let engine = app_state.engine.clone();
    let loaded =
        tokio::task::spawn_blocking(move || engine.blocking_lock().load_model(&path, &config))
            .await;

    match loaded {
        Ok(Ok(info)) => model_state.set(ModelState::Loaded(info)),
        Ok(Err(e)) => {
            tracing::error!("Failed to load model: {}", e);
            model_state.set(ModelState::Error(e.to_string()));
        }
        Err(e) => model_state.set(ModelState::Error(e.to_string())),
    }
}

#[component]
pub fn App() -> Element {
    let app_state = use_context_provider(AppState::new);

    use_hook(move || {
        let mut app_state = app_state.clone();
        app_state.load_dataset();
        if app_state.settings.read().auto_load_model {
            spawn(prepare_model(app_state));
        }
    });

    rsx! {
        Layout {}
    }
}
