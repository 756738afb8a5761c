//! Question/answer view
//!
//! Product picker, question input and the streamed answer.

pub mod input;

use crate::app::{AppState, ModelState};
use crate::ui::components::loading::{ErrorBanner, Spinner};
use dioxus::prelude::*;
use input::QuestionInput;
use std::sync::atomic::Ordering;

#[component]
pub fn AskView() -> Element {
    let app_state = use_context::<AppState>();
    let answer = app_state.answer;
    let error = app_state.answer_error;

    let is_en = app_state.settings.read().language().is_en();
    let is_generating = *app_state.is_generating.read();
    let model_state = app_state.model_state.read().clone();
    let dataset = app_state.dataset.read().clone();
    let selected = app_state.selected_product.read().clone().unwrap_or_default();

    let products: Vec<String> = dataset
        .as_ref()
        .map(|d| d.product_names().into_iter().map(String::from).collect())
        .unwrap_or_default();

    let model_ready = matches!(model_state, ModelState::Loaded(_));

    let app_state_for_ask = app_state.clone();
    let handle_ask = move |question: String| {
        app_state_for_ask.clone().start_answer(question);
    };

    let app_state_for_stop = app_state.clone();
    let handle_stop = move |_: ()| {
        app_state_for_stop.stop_signal.store(true, Ordering::Relaxed);
    };

    let mut selected_product = app_state.selected_product;
    let product_label = if is_en { "Product:" } else { "Prodotto:" };
    let init_error_prefix = if is_en {
        "Model initialization error"
    } else {
        "Errore inizializzazione modello"
    };
    let error_prefix = if is_en { "Error" } else { "Errore" };
    let faq_error_prefix = if is_en {
        "Could not load FAQ"
    } else {
        "Errore caricamento FAQ"
    };
    let waiting_label = match &model_state {
        ModelState::Fetching { .. } if is_en => "Downloading model...",
        ModelState::Fetching { .. } => "Download del modello...",
        ModelState::Loading if is_en => "Loading model...",
        ModelState::Loading => "Caricamento del modello...",
        _ => "",
    };

    rsx! {
        if let Some(e) = app_state.dataset_error.read().clone() {
            ErrorBanner { message: format!("{faq_error_prefix}: {e}") }
        }
        if let ModelState::Error(e) = &model_state {
            ErrorBanner { message: format!("{init_error_prefix}: {e}") }
        }
        if !waiting_label.is_empty() {
            Spinner { label: waiting_label.to_string() }
        }

        div {
            class: "ask-row",
            div {
                class: "field",
                label { "{product_label}" }
                select {
                    disabled: is_generating || products.is_empty(),
                    value: "{selected}",
                    onchange: move |evt| selected_product.set(Some(evt.value())),
                    for product in products.iter() {
                        option {
                            value: "{product}",
                            selected: *product == selected,
                            "{product}"
                        }
                    }
                }
            }
            QuestionInput {
                on_ask: handle_ask,
                on_stop: handle_stop,
                is_generating: is_generating,
                disabled: !model_ready || dataset.is_none(),
            }
        }

        if is_generating && answer.read().is_empty() {
            div { class: "answer", Spinner { label: "⚡".to_string() } }
        } else if !answer.read().is_empty() {
            div { class: "answer", "{answer}" }
        }

        if let Some(e) = error() {
            ErrorBanner { message: format!("{error_prefix}: {e}") }
        }
    }
}
