use crate::app::{prepare_model, AppState, ModelState};
use crate::storage::huggingface::format_size;
use crate::ui::components::loading::Spinner;
use dioxus::prelude::*;

#[component]
pub fn ModelStatus() -> Element {
    let app_state = use_context::<AppState>();
    let model_state = app_state.model_state.read().clone();
    let is_en = app_state.settings.read().language().is_en();
    let (model_path, model_url) = {
        let settings = app_state.settings.read();
        (
            settings.model.path().display().to_string(),
            settings.model.url().map(str::to_string),
        )
    };

    let busy = matches!(
        model_state,
        ModelState::Fetching { .. } | ModelState::Loading
    );
    let is_generating = *app_state.is_generating.read();

    let app_state_for_load = app_state.clone();
    let handle_load = move |_| {
        let app_state = app_state_for_load.clone();
        spawn(prepare_model(app_state));
    };

    let app_state_for_unload = app_state.clone();
    let handle_unload = move |_| {
        let mut app_state = app_state_for_unload.clone();
        let engine = app_state.engine.clone();
        spawn(async move {
            engine.lock().await.unload_model();
        });
        app_state.model_state.set(ModelState::NotLoaded);
    };

    let title = if is_en { "Model" } else { "Modello" };
    let load_label = match (&model_state, is_en) {
        (ModelState::Error(_), true) => "Retry",
        (ModelState::Error(_), false) => "Riprova",
        (_, true) => "Load",
        (_, false) => "Carica",
    };
    let unload_label = if is_en { "Unload" } else { "Scarica dalla memoria" };

    rsx! {
        div {
            class: "sidebar-section",
            div { class: "section-label", "{title}" }
            p { class: "muted", "{model_path}" }
            if let Some(url) = model_url {
                p { class: "muted", "⇣ {url}" }
            }

            {match model_state {
                ModelState::NotLoaded => rsx! {
                    p { class: "muted", if is_en { "Not loaded" } else { "Non caricato" } }
                },
                ModelState::Fetching { downloaded, total } => {
                    let percent = total
                        .filter(|&t| t > 0)
                        .map(|t| downloaded as f64 / t as f64 * 100.0)
                        .unwrap_or(0.0);
                    let done = format_size(downloaded);
                    let of = total.map(format_size).unwrap_or_else(|| "?".to_string());
                    rsx! {
                        div {
                            class: "progress",
                            div { class: "progress-bar", style: "width: {percent:.1}%" }
                        }
                        p { class: "muted", "{done} / {of}" }
                    }
                }
                ModelState::Loading => rsx! {
                    Spinner { label: if is_en { "Loading...".to_string() } else { "Caricamento...".to_string() } }
                },
                ModelState::Loaded(info) => {
                    let size = format_size(info.size_bytes);
                    rsx! {
                        p { "✅ {info.name}" }
                        p { class: "muted", "{size}" }
                    }
                }
                ModelState::Error(e) => rsx! {
                    p { class: "muted", "❌ {e}" }
                },
            }}

            div {
                class: "question-box",
                style: "margin-top: 10px;",
                if matches!(*app_state.model_state.read(), ModelState::Loaded(_)) {
                    button {
                        class: "btn btn-ghost",
                        disabled: is_generating,
                        onclick: handle_unload,
                        "{unload_label}"
                    }
                } else {
                    button {
                        class: "btn",
                        disabled: busy,
                        onclick: handle_load,
                        "{load_label}"
                    }
                }
            }
        }
    }
}
