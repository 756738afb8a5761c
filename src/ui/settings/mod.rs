//! Generation settings panel
//!
//! Every change is validated and written to disk immediately.

use crate::app::AppState;
use crate::storage::settings::{save_settings, AppSettings};
use dioxus::prelude::*;
use std::str::FromStr;

/// Apply `change` to the shared settings, validate and persist them
fn update_settings(app_state: &mut AppState, change: impl FnOnce(&mut AppSettings)) {
    let mut settings = app_state.settings.write();
    change(&mut *settings);
    settings.validate();
    persist(&settings);
}

/// Like [`update_settings`] for a typed form value; half-typed or cleared
/// input keeps the saved value
fn update_from_input<T: FromStr>(
    app_state: &mut AppState,
    raw: &str,
    set: impl FnOnce(&mut AppSettings, T),
) {
    let mut next = app_state.settings.read().clone();
    if next.apply_input(raw, set) {
        persist(&next);
        app_state.settings.set(next);
    }
}

fn persist(settings: &AppSettings) {
    if let Err(error) = save_settings(settings) {
        tracing::error!("Failed to save settings: {}", error);
    }
}

#[component]
pub fn SettingsPanel() -> Element {
    let app_state = use_context::<AppState>();
    let settings = app_state.settings.read().clone();
    let is_en = settings.language().is_en();

    let temperature = settings.temperature;
    let top_p = settings.top_p;
    let max_tokens = settings.max_tokens;
    let context_size = settings.model_config.context_size;
    let language = settings.language.clone();
    let faq_path = settings.faq_path.display().to_string();

    let mut app_state_temperature = app_state.clone();
    let mut app_state_top_p = app_state.clone();
    let mut app_state_max_tokens = app_state.clone();
    let mut app_state_language = app_state.clone();
    let mut app_state_reload = app_state.clone();

    let (title, max_tokens_label, language_label, reload_label) = if is_en {
        ("Generation", "Max answer tokens", "Language", "Reload FAQ")
    } else {
        ("Generazione", "Token massimi per risposta", "Lingua", "Ricarica FAQ")
    };
    let temperature_help = if is_en {
        "Lower values give more focused, deterministic answers."
    } else {
        "Valori bassi danno risposte più precise e deterministiche."
    };

    rsx! {
        div {
            class: "settings",
            h3 { "{title}" }

            div {
                div { class: "row",
                    label { "Temperature" }
                    span { "{temperature:.2}" }
                }
                input {
                    r#type: "range",
                    min: "0",
                    max: "2",
                    step: "0.05",
                    value: "{temperature}",
                    oninput: move |e| {
                        update_from_input(&mut app_state_temperature, &e.value(), |s, v: f32| {
                            s.temperature = v
                        });
                    },
                }
                p { class: "muted", "{temperature_help}" }
            }

            div {
                div { class: "row",
                    label { "Top P" }
                    span { "{top_p:.2}" }
                }
                input {
                    r#type: "range",
                    min: "0",
                    max: "1",
                    step: "0.05",
                    value: "{top_p}",
                    oninput: move |e| {
                        update_from_input(&mut app_state_top_p, &e.value(), |s, v: f32| {
                            s.top_p = v
                        });
                    },
                }
            }

            div {
                class: "field",
                label { "{max_tokens_label} (≤ {context_size})" }
                input {
                    r#type: "number",
                    min: "1",
                    max: "{context_size}",
                    value: "{max_tokens}",
                    oninput: move |e| {
                        update_from_input(&mut app_state_max_tokens, &e.value(), |s, v: u32| {
                            s.max_tokens = v
                        });
                    },
                }
            }

            div {
                class: "field",
                label { "{language_label}" }
                select {
                    value: "{language}",
                    onchange: move |e| {
                        let value = e.value();
                        update_settings(&mut app_state_language, |s| s.language = value);
                    },
                    option { value: "it", selected: language == "it", "Italiano" }
                    option { value: "en", selected: language == "en", "English" }
                }
            }

            div {
                class: "field",
                label { "FAQ" }
                p { class: "muted", "{faq_path}" }
                button {
                    class: "btn btn-ghost",
                    onclick: move |_| app_state_reload.load_dataset(),
                    "{reload_label}"
                }
            }
        }
    }
}
