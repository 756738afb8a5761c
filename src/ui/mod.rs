//! UI components for LlamaFAQ
//!
//! This module contains all user interface components built with Dioxus.

#![allow(non_snake_case)]

pub mod ask;
pub mod components;
pub mod settings;
pub mod sidebar;

use crate::app::AppState;
use ask::AskView;
use dioxus::prelude::*;
use settings::SettingsPanel;
use sidebar::Sidebar;

const STYLE: &str = include_str!("../../assets/style.css");

#[component]
pub fn Layout() -> Element {
    let app_state = use_context::<AppState>();
    let is_en = app_state.settings.read().language().is_en();
    let mut show_settings = use_signal(|| false);

    let settings_label = match (show_settings(), is_en) {
        (true, true) => "Back",
        (true, false) => "Indietro",
        (false, true) => "Settings",
        (false, false) => "Impostazioni",
    };

    rsx! {
        style { {STYLE} }
        div {
            class: "app",
            Sidebar {}
            main {
                class: "main",
                div {
                    class: "header",
                    h1 { "🤖 FAQ Assistant con LLAMA 🦙" }
                    button {
                        class: "btn btn-ghost",
                        onclick: move |_| show_settings.toggle(),
                        "{settings_label}"
                    }
                }
                div {
                    class: "content",
                    if show_settings() {
                        SettingsPanel {}
                    } else {
                        AskView {}
                    }
                }
            }
        }
    }
}
