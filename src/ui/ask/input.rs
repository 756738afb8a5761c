//! Question input with ask/stop button

use crate::app::AppState;
use dioxus::prelude::*;

#[component]
pub fn QuestionInput(
    on_ask: EventHandler<String>,
    on_stop: EventHandler<()>,
    is_generating: bool,
    disabled: bool,
) -> Element {
    let mut text = use_signal(String::new);
    let app_state = use_context::<AppState>();
    let is_en = app_state.settings.read().language().is_en();

    let can_ask = !disabled && !is_generating && !text().trim().is_empty();

    let handle_keydown = move |evt: KeyboardEvent| {
        if evt.key() == Key::Escape && is_generating {
            on_stop.call(());
        } else if evt.key() == Key::Enter {
            evt.prevent_default();
            if can_ask {
                on_ask.call(text());
            }
        }
    };

    let label = if is_en { "Question:" } else { "Domanda:" };
    let placeholder = if is_en {
        "Type a question and press Enter"
    } else {
        "Scrivi una domanda e premi Invio"
    };
    let ask_title = if is_en { "Ask (Enter)" } else { "Chiedi (Invio)" };
    let stop_title = if is_en { "Stop (Esc)" } else { "Ferma (Esc)" };

    rsx! {
        div {
            class: "field",
            label { "{label}" }
            div {
                class: "question-box",
                input {
                    r#type: "text",
                    placeholder: "{placeholder}",
                    value: "{text}",
                    disabled: disabled,
                    oninput: move |evt| text.set(evt.value()),
                    onkeydown: handle_keydown,
                }
                if is_generating {
                    button {
                        class: "btn btn-stop",
                        title: "{stop_title}",
                        onclick: move |_| on_stop.call(()),
                        "■"
                    }
                } else {
                    button {
                        class: "btn",
                        title: "{ask_title}",
                        disabled: !can_ask,
                        onclick: move |_| {
                            if can_ask {
                                on_ask.call(text());
                            }
                        },
                        "➤"
                    }
                }
            }
        }
    }
}
