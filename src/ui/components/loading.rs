use dioxus::prelude::*;

#[component]
pub fn Spinner(label: String) -> Element {
    rsx! {
        span {
            class: "spinner",
            span { class: "spinner-dot" }
            "{label}"
        }
    }
}

#[component]
pub fn ErrorBanner(message: String) -> Element {
    rsx! {
        div {
            class: "error-banner",
            role: "alert",
            "{message}"
        }
    }
}
