use crate::app::AppState;
use dioxus::prelude::*;

/// Every question of the selected product as an expandable item
#[component]
pub fn FaqList() -> Element {
    let app_state = use_context::<AppState>();
    let dataset = app_state.dataset.read().clone();
    let selected = app_state.selected_product.read().clone();
    let is_en = app_state.settings.read().language().is_en();

    let Some(product) = dataset
        .as_ref()
        .zip(selected.as_deref())
        .and_then(|(dataset, name)| dataset.product(name).cloned())
    else {
        return rsx! {};
    };

    let empty_label = if is_en {
        "No questions for this product"
    } else {
        "Nessuna domanda per questo prodotto"
    };

    rsx! {
        div {
            class: "sidebar-section",
            div { class: "section-label", "📚 FAQ {product.name}" }
            if product.entries.is_empty() {
                p { class: "muted", "{empty_label}" }
            }
            for entry in product.entries.iter() {
                details {
                    key: "{entry.question}",
                    class: "faq-item",
                    summary { "{entry.question}" }
                    p { "{entry.answer}" }
                }
            }
        }
    }
}
