//! Sidebar: model status and the FAQ list of the selected product

pub mod faq_list;
pub mod model_status;

use dioxus::prelude::*;
use faq_list::FaqList;
use model_status::ModelStatus;

#[component]
pub fn Sidebar() -> Element {
    rsx! {
        aside {
            class: "sidebar",
            ModelStatus {}
            FaqList {}
        }
    }
}
