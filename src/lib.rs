//! LlamaFAQ Library
//!
//! Core library for the LlamaFAQ desktop application: a product FAQ assistant
//! answering with a local llama.cpp model.

pub mod app;
pub mod assistant;
pub mod faq;
pub mod inference;
pub mod storage;
pub mod types;
pub mod ui;
