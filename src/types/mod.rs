//! Shared type definitions
//!
//! This module contains small data types used across the application.

pub mod language;
pub mod model;

pub use language::Language;
pub use model::ModelInfo;
