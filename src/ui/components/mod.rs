//! Shared UI building blocks

pub mod loading;
