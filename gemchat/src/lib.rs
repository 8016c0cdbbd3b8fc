//! `GemChat`: terminal messenger with simulated contacts and a streaming
//! Gemini assistant.

pub mod app;
pub mod completion;
pub mod config;
pub mod seed;
pub mod simulator;
pub mod store;
pub mod ui;
