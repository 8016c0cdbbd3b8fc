//! Shared data model for `gemchat`: contacts, messages and history turns.

pub mod contact;
pub mod history;
pub mod ids;
pub mod message;
