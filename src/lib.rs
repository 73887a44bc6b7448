//! agent-cli library.
//!
//! The binary in `main.rs` is a thin shell around these modules; keeping them
//! in a library target lets `tests/` drive `ChatSession` directly.

pub mod agent;
pub mod chat;
pub mod cli;
pub mod command;
pub mod config;
pub mod foundry;
pub mod history;
pub mod interrupt;
pub mod message;
pub mod output;
pub mod settings;
pub mod storage;
