//! Client for the hosted agent service (Azure AI Foundry agents, REST `v1`).

pub mod auth;
pub mod client;
pub mod service;
pub mod steps;
pub mod tools;
pub(crate) mod types;

#[cfg(test)]
mod test_server;

pub use service::FoundryService;
