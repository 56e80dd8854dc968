// Public API for integration tests and potential library usage

pub mod answer;
pub mod api;
pub mod auth;
pub mod config;
pub mod llm;
pub mod pool;
pub mod protocol;
pub mod session;
pub mod state;
pub mod types;
pub mod ws;
