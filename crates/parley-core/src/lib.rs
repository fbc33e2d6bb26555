//! parley-core — configuration and LLM provider layer for Parley
//!
//! Everything here is read once at startup and handed to the A2A layer as
//! immutable values. Nothing in this crate touches the network except the
//! provider implementations.

pub mod config;
pub mod env;
pub mod providers;

pub use config::{ConfigError, ModelConfig, ProviderKind};
pub use providers::{ChatMessage, ChatResponse, ChatRole, LlmProvider, build_provider};
