//! Backend clients - the "send text, get text back" capability
//!
//! This module provides:
//! - LlmClient trait for backend abstraction
//! - OpenAI, Anthropic and Google implementations
//! - MockLlmClient for tests

pub mod anthropic;
pub mod client;
pub mod google;
pub mod openai;

pub use anthropic::{ANTHROPIC_BASE_URL, AnthropicClient};
pub use client::{BackendConfig, LlmClient, LlmError, MockLlmClient};
pub use google::{GOOGLE_BASE_URL, GoogleClient};
pub use openai::{OPENAI_BASE_URL, OpenAiClient};
