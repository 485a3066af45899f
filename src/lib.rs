//! Prompt Studio - compile structured prompts and dispatch them to a provider
//!
//! Prompt definitions are loaded once into an immutable registry, compiled
//! into plain text (persona, instructions, examples, process steps and the
//! substituted user input) and sent to one of several interchangeable
//! text-generation backends selected by name.

pub mod error;
pub mod executor;
pub mod llm;
pub mod prompt;
pub mod provider;

pub use error::{PromptError, Result};
pub use executor::{Evaluation, PromptExecutor};
pub use provider::{Provider, ProviderRouter};
