//! Prompt System - template records, registry, sources and compilation
//!
//! This module provides functionality for loading structured prompt
//! definitions into an immutable registry and compiling them into the final
//! text sent to a backend.

mod compile;
mod registry;
mod source;
mod template;

pub use compile::{compile, compile_test_case, missing_required, substitute, value_to_string};
pub use registry::{LoadFailure, LoadReport, PromptRegistry, PromptSummary, RegistryHandle};
pub use source::{DirectorySource, PROMPT_SUFFIXES, SourceEntry, StaticSource, TemplateSource};
pub use template::{FewShotExample, Persona, TemplateRecord, TestCase, VariableDeclaration, Variables};
