//! Prompt assembly for retrieval-augmented generation
//!
//! The assembler fits retrieved passages and a user question into a prompt
//! that never exceeds the target model's token budget, truncating context
//! (and only context) as needed.

mod assembler;
mod templates;

pub use assembler::{
    AssembledPrompt, AssemblySignal, PromptAssembler, PromptError, PromptSections,
    DEFAULT_TRIM_STEP,
};
pub use templates::{PromptTemplates, ScaffoldTemplate};
