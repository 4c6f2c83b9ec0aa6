//! Token-budgeted prompt assembly
//!
//! Builds the final LLM prompt from a fixed instruction/question scaffold and
//! as much retrieved context as the token budget allows. The scaffold is
//! never truncated; context is cut from the tail, so earlier (higher-ranked)
//! passages survive longest.

use crate::tokenizer::TokenizerAdapter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::templates::PromptTemplates;

/// Default number of trailing context tokens dropped per verification pass
pub const DEFAULT_TRIM_STEP: usize = 10;

/// Hard failures that reject an assembly call outright
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// The question was empty or whitespace-only
    #[error("question is empty")]
    EmptyQuestion,
    /// The token budget was zero
    #[error("token budget must be positive")]
    ZeroBudget,
    /// The tokenizer adapter failed
    #[error("tokenizer error: {0}")]
    Tokenizer(anyhow::Error),
}

/// Advisory conditions raised during assembly
///
/// Neither aborts the flow; the orchestrator logs them and proceeds with the
/// prompt it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssemblySignal {
    /// Context was shortened to fit the budget
    ContextTruncated {
        /// Token count of the full retrieved context
        original_tokens: usize,
        /// Token count of the context that survived
        retained_tokens: usize,
    },
    /// The fixed scaffold alone meets or exceeds the budget; context was
    /// omitted and the emitted prompt may itself exceed the budget
    BudgetExhausted {
        /// Combined token count of instruction and question block
        scaffold_tokens: usize,
        /// The requested budget
        budget: usize,
    },
}

impl fmt::Display for AssemblySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblySignal::ContextTruncated {
                original_tokens,
                retained_tokens,
            } => write!(
                f,
                "context truncated from {} to {} tokens to fit the prompt budget",
                original_tokens, retained_tokens
            ),
            AssemblySignal::BudgetExhausted {
                scaffold_tokens,
                budget,
            } => write!(
                f,
                "instruction and question alone take {} of {} budget tokens; context omitted",
                scaffold_tokens, budget
            ),
        }
    }
}

/// The three ordered prompt sections
///
/// `instruction` and `question_block` are fixed; only `context` may shrink.
/// The rendered prompt is their plain concatenation.
#[derive(Debug, Clone)]
pub struct PromptSections {
    /// Fixed boilerplate describing the task, ending with the context label
    pub instruction: String,
    /// Retrieved passages joined by blank lines; truncatable
    pub context: String,
    /// The literal user question plus the answer cue
    pub question_block: String,
}

impl PromptSections {
    /// Concatenate the sections into the prompt string
    pub fn render(&self) -> String {
        format!("{}{}{}", self.instruction, self.context, self.question_block)
    }
}

/// A prompt produced by [`PromptAssembler::assemble`]
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    /// The full prompt text
    pub text: String,
    /// Token count of `text` under the assembler's tokenizer
    pub prompt_tokens: usize,
    /// Token count of the retained context section
    pub context_tokens: usize,
    /// Advisory signals raised during assembly
    pub signals: Vec<AssemblySignal>,
}

/// Assembles retrieval context and a question into a budget-bounded prompt
///
/// Guarantees that the returned prompt re-tokenizes to at most the budget,
/// except in the degenerate case where the fixed scaffold alone exceeds it
/// (signaled as [`AssemblySignal::BudgetExhausted`]).
pub struct PromptAssembler {
    tokenizer: Arc<dyn TokenizerAdapter>,
    templates: PromptTemplates,
    template: String,
    trim_step: usize,
}

impl PromptAssembler {
    /// Create an assembler over the given tokenizer with default templates
    pub fn new(tokenizer: Arc<dyn TokenizerAdapter>) -> Self {
        Self {
            tokenizer,
            templates: PromptTemplates::default(),
            template: "default".to_string(),
            trim_step: DEFAULT_TRIM_STEP,
        }
    }

    /// Select the scaffold template by name
    pub fn with_template(mut self, name: &str) -> Self {
        self.template = name.to_string();
        self
    }

    /// Replace the template collection
    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Set how many trailing context tokens each verification pass drops
    pub fn with_trim_step(mut self, trim_step: usize) -> Self {
        self.trim_step = trim_step.max(1);
        self
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>, PromptError> {
        self.tokenizer.encode(text).map_err(PromptError::Tokenizer)
    }

    fn decode(&self, ids: &[u32]) -> Result<String, PromptError> {
        self.tokenizer.decode(ids).map_err(PromptError::Tokenizer)
    }

    /// Assemble a prompt for `question` over `passages`, bounded by `budget`
    /// tokens
    ///
    /// Passages must arrive in retriever order: when the budget forces
    /// truncation, trailing passages are sacrificed first.
    pub fn assemble(
        &self,
        question: &str,
        passages: &[String],
        budget: usize,
    ) -> Result<AssembledPrompt, PromptError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PromptError::EmptyQuestion);
        }
        if budget == 0 {
            return Err(PromptError::ZeroBudget);
        }

        let template = self.templates.get(&self.template);
        let instruction = template.instruction.clone();
        let question_block = template.question_block(question);

        let mut signals = Vec::new();

        let scaffold_tokens =
            self.encode(&instruction)?.len() + self.encode(&question_block)?.len();

        // Degenerate case: the fixed scaffold saturates the budget on its
        // own. Emit it without context; the prompt may exceed the budget.
        if scaffold_tokens >= budget {
            signals.push(AssemblySignal::BudgetExhausted {
                scaffold_tokens,
                budget,
            });
            let text = format!("{}{}", instruction, question_block);
            let prompt_tokens = self.encode(&text)?.len();
            return Ok(AssembledPrompt {
                text,
                prompt_tokens,
                context_tokens: 0,
                signals,
            });
        }

        let available = budget - scaffold_tokens;

        // Passages keep their retriever order; blank lines mark passage
        // boundaries.
        let context = passages.join("\n\n");
        let mut context_ids = self.encode(&context)?;
        let original_tokens = context_ids.len();
        let mut truncated = false;

        let mut sections = PromptSections {
            instruction,
            context,
            question_block,
        };

        if context_ids.len() > available {
            context_ids.truncate(available);
            sections.context = self.decode(&context_ids)?;
            truncated = true;
        }

        let mut text = sections.render();
        let mut prompt_tokens = self.encode(&text)?.len();

        // Tokenization is not compositional: the full prompt can encode to a
        // different count than the sum of its sections. Verify against the
        // actual encoding and trim until it fits.
        while prompt_tokens > budget && !context_ids.is_empty() {
            let cut = self.trim_step.min(context_ids.len());
            context_ids.truncate(context_ids.len() - cut);
            sections.context = self.decode(&context_ids)?;
            truncated = true;

            text = sections.render();
            prompt_tokens = self.encode(&text)?.len();
        }

        if truncated {
            signals.push(AssemblySignal::ContextTruncated {
                original_tokens,
                retained_tokens: context_ids.len(),
            });
        }

        // Context is gone and the scaffold still overflows once re-encoded
        // whole; same degenerate contract as above.
        if prompt_tokens > budget {
            signals.push(AssemblySignal::BudgetExhausted {
                scaffold_tokens,
                budget,
            });
        }

        Ok(AssembledPrompt {
            text,
            prompt_tokens,
            context_tokens: context_ids.len(),
            signals,
        })
    }
}
