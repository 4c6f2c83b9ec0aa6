//! Scaffold templates for question-answering prompts
//!
//! A template supplies the two fixed prompt sections: the instruction
//! boilerplate that precedes the retrieved context, and the question block
//! that follows it. Neither is ever truncated by the assembler.

use std::collections::HashMap;

/// The fixed scaffold around the (truncatable) context section
#[derive(Debug, Clone)]
pub struct ScaffoldTemplate {
    /// Instruction boilerplate, ending with the context label
    pub instruction: String,
    /// Question block with a `{question}` placeholder and an answer cue
    pub question: String,
}

impl ScaffoldTemplate {
    /// Create a template from its two fixed parts
    pub fn new(instruction: &str, question: &str) -> Self {
        Self {
            instruction: instruction.to_string(),
            question: question.to_string(),
        }
    }

    /// Render the question block for a concrete question
    pub fn question_block(&self, question: &str) -> String {
        self.question.replace("{question}", question)
    }
}

/// Named scaffold templates
pub struct PromptTemplates {
    templates: HashMap<String, ScaffoldTemplate>,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        let mut templates = HashMap::new();

        templates.insert(
            "default".to_string(),
            ScaffoldTemplate::new(
                concat!(
                    "You are a helpful AI assistant. Use the following context to answer the ",
                    "question. If the context doesn't contain enough information to answer the ",
                    "question, say so.\n\n",
                    "Context:\n"
                ),
                "\n\nQuestion: {question}\n\nAnswer:",
            ),
        );

        templates.insert(
            "concise".to_string(),
            ScaffoldTemplate::new(
                concat!(
                    "Answer the question using only the provided context. Be concise and ",
                    "direct.\n\n",
                    "Context:\n"
                ),
                "\n\nQuestion: {question}\n\nAnswer:",
            ),
        );

        templates.insert(
            "chat".to_string(),
            ScaffoldTemplate::new(
                concat!(
                    "You are a helpful AI assistant engaged in a conversation. Use the provided ",
                    "context to inform your response, but keep a natural conversational ",
                    "tone.\n\n",
                    "Relevant information:\n"
                ),
                "\n\nUser: {question}\n\nAssistant:",
            ),
        );

        Self { templates }
    }
}

impl PromptTemplates {
    /// Create an empty template collection
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Get a template by name, falling back to "default" if not found
    pub fn get(&self, name: &str) -> ScaffoldTemplate {
        self.templates
            .get(name)
            .or_else(|| self.templates.get("default"))
            .cloned()
            .unwrap_or_else(|| ScaffoldTemplate::new("", "Question: {question}\n\nAnswer:"))
    }

    /// Register a custom template
    pub fn register(&mut self, name: &str, template: ScaffoldTemplate) {
        self.templates.insert(name.to_string(), template);
    }

    /// Check if a template exists
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// List available template names
    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates() {
        let templates = PromptTemplates::default();

        assert!(templates.contains("default"));
        assert!(templates.contains("concise"));
        assert!(templates.contains("chat"));
    }

    #[test]
    fn test_question_block_substitution() {
        let templates = PromptTemplates::default();
        let template = templates.get("default");

        let block = template.question_block("What is X?");
        assert!(block.contains("Question: What is X?"));
        assert!(block.ends_with("Answer:"));
    }

    #[test]
    fn test_fallback_to_default() {
        let templates = PromptTemplates::default();

        let unknown = templates.get("nonexistent");
        let default = templates.get("default");
        assert_eq!(unknown.instruction, default.instruction);
    }

    #[test]
    fn test_custom_template() {
        let mut templates = PromptTemplates::default();

        templates.register(
            "custom",
            ScaffoldTemplate::new("Context follows.\n", "\nQ: {question}\nA:"),
        );

        assert!(templates.contains("custom"));
        assert_eq!(
            templates.get("custom").question_block("why?"),
            "\nQ: why?\nA:"
        );
    }
}
