//! Prompt assembly

use crate::provider::ChatMessage;

pub const CONTEXT_HEADER: &str = "---Thông tin từ cơ sở dữ liệu---";
pub const DIRECTIVES_HEADER: &str = "---Yêu cầu---";

const DEFAULT_PERSONA: &str = include_str!("../prompts/persona.md");
const DEFAULT_DIRECTIVES: &str = include_str!("../prompts/directives.md");

/// Persona, then the context section, then the directives section
pub fn assemble(persona: &str, context: &str, directives: &str) -> String {
    format!(
        "{}\n\n{}\n\n{}\n\n{}\n\n{}",
        persona.trim_end(),
        CONTEXT_HEADER,
        context,
        DIRECTIVES_HEADER,
        directives.trim_end()
    )
}

/// Builds the system prompt and message list for a completion
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    persona: String,
    directives: String,
}

impl PromptAssembler {
    pub fn new(persona: impl Into<String>, directives: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            directives: directives.into(),
        }
    }

    pub fn system_prompt(&self, context: &str) -> String {
        assemble(&self.persona, context, &self.directives)
    }

    /// System prompt carrying the context, followed by the user's question
    pub fn messages(&self, context: &str, question: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt(context)),
            ChatMessage::user(question),
        ]
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA, DEFAULT_DIRECTIVES)
    }
}
