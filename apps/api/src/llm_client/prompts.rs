// Shared prompt fragments and the prompt builder.
// Each feature keeps its own prompt text in a prompts.rs next to it.

use std::borrow::Cow;

use super::ChatMessage;

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Token estimate used for budgeting: one token per four characters.
pub const CHARS_PER_TOKEN: usize = 4;

pub const ELLIPSIS: &str = "...";

pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Cuts `text` so its estimate fits `max_tokens`, marking the cut with `...`.
/// Text already within budget is returned unchanged.
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> Cow<'_, str> {
    if estimate_tokens(text) <= max_tokens {
        return Cow::Borrowed(text);
    }
    let max_chars = max_tokens * CHARS_PER_TOKEN;
    if max_chars < ELLIPSIS.len() {
        return Cow::Owned(String::new());
    }
    let kept: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    Cow::Owned(format!("{kept}{ELLIPSIS}"))
}

/// Assembles a system message plus one user message made of free-form
/// instructions followed by labelled context sections.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system: String,
    instructions: String,
    sections: Vec<String>,
}

impl PromptBuilder {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            instructions: String::new(),
            sections: Vec::new(),
        }
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Adds `LABEL:\n<body>` with the body held to `max_tokens`.
    /// Blank bodies are skipped.
    pub fn section(mut self, label: &str, body: &str, max_tokens: usize) -> Self {
        let body = body.trim();
        if !body.is_empty() {
            self.sections
                .push(format!("{label}:\n{}", truncate_to_tokens(body, max_tokens)));
        }
        self
    }

    /// Adds a numbered list, each item held to `max_tokens_per_item`.
    pub fn list_section<S: AsRef<str>>(
        mut self,
        label: &str,
        items: &[S],
        max_tokens_per_item: usize,
    ) -> Self {
        if items.is_empty() {
            return self;
        }
        let lines: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                format!(
                    "{}. {}",
                    i + 1,
                    truncate_to_tokens(item.as_ref().trim(), max_tokens_per_item)
                )
            })
            .collect();
        self.sections.push(format!("{label}:\n{}", lines.join("\n")));
        self
    }

    pub fn build(self) -> Vec<ChatMessage> {
        let mut user = self.instructions;
        for section in self.sections {
            if !user.is_empty() {
                user.push_str("\n\n");
            }
            user.push_str(&section);
        }
        vec![ChatMessage::system(self.system), ChatMessage::user(user)]
    }
}
