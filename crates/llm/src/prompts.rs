//! Prompt templates for summarization

use crate::types::ChatMessage;

/// System prompt fixing the two-paragraph summary format
pub const SYSTEM_PROMPT: &str = r#"You are an expert summarization model. You write concise, information-dense
summaries that keep the core meaning and the key details of a text.

Rules:
1. LENGTH: exactly two paragraphs, each of three to five sentences.
2. CONTENT:
   - Paragraph one introduces the main topic and the context needed to follow it.
   - Paragraph two covers key findings, implications and specific details.
3. STYLE:
   - Clear, direct language with a formal tone.
   - Facts over opinions; keep concrete numbers, dates and measurements.
   - Each sentence follows logically from the previous one.
   - Lead with the most important information and close with conclusions.
4. AVOID:
   - Repetition and tangential details.
   - Personal opinions or vague statements.
   - Unexplained technical terminology."#;

/// User prompt; the caller's content is appended after it
pub const USER_PROMPT_FORMAT: &str = r#"Summarize the text below in two paragraphs using Markdown.

Paragraph 1 (Context and Main Ideas): the subject, the scope of the discussion
and the central argument or findings.

Paragraph 2 (Key Details and Implications): the critical data points, notable
trends or limitations, and why they matter.

Formatting:
- Structure the response with Markdown headings, subheadings and bullet points.
- Under each section add a `###` subheading followed by jot-note bullets for
  lists, definitions or nuanced details.

Response format:
# Title

## Context and Main Ideas
A short introduction to the main themes.

### Subheading
- Jot note
- Jot note
- Jot note

## Key Details and Implications
The specific insights and their significance.

### Subheading
- Jot note
- Jot note
- Jot note

Text:"#;

/// Fixed system/user prompt pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub user_format: &'static str,
}

impl PromptTemplate {
    /// The two-paragraph summary template
    pub const SUMMARY: PromptTemplate = PromptTemplate {
        system: SYSTEM_PROMPT,
        user_format: USER_PROMPT_FORMAT,
    };

    /// Render the message pair sent to the provider
    pub fn render(&self, content: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system),
            ChatMessage::user(self.user_prompt(content)),
        ]
    }

    /// User message text for `content`
    pub fn user_prompt(&self, content: &str) -> String {
        format!("{}\n{}", self.user_format, content)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::SUMMARY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_render_builds_system_then_user() {
        let messages = PromptTemplate::SUMMARY.render("The quarterly report.");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.starts_with(USER_PROMPT_FORMAT));
        assert!(messages[1].content.ends_with("The quarterly report."));
    }

    #[test]
    fn test_user_prompt_asks_for_subheadings_and_jot_notes() {
        let prompt = PromptTemplate::SUMMARY.user_prompt("text");
        assert!(prompt.contains("## Context and Main Ideas"));
        assert!(prompt.contains("## Key Details and Implications"));
        assert_eq!(prompt.matches("### Subheading").count(), 2);
        assert!(prompt.contains("- Jot note"));
    }

    #[test]
    fn test_content_is_not_interpreted() {
        let prompt = PromptTemplate::SUMMARY.user_prompt("{text} {}");
        assert!(prompt.ends_with("{text} {}"));
    }
}
