//! Prompt templates for the generative summariser.
//!
//! Centralising the prompt here keeps wording changes out of the client and
//! lets tests inspect the exact request text without a live model.

use crate::config::LengthMode;

/// System prompt sent ahead of every summarisation request.
///
/// The reply format it asks for (a paragraph, then one bullet per highlight)
/// is what [`crate::pipeline::parse::BulletListParser`] expects.
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a careful document summariser.
Answer with plain text only:
- first, the summary as one paragraph with no heading;
- then each key highlight on its own line, starting with "- ".
Do not add commentary before or after."#;

/// Build the user prompt for summarising `text` in the given register.
pub fn summary_prompt(text: &str, length: LengthMode) -> String {
    format!(
        "Summarize the following text in a {length} style.\n\
         Return both:\n\
         1. A single coherent summary.\n\
         2. A list of 3-5 key highlights.\n\
         \n\
         Text:\n\
         {text}\n"
    )
}
