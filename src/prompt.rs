//! Builds the analysis prompt the tokenizer consumes
//!
//! Request text is copied into the prompt under explicit capacity limits:
//! over-long fields are truncated at a char boundary and extra conversation
//! turns are dropped, never an error and never an unchecked copy.

/// Capacity for the patient background, in chars
pub const MAX_BACKGROUND_CHARS: usize = 1000;
/// Capacity for the statement and for each conversation turn, in chars
pub const MAX_STATEMENT_CHARS: usize = 500;
/// Conversation turns beyond this count are dropped
pub const MAX_TURNS: usize = 5;

/// One prior exchange in the consultation
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub speaker: String,
    pub text: String,
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// Compose the fixed analysis template from the request fields.
pub fn compose_prompt(background: &str, history: &[ConversationTurn], statement: &str) -> String {
    let background = truncate_chars(background, MAX_BACKGROUND_CHARS);
    let statement = truncate_chars(statement, MAX_STATEMENT_CHARS);

    let mut conversation = String::new();
    for turn in history.iter().take(MAX_TURNS) {
        let speaker = if turn.speaker.is_empty() {
            "Unknown"
        } else {
            truncate_chars(&turn.speaker, 64)
        };
        conversation.push_str(speaker);
        conversation.push_str(": ");
        conversation.push_str(truncate_chars(&turn.text, MAX_STATEMENT_CHARS));
        conversation.push('\n');
    }

    format!(
        "Patient background: {background}\n\n\
         Recent conversation:\n{conversation}\n\
         Analyze the emotional impact of the following doctor statement in this context:\n\
         \"{statement}\"\n"
    )
}
