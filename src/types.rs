//! Common types used throughout the stagehand bot.

use serde::{Deserialize, Serialize};

/// Role of a message in a chat completion conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the human user
    User,
    /// Message from the AI assistant
    Assistant,
}

/// Discord rejects embed titles longer than this.
pub const EMBED_TITLE_CHARS: usize = 256;

/// Embed colours shared across features.
pub mod colors {
    pub const BLUE: u32 = 0x3498_DB;
    pub const PURPLE: u32 = 0x9B59_B6;
    pub const GREEN: u32 = 0x2ECC_71;
    pub const RED: u32 = 0xE74C_3C;
    pub const SPOTIFY_GREEN: u32 = 0x1DB9_54;
}

/// Truncate to at most `max_chars` characters, marking the cut with an ellipsis.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
