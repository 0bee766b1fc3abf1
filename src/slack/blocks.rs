//! Serializable subset of Slack's Block Kit.
//!
//! Only the block and element shapes the digest emits are modeled. Limits are
//! the documented Slack maximums; the formatter keeps every payload under them.

use serde::Serialize;

use crate::util::char_len;

/// Maximum blocks in one message.
pub const MAX_BLOCKS: usize = 50;
/// Maximum characters in a section block's text.
pub const SECTION_TEXT_MAX: usize = 3000;
/// Maximum characters in a header block's text.
pub const HEADER_TEXT_MAX: usize = 150;
/// Maximum characters in a button's `value`.
pub const BUTTON_VALUE_MAX: usize = 2000;
/// Maximum characters in a top-level `text` field.
pub const MESSAGE_TEXT_MAX: usize = 40_000;

/// A Block Kit text object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String, emoji: bool },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        TextObject::PlainText {
            text: text.into(),
            emoji: true,
        }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        TextObject::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            TextObject::PlainText { text, .. } | TextObject::Mrkdwn { text } => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

/// An interactive button. `value` is opaque to this crate; the interaction
/// handler that receives the click parses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "button")]
pub struct Button {
    pub text: TextObject,
    pub action_id: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: TextObject,
    },
    Section {
        text: TextObject,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<Button>,
    },
    Actions {
        elements: Vec<Button>,
    },
    Divider,
    Context {
        elements: Vec<TextObject>,
    },
}

impl Block {
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Header { .. } => "header",
            Block::Section { .. } => "section",
            Block::Actions { .. } => "actions",
            Block::Divider => "divider",
            Block::Context { .. } => "context",
        }
    }

    /// Character count of the block's primary text (0 for dividers and actions).
    pub fn text_chars(&self) -> usize {
        match self {
            Block::Header { text } | Block::Section { text, .. } => char_len(text.text()),
            Block::Context { elements } => elements.iter().map(|e| char_len(e.text())).sum(),
            Block::Actions { .. } | Block::Divider => 0,
        }
    }

    /// The Slack limit on this block's text, if it has one.
    pub fn text_limit(&self) -> Option<usize> {
        match self {
            Block::Header { .. } => Some(HEADER_TEXT_MAX),
            Block::Section { .. } => Some(SECTION_TEXT_MAX),
            _ => None,
        }
    }
}

/// One chat message: ordered blocks plus the plain-text fallback.
///
/// Plain-style messages carry no blocks; `text` is then the whole message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatPayload {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
    pub text: String,
}

impl ChatPayload {
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_interactive(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// Describes the first Slack limit this payload breaks, if any.
    pub fn limit_violation(&self) -> Option<String> {
        if self.blocks.len() > MAX_BLOCKS {
            return Some(format!(
                "{} blocks exceeds maximum of {}",
                self.blocks.len(),
                MAX_BLOCKS
            ));
        }
        if char_len(&self.text) > MESSAGE_TEXT_MAX {
            return Some(format!("text exceeds {} characters", MESSAGE_TEXT_MAX));
        }
        self.blocks.iter().enumerate().find_map(|(i, block)| {
            let limit = block.text_limit()?;
            let chars = block.text_chars();
            (chars > limit).then(|| {
                format!(
                    "block {} ({}) text is {} characters, maximum {}",
                    i,
                    block.kind(),
                    chars,
                    limit
                )
            })
        })
    }
}
