//! Slack message construction and delivery.
//!
//! - [`blocks`] - Block Kit data model and Slack's size limits
//! - [`format`] - Renders summarized articles as an interactive or plain message
//! - [`publisher`] - Posts a message through an incoming webhook or the bot API

pub mod blocks;
pub mod format;
pub mod publisher;

pub use blocks::{Block, Button, ChatPayload, TextObject, MAX_BLOCKS};
pub use format::{probe_payload, MessageFormatter, MessageStyle, SizeProbe, DEFAULT_TEXT_LIMIT};
pub use publisher::{
    BotPublisher, PublishError, PublishOutcome, Publisher, WebhookPublisher, DEFAULT_API_BASE_URL,
};
