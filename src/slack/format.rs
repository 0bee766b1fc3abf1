use std::borrow::Cow;

use serde::Deserialize;

use crate::slack::blocks::{
    Block, Button, ButtonStyle, ChatPayload, TextObject, BUTTON_VALUE_MAX, HEADER_TEXT_MAX,
    MESSAGE_TEXT_MAX, SECTION_TEXT_MAX,
};
use crate::summarize::SummarizedArticle;
use crate::util::{char_len, truncate_chars, ELLIPSIS};

pub const CAMPAIGN_TITLE: &str = "Trending Tech Articles";
pub const FOOTER_TEXT: &str = "💪 Have a great day! | Tech News Bot";
pub const DETAIL_ACTION_ID: &str = "detail_summary";
pub const QUESTION_ACTION_ID: &str = "ask_question";

/// Default safety threshold for composed article text: Slack's 3000-char
/// section limit minus headroom for mrkdwn escaping.
pub const DEFAULT_TEXT_LIMIT: usize = 2900;

/// Which message shape to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStyle {
    /// Block Kit message with per-article buttons
    #[default]
    Interactive,
    /// Single mrkdwn text message, for destinations that reject blocks
    Plain,
}

impl std::fmt::Display for MessageStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageStyle::Interactive => f.write_str("interactive"),
            MessageStyle::Plain => f.write_str("plain"),
        }
    }
}

impl std::str::FromStr for MessageStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interactive" => Ok(MessageStyle::Interactive),
            "plain" => Ok(MessageStyle::Plain),
            other => Err(format!(
                "unknown message style '{other}' (expected 'interactive' or 'plain')"
            )),
        }
    }
}

/// Renders summarized articles into a [`ChatPayload`].
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    style: MessageStyle,
    text_limit: usize,
}

impl MessageFormatter {
    /// `text_limit` is clamped to Slack's section maximum.
    pub fn new(style: MessageStyle, text_limit: usize) -> Self {
        Self {
            style,
            text_limit: text_limit.clamp(4, SECTION_TEXT_MAX),
        }
    }

    pub fn style(&self) -> MessageStyle {
        self.style
    }

    pub fn text_limit(&self) -> usize {
        self.text_limit
    }

    /// Builds the message for `articles` in rank order. `date` is shown verbatim.
    pub fn format(&self, articles: &[SummarizedArticle], date: &str) -> ChatPayload {
        match self.style {
            MessageStyle::Interactive => self.interactive(articles, date),
            MessageStyle::Plain => self.plain(articles, date),
        }
    }

    fn interactive(&self, articles: &[SummarizedArticle], date: &str) -> ChatPayload {
        let mut blocks = Vec::with_capacity(3 * articles.len() + 1);

        let header = format!("🔥 {date} {CAMPAIGN_TITLE} 🔥");
        blocks.push(Block::Header {
            text: TextObject::plain(truncate_chars(&header, HEADER_TEXT_MAX)),
        });

        for (i, article) in articles.iter().enumerate() {
            let rank = i + 1;
            blocks.push(Block::Section {
                text: TextObject::mrkdwn(self.article_text(rank, article)),
                accessory: Some(Button {
                    text: TextObject::plain("📚 Detailed summary"),
                    action_id: DETAIL_ACTION_ID.to_string(),
                    value: action_value("detail", &article.link),
                    style: Some(ButtonStyle::Primary),
                }),
            });
            blocks.push(Block::Actions {
                elements: vec![Button {
                    text: TextObject::plain("❓ Ask a question"),
                    action_id: QUESTION_ACTION_ID.to_string(),
                    value: action_value("question", &article.link),
                    style: None,
                }],
            });
            if rank < articles.len() {
                blocks.push(Block::Divider);
            }
        }

        blocks.push(Block::Context {
            elements: vec![TextObject::mrkdwn(FOOTER_TEXT)],
        });

        ChatPayload {
            blocks,
            text: format!("{date} {CAMPAIGN_TITLE}"),
        }
    }

    fn plain(&self, articles: &[SummarizedArticle], date: &str) -> ChatPayload {
        let mut text = format!("🔥 *{date} {CAMPAIGN_TITLE}* 🔥\n\n");
        for (i, article) in articles.iter().enumerate() {
            let link_line = format!("🔗 {}", article.link);
            text.push_str(&self.compose_entry(i + 1, article, &link_line));
            text.push_str("\n\n");
        }
        text.push_str("Have a great day! 💪");

        ChatPayload {
            blocks: Vec::new(),
            text: truncate_chars(&text, MESSAGE_TEXT_MAX).into_owned(),
        }
    }

    /// Composes one article's section text within the safety threshold.
    pub fn article_text(&self, rank: usize, article: &SummarizedArticle) -> String {
        let link_line = format!("🔗 <{}|Read article>", article.link);
        self.compose_entry(rank, article, &link_line)
    }

    /// Lays out `*{rank}. {title}*`, the summary and `link_line`, escaped.
    ///
    /// Only the summary is shortened while the rest fits. The title is cut
    /// only when it cannot fit on its own, leaving `...` as the summary. A cut
    /// never splits an escape.
    fn compose_entry(&self, rank: usize, article: &SummarizedArticle, link_line: &str) -> String {
        let limit = self.text_limit;
        let title = escape_mrkdwn(&article.title);
        let summary = escape_mrkdwn(&article.summary);
        let layout = |title: &str, summary: &str| {
            format!("*{rank}. {title}*\n📝 {summary}\n{link_line}")
        };

        let composed = layout(title.as_ref(), summary.as_ref());
        let total = char_len(&composed);
        if total <= limit {
            return composed;
        }
        tracing::debug!(rank, chars = total, limit, "Truncating article text");

        let title_chars = char_len(&title);
        let fixed = total - title_chars - char_len(&summary);
        if fixed + title_chars + ELLIPSIS.len() <= limit {
            let budget = limit - fixed - title_chars;
            return layout(title.as_ref(), &escape_within(&article.summary, budget));
        }
        if fixed + ELLIPSIS.len() <= limit {
            let budget = limit - fixed - ELLIPSIS.len();
            return layout(&escape_within(&article.title, budget), ELLIPSIS);
        }
        truncate_chars(&composed, limit).into_owned()
    }
}

fn action_value(prefix: &str, link: &str) -> String {
    truncate_chars(&format!("{prefix}:{link}"), BUTTON_VALUE_MAX).into_owned()
}

fn mrkdwn_escape_for(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    }
}

/// Escapes the three characters Slack mrkdwn treats as control characters.
fn escape_mrkdwn(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match mrkdwn_escape_for(c) {
            Some(escaped) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escapes `raw` and shortens the result to at most `max_chars`, ending in
/// [`ELLIPSIS`] when cut. Whole escape sequences are kept or dropped.
fn escape_within(raw: &str, max_chars: usize) -> String {
    let escaped = escape_mrkdwn(raw);
    if char_len(&escaped) <= max_chars {
        return escaped.into_owned();
    }
    if max_chars <= ELLIPSIS.len() {
        return ELLIPSIS[..max_chars].to_string();
    }

    let budget = max_chars - ELLIPSIS.len();
    let mut out = String::new();
    let mut used = 0;
    for c in raw.chars() {
        let width = mrkdwn_escape_for(c).map_or(1, str::len);
        if used + width > budget {
            break;
        }
        match mrkdwn_escape_for(c) {
            Some(escaped) => out.push_str(escaped),
            None => out.push(c),
        }
        used += width;
    }
    out.push_str(ELLIPSIS);
    out
}

/// Cumulative size of a payload after each block, used by diagnostics mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeProbe {
    /// Zero-based index of the block just added
    pub index: usize,
    pub kind: &'static str,
    pub block_chars: usize,
    /// Serialized JSON size of blocks `0..=index`
    pub cumulative_bytes: usize,
    /// Set when this block's text exceeds its Slack limit
    pub violation: Option<String>,
}

/// Measures the payload incrementally, one block at a time.
///
/// Plain payloads produce a single probe for the text message.
pub fn probe_payload(payload: &ChatPayload) -> Vec<SizeProbe> {
    if payload.blocks.is_empty() {
        let chars = char_len(&payload.text);
        return vec![SizeProbe {
            index: 0,
            kind: "text",
            block_chars: chars,
            cumulative_bytes: payload.text.len(),
            violation: (chars > MESSAGE_TEXT_MAX)
                .then(|| format!("text exceeds {MESSAGE_TEXT_MAX} characters")),
        }];
    }

    (0..payload.blocks.len())
        .map(|i| {
            let block = &payload.blocks[i];
            let chars = block.text_chars();
            let cumulative_bytes = serde_json::to_vec(&payload.blocks[..=i])
                .map(|v| v.len())
                .unwrap_or(0);
            let violation = block
                .text_limit()
                .filter(|limit| chars > *limit)
                .map(|limit| format!("{} characters exceeds maximum {}", chars, limit));
            SizeProbe {
                index: i,
                kind: block.kind(),
                block_chars: chars,
                cumulative_bytes,
                violation,
            }
        })
        .collect()
}
