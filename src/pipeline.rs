//! Run orchestration: ConfigCheck → Fetch → Summarize → Format → Publish.
//!
//! Each stage runs once, in order. The first failing stage ends the run; there
//! are no retries across stages. A failed summary is not a stage failure, it
//! only swaps in the fallback text for that article.

use secrecy::SecretString;
use std::time::Duration;
use thiserror::Error;

use crate::config::{Config, ConfigError, DeliveryMode};
use crate::feed::fetch_articles;
use crate::slack::{
    probe_payload, BotPublisher, ChatPayload, MessageFormatter, PublishError, Publisher,
    WebhookPublisher,
};
use crate::summarize::{GeminiClient, SummarizedArticle, Summarizer};

const USER_AGENT: &str = concat!("tech-digest/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ConfigCheck,
    Fetch,
    Summarize,
    Format,
    Publish,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::ConfigCheck => "config-check",
            Stage::Fetch => "fetch",
            Stage::Summarize => "summarize",
            Stage::Format => "format",
            Stage::Publish => "publish",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Why a run ended in the Failed state.
#[derive(Debug, Error)]
pub enum RunError {
    /// A required setting is missing or invalid; no network call was made.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The feed could not be fetched or held no usable entries.
    #[error("No articles available from {feed_url}")]
    FetchFailure { feed_url: String },

    /// Slack refused the message.
    #[error("Slack rejected the digest: {0}")]
    PublishRejected(#[source] PublishError),

    /// Slack could not be reached.
    #[error("Could not reach Slack: {0}")]
    PublishTransport(#[source] PublishError),
}

impl RunError {
    /// The stage the run failed in.
    pub fn stage(&self) -> Stage {
        match self {
            RunError::Configuration(_) => Stage::ConfigCheck,
            RunError::FetchFailure { .. } => Stage::Fetch,
            RunError::PublishRejected(_) | RunError::PublishTransport(_) => Stage::Publish,
        }
    }
}

impl From<PublishError> for RunError {
    fn from(e: PublishError) -> Self {
        match e {
            PublishError::Transport(_) | PublishError::Timeout(_) => RunError::PublishTransport(e),
            _ => RunError::PublishRejected(e),
        }
    }
}

/// What a successful run produced.
#[derive(Debug)]
pub struct RunReport {
    pub articles: Vec<SummarizedArticle>,
    /// Articles whose summary is the fallback text
    pub failed_summaries: usize,
    pub payload: ChatPayload,
    /// False for dry runs
    pub published: bool,
}

/// Builds the HTTP client shared by every stage of a run.
pub fn build_client(config: &Config) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT.min(config.timeout()))
        .build()
}

/// One digest run, configured up front.
pub struct Pipeline {
    config: Config,
    client: reqwest::Client,
    dry_run: bool,
}

impl Pipeline {
    pub fn new(config: Config, client: reqwest::Client) -> Self {
        Self {
            config,
            client,
            dry_run: false,
        }
    }

    /// Skip the Publish stage; the formatted payload is still returned.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs every stage once. `date` is the display date for the header.
    pub async fn run(&self, date: &str) -> Result<RunReport, RunError> {
        let result = self.run_stages(date).await;
        match &result {
            Ok(report) => tracing::info!(
                stage = %Stage::Done,
                articles = report.articles.len(),
                failed_summaries = report.failed_summaries,
                published = report.published,
                "Digest run completed"
            ),
            Err(e) => tracing::error!(stage = %e.stage(), error = %e, "Digest run failed"),
        }
        result
    }

    async fn run_stages(&self, date: &str) -> Result<RunReport, RunError> {
        tracing::info!(stage = %Stage::ConfigCheck, dry_run = self.dry_run, "Checking configuration");
        self.config.check(!self.dry_run)?;
        let summarizer = self.summarizer()?;
        let publisher = if self.dry_run {
            None
        } else {
            Some(self.publisher()?)
        };
        let formatter =
            MessageFormatter::new(self.config.effective_style(), self.config.block_text_limit);

        tracing::info!(stage = %Stage::Fetch, feed = %self.config.feed_url, "Fetching trending articles");
        let articles =
            fetch_articles(&self.client, &self.config.feed_url, self.config.timeout()).await;
        if articles.is_empty() {
            return Err(RunError::FetchFailure {
                feed_url: self.config.feed_url.clone(),
            });
        }
        tracing::info!(stage = %Stage::Fetch, count = articles.len(), "Fetched articles");

        tracing::info!(stage = %Stage::Summarize, count = articles.len(), "Generating summaries");
        let summarized = summarizer.summarize_all(articles).await;
        let failed_summaries = summarized.iter().filter(|a| a.is_fallback()).count();
        if failed_summaries > 0 {
            tracing::warn!(
                stage = %Stage::Summarize,
                failed = failed_summaries,
                total = summarized.len(),
                "Some summaries fell back to placeholder text"
            );
        }

        tracing::info!(stage = %Stage::Format, style = %formatter.style(), "Formatting message");
        let payload = formatter.format(&summarized, date);
        if self.config.diagnostics {
            log_size_probe(&payload);
        }

        let Some(publisher) = publisher else {
            tracing::info!(stage = %Stage::Publish, "Dry run, skipping publish");
            return Ok(RunReport {
                articles: summarized,
                failed_summaries,
                payload,
                published: false,
            });
        };

        tracing::info!(stage = %Stage::Publish, mode = publisher.name(), "Posting to Slack");
        publisher.deliver(&payload).await.into_result()?;

        Ok(RunReport {
            articles: summarized,
            failed_summaries,
            payload,
            published: true,
        })
    }

    fn summarizer(&self) -> Result<Summarizer, ConfigError> {
        let api_key = self
            .config
            .gemini_api_key
            .clone()
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        let client = GeminiClient::new(
            self.client.clone(),
            SecretString::from(api_key),
            self.config.gemini_base_url.as_str(),
            self.config.gemini_model.as_str(),
            self.config.timeout(),
        );
        Ok(Summarizer::new(client, self.config.summary_language.as_str()))
    }

    fn publisher(&self) -> Result<Publisher, ConfigError> {
        let timeout = self.config.timeout();
        match self.config.delivery_mode() {
            Some(DeliveryMode::Bot) => {
                let token = self
                    .config
                    .slack_bot_token
                    .clone()
                    .ok_or(ConfigError::Missing("SLACK_BOT_TOKEN"))?;
                Ok(Publisher::Bot(BotPublisher::new(
                    self.client.clone(),
                    SecretString::from(token),
                    self.config.slack_channel.as_str(),
                    self.config.slack_api_base_url.as_str(),
                    timeout,
                )))
            }
            Some(DeliveryMode::Webhook) => {
                let url = self
                    .config
                    .slack_webhook_url
                    .clone()
                    .ok_or(ConfigError::Missing("SLACK_WEBHOOK_URL"))?;
                Ok(Publisher::Webhook(WebhookPublisher::new(
                    self.client.clone(),
                    SecretString::from(url),
                    timeout,
                )))
            }
            None => Err(ConfigError::Missing("SLACK_BOT_TOKEN or SLACK_WEBHOOK_URL")),
        }
    }
}

fn log_size_probe(payload: &ChatPayload) {
    for probe in probe_payload(payload) {
        match &probe.violation {
            Some(violation) => tracing::warn!(
                block = probe.index,
                kind = probe.kind,
                chars = probe.block_chars,
                cumulative_bytes = probe.cumulative_bytes,
                violation = %violation,
                "Payload block exceeds Slack limit"
            ),
            None => tracing::info!(
                block = probe.index,
                kind = probe.kind,
                chars = probe.block_chars,
                cumulative_bytes = probe.cumulative_bytes,
                "Payload size probe"
            ),
        }
    }
    if let Some(violation) = payload.limit_violation() {
        tracing::warn!(violation = %violation, "Payload exceeds Slack limits");
    }
}
