//! Article summarization through the Gemini API.
//!
//! [`Summarizer::summarize`] never fails: any remote error is logged and
//! replaced by [`SUMMARY_FALLBACK`], so one bad call cannot sink the batch.

mod gemini;

pub use gemini::{GeminiClient, SummarizeError, DEFAULT_BASE_URL, DEFAULT_MODEL};

use crate::feed::Article;

/// Summary text used whenever generation fails.
pub const SUMMARY_FALLBACK: &str = "summary generation failed";

/// An [`Article`] paired with its generated (or fallback) summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizedArticle {
    pub title: String,
    pub link: String,
    pub description: String,
    pub summary: String,
}

impl SummarizedArticle {
    pub fn new(article: Article, summary: impl Into<String>) -> Self {
        Self {
            title: article.title,
            link: article.link,
            description: article.description,
            summary: summary.into(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.summary == SUMMARY_FALLBACK
    }
}

/// Builds the summarization prompt. Title and description are embedded verbatim.
pub fn build_prompt(language: &str, title: &str, description: &str) -> String {
    format!(
        "Write a concise, easy-to-understand summary of the following technical article in {language}.\n\
         Keep it to 2-3 sentences and include information that is useful to engineers.\n\
         \n\
         Title: {title}\n\
         Description: {description}\n\
         \n\
         Summary:"
    )
}

#[derive(Debug)]
pub struct Summarizer {
    client: GeminiClient,
    language: String,
}

impl Summarizer {
    pub fn new(client: GeminiClient, language: impl Into<String>) -> Self {
        Self {
            client,
            language: language.into(),
        }
    }

    /// Summarizes one article with exactly one remote call.
    pub async fn summarize(&self, title: &str, description: &str) -> String {
        let prompt = build_prompt(&self.language, title, description);
        match self.client.generate(&prompt).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "Summary generation failed, using fallback");
                SUMMARY_FALLBACK.to_string()
            }
        }
    }

    /// Summarizes articles one after another, in order.
    ///
    /// Calls are strictly sequential so each log line maps to one article.
    pub async fn summarize_all(&self, articles: Vec<Article>) -> Vec<SummarizedArticle> {
        let total = articles.len();
        let mut summarized = Vec::with_capacity(total);
        for (i, article) in articles.into_iter().enumerate() {
            tracing::info!(index = i + 1, total, title = %article.title, "Summarizing article");
            let summary = self.summarize(&article.title, &article.description).await;
            summarized.push(SummarizedArticle::new(article, summary));
        }
        summarized
    }
}
