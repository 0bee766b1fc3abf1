//! Daily digest of trending tech articles, summarized by Gemini and posted to Slack.
//!
//! - [`feed`] - Fetches the trending feed and extracts the top articles
//! - [`summarize`] - Produces a short summary per article
//! - [`slack`] - Builds the message and delivers it
//! - [`pipeline`] - Runs the stages in order and reports the outcome

pub mod config;
pub mod feed;
pub mod pipeline;
pub mod slack;
pub mod summarize;
pub mod util;

pub use config::Config;
pub use pipeline::{build_client, Pipeline, RunError, RunReport, Stage};
