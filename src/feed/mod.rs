//! Feed acquisition and parsing.
//!
//! - [`parser`] - Line-oriented extraction of the top entries from the hotentry RSS
//! - [`fetcher`] - Single-attempt HTTP retrieval with a body size cap
//!
//! Neither half ever fails the caller: download errors and malformed documents
//! both come back as an empty article list.

mod fetcher;
mod parser;

pub use fetcher::{fetch_articles, fetch_feed, FetchError};
pub use parser::{parse_feed, Article, MAX_ARTICLES};
