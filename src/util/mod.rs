//! Utility functions for common operations.
//!
//! - **Endpoint validation**: keeps credentials off plain-HTTP, non-local hosts
//! - **Text processing**: character-count truncation matching Slack's text limits

mod text;
mod url_validator;

pub use text::{char_len, truncate_chars, ELLIPSIS};
pub use url_validator::{validate_endpoint, UrlValidationError};
