//! # Retrieval-Augmented Generation
//!
//! Ties the pieces together: page text is chunked and embedded into a named
//! collection, questions are embedded and matched against it, and the
//! closest chunks are handed to the language model as context.
//!
//! ## Key Components
//!
//! - `RagSystem`: one collection plus the models that read and write it
//! - `RagOptions`: chunking and retrieval settings
//! - `QueryResult`: the chunks retrieved for a question
//! - `collection_name_for`: the naming scheme for crawl collections

mod config;
mod error;
mod prompt;
mod system;

pub use config::{DEFAULT_TOP_K, RagOptions, RagOptionsBuilder};
pub use error::RagError;
pub use prompt::{NO_DOCUMENTS_MESSAGE, SYSTEM_PREAMBLE, build_prompt};
pub use system::{DOCUMENTATION_SOURCE, QueryResult, RagSystem};

use chrono::{DateTime, Utc};
use url::Url;

/// Name of the collection for a crawl of `url` started at `now`
///
/// The form is `docs_{netloc}_{YYYYmmdd_HHMMSS}`, where the netloc is the
/// host plus any explicit port with characters outside `[A-Za-z0-9._-]`
/// replaced by `_`.
pub fn collection_name_for(url: &Url, now: DateTime<Utc>) -> String {
    let netloc = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    let netloc: String = netloc
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("docs_{}_{}", netloc, now.format("%Y%m%d_%H%M%S"))
}
