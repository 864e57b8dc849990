//! # docrag - Documentation crawling and retrieval-augmented answers
//!
//! This crate crawls a documentation website, extracts the readable text of
//! every page under the start URL, stores the text in a persistent vector
//! index and answers natural-language questions about it by retrieving the
//! closest passages and asking a language model to synthesize an answer.
//!
//! ## Pipeline
//!
//! - [`crawler`]: bounded, same-scope traversal with URL normalization,
//!   link extraction and main-content text extraction
//! - [`processor`]: splitting page text into id-tagged chunks
//! - [`index`]: libsql-backed collections of embedded chunks with
//!   nearest-neighbour lookup
//! - [`rag`]: the orchestrator tying chunks, embeddings, retrieval and the
//!   language model together
//! - [`server`]: the `/scrape`, `/query` and `/collections` HTTP endpoints
//!
//! ## Example
//!
//! ```rust,no_run
//! use docrag::crawler::{crawl_website, CrawlerConfig, HttpFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CrawlerConfig::builder().max_pages(20).build();
//!     let fetcher = HttpFetcher::new(&config)?;
//!     let report = crawl_website(&fetcher, "https://example.com/docs/", &config).await?;
//!
//!     println!("{}", report.to_markdown());
//!     Ok(())
//! }
//! ```

mod error;
mod markdown;
pub mod model;

pub mod crawler;
pub mod index;
pub mod processor;
pub mod rag;
pub mod server;

pub use error::{Error, Result};
pub use markdown::{markdown_to_html, render_crawl_markdown};

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
