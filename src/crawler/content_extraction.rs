//! Content extraction functionality for the crawler module

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::warn;

use crate::crawler::{CrawlerConfig, PageRecord};

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Extract a page record from raw HTML
///
/// Parses the HTML and delegates to [`extract_text`].
pub fn extract_page(html: &str, url: &str, config: &CrawlerConfig) -> Option<PageRecord> {
    let mut document = Html::parse_document(html);
    extract_text(&mut document, url, config)
}

/// Extract the main text of a parsed page
///
/// Boilerplate elements matching `config.exclude_selectors` are removed from
/// the document first. The text of the first content candidate (in the order
/// of `config.content_selectors`) that is not blank is used; when no candidate
/// has text the whole body is used instead.
///
/// # Returns
///
/// `None` when the cleaned text is empty. The record's title falls back to the
/// URL when the page has no usable `<title>`.
pub fn extract_text(
    document: &mut Html,
    url: &str,
    config: &CrawlerConfig,
) -> Option<PageRecord> {
    let title = page_title(document).unwrap_or_else(|| url.to_string());

    remove_elements(document, &config.exclude_selectors);

    let content = clean_text(&main_content_text(document, &config.content_selectors));
    if content.is_empty() {
        return None;
    }

    Some(PageRecord {
        content,
        url: url.to_string(),
        title,
    })
}

/// Normalize whitespace in extracted text
///
/// Each line is trimmed and split on double spaces, the non-empty pieces are
/// joined with single spaces and any remaining whitespace runs are collapsed.
pub fn clean_text(text: &str) -> String {
    let joined = text
        .lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    WHITESPACE_RUN.replace_all(&joined, " ").trim().to_string()
}

fn page_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| clean_text(&element.text().collect::<String>()))
        .filter(|title| !title.is_empty())
}

fn remove_elements(document: &mut Html, selectors: &[String]) {
    for selector_str in selectors {
        let selector = match Selector::parse(selector_str) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("Failed to parse selector '{}': {}", selector_str, e);
                continue;
            }
        };

        let ids: Vec<_> = document.select(&selector).map(|element| element.id()).collect();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

fn main_content_text(document: &Html, selectors: &[String]) -> String {
    for selector_str in selectors {
        let selector = match Selector::parse(selector_str) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("Failed to parse selector '{}': {}", selector_str, e);
                continue;
            }
        };

        if let Some(element) = document.select(&selector).next() {
            let text = element.text().collect::<String>();
            if !text.trim().is_empty() {
                return text;
            }
        }
    }

    // No candidate had text, fall back to the whole body
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());
    match body {
        Some(body) => body.text().collect(),
        None => document.root_element().text().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Option<PageRecord> {
        extract_page(html, "https://site.com/docs/page", &CrawlerConfig::default())
    }

    #[test]
    fn test_clean_text() {
        let raw = "\n   Hello   world  \n\n\tSecond line  with  gaps\n   ";
        assert_eq!(clean_text(raw), "Hello world Second line with gaps");
        assert_eq!(clean_text(" \n \t "), "");
    }

    #[test]
    fn test_prefers_main_content() {
        let html = r#"<html><head><title> Getting Started </title></head>
            <body>
              <header>Site header</header>
              <nav><a href="/docs/a">A</a></nav>
              <main>
                <h1>Install</h1>
                <p>Run the installer.</p>
              </main>
              <footer>Copyright</footer>
            </body></html>"#;

        let record = extract(html).unwrap();
        assert_eq!(record.title, "Getting Started");
        assert_eq!(record.url, "https://site.com/docs/page");
        assert_eq!(record.content, "Install Run the installer.");
    }

    #[test]
    fn test_title_whitespace_is_collapsed() {
        let html = "<html><head><title>\n  Getting\n\tStarted  \n</title></head>\
            <body><main>Text</main></body></html>";

        let record = extract(html).unwrap();
        assert_eq!(record.title, "Getting Started");

        let markdown = crate::render_crawl_markdown("https://site.com/docs/", &[record]);
        assert!(markdown.contains("## Getting Started\nSource: https://site.com/docs/page\n"));
    }

    #[test]
    fn test_candidate_priority() {
        let html = r#"<html><body>
              <div class="docs">Docs container</div>
              <div class="content">Content container</div>
              <article>Article text</article>
            </body></html>"#;

        assert_eq!(extract(html).unwrap().content, "Article text");
    }

    #[test]
    fn test_role_main_candidate() {
        let html = r#"<html><body>
              <div>Outer text</div>
              <div role="main">Role main text</div>
            </body></html>"#;

        assert_eq!(extract(html).unwrap().content, "Role main text");
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = r#"<html><head><script>var x = 1;</script></head>
            <body><aside>Related</aside><div><p>Plain page body</p></div></body></html>"#;

        let record = extract(html).unwrap();
        assert_eq!(record.content, "Plain page body");
        assert_eq!(record.title, "https://site.com/docs/page");
    }

    #[test]
    fn test_boilerplate_only_page_yields_nothing() {
        let html = r#"<html><head><style>body { color: red; }</style>
            <script>console.log("hi")</script></head>
            <body><nav><a href="/docs/a">A</a> <a href="/docs/b">B</a></nav><main></main></body></html>"#;

        assert!(extract(html).is_none());
    }

    #[test]
    fn test_excluded_elements_inside_main_are_removed() {
        let html = r#"<html><body><main>
              <header>Breadcrumbs</header>
              <p>Body text</p>
              <script>track()</script>
            </main></body></html>"#;

        assert_eq!(extract(html).unwrap().content, "Body text");
    }
}
