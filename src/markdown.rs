use pulldown_cmark::{html, Options, Parser};

use crate::crawler::PageRecord;

/// Assembles crawled pages into a single markdown document
///
/// The document starts with a top-level heading naming the crawl's base URL,
/// followed by one section per page with its title, source URL and content.
pub fn render_crawl_markdown(base_url: &str, records: &[PageRecord]) -> String {
    let mut markdown = format!("# Documentation for {}\n\n", base_url);

    for record in records {
        markdown.push_str(&format!("## {}\n", record.title));
        markdown.push_str(&format!("Source: {}\n\n", record.url));
        markdown.push_str(&record.content);
        markdown.push_str("\n\n---\n\n");
    }

    markdown
}

/// Renders markdown text to HTML
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, url: &str, content: &str) -> PageRecord {
        PageRecord {
            content: content.to_string(),
            url: url.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_render_sections() {
        let records = vec![
            record("Intro", "https://site.com/docs/", "Welcome to the docs."),
            record("Install", "https://site.com/docs/install", "Run the installer."),
        ];

        let markdown = render_crawl_markdown("https://site.com/docs/", &records);

        assert!(markdown.starts_with("# Documentation for https://site.com/docs/\n\n"));
        assert_eq!(markdown.lines().filter(|l| l.starts_with("## ")).count(), 2);
        assert!(markdown.contains("## Install\nSource: https://site.com/docs/install\n\nRun the installer.\n\n---\n\n"));
        assert_eq!(markdown.matches("---").count(), 2);
    }

    #[test]
    fn test_render_without_records() {
        let markdown = render_crawl_markdown("https://site.com/docs", &[]);
        assert_eq!(markdown, "# Documentation for https://site.com/docs\n\n");
    }

    #[test]
    fn test_markdown_to_html() {
        let html = markdown_to_html("# Title\n\nSome *text*.\n\n---\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>text</em>"));
        assert!(html.contains("<hr />"));
    }
}
