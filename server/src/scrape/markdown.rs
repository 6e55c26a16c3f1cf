//! Markdownizer (C3): convert an HTML subtree to markdown and plaintext
//! (spec §4.3 steps 4-5).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkdownError {
    #[error("markdown conversion failed: {0}")]
    Htmd(#[from] htmd::HtmdError),
}

/// Convert an HTML fragment to markdown.
pub fn to_markdown(html: &str) -> Result<String, MarkdownError> {
    let converter = htmd::HtmlToMarkdown::new();
    Ok(converter.convert(html)?)
}

/// Convert an HTML fragment to plain text, collapsing tags and entities.
pub fn to_plaintext(html: &str) -> String {
    html2text::from_read(html.as_bytes(), usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_heading_to_markdown() {
        let md = to_markdown("<h1>Hello, World!</h1>").unwrap();
        assert!(md.contains("Hello, World!"));
    }

    #[test]
    fn test_plaintext_strips_tags() {
        let text = to_plaintext("<p>Hello, <b>World!</b></p>");
        assert!(text.contains("Hello,"));
        assert!(text.contains("World!"));
        assert!(!text.contains('<'));
    }
}
