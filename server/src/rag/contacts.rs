//! Contact Extractor (C5): finds emails, phone numbers, and websites in text
//! and captures a bounded surrounding context for each (spec §4.4 step 4,
//! §4.6).

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokenizers::Tokenizer;

const CONTEXT_CHARS_BEFORE: usize = 200;
const CONTEXT_CHARS_AFTER: usize = 50;
const CONTEXT_TOKEN_LIMIT: usize = 512;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}").expect("valid regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\d{3}\)[\s-]*\d{3}[\s-]*\d{4}").expect("valid regex"));
static WEBSITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactType {
    Email,
    Phone,
    Website,
}

impl ContactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactType::Email => "email",
            ContactType::Phone => "phone",
            ContactType::Website => "website",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Contact {
    pub value: String,
    /// Empty when the surrounding context exceeds the model's token budget.
    pub context: String,
    pub contact_type: ContactType,
}

pub struct ContactExtractor {
    tokenizer: Arc<Tokenizer>,
}

impl ContactExtractor {
    pub fn new(tokenizer: Arc<Tokenizer>) -> Self {
        Self { tokenizer }
    }

    pub fn extract(&self, text: &str) -> Vec<Contact> {
        let mut contacts = Vec::new();

        for m in EMAIL_RE.find_iter(text) {
            contacts.push(Contact {
                value: m.as_str().to_string(),
                context: self.context(text, m.start(), m.end()),
                contact_type: ContactType::Email,
            });
        }

        for m in PHONE_RE.find_iter(text) {
            contacts.push(Contact {
                value: m.as_str().to_string(),
                context: self.context(text, m.start(), m.end()),
                contact_type: ContactType::Phone,
            });
        }

        for m in WEBSITE_RE.find_iter(text) {
            let value = m.as_str().trim_end_matches(['.', ',', ';', ':']).to_string();
            contacts.push(Contact {
                value,
                context: self.context(text, m.start(), m.end()),
                contact_type: ContactType::Website,
            });
        }

        contacts
    }

    /// `CONTEXT_CHARS_BEFORE`/`_AFTER` around `[start, end)`, snapped to char
    /// boundaries since `text` may contain multi-byte characters. Empty if
    /// the resulting window would overflow the model's token budget.
    fn context(&self, text: &str, start: usize, end: usize) -> String {
        let from = floor_char_boundary(text, start.saturating_sub(CONTEXT_CHARS_BEFORE));
        let to = ceil_char_boundary(text, (end + CONTEXT_CHARS_AFTER).min(text.len()));
        let window = &text[from..to];

        match self.tokenizer.encode(window, true) {
            Ok(encoding) if encoding.get_ids().len() <= CONTEXT_TOKEN_LIMIT => window.to_string(),
            _ => String::new(),
        }
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_punctuation_is_trimmed_from_websites() {
        let trimmed = "https://example.com/page".trim_end_matches(['.', ',', ';', ':']);
        assert_eq!(trimmed, "https://example.com/page");
        let trimmed = "https://example.com/page.".trim_end_matches(['.', ',', ';', ':']);
        assert_eq!(trimmed, "https://example.com/page");
    }

    #[test]
    fn test_char_boundary_snapping_never_panics_on_multibyte_text() {
        let text = "caf\u{e9} ".repeat(100);
        let from = floor_char_boundary(&text, 3);
        let to = ceil_char_boundary(&text, text.len() - 1);
        let _ = &text[from..to];
    }

    #[test]
    fn test_email_regex_matches_basic_address() {
        assert!(EMAIL_RE.is_match("contact us at hello@example.com today"));
    }

    #[test]
    fn test_phone_regex_matches_formatted_number() {
        assert!(PHONE_RE.is_match("call (555) 123-4567 now"));
    }

    #[test]
    fn test_website_regex_matches_bare_www() {
        assert!(WEBSITE_RE.is_match("visit www.example.com for more"));
    }
}
