//! Query classification and normalisation.
//!
//! An input is an [`QueryClass::Identifier`] when, after stripping hyphens
//! and spaces, it is a checksum-valid ISBN-10 or ISBN-13. Everything else is
//! free text that must go through candidate resolution before a full search.

use serde::{Deserialize, Serialize};

/// Classification of a raw query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryClass {
    /// A valid ISBN-10 or ISBN-13.
    Identifier,
    /// Anything else: a title, author, or keyword.
    FreeText,
}

/// A user query plus whatever resolution has attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    raw: String,
    class: QueryClass,
    identifier: Option<String>,
    title: Option<String>,
    search_title: Option<String>,
}

impl SearchQuery {
    /// Classify a raw query. Identifier queries carry their normalised ISBN.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        match normalize_isbn(&raw) {
            Some(isbn) => Self {
                raw,
                class: QueryClass::Identifier,
                identifier: Some(isbn),
                title: None,
                search_title: None,
            },
            None => Self {
                raw,
                class: QueryClass::FreeText,
                identifier: None,
                title: None,
                search_title: None,
            },
        }
    }

    /// Attach an explicit resolution (identifier + canonical title).
    ///
    /// The identifier is normalised when it is a valid ISBN and kept verbatim
    /// otherwise, since some catalogs carry non-ISBN item codes.
    pub fn resolved_with(mut self, identifier: &str, title: &str) -> Self {
        let identifier = identifier.trim();
        let normalized = normalize_isbn(identifier).unwrap_or_else(|| identifier.to_string());
        self.identifier = Some(normalized);
        let title = title.trim();
        self.title = (!title.is_empty()).then(|| title.to_string());
        self
    }

    /// Attach the main title used for title matching.
    pub fn with_search_title(mut self, search_title: Option<&str>) -> Self {
        self.search_title = search_title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn class(&self) -> QueryClass {
        self.class
    }

    /// Resolved identifier, if any.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Resolved canonical title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Best title for keyword matching: main title, then canonical title.
    pub fn search_title(&self) -> Option<&str> {
        self.search_title.as_deref().or(self.title.as_deref())
    }

    /// A query is ready for fan-out once it carries an identifier.
    pub fn is_resolved(&self) -> bool {
        self.identifier.is_some()
    }

    /// Keyword to use for a source that cannot look up identifiers.
    pub fn keyword(&self) -> &str {
        self.search_title()
            .or(self.identifier.as_deref())
            .unwrap_or(&self.raw)
    }

    /// Canonical form of the raw query used for cache keys.
    ///
    /// Identifier queries use the compact ISBN so that hyphenated and plain
    /// spellings share one key; free text is lowercased and trimmed.
    pub fn normalized(&self) -> String {
        match (self.class, &self.identifier) {
            (QueryClass::Identifier, Some(isbn)) => isbn.clone(),
            _ => self.raw.trim().to_lowercase(),
        }
    }
}

/// Text before the first `" - "` separator, the catalog's subtitle marker.
pub fn main_title(title: &str) -> &str {
    title.split(" - ").next().unwrap_or(title).trim()
}

/// Classify a raw string without building a [`SearchQuery`].
pub fn classify(raw: &str) -> QueryClass {
    if normalize_isbn(raw).is_some() {
        QueryClass::Identifier
    } else {
        QueryClass::FreeText
    }
}

/// Strip hyphens and spaces and validate as ISBN-10 or ISBN-13.
///
/// Returns the compact form (uppercase `X` for an ISBN-10 check digit) on
/// success.
pub fn normalize_isbn(raw: &str) -> Option<String> {
    let mut compact = String::with_capacity(13);
    for c in raw.trim().chars() {
        match c {
            '-' | ' ' => {}
            '0'..='9' => compact.push(c),
            'x' | 'X' => compact.push('X'),
            _ => return None,
        }
    }
    let valid = match compact.len() {
        10 => is_valid_isbn10(&compact),
        13 => is_valid_isbn13(&compact),
        _ => false,
    };
    valid.then_some(compact)
}

fn is_valid_isbn10(s: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in s.chars().enumerate() {
        let value = match c {
            'X' if i == 9 => 10,
            _ => match c.to_digit(10) {
                Some(d) => d,
                None => return false,
            },
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}

fn is_valid_isbn13(s: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in s.chars().enumerate() {
        let Some(d) = c.to_digit(10) else {
            return false;
        };
        sum += if i % 2 == 0 { d } else { d * 3 };
    }
    sum % 10 == 0
}
