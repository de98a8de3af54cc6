//! Local holdings: e-book files on disk.
//!
//! Walks the configured directory recursively, keeps files with a supported
//! extension and scores each file stem against the query. No network.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::adapter::{QueryTerm, SourceAdapter};
use crate::error::SearchError;
use crate::types::{AdapterCapabilities, BookRecord};

/// Availability reported for every local file.
const OWNED: &str = "owned";

/// Scores e-book file names under a directory.
pub struct LocalHoldingsAdapter {
    root: PathBuf,
    extensions: Vec<String>,
}

impl LocalHoldingsAdapter {
    /// Extensions are matched case-insensitively, with or without a leading dot.
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }
}

#[async_trait]
impl SourceAdapter for LocalHoldingsAdapter {
    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::BOTH
    }

    async fn lookup(
        &self,
        term: &QueryTerm,
        max_results: usize,
    ) -> Result<Vec<BookRecord>, SearchError> {
        let root = self.root.clone();
        let extensions = self.extensions.clone();
        let term = term.clone();

        tokio::task::spawn_blocking(move || scan(&root, &extensions, &term, max_results))
            .await
            .map_err(|e| SearchError::InvalidState(format!("directory scan aborted: {e}")))?
    }
}

struct Hit {
    path: PathBuf,
    title: String,
    extension: String,
    size: u64,
    score: u32,
}

fn scan(
    root: &Path,
    extensions: &[String],
    term: &QueryTerm,
    max_results: usize,
) -> Result<Vec<BookRecord>, SearchError> {
    if !root.is_dir() {
        return Err(SearchError::Config(format!(
            "books directory does not exist: {}",
            root.display()
        )));
    }

    let needle = match term {
        QueryTerm::Identifier(isbn) => digits(isbn),
        QueryTerm::Title(title) => normalize(title),
    };
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let mut hits = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(extension) = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
        else {
            continue;
        };
        if !extensions.contains(&extension) {
            continue;
        }
        let Some(title) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let haystack = match term {
            QueryTerm::Identifier(_) => digits(title),
            QueryTerm::Title(_) => normalize(title),
        };
        let score = match_score(&needle, &haystack);
        if score == 0 {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        hits.push(Hit {
            path: path.to_path_buf(),
            title: title.to_string(),
            extension,
            size,
            score,
        });
    }

    hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.path.cmp(&b.path)));
    tracing::debug!(matches = hits.len(), "local scan finished");

    Ok(hits.into_iter().take(max_results).map(to_record).collect())
}

fn to_record(hit: Hit) -> BookRecord {
    let file_name = hit
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size_mb = (hit.size as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;

    BookRecord {
        title: Some(hit.title),
        author: None,
        isbn: None,
        availability: Some(OWNED.into()),
        url: Some(hit.path.to_string_lossy().into_owned()),
        additional_info: Default::default(),
    }
    .with_info("file_name", file_name)
    .with_info("extension", hit.extension)
    .with_info("size_mb", size_mb)
    .with_info("match_score", hit.score)
}

/// Lowercase and keep only alphanumerics (Hangul included).
pub(crate) fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// 100 exact, 90 prefix, 80/70/60 substring by length ratio, 0 no match.
pub(crate) fn match_score(needle: &str, haystack: &str) -> u32 {
    if needle.is_empty() || haystack.is_empty() {
        return 0;
    }
    if needle == haystack {
        return 100;
    }
    if !haystack.contains(needle) {
        return 0;
    }
    if haystack.starts_with(needle) {
        return 90;
    }
    let ratio = needle.chars().count() as f64 / haystack.chars().count() as f64;
    if ratio >= 0.8 {
        80
    } else if ratio >= 0.5 {
        70
    } else {
        60
    }
}
