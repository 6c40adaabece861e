use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ScrapeError};

pub const DEFAULT_IDENTIFIER: &str = "pageData";

/// Locates the object literal assigned to a known script variable.
pub struct DataBlobExtractor {
    pattern: Regex,
}

impl DataBlobExtractor {
    pub fn new(identifier: &str) -> Result<Self> {
        // Non-greedy so the blob ends at the first `};` after the opening brace.
        let pattern = format!(
            r"(?s)(?:\b(?:var|let|const)\s+)?\b{}\s*=\s*(\{{.*?\}});",
            regex::escape(identifier)
        );
        let pattern = Regex::new(&pattern).map_err(|e| ScrapeError::Pattern(e.to_string()))?;

        Ok(Self { pattern })
    }

    /// Returns the object literal, braces included, or `None` when the page
    /// carries no such assignment.
    pub fn extract<'a>(&self, page_text: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(page_text)
            .and_then(|captures| captures.get(1))
            .map(|blob| blob.as_str())
    }
}

static DEFAULT_EXTRACTOR: Lazy<DataBlobExtractor> = Lazy::new(|| {
    DataBlobExtractor::new(DEFAULT_IDENTIFIER).expect("default identifier pattern compiles")
});

/// Shorthand for the default `pageData` extractor.
pub fn extract_data_blob(page_text: &str) -> Option<&str> {
    DEFAULT_EXTRACTOR.extract(page_text)
}
