use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::domain::ProductRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// Marketplace a product URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Booth,
    Gumroad,
}

impl Source {
    pub fn detect(url: &str) -> Option<Self> {
        if url.contains("booth.pm") {
            Some(Source::Booth)
        } else if url.contains("gumroad.com") {
            Some(Source::Gumroad)
        } else {
            None
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Booth => write!(f, "booth"),
            Source::Gumroad => write!(f, "gumroad"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListedEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub source: Option<Source>,
    pub product: Option<ProductRecord>,
}

/// A non-fatal problem collected during a best-effort operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub subject: String,
    pub message: String,
}

impl Issue {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Listing {
    pub entries: Vec<ListedEntry>,
    pub issues: Vec<Issue>,
}
