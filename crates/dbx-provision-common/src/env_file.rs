//! `KEY=VALUE` config store
//!
//! Commands read their inputs from this file and merge the identifiers they
//! create back into it, so later commands can pick them up. The format is the
//! one dotenv tools read: one `KEY=VALUE` per line, optional `export` prefix,
//! `#` comments, optionally quoted values.
//!
//! Comments and blank lines survive a load/save cycle. A key that appears
//! more than once keeps its first position and its last value, and is
//! written back exactly once.
//!
//! There is no locking: two commands saving the same file concurrently race
//! and the last writer wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Config store errors
#[derive(Debug, Error)]
pub enum EnvFileError {
    /// Failed to read or write the file
    #[error("Failed to access env file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl EnvFileError {
    /// Create an IO error with path context
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry {
        key: String,
        value: String,
        /// Written back with an `export ` prefix
        export: bool,
    },
    Verbatim(String),
}

/// In-memory view of an env file bound to its path
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
    lines: Vec<Line>,
}

impl EnvFile {
    /// An empty store that will be written to `path` on save
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: Vec::new(),
        }
    }

    /// Load the store from disk. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, EnvFileError> {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Self::parse(path, &content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Env file not found, starting empty");
                Ok(Self::empty(path))
            }
            Err(e) => Err(EnvFileError::io(&path, e)),
        }
    }

    /// Parse file content that belongs to `path`
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        Self {
            path: path.into(),
            lines: content.lines().map(parse_line).collect(),
        }
    }

    /// Path this store saves to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value for `key`; the last occurrence wins
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set `key`, overwriting the existing entry in place or appending it.
    ///
    /// Any duplicate entries for `key` are dropped.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        let mut seen = false;
        self.lines.retain_mut(|line| match line {
            Line::Entry { key: k, value: v, .. } if *k == key => {
                if seen {
                    return false;
                }
                seen = true;
                *v = value.clone();
                true
            }
            _ => true,
        });

        if !seen {
            self.lines.push(Line::Entry {
                key,
                value,
                export: false,
            });
        }
    }

    /// Apply `updates` in order. Later pairs win over earlier ones and over
    /// what the file already held.
    pub fn merge<I, K, V>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in updates {
            self.set(key, value);
        }
    }

    /// Remove every entry for `key`, returning the winning value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let previous = self.get(key).map(str::to_string);
        self.lines
            .retain(|line| !matches!(line, Line::Entry { key: k, .. } if k == key));
        previous
    }

    /// Distinct keys with their winning values, in first-appearance order
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = Vec::new();
        for line in &self.lines {
            if let Line::Entry { key, .. } = line {
                if out.iter().any(|(k, _)| *k == key.as_str()) {
                    continue;
                }
                if let Some(value) = self.get(key) {
                    out.push((key, value));
                }
            }
        }
        out
    }

    /// Render the file content, one entry per key
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut written: Vec<&str> = Vec::new();

        for line in &self.lines {
            match line {
                Line::Verbatim(text) => out.push_str(text),
                Line::Entry { key, export, .. } => {
                    if written.contains(&key.as_str()) {
                        continue;
                    }
                    written.push(key);
                    let value = self.get(key).unwrap_or_default();
                    if *export {
                        out.push_str("export ");
                    }
                    out.push_str(key);
                    out.push('=');
                    out.push_str(&quote_value(value));
                }
            }
            out.push('\n');
        }

        out
    }

    /// Write the store back to its path
    pub fn save(&self) -> Result<(), EnvFileError> {
        fs::write(&self.path, self.render()).map_err(|e| EnvFileError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "Env file saved");
        Ok(())
    }
}

fn parse_line(raw: &str) -> Line {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Verbatim(raw.to_string());
    }

    let (body, export) = match trimmed.strip_prefix("export ") {
        Some(rest) => (rest.trim_start(), true),
        None => (trimmed, false),
    };
    let Some((key, value)) = body.split_once('=') else {
        return Line::Verbatim(raw.to_string());
    };

    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Line::Verbatim(raw.to_string());
    }

    Line::Entry {
        key: key.to_string(),
        value: unquote_value(value.trim()).to_string(),
        export,
    }
}

fn unquote_value(value: &str) -> &str {
    // A quoted value ends at its closing quote; anything after it is a comment
    for quote in ['\'', '"'] {
        if let Some(rest) = value.strip_prefix(quote) {
            if let Some(end) = rest.find(quote) {
                return &rest[..end];
            }
        }
    }

    // Unquoted values end at an inline comment
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end(),
        None => value,
    }
}

fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '#' | '\'' | '"'));

    if !needs_quotes {
        value.to_string()
    } else if value.contains('\'') {
        format!("\"{value}\"")
    } else {
        format!("'{value}'")
    }
}
