//! Immutable project lists
//!
//! A project list is the artifact passed between pipeline stages: sampling
//! writes the accepted repositories, cleaning derives a smaller list, and the
//! distribution stage reads one. Stages never edit a list in place; each
//! derives a new one and writes it to its own file.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// An ordered list of repository identifiers (`owner/name`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProjectList {
    label: String,
    entries: Vec<String>,
}

impl ProjectList {
    /// Build a list from identifiers, trimming whitespace and dropping blanks
    pub fn new<S, I, E>(label: S, entries: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = E>,
        E: AsRef<str>,
    {
        Self {
            label: label.into(),
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Parse one identifier per line
    pub fn parse<S: Into<String>>(label: S, content: &str) -> Self {
        Self::new(label, content.lines())
    }

    /// Read a list file; the label is the file name
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading project list from: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read project list: {}", path.display()))?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let list = Self::parse(label, &content);
        info!("Loaded {} repositories from {}", list.len(), path.display());
        Ok(list)
    }

    /// Write the list, one identifier per line, to a new artifact
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(path, self.to_text())
            .with_context(|| format!("Failed to write project list: {}", path.display()))?;
        info!("Wrote {} repositories ({}) to {}", self.len(), self.label, path.display());
        Ok(())
    }

    /// Text form written to disk
    pub fn to_text(&self) -> String {
        self.entries.iter().fold(String::new(), |mut text, entry| {
            text.push_str(entry);
            text.push('\n');
            text
        })
    }

    /// Derive a list keeping the entries that match `keep`
    pub fn retain<S, F>(&self, label: S, mut keep: F) -> Self
    where
        S: Into<String>,
        F: FnMut(&str) -> bool,
    {
        Self {
            label: label.into(),
            entries: self.entries.iter().filter(|e| keep(e)).cloned().collect(),
        }
    }

    /// Derive a list without the given identifiers
    pub fn without<S: Into<String>>(&self, label: S, removed: &HashSet<String>) -> Self {
        self.retain(label, |entry| !removed.contains(entry))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.iter().any(|e| e == identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
