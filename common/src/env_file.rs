//! Parser for the flat `KEY=value` configuration file read before a deployment.
//!
//! The format is the subset of dotenv syntax the deployment needs:
//! - blank lines and lines starting with `#` are ignored
//! - a leading `export ` is tolerated
//! - values wrapped in double quotes have the quotes stripped
//! - a key given twice keeps the last value
//! - a leading UTF-8 byte order mark is ignored
//!
//! Every value is held as a [`Secret`], so printing an [`EnvFile`] never shows
//! the password it carries.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{trace, warn};

use crate::secrets::Secret;

#[derive(Clone, Debug, Default)]
pub struct EnvFile {
    entries: BTreeMap<String, Secret<String>>,
}

impl EnvFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        trace!(path = %path.display(), "reading env file");
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read env file at {}", path.display()))?;

        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut entries = BTreeMap::new();
        let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);

        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);

            let Some((key, value)) = line.split_once('=') else {
                warn!(line = index + 1, "skipping env file line without '='");
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                warn!(line = index + 1, "skipping env file line with an empty key");
                continue;
            }

            entries.insert(key.to_owned(), Secret::new(unquote(value.trim()).to_owned()));
        }

        trace!(keys = ?entries.keys().collect::<Vec<_>>(), "parsed env file");

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|value| value.expose().as_str())
    }

    /// Like [`EnvFile::get`], but keeps the value wrapped
    pub fn get_secret(&self, key: &str) -> Option<Secret<String>> {
        self.entries.get(key).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}
