use std::path::Path;
use crate::{Result, MetanetError};

/// Immutable list of hostname substrings.
#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    name: String,
    entries: Vec<String>,
}

impl Blocklist {
    pub fn new<I, S>(name: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<String> = entries
            .into_iter()
            .map(|entry| Into::<String>::into(entry).trim().to_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();
        entries.dedup();

        Self {
            name: name.to_string(),
            entries,
        }
    }

    pub fn from_file<P: AsRef<Path>>(name: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let list = Self::parse(name, &path.display().to_string(), &content)?;

        log::debug!("Loaded {} entries into '{}' blocklist from {}", list.len(), name, path.display());
        Ok(list)
    }

    /// One substring per line. Blank lines and `#` comments are skipped.
    pub fn parse(name: &str, origin: &str, content: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let entry = line.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }
            if entry.contains(char::is_whitespace) {
                return Err(MetanetError::Blocklist {
                    path: origin.to_string(),
                    line: index + 1,
                    reason: format!("entry '{}' contains whitespace", entry),
                });
            }
            entries.push(entry.to_string());
        }

        Ok(Self::new(name, entries))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn matches(&self, hostname: &str) -> bool {
        self.entries.iter().any(|entry| hostname.contains(entry.as_str()))
    }
}
