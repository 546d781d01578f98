//! `KEY=VALUE` credential file (`.env.local` by default) holding the provider
//! key and the selected model. Saving merges into the existing entries.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, parsed with dotenv rules; a missing file is empty.
    pub fn load(&self) -> io::Result<BTreeMap<String, String>> {
        let entries = match dotenvy::from_path_iter(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.not_found() => return Ok(BTreeMap::new()),
            Err(e) => return Err(into_io(e)),
        };
        entries.map(|entry| entry.map_err(into_io)).collect()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(entries) => entries.get(key).cloned().filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read credential store");
                None
            }
        }
    }

    /// Merge `updates` into the file, keeping entries not mentioned.
    pub fn save(&self, updates: &[(&str, &str)]) -> io::Result<()> {
        let mut entries = self.load()?;
        for (key, value) in updates {
            entries.insert(key.to_string(), value.trim().to_string());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let body: String = entries
            .iter()
            .map(|(k, v)| format!("{}={}\n", k, quote_value(v)))
            .collect();
        std::fs::write(&self.path, body)?;
        tracing::info!(path = %self.path.display(), keys = updates.len(), "Saved credentials");
        Ok(())
    }

    pub fn api_key(&self) -> Option<String> {
        self.get(API_KEY_VAR)
    }

    pub fn selected_model(&self) -> Option<String> {
        self.get(MODEL_VAR)
    }
}

fn into_io(err: dotenvy::Error) -> io::Error {
    match err {
        dotenvy::Error::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

/// Double-quoted so `from_path_iter` reads back exactly what was written.
fn quote_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
