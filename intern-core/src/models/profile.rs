use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    #[serde(rename = "profile_id")]
    pub id: String,
    pub name: String,
    pub internship_name: String,
    pub start_date: String,
    pub vault_root: String,
    pub active: bool,
}

impl Profile {
    /// Vault root with `~` and environment variables expanded.
    pub fn vault_path(&self) -> PathBuf {
        expand_root(&self.vault_root)
    }
}

pub fn expand_root(root: &str) -> PathBuf {
    match shellexpand::full(root) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            tracing::warn!(root = %root, error = %e, "Vault root expansion failed, using it verbatim");
            PathBuf::from(root)
        }
    }
}
