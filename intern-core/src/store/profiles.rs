use serde::Deserialize;
use uuid::Uuid;

use super::Store;
use crate::error::{AssistantError, Result};
use crate::models::Profile;

const PROFILE_COLUMNS: &str = "id, name, internship_name, start_date, vault_root, active";

#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub name: String,
    pub internship_name: String,
    pub start_date: String,
    pub vault_root: String,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub internship_name: Option<String>,
    pub start_date: Option<String>,
    pub vault_root: Option<String>,
}

impl Store {
    pub async fn active_profile(&self) -> Result<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE active = 1 LIMIT 1", PROFILE_COLUMNS);
        Ok(sqlx::query_as::<_, Profile>(&sql)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE id = ?", PROFILE_COLUMNS);
        Ok(sqlx::query_as::<_, Profile>(&sql)
            .bind(profile_id)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let sql = format!("SELECT {} FROM profiles ORDER BY rowid", PROFILE_COLUMNS);
        Ok(sqlx::query_as::<_, Profile>(&sql).fetch_all(self.pool()).await?)
    }

    /// Insert a profile and make it the only active one.
    pub async fn create_profile(&self, new: NewProfile) -> Result<Profile> {
        let internship_name = new.internship_name.trim();
        if internship_name.is_empty() {
            return Err(AssistantError::Validation("internship_name is required".to_string()));
        }
        if new.vault_root.trim().is_empty() {
            return Err(AssistantError::Validation("vault_root is required".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let mut tx = self.pool().begin().await?;
        sqlx::query("UPDATE profiles SET active = 0")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO profiles (id, name, internship_name, start_date, vault_root, active)
            VALUES (?, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(&id)
        .bind(new.name.trim())
        .bind(internship_name)
        .bind(new.start_date.trim())
        .bind(new.vault_root.trim())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(profile_id = %id, internship = %internship_name, "Created profile");
        self.get_profile(&id)
            .await?
            .ok_or_else(|| AssistantError::NotFound(format!("profile {}", id)))
    }

    /// Activate `profile_id`, deactivating every other profile.
    pub async fn switch_profile(&self, profile_id: &str) -> Result<Profile> {
        let mut tx = self.pool().begin().await?;
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM profiles WHERE id = ?")
            .bind(profile_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AssistantError::NotFound(format!("profile {}", profile_id)));
        }
        sqlx::query("UPDATE profiles SET active = CASE WHEN id = ? THEN 1 ELSE 0 END")
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(profile_id = %profile_id, "Switched active profile");
        self.get_profile(profile_id)
            .await?
            .ok_or_else(|| AssistantError::NotFound(format!("profile {}", profile_id)))
    }

    pub async fn update_profile(&self, profile_id: &str, update: ProfileUpdate) -> Result<Profile> {
        let current = self
            .get_profile(profile_id)
            .await?
            .ok_or_else(|| AssistantError::NotFound(format!("profile {}", profile_id)))?;

        let pick = |value: Option<String>, old: String| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(old)
        };
        let name = pick(update.name, current.name);
        let internship_name = pick(update.internship_name, current.internship_name);
        let start_date = pick(update.start_date, current.start_date);
        let vault_root = pick(update.vault_root, current.vault_root);

        sqlx::query(
            r#"
            UPDATE profiles
            SET name = ?, internship_name = ?, start_date = ?, vault_root = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(&internship_name)
        .bind(&start_date)
        .bind(&vault_root)
        .bind(profile_id)
        .execute(self.pool())
        .await?;

        tracing::info!(profile_id = %profile_id, "Updated profile");
        self.get_profile(profile_id)
            .await?
            .ok_or_else(|| AssistantError::NotFound(format!("profile {}", profile_id)))
    }
}
