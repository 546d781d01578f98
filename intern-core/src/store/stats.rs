use super::Store;
use crate::error::Result;

impl Store {
    /// Add one to a counter and return the new value.
    pub async fn increment_stat(&self, key: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO progress_stats (key, value) VALUES (?, 1)
            ON CONFLICT(key) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(key)
        .fetch_one(self.pool())
        .await?;
        Ok(row.0)
    }

    pub async fn get_stat(&self, key: &str) -> Result<i64> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT value FROM progress_stats WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(|r| r.0).unwrap_or(0))
    }
}
