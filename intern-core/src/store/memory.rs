//! Chat memory: daily sessions, the append-only message log and per-session
//! agent state.

use chrono::NaiveDate;
use uuid::Uuid;

use super::{now_rfc3339, Store};
use crate::actions::ActionRequest;
use crate::error::{AssistantError, Result};
use crate::models::{AgentState, ChatMessage, ChatSession, Role};

const SESSION_COLUMNS: &str = "id, profile_id, day, created_at, updated_at";

impl Store {
    /// The profile's session for `day`, created on first use.
    pub async fn get_or_create_daily_session(
        &self,
        profile_id: &str,
        day: NaiveDate,
    ) -> Result<ChatSession> {
        let day = day.format("%Y-%m-%d").to_string();
        let sql = format!(
            "SELECT {} FROM chat_sessions WHERE profile_id = ? AND day = ? ORDER BY created_at LIMIT 1",
            SESSION_COLUMNS
        );
        if let Some(session) = sqlx::query_as::<_, ChatSession>(&sql)
            .bind(profile_id)
            .bind(&day)
            .fetch_optional(self.pool())
            .await?
        {
            return Ok(session);
        }

        let id = Uuid::new_v4().to_string();
        self.insert_session(&id, profile_id, &day).await?;
        tracing::debug!(session_id = %id, profile_id = %profile_id, day = %day, "Created daily session");
        self.require_session(&id).await
    }

    /// Resume a caller-supplied session id, registering it if unknown. A
    /// session owned by another profile is reported as not found.
    pub async fn ensure_session(&self, session_id: &str, profile_id: &str, day: NaiveDate) -> Result<ChatSession> {
        if let Some(session) = self.get_session(session_id).await? {
            if session.profile_id != profile_id {
                return Err(AssistantError::NotFound(format!("Session {}", session_id)));
            }
            return Ok(session);
        }
        self.insert_session(session_id, profile_id, &day.format("%Y-%m-%d").to_string())
            .await?;
        self.require_session(session_id).await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        let sql = format!("SELECT {} FROM chat_sessions WHERE id = ?", SESSION_COLUMNS);
        Ok(sqlx::query_as::<_, ChatSession>(&sql)
            .bind(session_id)
            .fetch_optional(self.pool())
            .await?)
    }

    /// Most recently active first.
    pub async fn list_sessions(&self, profile_id: &str) -> Result<Vec<ChatSession>> {
        let sql = format!(
            "SELECT {} FROM chat_sessions WHERE profile_id = ? ORDER BY updated_at DESC, created_at DESC",
            SESSION_COLUMNS
        );
        Ok(sqlx::query_as::<_, ChatSession>(&sql)
            .bind(profile_id)
            .fetch_all(self.pool())
            .await?)
    }

    async fn insert_session(&self, id: &str, profile_id: &str, day: &str) -> Result<()> {
        let now = now_rfc3339();
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO chat_sessions (id, profile_id, day, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(profile_id)
        .bind(day)
        .bind(&now)
        .bind(&now)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn require_session(&self, session_id: &str) -> Result<ChatSession> {
        self.get_session(session_id)
            .await?
            .ok_or_else(|| AssistantError::NotFound(format!("session {}", session_id)))
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    pub async fn add_message(
        &self,
        session_id: &str,
        profile_id: &str,
        role: Role,
        content: &str,
    ) -> Result<()> {
        let now = now_rfc3339();
        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"
            INSERT INTO chat_messages (session_id, profile_id, role, timestamp, content)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(session_id)
        .bind(profile_id)
        .bind(role.as_str())
        .bind(&now)
        .bind(content)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// The last `limit` messages of a session, oldest first.
    pub async fn history(&self, session_id: &str, profile_id: &str, limit: u32) -> Result<Vec<ChatMessage>> {
        Ok(sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, session_id, profile_id, role, timestamp, content FROM (
                SELECT id, session_id, profile_id, role, timestamp, content
                FROM chat_messages
                WHERE session_id = ? AND profile_id = ?
                ORDER BY id DESC
                LIMIT ?
            ) ORDER BY id ASC
            "#,
        )
        .bind(session_id)
        .bind(profile_id)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await?)
    }

    /// History rendered as `role: content` lines for prompts.
    pub async fn context(&self, session_id: &str, profile_id: &str, limit: u32) -> Result<String> {
        let messages = self.history(session_id, profile_id, limit).await?;
        Ok(messages
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Drop a session's messages and its agent state.
    pub async fn clear_history(&self, session_id: &str, profile_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM chat_messages WHERE session_id = ? AND profile_id = ?")
            .bind(session_id)
            .bind(profile_id)
            .execute(self.pool())
            .await?;
        self.clear_state(session_id).await?;
        tracing::info!(session_id = %session_id, "Cleared conversation memory");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Agent state
    // ------------------------------------------------------------------

    pub async fn get_state(&self, session_id: &str) -> Result<AgentState> {
        let row: Option<(Option<String>, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT last_intent, pending_action, conversation_mode FROM agent_state WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(self.pool())
        .await?;

        let Some((last_intent, pending_raw, conversation_mode)) = row else {
            return Ok(AgentState::default());
        };

        let pending_action = pending_raw.and_then(|raw| {
            serde_json::from_str::<ActionRequest>(&raw)
                .map_err(|e| {
                    tracing::warn!(session_id = %session_id, error = %e, "Discarding unreadable pending action");
                })
                .ok()
        });

        Ok(AgentState {
            last_intent,
            pending_action,
            conversation_mode,
        })
    }

    pub async fn update_state(&self, session_id: &str, profile_id: &str, state: &AgentState) -> Result<()> {
        let pending = state
            .pending_action
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(
            r#"
            INSERT INTO agent_state (session_id, profile_id, last_intent, pending_action, conversation_mode, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                profile_id = excluded.profile_id,
                last_intent = excluded.last_intent,
                pending_action = excluded.pending_action,
                conversation_mode = excluded.conversation_mode,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session_id)
        .bind(profile_id)
        .bind(&state.last_intent)
        .bind(pending)
        .bind(&state.conversation_mode)
        .bind(now_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn clear_state(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM agent_state WHERE session_id = ?")
            .bind(session_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::NoteCategory;
    use crate::store::test_store;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[tokio::test]
    async fn test_daily_session_is_reused_per_day() {
        let (store, _dir) = test_store().await;
        let a = store.get_or_create_daily_session("p1", day(4)).await.unwrap();
        let b = store.get_or_create_daily_session("p1", day(4)).await.unwrap();
        let c = store.get_or_create_daily_session("p1", day(5)).await.unwrap();
        let other = store.get_or_create_daily_session("p2", day(4)).await.unwrap();

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_ne!(a.id, other.id);
        assert_eq!(a.day, "2026-05-04");
        assert_eq!(store.list_sessions("p1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_history_returns_last_messages_in_order() {
        let (store, _dir) = test_store().await;
        let session = store.get_or_create_daily_session("p1", day(4)).await.unwrap();
        for i in 0..5 {
            store
                .add_message(&session.id, "p1", Role::User, &format!("msg {}", i))
                .await
                .unwrap();
        }
        store
            .add_message(&session.id, "p1", Role::Assistant, "reply")
            .await
            .unwrap();

        let last = store.history(&session.id, "p1", 3).await.unwrap();
        let contents: Vec<&str> = last.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg 3", "msg 4", "reply"]);
        assert_eq!(last[2].role, Role::Assistant);

        let context = store.context(&session.id, "p1", 2).await.unwrap();
        assert_eq!(context, "user: msg 4\nassistant: reply");

        let refreshed = store.get_session(&session.id).await.unwrap().unwrap();
        assert!(refreshed.updated_at >= session.updated_at);
    }

    #[tokio::test]
    async fn test_state_round_trips_pending_action() {
        let (store, _dir) = test_store().await;
        assert_eq!(store.get_state("s1").await.unwrap(), AgentState::default());

        let state = AgentState {
            last_intent: Some("conversation".to_string()),
            pending_action: Some(ActionRequest::OrganizeNote {
                text: "rust traits".to_string(),
                category: NoteCategory::Learning,
                date: None,
            }),
            conversation_mode: Some("act".to_string()),
        };
        store.update_state("s1", "p1", &state).await.unwrap();
        assert_eq!(store.get_state("s1").await.unwrap(), state);

        let cleared = AgentState {
            pending_action: None,
            ..state
        };
        store.update_state("s1", "p1", &cleared).await.unwrap();
        assert!(store.get_state("s1").await.unwrap().pending_action.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_pending_action_reads_as_none() {
        let (store, _dir) = test_store().await;
        sqlx::query(
            "INSERT INTO agent_state (session_id, profile_id, last_intent, pending_action, updated_at) VALUES ('s1', 'p1', 'write_command', '{\"action\":\"launch_rocket\"}', '')",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let state = store.get_state("s1").await.unwrap();
        assert_eq!(state.last_intent.as_deref(), Some("write_command"));
        assert!(state.pending_action.is_none());
    }

    #[tokio::test]
    async fn test_clear_history_drops_messages_and_state() {
        let (store, _dir) = test_store().await;
        let session = store.get_or_create_daily_session("p1", day(4)).await.unwrap();
        store.add_message(&session.id, "p1", Role::User, "hi").await.unwrap();
        store
            .update_state(
                &session.id,
                "p1",
                &AgentState {
                    pending_action: Some(ActionRequest::WeeklyReport { date: None }),
                    ..AgentState::default()
                },
            )
            .await
            .unwrap();

        store.clear_history(&session.id, "p1").await.unwrap();
        assert!(store.history(&session.id, "p1", 10).await.unwrap().is_empty());
        assert_eq!(store.get_state(&session.id).await.unwrap(), AgentState::default());
    }

    #[tokio::test]
    async fn test_ensure_session_registers_unknown_id() {
        let (store, _dir) = test_store().await;
        let session = store.ensure_session("client-chosen", "p1", day(9)).await.unwrap();
        assert_eq!(session.id, "client-chosen");
        assert_eq!(session.day, "2026-05-09");
        let again = store.ensure_session("client-chosen", "p1", day(10)).await.unwrap();
        assert_eq!(again.day, "2026-05-09");
    }

    #[tokio::test]
    async fn test_ensure_session_rejects_other_profiles_session() {
        let (store, _dir) = test_store().await;
        store.ensure_session("shared", "p1", day(9)).await.unwrap();

        let err = store.ensure_session("shared", "p2", day(9)).await.unwrap_err();
        assert!(matches!(err, AssistantError::NotFound(_)));
        assert_eq!(store.get_session("shared").await.unwrap().unwrap().profile_id, "p1");
    }
}
