//! Periodic vault and session upkeep for the active profile.

use chrono::NaiveDate;
use tokio::sync::broadcast;

use intern_core::config::HousekeepingConfig;
use intern_core::error::Result;
use intern_core::vault::{display_path, today};
use intern_core::{Store, Vault};

#[derive(Debug, Clone, PartialEq)]
pub struct HousekeepingReport {
    pub profile_id: String,
    pub week_folder: String,
    pub session_id: String,
}

/// Make sure the active profile's vault, this week's folders and the day's
/// chat session exist. `None` when no profile is active.
pub async fn run_housekeeping_cycle(store: &Store, date: NaiveDate) -> Result<Option<HousekeepingReport>> {
    let Some(profile) = store.active_profile().await? else {
        return Ok(None);
    };
    let vault = Vault::open(profile.vault_path())?;
    let week = vault.ensure_week_folders(date)?;
    let session = store.get_or_create_daily_session(&profile.id, date).await?;

    Ok(Some(HousekeepingReport {
        profile_id: profile.id,
        week_folder: display_path(&week),
        session_id: session.id,
    }))
}

/// Called from main.rs; ticks every `interval_minutes` until shutdown.
pub async fn run_housekeeping_loop(
    store: Store,
    config: HousekeepingConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let interval = tokio::time::Duration::from_secs(config.interval_minutes.max(1) * 60);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(
        "Housekeeping loop started (interval: {}min)",
        config.interval_minutes
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match run_housekeeping_cycle(&store, today()).await {
                    Ok(Some(report)) => tracing::debug!(
                        profile_id = %report.profile_id,
                        week_folder = %report.week_folder,
                        session_id = %report.session_id,
                        "Housekeeping cycle complete"
                    ),
                    Ok(None) => tracing::debug!("Housekeeping skipped: no active profile"),
                    Err(e) => tracing::warn!("Housekeeping error (non-fatal): {}", e),
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Housekeeping loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intern_core::store::NewProfile;

    #[tokio::test]
    async fn test_cycle_without_profile_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::connect(&intern_core::AssistantConfig::rooted_at(dir.path()).database)
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 5, 20).unwrap();
        assert!(run_housekeeping_cycle(&store, date).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cycle_creates_week_folders_and_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = intern_core::AssistantConfig::rooted_at(dir.path());
        let store = Store::connect(&config.database).await.unwrap();
        let profile = store
            .create_profile(NewProfile {
                internship_name: "Infra".to_string(),
                vault_root: config.vault.default_root.clone(),
                ..NewProfile::default()
            })
            .await
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 5, 20).unwrap();
        let report = run_housekeeping_cycle(&store, date).await.unwrap().unwrap();
        assert_eq!(report.profile_id, profile.id);
        assert_eq!(report.week_folder, "2026/05/Week-3");
        for section in ["Meetings", "Tasks", "Progress", "Notes"] {
            assert!(dir.path().join("vault/2026/05/Week-3").join(section).is_dir());
        }

        // Same day reuses the session
        let again = run_housekeeping_cycle(&store, date).await.unwrap().unwrap();
        assert_eq!(again.session_id, report.session_id);
    }

    #[tokio::test]
    async fn test_loop_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::connect(&intern_core::AssistantConfig::rooted_at(dir.path()).database)
            .await
            .unwrap();
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(run_housekeeping_loop(store, HousekeepingConfig::default(), rx));
        tx.send(()).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
