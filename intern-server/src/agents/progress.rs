//! Daily progress logs, the weekly rollup and the draft cache.
//!
//! - `<week>/Progress/<date>-daily-progress.md`: written once, later runs on
//!   the same day append `## Update <timestamp>` sections.
//! - `<week>/Progress/weekly-summary.md`: regenerated from the whole week on
//!   every daily log.
//! - `<week>/Progress/<date>-draft-cache.md`: timestamped scratch entries that
//!   can later be turned into a daily log.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use intern_core::actions::ProgressInputs;
use intern_core::error::Result;
use intern_core::llm::StructuredOutput;
use intern_core::store::DAILY_LOGS_STAT;
use intern_core::vault::{
    bullets, build_frontmatter, display_path, finish, timestamp, week_base_path, VaultSection,
    WEEKLY_SUMMARY_FILE,
};
use intern_core::Vault;

use super::tasks::count_checkboxes;
use super::Agents;

const DAILY_SYSTEM_PROMPT: &str = "You are an internship progress assistant. Create a concise \
daily progress update using the provided context from notes, meetings, tasks, and progress logs. \
Do not invent facts.";

const WEEKLY_SYSTEM_PROMPT: &str = "You are an internship progress assistant. Create a \
professional weekly summary for reporting. Use only the provided context. Do not invent facts.";

const CACHE_SYSTEM_PROMPT: &str = "You are extracting daily progress inputs from draft notes. \
Return concise bullet items for done, blockers, and next_steps. Use only what exists in the text.";

/// Bullet lines taken from the cache when extraction fails.
const CACHE_FALLBACK_LIMIT: usize = 8;

#[derive(Debug, Deserialize)]
pub struct DailyProgressSummary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub done: Vec<String>,
    #[serde(default)]
    pub blockers: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

impl StructuredOutput for DailyProgressSummary {
    const NAME: &'static str = "DailyProgressSummary";

    fn schema() -> &'static str {
        r#"{"summary": "string", "done": ["string"], "blockers": ["string"], "next_steps": ["string"], "highlights": ["string"]}"#
    }
}

#[derive(Debug, Deserialize)]
pub struct WeeklyProgressSummary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub accomplishments: Vec<String>,
    #[serde(default)]
    pub meetings: Vec<String>,
    #[serde(default)]
    pub tasks_completed: Vec<String>,
    #[serde(default)]
    pub tasks_pending: Vec<String>,
    #[serde(default)]
    pub blockers: Vec<String>,
    #[serde(default)]
    pub next_week: Vec<String>,
}

impl StructuredOutput for WeeklyProgressSummary {
    const NAME: &'static str = "WeeklyProgressSummary";

    fn schema() -> &'static str {
        r#"{"summary": "string", "accomplishments": ["string"], "meetings": ["string"], "tasks_completed": ["string"], "tasks_pending": ["string"], "blockers": ["string"], "next_week": ["string"]}"#
    }
}

#[derive(Debug, Clone)]
pub struct ProgressPaths {
    pub daily: PathBuf,
    pub weekly: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheSnapshot {
    pub cache_path: String,
    pub last_entry: String,
    pub updated_at: String,
}

fn date_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn daily_log_name(date: NaiveDate) -> String {
    format!("{}-daily-progress.md", date_str(date))
}

fn progress_folder(date: NaiveDate) -> PathBuf {
    week_base_path(date).join(VaultSection::Progress.folder())
}

/// Vault-relative location of a day's progress log; creates nothing.
pub fn daily_log_path(date: NaiveDate) -> PathBuf {
    progress_folder(date).join(daily_log_name(date))
}

pub fn cache_path(date: NaiveDate) -> PathBuf {
    progress_folder(date).join(format!("{}-draft-cache.md", date_str(date)))
}

// ============================================================================
// Daily + weekly logs
// ============================================================================

pub async fn log_daily(agents: &Agents<'_>, inputs: &ProgressInputs, date: NaiveDate) -> Result<ProgressPaths> {
    let day = date_str(date);
    let log_path = agents
        .vault
        .week_subpath(date, VaultSection::Progress)?
        .join(daily_log_name(date));

    let context = build_daily_context(agents.vault, date)?;
    let prompt = format!(
        "Date: {}\nUser inputs:\n- Done: {:?}\n- Blockers: {:?}\n- Next steps: {:?}\n\nContext:\n{}",
        day, inputs.done, inputs.blockers, inputs.next_steps, context
    );
    let daily: DailyProgressSummary = agents.llm.structured(Some(DAILY_SYSTEM_PROMPT), &prompt).await?;

    let sections = daily_sections(&daily);
    if agents.vault.exists(&log_path) {
        let mut lines = vec![format!("## Update {}", timestamp()), String::new()];
        lines.extend(sections);
        agents.vault.append_markdown(&log_path, &finish(&lines))?;
        tracing::info!(path = %log_path.display(), "Appended daily progress update");
    } else {
        let title = format!("Daily Progress {}", day);
        let mut lines = vec![
            build_frontmatter(&title, &["progress", "daily"], None, date),
            String::new(),
            format!("# {}", title),
            String::new(),
        ];
        lines.extend(sections);
        agents.vault.write_markdown(&log_path, &finish(&lines))?;
        tracing::info!(path = %log_path.display(), "Wrote daily progress log");
    }

    let count = agents.store.increment_stat(DAILY_LOGS_STAT).await?;
    tracing::debug!(daily_logs = count, "Daily log counter");

    let weekly = generate_weekly(agents, date).await?;
    Ok(ProgressPaths {
        daily: log_path,
        weekly,
    })
}

fn daily_sections(daily: &DailyProgressSummary) -> Vec<String> {
    let mut lines = vec![
        "## Summary".to_string(),
        daily.summary.trim().to_string(),
        String::new(),
        "## Highlights".to_string(),
    ];
    lines.extend(bullets(&daily.highlights, "None noted."));
    for (heading, items) in [
        ("## Done", &daily.done),
        ("## Blockers", &daily.blockers),
        ("## Next Steps", &daily.next_steps),
    ] {
        lines.push(String::new());
        lines.push(heading.to_string());
        lines.extend(bullets(items, "None noted."));
    }
    lines
}

/// Regenerate the week's `weekly-summary.md`.
pub async fn generate_weekly(agents: &Agents<'_>, date: NaiveDate) -> Result<PathBuf> {
    let weekly_path = agents
        .vault
        .week_subpath(date, VaultSection::Progress)?
        .join(WEEKLY_SUMMARY_FILE);

    let context = build_week_context(agents.vault, date)?;
    let prompt = format!("Context:\n{}", context);
    let weekly: WeeklyProgressSummary = agents.llm.structured(Some(WEEKLY_SYSTEM_PROMPT), &prompt).await?;

    let mut lines = vec![
        build_frontmatter("Weekly Progress Summary", &["progress", "weekly"], None, date),
        String::new(),
        "# Weekly Progress Summary".to_string(),
        String::new(),
        "## Summary".to_string(),
        weekly.summary.trim().to_string(),
    ];
    for (heading, items) in [
        ("## Accomplishments", &weekly.accomplishments),
        ("## Meetings", &weekly.meetings),
        ("## Tasks Completed", &weekly.tasks_completed),
        ("## Tasks Pending", &weekly.tasks_pending),
        ("## Blockers", &weekly.blockers),
        ("## Next Week", &weekly.next_week),
    ] {
        lines.push(String::new());
        lines.push(heading.to_string());
        lines.extend(bullets(items, "None noted."));
    }

    agents.vault.write_markdown(&weekly_path, &finish(&lines))?;
    tracing::info!(path = %weekly_path.display(), "Regenerated weekly progress summary");
    Ok(weekly_path)
}

fn or_none(text: String) -> String {
    if text.is_empty() {
        "None.".to_string()
    } else {
        text
    }
}

/// Meetings, notes, tasks and progress files of `date`'s week whose names
/// start with the date.
pub fn build_daily_context(vault: &Vault, date: NaiveDate) -> Result<String> {
    let day = date_str(date);
    let base = week_base_path(date);
    let read = |section: VaultSection| vault.read_folder(&base.join(section.folder()), Some(day.as_str()));

    let meetings = read(VaultSection::Meetings)?;
    let notes = read(VaultSection::Notes)?;
    let tasks = read(VaultSection::Tasks)?;
    let progress = read(VaultSection::Progress)?;
    let (done, pending) = count_checkboxes(&tasks);

    Ok([
        format!("Date: {}", day),
        String::new(),
        "Meetings today:".to_string(),
        or_none(meetings),
        String::new(),
        "Notes today:".to_string(),
        or_none(notes),
        String::new(),
        "Tasks today:".to_string(),
        or_none(tasks),
        String::new(),
        format!("Tasks completed: {}; pending: {}", done, pending),
        String::new(),
        "Progress logs today:".to_string(),
        or_none(progress),
    ]
    .join("\n")
    .trim()
    .to_string())
}

/// Every file of `date`'s week except the weekly summary itself.
pub fn build_week_context(vault: &Vault, date: NaiveDate) -> Result<String> {
    let base = week_base_path(date);
    let read = |section: VaultSection| vault.read_folder(&base.join(section.folder()), None);

    let meetings = read(VaultSection::Meetings)?;
    let notes = read(VaultSection::Notes)?;
    let tasks = read(VaultSection::Tasks)?;
    let progress = read(VaultSection::Progress)?;
    let (done, pending) = count_checkboxes(&tasks);

    Ok([
        "Meetings:".to_string(),
        or_none(meetings),
        String::new(),
        "Notes:".to_string(),
        or_none(notes),
        String::new(),
        "Tasks:".to_string(),
        or_none(tasks),
        String::new(),
        format!("Tasks completed: {}; pending: {}", done, pending),
        String::new(),
        "Progress logs:".to_string(),
        or_none(progress),
    ]
    .join("\n")
    .trim()
    .to_string())
}

// ============================================================================
// Draft cache
// ============================================================================

/// Append a timestamped entry to the day's draft cache.
pub fn cache_daily_update(vault: &Vault, raw_text: &str, date: NaiveDate) -> Result<PathBuf> {
    vault.ensure_week_folders(date)?;
    let path = cache_path(date);
    let entry_time = Local::now().format("%H:%M:%S").to_string();

    if vault.exists(&path) {
        let lines = vec![format!("## Entry {}", entry_time), raw_text.trim().to_string()];
        vault.append_markdown(&path, &finish(&lines))?;
    } else {
        let title = format!("Daily Draft Cache {}", date_str(date));
        let lines = vec![
            build_frontmatter(&title, &["progress", "draft", "cache"], None, date),
            String::new(),
            format!("# {}", title),
            String::new(),
            format!("## Entry {}", entry_time),
            raw_text.trim().to_string(),
            String::new(),
            "## Notes".to_string(),
            "- Review these entries before final save.".to_string(),
        ];
        vault.write_markdown(&path, &finish(&lines))?;
    }

    tracing::info!(path = %path.display(), "Cached daily update");
    Ok(path)
}

/// Last cache entry flattened to one line; empty fields when there is no cache.
pub fn latest_cache_snapshot(vault: &Vault, date: NaiveDate) -> Result<CacheSnapshot> {
    let path = cache_path(date);
    let Some(raw) = vault.read_optional(&path)? else {
        return Ok(CacheSnapshot::default());
    };

    Ok(CacheSnapshot {
        cache_path: display_path(&path),
        last_entry: last_entry(&raw),
        updated_at: vault.modified_at(&path)?.to_rfc3339(),
    })
}

fn last_entry(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().map(str::trim).collect();
    let Some(start) = lines.iter().rposition(|l| l.starts_with("## Entry ")) else {
        return String::new();
    };
    lines[start + 1..]
        .iter()
        .take_while(|l| !l.starts_with("## "))
        .filter(|l| !l.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn the day's draft cache into progress inputs.
///
/// Falls back to the cache's first bullet lines as `done` when the model
/// cannot extract anything usable.
pub async fn collect_inputs_from_cache(agents: &Agents<'_>, date: NaiveDate) -> Result<ProgressInputs> {
    let path = cache_path(date);
    let Some(cache_text) = agents.vault.read_optional(&path)? else {
        return Ok(ProgressInputs::default());
    };

    let prompt = format!("Draft cache content:\n{}", cache_text);
    match agents
        .llm
        .structured::<DailyProgressSummary>(Some(CACHE_SYSTEM_PROMPT), &prompt)
        .await
    {
        Ok(parsed) => Ok(ProgressInputs {
            done: parsed.done,
            blockers: parsed.blockers,
            next_steps: parsed.next_steps,
        }),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cache extraction failed, using bullet lines");
            Ok(ProgressInputs {
                done: cache_bullets(&cache_text),
                ..ProgressInputs::default()
            })
        }
    }
}

fn cache_bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| l.starts_with('-'))
        .map(|l| l.trim_start_matches(['-', ' ']).trim().to_string())
        .filter(|l| !l.is_empty())
        .take(CACHE_FALLBACK_LIMIT)
        .collect()
}
