//! Read-only digest of the vault for status questions. Never writes.

use chrono::NaiveDate;

use intern_core::error::Result;
use intern_core::vault::{week_base_path, VaultSection};
use intern_core::Vault;

use crate::agents::progress::daily_log_path;
use crate::agents::tasks::task_file_name;

fn or_none_found(text: Option<String>) -> String {
    match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => "None found.".to_string(),
    }
}

/// Today's progress log and task file plus the week's meetings and notes.
pub fn build_read_context(vault: &Vault, date: NaiveDate) -> Result<String> {
    let base = week_base_path(date);

    let daily = vault.read_optional(&daily_log_path(date))?;
    let tasks = vault.read_optional(
        &base
            .join(VaultSection::Tasks.folder())
            .join(task_file_name(date)),
    )?;
    let meetings = vault.read_folder(&base.join(VaultSection::Meetings.folder()), None)?;
    let notes = vault.read_folder(&base.join(VaultSection::Notes.folder()), None)?;

    Ok([
        format!("Date: {}", date.format("%Y-%m-%d")),
        String::new(),
        "Daily progress log:".to_string(),
        or_none_found(daily),
        String::new(),
        "Tasks for the day:".to_string(),
        or_none_found(tasks),
        String::new(),
        "Meetings this week:".to_string(),
        or_none_found(Some(meetings)),
        String::new(),
        "Notes this week:".to_string(),
        or_none_found(Some(notes)),
    ]
    .join("\n")
    .trim()
    .to_string())
}
