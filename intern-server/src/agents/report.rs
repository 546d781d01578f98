use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use intern_core::error::Result;
use intern_core::llm::StructuredOutput;
use intern_core::vault::{bullets, build_frontmatter, finish, report_base_path};
use intern_core::Vault;

use super::progress::daily_log_path;
use super::Agents;

const SYSTEM_PROMPT: &str = "Write a professional weekly internship report in Markdown with clear \
sections. Focus on achievements, learning, challenges, and next steps.";

#[derive(Debug, Deserialize)]
pub struct WeeklyReportDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub next_week: Vec<String>,
}

impl StructuredOutput for WeeklyReportDraft {
    const NAME: &'static str = "WeeklyReportDraft";

    fn schema() -> &'static str {
        r#"{"title": "string", "summary": "string", "highlights": ["string"], "challenges": ["string"], "next_week": ["string"]}"#
    }
}

#[derive(Debug, Clone)]
pub struct WeeklyReport {
    pub path: PathBuf,
    pub week_ending: NaiveDate,
}

/// Daily logs of the seven days ending on `week_ending`, oldest first.
pub fn load_daily_logs(vault: &Vault, week_ending: NaiveDate) -> Result<Vec<String>> {
    let mut logs = Vec::new();
    for offset in (0..7).rev() {
        let day = week_ending - Duration::days(offset);
        if let Some(text) = vault.read_optional(&daily_log_path(day))? {
            logs.push(text);
        }
    }
    Ok(logs)
}

pub async fn generate_weekly(agents: &Agents<'_>, week_ending: NaiveDate) -> Result<WeeklyReport> {
    let logs = load_daily_logs(agents.vault, week_ending)?;
    let context = if logs.is_empty() {
        "No daily logs found.".to_string()
    } else {
        logs.join("\n\n")
    };

    let prompt = format!("Daily logs:\n{}", context);
    let report: WeeklyReportDraft = agents.llm.structured(Some(SYSTEM_PROMPT), &prompt).await?;

    let ending = week_ending.format("%Y-%m-%d").to_string();
    let title = match report.title.trim() {
        "" => format!("Weekly Report {}", ending),
        t => t.to_string(),
    };

    let mut lines = vec![
        build_frontmatter(&title, &["report", "weekly"], Some(&report.summary), week_ending),
        String::new(),
        format!("# {}", title),
        String::new(),
        "## Summary".to_string(),
        report.summary.trim().to_string(),
    ];
    for (heading, items) in [
        ("## Highlights", &report.highlights),
        ("## Challenges", &report.challenges),
        ("## Next Week", &report.next_week),
    ] {
        lines.push(String::new());
        lines.push(heading.to_string());
        lines.extend(bullets(items, "None noted."));
    }

    let path = report_base_path(week_ending).join(format!("{}-weekly-report.md", ending));
    agents.vault.write_markdown(&path, &finish(&lines))?;
    tracing::info!(path = %path.display(), days_logged = logs.len(), "Wrote weekly report");

    Ok(WeeklyReport { path, week_ending })
}
