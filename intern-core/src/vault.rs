//! Vault writer: deterministic folder layout and Markdown file I/O
//!
//! Layout, relative to the vault root:
//! - `{year}/{month}/Week-{n}/{Meetings,Tasks,Progress,Notes}/…md` where
//!   `n = (day - 1) / 7 + 1`
//! - `Reports/{year}/{month}/…md`
//!
//! Every path handed out by this module is relative to the root; callers turn
//! it into a display string with [`display_path`].

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate};
use regex::Regex;
use walkdir::WalkDir;

use crate::error::AssistantError;

/// Top-level folders created when a vault is opened.
const VAULT_STRUCTURE: &[&str] = &["Reports", "Templates"];

/// Generated weekly rollup; never fed back into context reads.
pub const WEEKLY_SUMMARY_FILE: &str = "weekly-summary.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultSection {
    Meetings,
    Tasks,
    Progress,
    Notes,
}

impl VaultSection {
    pub const ALL: [VaultSection; 4] = [
        VaultSection::Meetings,
        VaultSection::Tasks,
        VaultSection::Progress,
        VaultSection::Notes,
    ];

    pub fn folder(&self) -> &'static str {
        match self {
            VaultSection::Meetings => "Meetings",
            VaultSection::Tasks => "Tasks",
            VaultSection::Progress => "Progress",
            VaultSection::Notes => "Notes",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    /// Open a vault rooted at `root`, creating the root and its top-level folders.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let vault = Self { root: root.into() };
        std::fs::create_dir_all(&vault.root)?;
        for sub in VAULT_STRUCTURE {
            std::fs::create_dir_all(vault.root.join(sub))?;
        }
        Ok(vault)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn full_path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn exists(&self, relative: &Path) -> bool {
        self.full_path(relative).is_file()
    }

    pub fn write_markdown(&self, relative: &Path, content: &str) -> io::Result<PathBuf> {
        let full = self.full_path(relative);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, content)?;
        tracing::debug!(path = %full.display(), bytes = content.len(), "Wrote markdown");
        Ok(full)
    }

    /// Append `content` after a blank line, or create the file if it is missing.
    pub fn append_markdown(&self, relative: &Path, content: &str) -> io::Result<PathBuf> {
        let full = self.full_path(relative);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let combined = match std::fs::read_to_string(&full) {
            Ok(existing) => format!("{}\n\n{}", existing.trim_end(), content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => content.to_string(),
            Err(e) => return Err(e),
        };
        std::fs::write(&full, combined)?;
        tracing::debug!(path = %full.display(), "Appended markdown");
        Ok(full)
    }

    pub fn read_markdown(&self, relative: &Path) -> io::Result<String> {
        std::fs::read_to_string(self.full_path(relative))
    }

    /// Like [`Vault::read_markdown`] but a missing file is `None`.
    pub fn read_optional(&self, relative: &Path) -> io::Result<Option<String>> {
        match self.read_markdown(relative) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn modified_at(&self, relative: &Path) -> io::Result<DateTime<Local>> {
        let modified = std::fs::metadata(self.full_path(relative))?.modified()?;
        Ok(DateTime::<Local>::from(modified))
    }

    /// Create the four section folders of the week containing `date`.
    pub fn ensure_week_folders(&self, date: NaiveDate) -> io::Result<PathBuf> {
        let base = week_base_path(date);
        for section in VaultSection::ALL {
            std::fs::create_dir_all(self.root.join(&base).join(section.folder()))?;
        }
        Ok(base)
    }

    pub fn week_subpath(&self, date: NaiveDate, section: VaultSection) -> io::Result<PathBuf> {
        Ok(self.ensure_week_folders(date)?.join(section.folder()))
    }

    /// Markdown files under `relative_folder` (recursive, sorted, weekly summaries
    /// excluded), as vault-relative paths. A missing folder yields nothing.
    pub fn list_markdown(&self, relative_folder: &Path) -> io::Result<Vec<PathBuf>> {
        let folder = self.full_path(relative_folder);
        if !folder.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&folder).sort_by_file_name() {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !name.ends_with(".md") || name.eq_ignore_ascii_case(WEEKLY_SUMMARY_FILE) {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                files.push(relative.to_path_buf());
            }
        }
        Ok(files)
    }

    /// Concatenate the Markdown files of a folder as `## <file name>` blocks.
    ///
    /// With `name_prefix`, only files whose name starts with it are read (used to
    /// restrict a week folder to one day's `YYYY-MM-DD-*` files).
    pub fn read_folder(&self, relative_folder: &Path, name_prefix: Option<&str>) -> io::Result<String> {
        let mut blocks = Vec::new();
        for relative in self.list_markdown(relative_folder)? {
            let name = relative
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Some(prefix) = name_prefix {
                if !name.starts_with(prefix) {
                    continue;
                }
            }
            let text = self.read_markdown(&relative)?;
            blocks.push(format!("## {}\n{}", name, text));
        }
        Ok(blocks.join("\n\n"))
    }
}

// ============================================================================
// Path helpers
// ============================================================================

pub fn week_of_month(date: NaiveDate) -> u32 {
    use chrono::Datelike;
    (date.day() - 1) / 7 + 1
}

pub fn week_base_path(date: NaiveDate) -> PathBuf {
    use chrono::Datelike;
    PathBuf::from(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
        .join(format!("Week-{}", week_of_month(date)))
}

pub fn report_base_path(date: NaiveDate) -> PathBuf {
    use chrono::Datelike;
    PathBuf::from("Reports")
        .join(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
}

/// Vault-relative path rendered with `/` separators.
pub fn display_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Accept a user-supplied vault path only if it stays inside the vault.
pub fn validate_relative(raw: &str) -> Result<PathBuf, AssistantError> {
    let path = PathBuf::from(raw.trim());
    if path.as_os_str().is_empty() {
        return Err(AssistantError::Validation("path is empty".to_string()));
    }
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(AssistantError::Validation(format!(
            "path must be relative to the vault: {}",
            raw
        )));
    }
    Ok(path)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn resolve_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(today)
}

/// Parse `YYYY-MM-DD`; blank input means today.
pub fn parse_date(raw: Option<&str>) -> Result<NaiveDate, AssistantError> {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| AssistantError::Validation(format!("invalid date '{}': {}", s, e))),
        _ => Ok(today()),
    }
}

/// Timestamp used in appended `## Update …` headings.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ============================================================================
// Markdown helpers
// ============================================================================

fn non_slug_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\s-]").expect("static regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

pub fn slugify(text: &str) -> String {
    let cleaned = non_slug_chars().replace_all(text, "");
    let lowered = cleaned.trim().to_lowercase();
    let slug = whitespace_runs().replace_all(&lowered, "-").into_owned();
    if slug.is_empty() {
        "note".to_string()
    } else {
        slug
    }
}

/// Quote a YAML scalar when it would otherwise be misread.
pub fn yaml_scalar(value: &str) -> String {
    const SPECIAL: &[char] = &[
        ':', '#', '[', ']', '{', '}', ',', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`', '\n',
    ];
    let needs_quotes = value.is_empty()
        || value.trim() != value
        || value.starts_with(['-', '?'])
        || value.contains(SPECIAL);
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}

pub fn build_frontmatter(title: &str, tags: &[&str], summary: Option<&str>, date: NaiveDate) -> String {
    let mut lines = vec![
        "---".to_string(),
        format!("title: {}", yaml_scalar(title)),
        format!("date: {}", date.format("%Y-%m-%d")),
    ];
    if !tags.is_empty() {
        let rendered: Vec<String> = tags.iter().map(|t| yaml_scalar(t)).collect();
        lines.push(format!("tags: [{}]", rendered.join(", ")));
    }
    if let Some(summary) = summary.map(str::trim).filter(|s| !s.is_empty()) {
        lines.push(format!("summary: {}", yaml_scalar(summary)));
    }
    lines.push("---".to_string());
    lines.join("\n")
}

/// `- item` lines, or a single placeholder bullet when there are no items.
pub fn bullets(items: &[String], placeholder: &str) -> Vec<String> {
    if items.is_empty() {
        return vec![format!("- {}", placeholder)];
    }
    items.iter().map(|item| format!("- {}", item.trim())).collect()
}

/// Join lines into file content with exactly one trailing newline.
pub fn finish(lines: &[String]) -> String {
    format!("{}\n", lines.join("\n").trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_paths_are_deterministic() {
        assert_eq!(week_of_month(date(2026, 3, 1)), 1);
        assert_eq!(week_of_month(date(2026, 3, 7)), 1);
        assert_eq!(week_of_month(date(2026, 3, 8)), 2);
        assert_eq!(week_of_month(date(2026, 3, 31)), 5);
        assert_eq!(
            display_path(&week_base_path(date(2026, 3, 15))),
            "2026/03/Week-3"
        );
        assert_eq!(display_path(&report_base_path(date(2026, 11, 2))), "Reports/2026/11");
    }

    #[test]
    fn test_open_creates_structure_and_week_folders() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path().join("vault")).unwrap();
        assert!(vault.root().join("Reports").is_dir());
        assert!(vault.root().join("Templates").is_dir());

        let tasks = vault.week_subpath(date(2026, 1, 20), VaultSection::Tasks).unwrap();
        assert_eq!(display_path(&tasks), "2026/01/Week-3/Tasks");
        for section in VaultSection::ALL {
            assert!(vault.root().join("2026/01/Week-3").join(section.folder()).is_dir());
        }
    }

    #[test]
    fn test_append_adds_blank_line_separator() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        let rel = Path::new("Notes/a.md");

        vault.append_markdown(rel, "first\n").unwrap();
        vault.append_markdown(rel, "second\n").unwrap();
        assert_eq!(vault.read_markdown(rel).unwrap(), "first\n\nsecond\n");
    }

    #[test]
    fn test_read_optional_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        assert!(vault.read_optional(Path::new("nope.md")).unwrap().is_none());
        assert_eq!(vault.read_folder(Path::new("missing"), None).unwrap(), "");
    }

    #[test]
    fn test_read_folder_filters_prefix_and_weekly_summary() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        vault.write_markdown(Path::new("P/2026-03-02-daily-progress.md"), "monday").unwrap();
        vault.write_markdown(Path::new("P/2026-03-03-daily-progress.md"), "tuesday").unwrap();
        vault.write_markdown(Path::new("P/weekly-summary.md"), "rollup").unwrap();
        vault.write_markdown(Path::new("P/sub/2026-03-02-extra.md"), "nested").unwrap();
        vault.write_markdown(Path::new("P/readme.txt"), "ignored").unwrap();

        let all = vault.read_folder(Path::new("P"), None).unwrap();
        assert!(all.contains("monday") && all.contains("tuesday") && all.contains("nested"));
        assert!(!all.contains("rollup"));
        assert!(!all.contains("ignored"));

        let monday = vault.read_folder(Path::new("P"), Some("2026-03-02")).unwrap();
        assert!(monday.contains("## 2026-03-02-daily-progress.md\nmonday"));
        assert!(monday.contains("nested"));
        assert!(!monday.contains("tuesday"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Advisor Sync: Q3 plan!"), "advisor-sync-q3-plan");
        assert_eq!(slugify("  Lots   of   space  "), "lots-of-space");
        assert_eq!(slugify("???"), "note");
        assert_eq!(slugify("already-slugged"), "already-slugged");
    }

    #[test]
    fn test_frontmatter_quotes_special_values() {
        let fm = build_frontmatter(
            "Sync: backend",
            &["meeting", "q3"],
            Some("Talked about #42"),
            date(2026, 4, 1),
        );
        assert_eq!(
            fm,
            "---\ntitle: \"Sync: backend\"\ndate: 2026-04-01\ntags: [meeting, q3]\nsummary: \"Talked about #42\"\n---"
        );

        let bare = build_frontmatter("Tasks 2026-04-01", &[], None, date(2026, 4, 1));
        assert_eq!(bare, "---\ntitle: Tasks 2026-04-01\ndate: 2026-04-01\n---");
    }

    #[test]
    fn test_validate_relative_rejects_escapes() {
        assert!(validate_relative("2026/03/Week-1/Notes/a.md").is_ok());
        assert!(validate_relative("../secrets.md").is_err());
        assert!(validate_relative("/etc/passwd").is_err());
        assert!(validate_relative("  ").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(Some("2026-02-28")).unwrap(), date(2026, 2, 28));
        assert_eq!(parse_date(Some("")).unwrap(), today());
        assert_eq!(parse_date(None).unwrap(), today());
        assert!(matches!(parse_date(Some("28/02/2026")), Err(AssistantError::Validation(_))));
    }

    #[test]
    fn test_bullets_placeholder() {
        assert_eq!(bullets(&[], "None noted."), vec!["- None noted."]);
        assert_eq!(
            bullets(&["a ".to_string(), "b".to_string()], "None noted."),
            vec!["- a", "- b"]
        );
    }
}
