//! Request templating: one artifact per actionable day.
//!
//! The template is plain text carrying four placeholder conventions:
//! two literal markers (diary id, bearer token) and two structural
//! JSON field patterns (`"date": "..."`, `"userId": 0`). The rendered
//! copy lands in the run's output directory, named after the entry's
//! date.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{NoExpand, Regex};

use crate::model::{DiaryEntry, UserId};

/// Literal marker replaced with the entry's diary id.
const DIARY_ID_MARKER: &str = "DIARY_ID";

/// Literal marker replaced with the raw bearer token.
const TOKEN_MARKER: &str = "TOKEN_PLACEHOLDER";

/// Artifact filename parts: `fill_request_<YYYY-MM-DD>.http`.
const FILE_PREFIX: &str = "fill_request";
const FILE_EXT: &str = "http";

/// Template or artifact I/O failures. Both are fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read template {path}: {source}")]
    TemplateRead { path: PathBuf, source: io::Error },

    #[error("failed to write artifact {path}: {source}")]
    ArtifactWrite { path: PathBuf, source: io::Error },
}

pub type Result<T> = core::result::Result<T, RenderError>;

/// Renders the request template for individual diary entries.
#[derive(Debug)]
pub struct TemplateProcessor {
    template: String,
}

impl TemplateProcessor {
    /// Read the template once up front; an unreadable template aborts
    /// the run before any network traffic.
    pub fn from_file(path: &Path) -> Result<Self> {
        let template = fs::read_to_string(path).map_err(|source| RenderError::TemplateRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { template })
    }

    /// Render the template for one entry.
    ///
    /// Four independent substitutions; the patterns cannot overlap,
    /// so the order is immaterial.
    pub fn render(&self, entry: &DiaryEntry, user_id: UserId, token: &str) -> String {
        let diary_id = entry.diary_id.unwrap_or_default();
        let date = entry.date.as_deref().unwrap_or_default();

        let rendered = self
            .template
            .replace(DIARY_ID_MARKER, &diary_id.to_string())
            .replace(TOKEN_MARKER, token);
        let rendered = date_field().replace_all(&rendered, NoExpand(&format!("\"date\": \"{date}\"")));
        let rendered = user_id_field().replace_all(&rendered, NoExpand(&format!("\"userId\": {user_id}")));

        rendered.into_owned()
    }

    /// Render and write the artifact for one entry, returning its
    /// path. Two entries with the same date would overwrite each
    /// other; dates are unique within one month's diary set.
    pub fn write_artifact(
        &self,
        entry: &DiaryEntry,
        user_id: UserId,
        token: &str,
        dir: &Path,
    ) -> Result<PathBuf> {
        let date = entry.date.as_deref().unwrap_or_default();
        let path = dir.join(format!("{FILE_PREFIX}_{date}.{FILE_EXT}"));

        let contents = self.render(entry, user_id, token);
        fs::write(&path, contents).map_err(|source| RenderError::ArtifactWrite {
            path: path.clone(),
            source,
        })?;

        tracing::info!("created request file {}", path.display());
        Ok(path)
    }
}

/// Structural pattern for the JSON `date` field.
fn date_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""date":\s*"[^"]+""#).expect("valid pattern"))
}

/// Structural pattern for the JSON `userId` field.
fn user_id_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""userId":\s*0"#).expect("valid pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    const TEMPLATE: &str = "\
// Fill one flexible-schedule day\n\
PUT https://example.test/api/diaries/DIARY_ID\n\
Authorization: Bearer TOKEN_PLACEHOLDER\n\
Content-Type: application/json\n\
\n\
{\"diaryId\": DIARY_ID, \"date\": \"2000-01-01\", \"userId\": 0}\n";

    fn processor() -> TemplateProcessor {
        TemplateProcessor {
            template: TEMPLATE.to_string(),
        }
    }

    fn entry() -> DiaryEntry {
        DiaryEntry {
            date: Some("2024-03-15".to_string()),
            check_in: Some("_FlexibleSchedule".to_string()),
            check_out: Some(String::new()),
            is_holiday: Some(false),
            is_weekend: Some(false),
            diary_id: Some(12345),
        }
    }

    #[test]
    fn renders_all_placeholders() {
        let rendered = processor().render(&entry(), 999, "tok-abc");

        assert!(rendered.contains("https://example.test/api/diaries/12345"));
        assert!(rendered.contains("Authorization: Bearer tok-abc"));
        assert!(rendered.contains("\"diaryId\": 12345"));
        assert!(rendered.contains("\"date\": \"2024-03-15\""));
        assert!(rendered.contains("\"userId\": 999"));
    }

    #[test]
    fn leaves_no_residual_placeholders() {
        let rendered = processor().render(&entry(), 999, "tok-abc");

        assert!(!rendered.contains(DIARY_ID_MARKER));
        assert!(!rendered.contains(TOKEN_MARKER));
        assert!(!rendered.contains("\"date\": \"2000-01-01\""));
        assert!(!rendered.contains("\"userId\": 0"));
    }

    #[test]
    fn date_pattern_tolerates_whitespace_variants() {
        let processor = TemplateProcessor {
            template: "{\"date\":\"x\"} {\"date\":   \"y\"} {\"userId\":0}".to_string(),
        };

        let rendered = processor.render(&entry(), 999, "tok");
        assert_eq!(
            rendered,
            "{\"date\": \"2024-03-15\"} {\"date\": \"2024-03-15\"} {\"userId\": 999}"
        );
    }

    #[test]
    fn write_artifact_names_file_after_date() {
        let dir = TempDir::new().unwrap();

        let path = processor()
            .write_artifact(&entry(), 999, "tok", dir.path())
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "fill_request_2024-03-15.http"
        );
        assert!(fs::read_to_string(&path)
            .unwrap()
            .contains("\"userId\": 999"));
    }

    #[test]
    fn same_date_overwrites_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let processor = processor();

        processor
            .write_artifact(&entry(), 111, "tok", dir.path())
            .unwrap();
        let path = processor
            .write_artifact(&entry(), 222, "tok", dir.path())
            .unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("\"userId\": 222"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");

        let err = processor()
            .write_artifact(&entry(), 999, "tok", &missing)
            .unwrap_err();
        assert!(matches!(err, RenderError::ArtifactWrite { .. }));
    }

    #[test]
    fn from_file_reads_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("template.http");
        fs::write(&path, TEMPLATE).unwrap();

        let processor = TemplateProcessor::from_file(&path).unwrap();
        assert!(processor.template.contains(DIARY_ID_MARKER));
    }

    #[test]
    fn from_file_missing_template_is_an_error() {
        let err = TemplateProcessor::from_file(Path::new("/nonexistent/template.http")).unwrap_err();
        assert!(matches!(err, RenderError::TemplateRead { .. }));
    }
}
