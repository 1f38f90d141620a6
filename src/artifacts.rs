//! Artifact persistence
//!
//! Writes `{base}.html`, `{base}.png`, `{base}.pdf` and `{base}.json` into the
//! output directory. Each artifact is its own failure domain: one failed
//! write never prevents attempts at the others, and the JSON record is
//! always written last so it reflects the final artifact paths.
//!
//! Before anything is written the run claims `{base}.json` with an exclusive
//! create, taking `{base}-1`, `{base}-2`, ... when the name is already held,
//! so concurrent runs of the same URL never share artifact files.

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::ScraperOptions;
use crate::browser::BrowserSession;
use crate::page_extractor::JobPosting;
use crate::utils::constants::{FALLBACK_STEM, MAX_NAME_CLAIMS};
use crate::utils::{ArtifactFailure, ArtifactKind, ScrapeError};

/// Record with final artifact paths, plus degraded-functionality notices
#[derive(Debug, Clone)]
pub struct PersistOutcome {
    pub record: JobPosting,
    pub json_path: PathBuf,
    pub warnings: Vec<String>,
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Last non-empty path segment without extension, else host, else `page`
fn url_stem(url: &str) -> String {
    let Ok(parsed) = url::Url::parse(url) else {
        return FALLBACK_STEM.to_string();
    };

    let segment_stem = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .and_then(|segment| Path::new(segment).file_stem())
        .map(|stem| sanitize(&stem.to_string_lossy()))
        .filter(|stem| !stem.is_empty());

    segment_stem
        .or_else(|| parsed.host_str().map(sanitize))
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string())
}

/// `{url-path-stem}-{timestamp}` with `:` and `.` replaced by `-`
///
/// e.g. `123-2024-05-01T12-30-45-123Z` for `https://example.com/jobs/123`.
pub fn base_name(url: &str, at: DateTime<Utc>) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}-{}", url_stem(url), timestamp)
}

/// Claim a base name in `output_dir` by exclusively creating its JSON file
async fn claim_base_name(output_dir: &Path, preferred: &str) -> std::io::Result<String> {
    for attempt in 0..MAX_NAME_CLAIMS {
        let candidate = match attempt {
            0 => preferred.to_string(),
            n => format!("{preferred}-{n}"),
        };
        let claimed = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(output_dir.join(format!("{candidate}.json")))
            .await;
        match claimed {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("no free artifact name for '{preferred}' after {MAX_NAME_CLAIMS} attempts"),
    ))
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Write the enabled artifacts and the JSON record
///
/// `preferred_name` gets a numeric suffix if another run already holds it.
///
/// On any failure every other artifact has still been attempted; the error
/// lists all failed writes.
pub async fn persist(
    session: &dyn BrowserSession,
    output_dir: &Path,
    preferred_name: &str,
    mut record: JobPosting,
    raw_page: &str,
    options: &ScraperOptions,
) -> Result<PersistOutcome, ScrapeError> {
    if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
        return Err(ScrapeError::Persistence {
            failures: vec![ArtifactFailure {
                artifact: ArtifactKind::OutputDir,
                path: output_dir.to_path_buf(),
                message: e.to_string(),
            }],
        });
    }

    let base_name = match claim_base_name(output_dir, preferred_name).await {
        Ok(name) => name,
        Err(e) => {
            return Err(ScrapeError::Persistence {
                failures: vec![ArtifactFailure {
                    artifact: ArtifactKind::Json,
                    path: output_dir.join(format!("{preferred_name}.json")),
                    message: e.to_string(),
                }],
            });
        }
    };

    let mut failures = Vec::new();
    let mut warnings = Vec::new();

    if options.save_html {
        let path = output_dir.join(format!("{base_name}.html"));
        match tokio::fs::write(&path, raw_page.as_bytes()).await {
            Ok(()) => {
                info!("Saved page markup to {}", path.display());
                record.html_path = Some(path_string(&path));
            }
            Err(e) => failures.push(ArtifactFailure {
                artifact: ArtifactKind::Html,
                path,
                message: e.to_string(),
            }),
        }
    }

    if options.save_screenshot {
        let path = output_dir.join(format!("{base_name}.png"));
        match session.screenshot(&path).await {
            Ok(()) => {
                info!("Saved screenshot to {}", path.display());
                record.screenshot_path = Some(path_string(&path));
            }
            Err(e) => failures.push(ArtifactFailure {
                artifact: ArtifactKind::Screenshot,
                path,
                message: e.to_string(),
            }),
        }
    }

    if options.save_pdf {
        let path = output_dir.join(format!("{base_name}.pdf"));
        if !session.supports_pdf() {
            let notice = "PDF capture requires headless mode; skipped".to_string();
            warn!("{}", notice);
            warnings.push(notice);
        } else {
            match session.pdf(&path).await {
                Ok(()) => {
                    info!("Saved PDF to {}", path.display());
                    record.pdf_path = Some(path_string(&path));
                }
                Err(e) => failures.push(ArtifactFailure {
                    artifact: ArtifactKind::Pdf,
                    path,
                    message: e.to_string(),
                }),
            }
        }
    }

    let json_path = output_dir.join(format!("{base_name}.json"));
    let json_result = match serde_json::to_string_pretty(&record) {
        Ok(json) => tokio::fs::write(&json_path, json)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    match json_result {
        Ok(()) => info!("Saved job record to {}", json_path.display()),
        Err(message) => failures.push(ArtifactFailure {
            artifact: ArtifactKind::Json,
            path: json_path.clone(),
            message,
        }),
    }

    if !failures.is_empty() {
        return Err(ScrapeError::Persistence { failures });
    }

    Ok(PersistOutcome {
        record,
        json_path,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap()
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn base_name_uses_last_segment_and_safe_timestamp() {
        assert_eq!(
            base_name("https://example.com/jobs/123", at()),
            "123-2024-05-01T12-30-45-123Z"
        );
    }

    #[test]
    fn base_name_has_no_colons_or_dots() {
        let name = base_name("https://careers.example.org/postings/senior.engineer.html?x=1", at());
        assert!(!name.contains(':'));
        assert!(!name.contains('.'));
        assert!(name.starts_with("senior-engineer-2024"));
    }

    #[test]
    fn stem_falls_back_to_host_then_page() {
        assert_eq!(url_stem("https://jobs.example.com/"), "jobs-example-com");
        assert_eq!(url_stem("https://example.com/jobs/"), "jobs");
        assert_eq!(url_stem("not a url"), "page");
    }

    #[test]
    fn stem_replaces_unsafe_characters() {
        assert_eq!(url_stem("https://example.com/jobs/a%20b"), "a-20b");
    }

    #[tokio::test]
    async fn claimed_names_never_collide() {
        let dir = tempfile::tempdir().unwrap();

        let first = claim_base_name(dir.path(), "123-2024").await.unwrap();
        let second = claim_base_name(dir.path(), "123-2024").await.unwrap();
        let third = claim_base_name(dir.path(), "123-2024").await.unwrap();

        assert_eq!(first, "123-2024");
        assert_eq!(second, "123-2024-1");
        assert_eq!(third, "123-2024-2");
        assert!(dir.path().join("123-2024-1.json").exists());
    }

    #[tokio::test]
    async fn claim_fails_when_directory_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        assert!(claim_base_name(&missing, "x").await.is_err());
    }

    #[test]
    fn names_sort_by_time() {
        let earlier = base_name("https://example.com/jobs/1", at());
        let later = base_name(
            "https://example.com/jobs/1",
            at() + chrono::Duration::milliseconds(1),
        );
        assert!(earlier < later);
    }
}
