//! Job posting record types

use serde::{Deserialize, Serialize};

/// Fixed-key metadata attached to every posting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMetadata {
    pub posted_date: Option<String>,
    pub closing_date: Option<String>,
    pub salary: Option<String>,
    pub employment_type: Option<String>,
}

/// Structured record extracted from a job posting page
///
/// Every field serializes, optional ones as `null`, so the JSON snapshot
/// always carries the full key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    url: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub qualifications: Vec<String>,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub html_path: Option<String>,
    pub screenshot_path: Option<String>,
    pub pdf_path: Option<String>,
    pub metadata: JobMetadata,
}

impl JobPosting {
    /// Empty record for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            company: String::new(),
            location: None,
            description: String::new(),
            responsibilities: Vec::new(),
            qualifications: Vec::new(),
            skills: Vec::new(),
            education: Vec::new(),
            experience: Vec::new(),
            html_path: None,
            screenshot_path: None,
            pdf_path: None,
            metadata: JobMetadata::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Fields produced by the extraction engine
///
/// Scalars are plain strings: a selector miss yields `""`, never `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub qualifications: Vec<String>,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub posted_date: String,
    pub closing_date: String,
    pub salary: String,
    pub employment_type: String,
}

impl ExtractedFields {
    /// Merge into a fresh record for `url`
    pub fn into_posting(self, url: impl Into<String>) -> JobPosting {
        let mut posting = JobPosting::new(url);
        posting.title = self.title;
        posting.company = self.company;
        posting.location = Some(self.location);
        posting.description = self.description;
        posting.responsibilities = self.responsibilities;
        posting.qualifications = self.qualifications;
        posting.skills = self.skills;
        posting.education = self.education;
        posting.experience = self.experience;
        posting.metadata = JobMetadata {
            posted_date: Some(self.posted_date),
            closing_date: Some(self.closing_date),
            salary: Some(self.salary),
            employment_type: Some(self.employment_type),
        };
        posting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const KEYS: [&str; 14] = [
        "url",
        "title",
        "company",
        "location",
        "description",
        "responsibilities",
        "qualifications",
        "skills",
        "education",
        "experience",
        "htmlPath",
        "screenshotPath",
        "pdfPath",
        "metadata",
    ];

    #[test]
    fn fresh_record_serializes_every_key() {
        let value = serde_json::to_value(JobPosting::new("https://example.com/jobs/123")).unwrap();
        let obj = value.as_object().unwrap();

        for key in KEYS {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj.len(), KEYS.len());

        assert_eq!(obj["title"], Value::String(String::new()));
        assert_eq!(obj["location"], Value::Null);
        assert_eq!(obj["skills"], Value::Array(vec![]));
        assert_eq!(obj["htmlPath"], Value::Null);

        let meta = obj["metadata"].as_object().unwrap();
        for key in ["postedDate", "closingDate", "salary", "employmentType"] {
            assert_eq!(meta[key], Value::Null, "metadata.{key}");
        }
    }

    #[test]
    fn populated_record_round_trips_through_json() {
        let mut job = JobPosting::new("https://example.com/jobs/123");
        job.title = "Test Job".into();
        job.company = "Test Company".into();
        job.location = Some("Test Location".into());
        job.responsibilities = vec!["Responsibility 1".into()];
        job.metadata.salary = Some("$50,000".into());

        let json = serde_json::to_string_pretty(&job).unwrap();
        assert!(json.contains("\n  \"title\": \"Test Job\""));

        let back: JobPosting = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
        assert_eq!(back.url(), "https://example.com/jobs/123");
    }

    #[test]
    fn merged_fields_fill_scalars_with_empty_strings() {
        let posting = ExtractedFields::default().into_posting("https://example.com/jobs/1");
        assert_eq!(posting.location.as_deref(), Some(""));
        assert_eq!(posting.metadata.posted_date.as_deref(), Some(""));
        assert_eq!(posting.metadata.employment_type.as_deref(), Some(""));
        assert!(posting.html_path.is_none());
    }
}
