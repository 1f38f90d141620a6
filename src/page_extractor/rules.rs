//! Selector fallback chains per posting field
//!
//! `SelectorRules` is the configurable, serializable form. It is compiled
//! once per run into `CompiledRules` before any browser is opened, so a bad
//! selector never costs a browser launch.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::utils::ScrapeError;

fn chain(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| (*s).to_string()).collect()
}

fn default_title() -> Vec<String> {
    chain(&["h1", ".job-title", "[role=\"heading\"]"])
}
fn default_company() -> Vec<String> {
    chain(&[
        ".company-name",
        ".employer",
        "[itemprop=\"hiringOrganization\"]",
        ".company",
    ])
}
fn default_location() -> Vec<String> {
    chain(&[".location", "[itemprop=\"jobLocation\"]"])
}
fn default_description() -> Vec<String> {
    chain(&[
        ".job-description",
        "[itemprop=\"description\"]",
        ".description",
    ])
}
fn default_responsibilities() -> Vec<String> {
    chain(&[".responsibilities li", ".duties li"])
}
fn default_qualifications() -> Vec<String> {
    chain(&[".qualifications li", ".requirements li"])
}
fn default_skills() -> Vec<String> {
    chain(&[".skills li", ".competencies li"])
}
fn default_education() -> Vec<String> {
    chain(&[".education li", ".requirements li"])
}
fn default_experience() -> Vec<String> {
    chain(&[".experience li", ".requirements li"])
}
fn default_posted_date() -> Vec<String> {
    chain(&[".posted-date", "[itemprop=\"datePosted\"]"])
}
fn default_closing_date() -> Vec<String> {
    chain(&[".closing-date", ".application-deadline"])
}
fn default_salary() -> Vec<String> {
    chain(&[".salary", "[itemprop=\"baseSalary\"]"])
}
fn default_employment_type() -> Vec<String> {
    chain(&[".employment-type", "[itemprop=\"employmentType\"]"])
}

/// Ordered selector candidates for each field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorRules {
    #[serde(default = "default_title")]
    pub title: Vec<String>,
    #[serde(default = "default_company")]
    pub company: Vec<String>,
    #[serde(default = "default_location")]
    pub location: Vec<String>,
    #[serde(default = "default_description")]
    pub description: Vec<String>,
    #[serde(default = "default_responsibilities")]
    pub responsibilities: Vec<String>,
    #[serde(default = "default_qualifications")]
    pub qualifications: Vec<String>,
    #[serde(default = "default_skills")]
    pub skills: Vec<String>,
    #[serde(default = "default_education")]
    pub education: Vec<String>,
    #[serde(default = "default_experience")]
    pub experience: Vec<String>,
    #[serde(default = "default_posted_date")]
    pub posted_date: Vec<String>,
    #[serde(default = "default_closing_date")]
    pub closing_date: Vec<String>,
    #[serde(default = "default_salary")]
    pub salary: Vec<String>,
    #[serde(default = "default_employment_type")]
    pub employment_type: Vec<String>,
}

impl Default for SelectorRules {
    fn default() -> Self {
        Self {
            title: default_title(),
            company: default_company(),
            location: default_location(),
            description: default_description(),
            responsibilities: default_responsibilities(),
            qualifications: default_qualifications(),
            skills: default_skills(),
            education: default_education(),
            experience: default_experience(),
            posted_date: default_posted_date(),
            closing_date: default_closing_date(),
            salary: default_salary(),
            employment_type: default_employment_type(),
        }
    }
}

/// Scalar field: candidates tried in order
#[derive(Debug, Clone)]
pub struct ScalarRule {
    pub candidates: Vec<Selector>,
}

/// List field: one selector group, matched in document order
#[derive(Debug, Clone)]
pub struct ListRule {
    pub group: Option<Selector>,
}

#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub title: ScalarRule,
    pub company: ScalarRule,
    pub location: ScalarRule,
    pub description: ScalarRule,
    pub responsibilities: ListRule,
    pub qualifications: ListRule,
    pub skills: ListRule,
    pub education: ListRule,
    pub experience: ListRule,
    pub posted_date: ScalarRule,
    pub closing_date: ScalarRule,
    pub salary: ScalarRule,
    pub employment_type: ScalarRule,
}

fn parse(field: &'static str, selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Extraction {
        field,
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn scalar(field: &'static str, selectors: &[String]) -> Result<ScalarRule, ScrapeError> {
    let candidates = selectors
        .iter()
        .map(|s| parse(field, s))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ScalarRule { candidates })
}

fn list(field: &'static str, selectors: &[String]) -> Result<ListRule, ScrapeError> {
    if selectors.is_empty() {
        return Ok(ListRule { group: None });
    }
    // Validate each member so the error names the offending selector
    for s in selectors {
        parse(field, s)?;
    }
    let group = parse(field, &selectors.join(", "))?;
    Ok(ListRule { group: Some(group) })
}

impl SelectorRules {
    pub fn compile(&self) -> Result<CompiledRules, ScrapeError> {
        Ok(CompiledRules {
            title: scalar("title", &self.title)?,
            company: scalar("company", &self.company)?,
            location: scalar("location", &self.location)?,
            description: scalar("description", &self.description)?,
            responsibilities: list("responsibilities", &self.responsibilities)?,
            qualifications: list("qualifications", &self.qualifications)?,
            skills: list("skills", &self.skills)?,
            education: list("education", &self.education)?,
            experience: list("experience", &self.experience)?,
            posted_date: scalar("postedDate", &self.posted_date)?,
            closing_date: scalar("closingDate", &self.closing_date)?,
            salary: scalar("salary", &self.salary)?,
            employment_type: scalar("employmentType", &self.employment_type)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ErrorKind;

    #[test]
    fn builtin_rules_compile() {
        let compiled = SelectorRules::default().compile().unwrap();
        assert_eq!(compiled.title.candidates.len(), 3);
        assert_eq!(compiled.company.candidates.len(), 4);
        assert!(compiled.skills.group.is_some());
    }

    #[test]
    fn bad_selector_names_field_and_selector() {
        let rules = SelectorRules {
            salary: vec![".salary".into(), "div[".into()],
            ..SelectorRules::default()
        };

        let err = rules.compile().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
        match err {
            ScrapeError::Extraction { field, selector, .. } => {
                assert_eq!(field, "salary");
                assert_eq!(selector, "div[");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_other_fields() {
        let rules: SelectorRules = serde_yaml::from_str("title:\n  - h2.posting-title\n").unwrap();
        assert_eq!(rules.title, vec!["h2.posting-title".to_string()]);
        assert_eq!(rules.company, default_company());
    }

    #[test]
    fn empty_list_rule_has_no_group() {
        let rules = SelectorRules {
            education: vec![],
            ..SelectorRules::default()
        };
        assert!(rules.compile().unwrap().education.group.is_none());
    }
}
