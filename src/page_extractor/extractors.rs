//! Field extraction over a parsed document
//!
//! Pure functions: no I/O, no mutation. A selector miss is the common case
//! and always degrades to an empty string or an empty list.

use scraper::{ElementRef, Html};

use super::rules::{CompiledRules, ListRule, ScalarRule};
use super::schema::ExtractedFields;

/// textContent of an element, trimmed
fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// First non-empty match of the highest-priority candidate that has one, else `""`
fn select_text(document: &Html, rule: &ScalarRule) -> String {
    rule.candidates
        .iter()
        .find_map(|selector| {
            document
                .select(selector)
                .map(|el| element_text(&el))
                .find(|text| !text.is_empty())
        })
        .unwrap_or_default()
}

/// All matches of the group in document order, empty entries dropped
fn select_list(document: &Html, rule: &ListRule) -> Vec<String> {
    let Some(group) = &rule.group else {
        return Vec::new();
    };
    document
        .select(group)
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Apply every rule to `document`
pub fn extract(document: &Html, rules: &CompiledRules) -> ExtractedFields {
    ExtractedFields {
        title: select_text(document, &rules.title),
        company: select_text(document, &rules.company),
        location: select_text(document, &rules.location),
        description: select_text(document, &rules.description),
        responsibilities: select_list(document, &rules.responsibilities),
        qualifications: select_list(document, &rules.qualifications),
        skills: select_list(document, &rules.skills),
        education: select_list(document, &rules.education),
        experience: select_list(document, &rules.experience),
        posted_date: select_text(document, &rules.posted_date),
        closing_date: select_text(document, &rules.closing_date),
        salary: select_text(document, &rules.salary),
        employment_type: select_text(document, &rules.employment_type),
    }
}

/// Parse `html` and extract
///
/// The parsed tree is not `Send`; keeping parse and extraction in one
/// synchronous call keeps it off await points.
pub fn extract_from_html(html: &str, rules: &CompiledRules) -> ExtractedFields {
    let document = Html::parse_document(html);
    extract(&document, rules)
}
