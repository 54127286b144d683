use serde::{Deserialize, Serialize};

use crate::models::document::Document;

/// Completion of the CV as shown on the editor's progress bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    /// Exact value in `[0, 100]`.
    pub percentage: f64,
    /// `percentage` rounded half away from zero, for display.
    pub rounded: u8,
    pub missing_sections: Vec<String>,
}

type SectionCheck = fn(&Document) -> bool;

/// One predicate per editor tab. Every predicate weighs the same.
const SECTION_CHECKS: [(&str, SectionCheck); 8] = [
    ("contact", |d: &Document| !d.full_name.is_empty() && !d.email.is_empty()),
    ("summary", |d: &Document| !d.summary.is_empty()),
    ("experience", |d: &Document| !d.experience.is_empty()),
    ("education", |d: &Document| !d.education.is_empty()),
    ("skills", |d: &Document| !d.skills.is_empty()),
    ("projects", |d: &Document| !d.projects.is_empty()),
    ("certificates", |d: &Document| !d.certificates.is_empty()),
    ("languages", |d: &Document| !d.languages.is_empty()),
];

pub fn completion_percentage(doc: &Document) -> f64 {
    let satisfied = SECTION_CHECKS.iter().filter(|(_, check)| check(doc)).count();
    satisfied as f64 / SECTION_CHECKS.len() as f64 * 100.0
}

pub fn compute_completion_report(doc: &Document) -> CompletionReport {
    let percentage = completion_percentage(doc);
    let missing_sections = SECTION_CHECKS
        .iter()
        .filter(|(_, check)| !check(doc))
        .map(|(section, _)| section.to_string())
        .collect();

    CompletionReport {
        percentage,
        rounded: percentage.round().clamp(0.0, 100.0) as u8,
        missing_sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{
        Certificate, Education, Experience, Language, NamedItem, Project,
    };

    fn full_document() -> Document {
        Document {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            summary: "Analyst".to_string(),
            skills: vec![NamedItem {
                id: "s".to_string(),
                name: "Maths".to_string(),
            }],
            experience: vec![Experience::default()],
            education: vec![Education::default()],
            projects: vec![Project::default()],
            certificates: vec![Certificate::default()],
            languages: vec![Language::default()],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_document_is_zero() {
        let report = compute_completion_report(&Document::default());
        assert_eq!(report.percentage, 0.0);
        assert_eq!(report.rounded, 0);
        assert_eq!(report.missing_sections.len(), 8);
    }

    #[test]
    fn test_full_document_is_hundred() {
        let report = compute_completion_report(&full_document());
        assert_eq!(report.percentage, 100.0);
        assert_eq!(report.rounded, 100);
        assert!(report.missing_sections.is_empty());
    }

    #[test]
    fn test_name_and_email_alone_round_up_to_thirteen() {
        let doc = Document {
            full_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        };
        let report = compute_completion_report(&doc);
        assert!((report.percentage - 12.5).abs() < 1e-9);
        assert_eq!(report.rounded, 13);
    }

    #[test]
    fn test_contact_needs_both_name_and_email() {
        let doc = Document {
            full_name: "Ada".to_string(),
            ..Default::default()
        };
        assert_eq!(completion_percentage(&doc), 0.0);
        let report = compute_completion_report(&doc);
        assert!(report.missing_sections.contains(&"contact".to_string()));
    }
}
