//! Owner of the live document.
//!
//! Every mutation clones the current document, edits the clone and commits it
//! as the new value; the commit recomputes completion and re-arms the
//! debounced save. Entries are always addressed by id: the position a UI event
//! carries is stale as soon as another entry is removed.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::document::autosave::Autosave;
use crate::document::completeness::{compute_completion_report, CompletionReport};
use crate::document::ids::new_id;
use crate::document::migration::split_comma_list;
use crate::models::document::{
    Certificate, Document, Education, Experience, Language, LanguageLevel, ListField, NamedItem,
    Project, ScalarField,
};

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("Unknown field '{field}' for {list} entries")]
    UnknownField { list: &'static str, field: String },

    #[error("Field '{field}' expects {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

/// A value posted by a form input: text box, checkbox, or line list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
    Lines(Vec<String>),
}

impl FieldValue {
    fn into_text(self, field: &str) -> Result<String, FormError> {
        match self {
            FieldValue::Text(s) => Ok(s),
            _ => Err(FormError::WrongType {
                field: field.to_string(),
                expected: "text",
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entry editing
// ────────────────────────────────────────────────────────────────────────────

/// A list entry the form can create and edit field by field.
trait FormEntry: Sized {
    const LIST: &'static str;

    fn blank(id: String) -> Self;
    fn id(&self) -> &str;
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FormError>;

    fn unknown(field: &str) -> FormError {
        FormError::UnknownField {
            list: Self::LIST,
            field: field.to_string(),
        }
    }
}

impl FormEntry for Experience {
    const LIST: &'static str = "experience";

    fn blank(id: String) -> Self {
        Experience {
            id,
            responsibilities: vec![String::new()],
            ..Default::default()
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FormError> {
        match field {
            "title" => self.title = value.into_text(field)?,
            "company" => self.company = value.into_text(field)?,
            "location" => self.location = value.into_text(field)?,
            "startDate" => self.start_date = value.into_text(field)?,
            "endDate" => self.end_date = value.into_text(field)?,
            "current" => match value {
                FieldValue::Flag(current) => self.current = current,
                _ => {
                    return Err(FormError::WrongType {
                        field: field.to_string(),
                        expected: "a boolean",
                    })
                }
            },
            "responsibilities" => match value {
                FieldValue::Lines(lines) => self.responsibilities = lines,
                FieldValue::Text(text) => {
                    self.responsibilities = text.lines().map(str::to_string).collect()
                }
                FieldValue::Flag(_) => {
                    return Err(FormError::WrongType {
                        field: field.to_string(),
                        expected: "a list of lines",
                    })
                }
            },
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

impl FormEntry for Education {
    const LIST: &'static str = "education";

    fn blank(id: String) -> Self {
        Education {
            id,
            ..Default::default()
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FormError> {
        let target = match field {
            "degree" => &mut self.degree,
            "school" => &mut self.school,
            "location" => &mut self.location,
            "startDate" => &mut self.start_date,
            "endDate" => &mut self.end_date,
            "gpa" => &mut self.gpa,
            _ => return Err(Self::unknown(field)),
        };
        *target = value.into_text(field)?;
        Ok(())
    }
}

impl FormEntry for Project {
    const LIST: &'static str = "projects";

    fn blank(id: String) -> Self {
        Project {
            id,
            ..Default::default()
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FormError> {
        match field {
            "name" => self.name = value.into_text(field)?,
            "description" => self.description = value.into_text(field)?,
            "url" => self.url = value.into_text(field)?,
            "technologies" => {
                self.technologies = match value {
                    FieldValue::Text(joined) => split_comma_list(&joined),
                    FieldValue::Lines(names) => names
                        .iter()
                        .map(|name| name.trim())
                        .filter(|name| !name.is_empty())
                        .map(|name| NamedItem {
                            id: new_id(),
                            name: name.to_string(),
                        })
                        .collect(),
                    FieldValue::Flag(_) => {
                        return Err(FormError::WrongType {
                            field: field.to_string(),
                            expected: "text or a list of names",
                        })
                    }
                }
            }
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

impl FormEntry for Certificate {
    const LIST: &'static str = "certificates";

    fn blank(id: String) -> Self {
        Certificate {
            id,
            ..Default::default()
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FormError> {
        let target = match field {
            "name" => &mut self.name,
            "issuer" => &mut self.issuer,
            "date" => &mut self.date,
            _ => return Err(Self::unknown(field)),
        };
        *target = value.into_text(field)?;
        Ok(())
    }
}

impl FormEntry for Language {
    const LIST: &'static str = "languages";

    fn blank(id: String) -> Self {
        Language {
            id,
            ..Default::default()
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), FormError> {
        match field {
            "name" => self.name = value.into_text(field)?,
            // An unrecognized level clears the selection rather than failing.
            "level" => self.level = LanguageLevel::parse(&value.into_text(field)?),
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

fn push_blank<E: FormEntry>(list: &mut Vec<E>) -> String {
    let id = new_id();
    list.push(E::blank(id.clone()));
    id
}

fn update_by_id<E: FormEntry>(
    list: &mut [E],
    id: &str,
    field: &str,
    value: FieldValue,
) -> Result<bool, FormError> {
    match list.iter_mut().find(|entry| entry.id() == id) {
        Some(entry) => entry.set_field(field, value).map(|_| true),
        None => Ok(false),
    }
}

fn remove_by_id<E: FormEntry>(list: &mut Vec<E>, id: &str) -> bool {
    let before = list.len();
    list.retain(|entry| entry.id() != id);
    list.len() != before
}

// ────────────────────────────────────────────────────────────────────────────
// FormController
// ────────────────────────────────────────────────────────────────────────────

pub struct FormController {
    document: Document,
    completion: CompletionReport,
    autosave: Autosave,
}

impl FormController {
    pub fn new(document: Document, autosave: Autosave) -> Self {
        let completion = compute_completion_report(&document);
        FormController {
            document,
            completion,
            autosave,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn completion(&self) -> &CompletionReport {
        &self.completion
    }

    /// Percentage rounded half away from zero, as shown on the progress bar.
    pub fn completion_rounded(&self) -> u8 {
        self.completion.rounded
    }

    pub fn update_scalar_field(&mut self, field: ScalarField, value: String) {
        let mut next = self.document.clone();
        *next.scalar_mut(field) = value;
        self.commit(next);
    }

    /// Appends a blank entry and returns its id.
    pub fn add_entry(&mut self, list: ListField) -> String {
        let mut next = self.document.clone();
        let id = match list {
            ListField::Experience => push_blank(&mut next.experience),
            ListField::Education => push_blank(&mut next.education),
            ListField::Projects => push_blank(&mut next.projects),
            ListField::Certificates => push_blank(&mut next.certificates),
            ListField::Languages => push_blank(&mut next.languages),
        };
        debug!("Added {} entry {id}", list.as_str());
        self.commit(next);
        id
    }

    /// Sets one field of the entry with `id`. Returns `Ok(false)` when no
    /// entry has that id; the document is left untouched in that case.
    pub fn update_entry_field(
        &mut self,
        list: ListField,
        id: &str,
        field: &str,
        value: FieldValue,
    ) -> Result<bool, FormError> {
        let mut next = self.document.clone();
        let found = match list {
            ListField::Experience => update_by_id(&mut next.experience, id, field, value)?,
            ListField::Education => update_by_id(&mut next.education, id, field, value)?,
            ListField::Projects => update_by_id(&mut next.projects, id, field, value)?,
            ListField::Certificates => update_by_id(&mut next.certificates, id, field, value)?,
            ListField::Languages => update_by_id(&mut next.languages, id, field, value)?,
        };
        if found {
            self.commit(next);
        }
        Ok(found)
    }

    /// Removes the entry with `id`. An unknown id is a no-op.
    pub fn remove_entry(&mut self, list: ListField, id: &str) -> bool {
        let mut next = self.document.clone();
        let removed = match list {
            ListField::Experience => remove_by_id(&mut next.experience, id),
            ListField::Education => remove_by_id(&mut next.education, id),
            ListField::Projects => remove_by_id(&mut next.projects, id),
            ListField::Certificates => remove_by_id(&mut next.certificates, id),
            ListField::Languages => remove_by_id(&mut next.languages, id),
        };
        if removed {
            debug!("Removed {} entry {id}", list.as_str());
            self.commit(next);
        }
        removed
    }

    /// Adds a skill. Blank names are ignored and return `None`.
    pub fn add_skill(&mut self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut next = self.document.clone();
        let id = new_id();
        next.skills.push(NamedItem {
            id: id.clone(),
            name: name.to_string(),
        });
        self.commit(next);
        Some(id)
    }

    pub fn remove_skill(&mut self, id: &str) -> bool {
        let mut next = self.document.clone();
        let before = next.skills.len();
        next.skills.retain(|skill| skill.id != id);
        let removed = next.skills.len() != before;
        if removed {
            self.commit(next);
        }
        removed
    }

    /// Adds a technology to a project. Returns `None` for a blank name or an
    /// unknown project.
    pub fn add_technology(&mut self, project_id: &str, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut next = self.document.clone();
        let project = next.projects.iter_mut().find(|p| p.id == project_id)?;
        let id = new_id();
        project.technologies.push(NamedItem {
            id: id.clone(),
            name: name.to_string(),
        });
        self.commit(next);
        Some(id)
    }

    pub fn remove_technology(&mut self, project_id: &str, tech_id: &str) -> bool {
        let mut next = self.document.clone();
        let Some(project) = next.projects.iter_mut().find(|p| p.id == project_id) else {
            return false;
        };
        let before = project.technologies.len();
        project.technologies.retain(|tech| tech.id != tech_id);
        let removed = project.technologies.len() != before;
        if removed {
            self.commit(next);
        }
        removed
    }

    /// Appends an empty responsibility line to an experience entry.
    pub fn add_responsibility(&mut self, experience_id: &str) -> bool {
        let mut next = self.document.clone();
        let Some(exp) = next.experience.iter_mut().find(|e| e.id == experience_id) else {
            return false;
        };
        exp.responsibilities.push(String::new());
        self.commit(next);
        true
    }

    pub fn remove_responsibility(&mut self, experience_id: &str, index: usize) -> bool {
        let mut next = self.document.clone();
        let Some(exp) = next.experience.iter_mut().find(|e| e.id == experience_id) else {
            return false;
        };
        if index >= exp.responsibilities.len() {
            return false;
        }
        exp.responsibilities.remove(index);
        self.commit(next);
        true
    }

    /// Replaces the whole document, e.g. on import.
    pub fn replace_document(&mut self, document: Document) {
        self.commit(document);
    }

    /// Persists immediately, cancelling any pending debounced write.
    pub fn save_now(&mut self) {
        if self.autosave.is_pending() {
            debug!("Flushing pending autosave");
        }
        self.autosave.flush(&self.document);
    }

    fn commit(&mut self, next: Document) {
        self.document = next;
        self.completion = compute_completion_report(&self.document);
        self.autosave.schedule(self.document.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::storage::{DocumentStore, MemoryStore};

    fn controller() -> (FormController, DocumentStore) {
        let store = DocumentStore::new(Arc::new(MemoryStore::default()));
        let autosave = Autosave::new(store.clone(), Duration::from_millis(1000));
        (FormController::new(Document::default(), autosave), store)
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_scalar_update_recomputes_completion() {
        let (mut form, _) = controller();
        form.update_scalar_field(ScalarField::FullName, "Ada".to_string());
        assert_eq!(form.completion().percentage, 0.0);
        form.update_scalar_field(ScalarField::Email, "ada@example.com".to_string());
        assert_eq!(form.completion_rounded(), 13);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutations_persist_after_quiet_period() {
        let (mut form, store) = controller();
        form.update_scalar_field(ScalarField::Summary, "Pionnière".to_string());
        form.add_entry(ListField::Education);
        assert!(store.load().is_none());

        tokio::time::sleep(Duration::from_millis(1_200)).await;
        let saved = store.load().unwrap();
        assert_eq!(&saved, form.document());
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_now_persists_immediately() {
        let (mut form, store) = controller();
        form.update_scalar_field(ScalarField::FullName, "Ada".to_string());
        form.save_now();
        assert_eq!(store.load().unwrap().full_name, "Ada");
    }

    #[tokio::test]
    async fn test_add_entry_has_fresh_id_and_defaults() {
        let (mut form, _) = controller();
        let a = form.add_entry(ListField::Experience);
        let b = form.add_entry(ListField::Experience);
        assert_ne!(a, b);
        let exp = &form.document().experience[0];
        assert_eq!(exp.id, a);
        assert!(!exp.current);
        assert_eq!(exp.responsibilities, vec![String::new()]);
    }

    #[tokio::test]
    async fn test_update_resolves_by_id_after_removal() {
        let (mut form, _) = controller();
        let first = form.add_entry(ListField::Certificates);
        let second = form.add_entry(ListField::Certificates);

        // The UI rendered `second` at position 1; removing `first` shifts it to 0.
        assert!(form.remove_entry(ListField::Certificates, &first));
        let updated = form
            .update_entry_field(ListField::Certificates, &second, "name", text("AWS"))
            .unwrap();

        assert!(updated);
        assert_eq!(form.document().certificates.len(), 1);
        assert_eq!(form.document().certificates[0].id, second);
        assert_eq!(form.document().certificates[0].name, "AWS");
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let (mut form, _) = controller();
        form.add_entry(ListField::Education);
        let before = form.document().clone();
        let updated = form
            .update_entry_field(ListField::Education, "missing", "degree", text("MSc"))
            .unwrap();
        assert!(!updated);
        assert_eq!(form.document(), &before);
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_field_and_wrong_type() {
        let (mut form, _) = controller();
        let id = form.add_entry(ListField::Experience);
        assert!(matches!(
            form.update_entry_field(ListField::Experience, &id, "salary", text("1")),
            Err(FormError::UnknownField { .. })
        ));
        assert!(matches!(
            form.update_entry_field(ListField::Experience, &id, "current", text("yes")),
            Err(FormError::WrongType { .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_absent_id_leaves_list_identical() {
        let (mut form, _) = controller();
        form.add_entry(ListField::Languages);
        form.add_entry(ListField::Languages);
        let before = form.document().languages.clone();
        assert!(!form.remove_entry(ListField::Languages, "nope"));
        assert_eq!(form.document().languages, before);
    }

    #[tokio::test]
    async fn test_remove_only_affects_matching_id() {
        let (mut form, _) = controller();
        let ids: Vec<String> = (0..3).map(|_| form.add_entry(ListField::Projects)).collect();
        form.update_entry_field(ListField::Projects, &ids[2], "name", text("Keep"))
            .unwrap();
        form.remove_entry(ListField::Projects, &ids[1]);
        let remaining: Vec<&str> = form.document().projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(remaining, vec![ids[0].as_str(), ids[2].as_str()]);
        assert_eq!(form.document().projects[1].name, "Keep");
    }

    #[tokio::test]
    async fn test_experience_current_flag_and_lines() {
        let (mut form, _) = controller();
        let id = form.add_entry(ListField::Experience);
        form.update_entry_field(ListField::Experience, &id, "current", FieldValue::Flag(true))
            .unwrap();
        form.update_entry_field(
            ListField::Experience,
            &id,
            "responsibilities",
            FieldValue::Lines(vec!["Lead".to_string(), "Ship".to_string()]),
        )
        .unwrap();
        let exp = &form.document().experience[0];
        assert!(exp.current);
        assert_eq!(exp.responsibilities, vec!["Lead", "Ship"]);
    }

    #[tokio::test]
    async fn test_language_level_parsing() {
        let (mut form, _) = controller();
        let id = form.add_entry(ListField::Languages);
        form.update_entry_field(ListField::Languages, &id, "level", text("Bilingue"))
            .unwrap();
        assert_eq!(
            form.document().languages[0].level,
            Some(LanguageLevel::Bilingual)
        );
    }

    #[tokio::test]
    async fn test_skills_trim_and_ignore_blank() {
        let (mut form, _) = controller();
        assert!(form.add_skill("   ").is_none());
        let id = form.add_skill("  Rust ").unwrap();
        assert_eq!(form.document().skills[0].name, "Rust");
        assert!(form.remove_skill(&id));
        assert!(!form.remove_skill(&id));
        assert!(form.document().skills.is_empty());
    }

    #[tokio::test]
    async fn test_project_technologies() {
        let (mut form, _) = controller();
        let project = form.add_entry(ListField::Projects);
        assert!(form.add_technology("unknown", "Rust").is_none());
        let tech = form.add_technology(&project, "Rust").unwrap();
        form.add_technology(&project, "Axum").unwrap();
        assert!(form.remove_technology(&project, &tech));
        let techs = &form.document().projects[0].technologies;
        assert_eq!(techs.len(), 1);
        assert_eq!(techs[0].name, "Axum");

        form.update_entry_field(ListField::Projects, &project, "technologies", text("A, B,"))
            .unwrap();
        assert_eq!(form.document().projects[0].technologies.len(), 2);
    }

    #[tokio::test]
    async fn test_responsibility_lines() {
        let (mut form, _) = controller();
        let id = form.add_entry(ListField::Experience);
        assert!(form.add_responsibility(&id));
        assert_eq!(form.document().experience[0].responsibilities.len(), 2);
        assert!(form.remove_responsibility(&id, 0));
        assert!(!form.remove_responsibility(&id, 5));
        assert_eq!(form.document().experience[0].responsibilities.len(), 1);
    }

    #[tokio::test]
    async fn test_mutation_does_not_alias_previous_value() {
        let (mut form, _) = controller();
        form.add_entry(ListField::Education);
        let snapshot = form.document().clone();
        let id = snapshot.education[0].id.clone();
        form.update_entry_field(ListField::Education, &id, "school", text("EPFL"))
            .unwrap();
        assert_eq!(snapshot.education[0].school, "");
        assert_eq!(form.document().education[0].school, "EPFL");
    }
}
