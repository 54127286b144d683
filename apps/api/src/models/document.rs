use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The complete in-memory CV.
///
/// Field names serialize in camelCase to match the persisted layout the front
/// end has always written (`fullName`, `linkedIn`, `startDate`, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub full_name: String,
    pub job_title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linked_in: String,
    pub github: String,
    pub portfolio: String,
    pub summary: String,
    pub skills: Vec<NamedItem>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub projects: Vec<Project>,
    pub certificates: Vec<Certificate>,
    pub languages: Vec<Language>,
}

/// A `{id, name}` pair, used for skills and project technologies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NamedItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    /// When set, `end_date` is kept but never displayed.
    pub current: bool,
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub id: String,
    pub degree: String,
    pub school: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    /// Empty string means "not provided".
    pub gpa: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub technologies: Vec<NamedItem>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Certificate {
    pub id: String,
    pub name: String,
    pub issuer: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Language {
    pub id: String,
    pub name: String,
    #[serde(with = "level_label")]
    pub level: Option<LanguageLevel>,
}

/// Proficiency scale offered by the language picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageLevel {
    Beginner,
    Intermediate,
    Advanced,
    Fluent,
    Bilingual,
    Native,
}

impl LanguageLevel {
    pub const ALL: [LanguageLevel; 6] = [
        LanguageLevel::Beginner,
        LanguageLevel::Intermediate,
        LanguageLevel::Advanced,
        LanguageLevel::Fluent,
        LanguageLevel::Bilingual,
        LanguageLevel::Native,
    ];

    /// Display label, also the persisted form.
    pub fn label(self) -> &'static str {
        match self {
            LanguageLevel::Beginner => "Débutant",
            LanguageLevel::Intermediate => "Intermédiaire",
            LanguageLevel::Advanced => "Avancé",
            LanguageLevel::Fluent => "Courant",
            LanguageLevel::Bilingual => "Bilingue",
            LanguageLevel::Native => "Langue Maternelle",
        }
    }

    /// Accepts the French labels and the English variant names, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        LanguageLevel::ALL.into_iter().find(|level| {
            level.label().to_lowercase() == needle || level.aliases().contains(&needle.as_str())
        })
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            LanguageLevel::Beginner => &["beginner"],
            LanguageLevel::Intermediate => &["intermediate"],
            LanguageLevel::Advanced => &["advanced"],
            LanguageLevel::Fluent => &["fluent", "conversational"],
            LanguageLevel::Bilingual => &["bilingual"],
            LanguageLevel::Native => &["native"],
        }
    }
}

/// Persists `Option<LanguageLevel>` as its label, with `""` for unset.
/// Unknown labels read back as unset rather than failing the whole document.
mod level_label {
    use super::*;

    pub fn serialize<S: Serializer>(
        level: &Option<LanguageLevel>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(level.map(LanguageLevel::label).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<LanguageLevel>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(LanguageLevel::parse))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field addressing
// ────────────────────────────────────────────────────────────────────────────

/// The plain-text fields at the top of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    FullName,
    JobTitle,
    Email,
    Phone,
    Location,
    LinkedIn,
    Github,
    Portfolio,
    Summary,
}

impl ScalarField {
    /// Resolves the form input name (`fullName`, `linkedIn`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "fullName" => ScalarField::FullName,
            "jobTitle" => ScalarField::JobTitle,
            "email" => ScalarField::Email,
            "phone" => ScalarField::Phone,
            "location" => ScalarField::Location,
            "linkedIn" => ScalarField::LinkedIn,
            "github" => ScalarField::Github,
            "portfolio" => ScalarField::Portfolio,
            "summary" => ScalarField::Summary,
            _ => return None,
        })
    }
}

/// The repeatable sections whose entries are added, edited and removed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    Experience,
    Education,
    Projects,
    Certificates,
    Languages,
}

impl ListField {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "experience" => ListField::Experience,
            "education" => ListField::Education,
            "projects" => ListField::Projects,
            "certificates" => ListField::Certificates,
            "languages" => ListField::Languages,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ListField::Experience => "experience",
            ListField::Education => "education",
            ListField::Projects => "projects",
            ListField::Certificates => "certificates",
            ListField::Languages => "languages",
        }
    }
}

impl Document {
    pub fn scalar_mut(&mut self, field: ScalarField) -> &mut String {
        match field {
            ScalarField::FullName => &mut self.full_name,
            ScalarField::JobTitle => &mut self.job_title,
            ScalarField::Email => &mut self.email,
            ScalarField::Phone => &mut self.phone,
            ScalarField::Location => &mut self.location,
            ScalarField::LinkedIn => &mut self.linked_in,
            ScalarField::Github => &mut self.github,
            ScalarField::Portfolio => &mut self.portfolio,
            ScalarField::Summary => &mut self.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_serializes_camel_case_keys() {
        let doc = Document {
            full_name: "Ada Lovelace".to_string(),
            linked_in: "linkedin.com/in/ada".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["fullName"], "Ada Lovelace");
        assert_eq!(value["linkedIn"], "linkedin.com/in/ada");
        assert!(value.get("full_name").is_none());
    }

    #[test]
    fn test_language_level_persists_as_label() {
        let lang = Language {
            id: "1".to_string(),
            name: "Anglais".to_string(),
            level: Some(LanguageLevel::Fluent),
        };
        let value = serde_json::to_value(&lang).unwrap();
        assert_eq!(value["level"], "Courant");

        let unset = Language {
            level: None,
            ..lang
        };
        assert_eq!(serde_json::to_value(&unset).unwrap()["level"], "");
    }

    #[test]
    fn test_unknown_level_reads_back_as_unset() {
        let lang: Language =
            serde_json::from_value(json!({"id": "1", "name": "Latin", "level": "Expert"})).unwrap();
        assert_eq!(lang.level, None);
    }

    #[test]
    fn test_level_parse_accepts_english_and_french() {
        assert_eq!(LanguageLevel::parse("Native"), Some(LanguageLevel::Native));
        assert_eq!(
            LanguageLevel::parse("langue maternelle"),
            Some(LanguageLevel::Native)
        );
        assert_eq!(
            LanguageLevel::parse("Conversational"),
            Some(LanguageLevel::Fluent)
        );
        assert_eq!(LanguageLevel::parse("Avancé"), Some(LanguageLevel::Advanced));
        assert_eq!(LanguageLevel::parse("  "), None);
    }

    #[test]
    fn test_scalar_field_names_round_trip_through_accessors() {
        let mut doc = Document::default();
        let field = ScalarField::from_name("linkedIn").unwrap();
        *doc.scalar_mut(field) = "x".to_string();
        assert_eq!(doc.linked_in, "x");
        assert!(ScalarField::from_name("skills").is_none());
    }

    #[test]
    fn test_list_field_names() {
        for name in ["experience", "education", "projects", "certificates", "languages"] {
            assert_eq!(ListField::from_name(name).unwrap().as_str(), name);
        }
        assert!(ListField::from_name("skills").is_none());
    }
}
