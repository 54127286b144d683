//! Normalization of persisted documents of unknown vintage.
//!
//! Nothing in the stored JSON says which schema wrote it, so every field is
//! decoded by its structural shape. `normalize` is the only way a stored or
//! imported value becomes a `Document`; it never fails.
//!
//! # Shapes handled
//! - `skills`: comma-joined string (legacy) or list of `{id, name}`
//! - `projects[].technologies`: same two shapes, per project
//! - `languages`: comma-joined string (legacy) or list of `{id, name, level}`
//! - anything else of the wrong type falls back to the field's empty default

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use crate::document::ids::new_id;
use crate::models::document::{
    Certificate, Document, Education, Experience, Language, LanguageLevel, NamedItem, Project,
};

/// Shape of a `{id, name}` list field as found in storage.
enum NamedItemsShape<'a> {
    CommaJoined(&'a str),
    Items(&'a [Value]),
    Unrecognized,
}

impl<'a> NamedItemsShape<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::String(s)) => NamedItemsShape::CommaJoined(s),
            Some(Value::Array(items)) => NamedItemsShape::Items(items),
            _ => NamedItemsShape::Unrecognized,
        }
    }
}

/// Decodes a raw stored value into the current `Document` schema.
pub fn normalize(raw: &Value) -> Document {
    let Some(obj) = raw.as_object() else {
        debug!("Stored document is not an object; starting from an empty document");
        return Document::default();
    };

    Document {
        full_name: text(obj, "fullName"),
        job_title: text(obj, "jobTitle"),
        email: text(obj, "email"),
        phone: text(obj, "phone"),
        location: text(obj, "location"),
        linked_in: text(obj, "linkedIn"),
        github: text(obj, "github"),
        portfolio: text(obj, "portfolio"),
        summary: text(obj, "summary"),
        skills: named_items(obj.get("skills")),
        experience: entries(obj.get("experience"), decode_experience),
        education: entries(obj.get("education"), decode_education),
        projects: entries(obj.get("projects"), decode_project),
        certificates: entries(obj.get("certificates"), decode_certificate),
        languages: languages(obj.get("languages")),
    }
}

/// Splits a comma-joined list into named items, trimming and dropping blanks.
pub fn split_comma_list(raw: &str) -> Vec<NamedItem> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| NamedItem {
            id: new_id(),
            name: name.to_string(),
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Field decoders
// ────────────────────────────────────────────────────────────────────────────

fn text(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn flag(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Ids were historically `Date.now().toString()`; numbers are accepted too.
fn stored_id(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn named_items(value: Option<&Value>) -> Vec<NamedItem> {
    let items = match NamedItemsShape::of(value) {
        NamedItemsShape::CommaJoined(raw) => split_comma_list(raw),
        NamedItemsShape::Items(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => Some(NamedItem {
                    id: stored_id(obj).unwrap_or_else(new_id),
                    name: text(obj, "name"),
                }),
                Value::String(name) if !name.trim().is_empty() => Some(NamedItem {
                    id: new_id(),
                    name: name.trim().to_string(),
                }),
                _ => None,
            })
            .collect(),
        NamedItemsShape::Unrecognized => Vec::new(),
    };
    dedupe_ids(items, HasId::id_mut)
}

fn entries<T>(value: Option<&Value>, decode: fn(&Map<String, Value>, String) -> T) -> Vec<T>
where
    T: HasId,
{
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    let decoded = items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| decode(obj, stored_id(obj).unwrap_or_else(new_id)))
        .collect();
    dedupe_ids(decoded, HasId::id_mut)
}

fn languages(value: Option<&Value>) -> Vec<Language> {
    match value {
        Some(Value::String(raw)) => split_comma_list(raw)
            .into_iter()
            .map(|item| Language {
                id: item.id,
                name: item.name,
                level: None,
            })
            .collect(),
        other => entries(other, decode_language),
    }
}

fn decode_experience(obj: &Map<String, Value>, id: String) -> Experience {
    let responsibilities = match obj.get("responsibilities") {
        Some(Value::Array(lines)) => lines
            .iter()
            .filter_map(|line| line.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(single)) if !single.is_empty() => vec![single.clone()],
        _ => Vec::new(),
    };
    Experience {
        id,
        title: text(obj, "title"),
        company: text(obj, "company"),
        location: text(obj, "location"),
        start_date: text(obj, "startDate"),
        end_date: text(obj, "endDate"),
        current: flag(obj, "current"),
        responsibilities,
    }
}

fn decode_education(obj: &Map<String, Value>, id: String) -> Education {
    Education {
        id,
        degree: text(obj, "degree"),
        school: text(obj, "school"),
        location: text(obj, "location"),
        start_date: text(obj, "startDate"),
        end_date: text(obj, "endDate"),
        gpa: text(obj, "gpa"),
    }
}

fn decode_project(obj: &Map<String, Value>, id: String) -> Project {
    Project {
        id,
        name: text(obj, "name"),
        description: text(obj, "description"),
        technologies: named_items(obj.get("technologies")),
        url: text(obj, "url"),
    }
}

fn decode_certificate(obj: &Map<String, Value>, id: String) -> Certificate {
    Certificate {
        id,
        name: text(obj, "name"),
        issuer: text(obj, "issuer"),
        date: text(obj, "date"),
    }
}

fn decode_language(obj: &Map<String, Value>, id: String) -> Language {
    Language {
        id,
        name: text(obj, "name"),
        level: obj
            .get("level")
            .and_then(Value::as_str)
            .and_then(LanguageLevel::parse),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Id uniqueness
// ────────────────────────────────────────────────────────────────────────────

trait HasId {
    fn id_mut(&mut self) -> &mut String;
}

macro_rules! impl_has_id {
    ($($ty:ty),*) => {
        $(impl HasId for $ty {
            fn id_mut(&mut self) -> &mut String {
                &mut self.id
            }
        })*
    };
}

impl_has_id!(NamedItem, Experience, Education, Project, Certificate, Language);

/// Re-issues ids that collide with an earlier entry of the same list.
/// The first holder of an id keeps it.
fn dedupe_ids<T>(mut items: Vec<T>, id_of: fn(&mut T) -> &mut String) -> Vec<T> {
    let mut seen = HashSet::new();
    for item in items.iter_mut() {
        let id = id_of(item);
        if !seen.insert(id.clone()) {
            *id = new_id();
            seen.insert(id.clone());
        }
    }
    items
}
