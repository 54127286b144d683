//! Preview renderer: turns a `Document` into positioned text runs and rules
//! on a continuous A4-wide canvas.
//!
//! All coordinates are points from the top-left corner of the first page.
//! A line that would cross a page's bottom margin is moved to the top of the
//! next page, so every element belongs to exactly one page.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::{get_metrics, FontFamily, FontMetricTable, BOLD_WIDTH_FACTOR};
use crate::layout::style::{Arrangement, StyleConfig, TextRole, LINE_HEIGHT};
use crate::models::document::{
    Certificate, Document, Education, Experience, Language, Project,
};

pub const NAME_PLACEHOLDER: &str = "Votre Nom";
pub const JOB_TITLE_PLACEHOLDER: &str = "Titre du Poste";
pub const PRESENT_LABEL: &str = "Présent";
pub const GPA_LABEL: &str = "Moyenne : ";

pub const CONTACT_SEPARATOR: &str = " • ";
pub const DATE_SEPARATOR: &str = " – ";
pub const LEVEL_SEPARATOR: &str = " — ";
const BULLET: &str = "•";

const SECTION_GAP_PT: f32 = 8.0;
const ENTRY_GAP_PT: f32 = 4.0;
const BULLET_INDENT_PT: f32 = 10.0;
const COLUMN_GAP_PT: f32 = 16.0;
const ROW_GAP_PT: f32 = 8.0;
const RULE_THICKNESS_PT: f32 = 0.75;
const RULE_SPACING_PT: f32 = 3.0;

/// Remaining heights at or below this are treated as no content.
pub const PAGE_EPSILON_PT: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Editing preview: empty header fields show placeholders.
    #[default]
    Live,
    /// Export rendition: empty header fields are omitted.
    Final,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    /// One line of text; `x_pt` is its left edge after alignment.
    Text {
        x_pt: f32,
        y_pt: f32,
        width_pt: f32,
        size_pt: f32,
        bold: bool,
        text: String,
    },
    Rule {
        x_pt: f32,
        y_pt: f32,
        width_pt: f32,
        thickness_pt: f32,
    },
}

impl Element {
    pub fn top(&self) -> f32 {
        match self {
            Element::Text { y_pt, .. } | Element::Rule { y_pt, .. } => *y_pt,
        }
    }

    pub fn height(&self) -> f32 {
        match self {
            Element::Text { size_pt, .. } => size_pt * LINE_HEIGHT,
            Element::Rule { thickness_pt, .. } => *thickness_pt,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.top() + self.height()
    }

    fn shifted_up(&self, dy: f32) -> Element {
        let mut moved = self.clone();
        match &mut moved {
            Element::Text { y_pt, .. } | Element::Rule { y_pt, .. } => *y_pt -= dy,
        }
        moved
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub width_pt: f32,
    pub page_height_pt: f32,
    /// Bottom of the lowest element plus the bottom margin. Trailing
    /// section gaps do not count.
    pub content_height_pt: f32,
    pub font_family: FontFamily,
    pub elements: Vec<Element>,
}

/// One A4 page of the paginated preview, in page-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub index: usize,
    pub elements: Vec<Element>,
}

impl PageLayout {
    /// Number of pages the content spans. Never zero.
    pub fn page_count(&self) -> usize {
        if self.page_height_pt <= 0.0 {
            return 1;
        }
        let mut count = 1;
        let mut remaining = self.content_height_pt - self.page_height_pt;
        while remaining > PAGE_EPSILON_PT {
            count += 1;
            remaining -= self.page_height_pt;
        }
        count
    }

    pub fn pages(&self) -> Vec<Page> {
        let count = self.page_count();
        let mut pages: Vec<Page> = (0..count)
            .map(|index| Page {
                index,
                elements: Vec::new(),
            })
            .collect();
        for element in &self.elements {
            let index = if self.page_height_pt > 0.0 {
                ((element.top() / self.page_height_pt).floor().max(0.0) as usize).min(count - 1)
            } else {
                0
            };
            let page_top = index as f32 * self.page_height_pt;
            pages[index].elements.push(element.shifted_up(page_top));
        }
        pages
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

/// Flows lines down a column of fixed width.
struct Cursor<'a> {
    style: &'a StyleConfig,
    metrics: &'static FontMetricTable,
    x: f32,
    width: f32,
    y: f32,
    page_height: f32,
    margin: f32,
    elements: Vec<Element>,
}

impl<'a> Cursor<'a> {
    fn new(style: &'a StyleConfig) -> Self {
        Cursor {
            style,
            metrics: get_metrics(style.font_family),
            x: style.margin_pt(),
            width: style.content_width_pt(),
            y: style.margin_pt(),
            page_height: style.page_height_pt(),
            margin: style.margin_pt(),
            elements: Vec::new(),
        }
    }

    fn column(&self, x: f32, width: f32) -> Cursor<'a> {
        Cursor {
            style: self.style,
            metrics: self.metrics,
            x,
            width,
            y: self.y,
            page_height: self.page_height,
            margin: self.margin,
            elements: Vec::new(),
        }
    }

    fn width_factor(role: TextRole) -> f32 {
        if role.is_bold() {
            BOLD_WIDTH_FACTOR
        } else {
            1.0
        }
    }

    fn text_width(&self, text: &str, role: TextRole) -> f32 {
        self.metrics.measure_str(text) * self.style.size_pt(role) * Self::width_factor(role)
    }

    fn wrap(&self, text: &str, role: TextRole, width: f32) -> Vec<String> {
        let em = self.style.size_pt(role) * Self::width_factor(role);
        if em <= 0.0 {
            return Vec::new();
        }
        self.metrics.wrap(text, width / em)
    }

    fn line_height(&self, role: TextRole) -> f32 {
        self.style.size_pt(role) * LINE_HEIGHT
    }

    /// Claims `height` points of vertical space and returns its top.
    ///
    /// Space that would cross the bottom margin starts on the next page
    /// instead, unless it could never fit on any page.
    fn reserve(&mut self, height: f32) -> f32 {
        if self.page_height > 0.0 {
            let page_top = (self.y / self.page_height).floor() * self.page_height;
            let limit = page_top + self.page_height - self.margin;
            let fits_on_empty_page = height <= self.page_height - 2.0 * self.margin;
            if self.y + height > limit && fits_on_empty_page {
                self.y = page_top + self.page_height + self.margin;
            }
        }
        let top = self.y;
        self.y += height;
        top
    }

    fn place(&mut self, x: f32, y: f32, text: &str, role: TextRole) {
        self.elements.push(Element::Text {
            x_pt: x,
            y_pt: y,
            width_pt: self.text_width(text, role),
            size_pt: self.style.size_pt(role),
            bold: role.is_bold(),
            text: text.to_string(),
        });
    }

    fn gap(&mut self, height: f32) {
        self.y += height;
    }

    fn paragraph(&mut self, text: &str, role: TextRole) {
        for line in self.wrap(text, role, self.width) {
            let y = self.reserve(self.line_height(role));
            if !line.is_empty() {
                self.place(self.x, y, &line, role);
            }
        }
    }

    fn centered(&mut self, text: &str, role: TextRole) {
        for line in self.wrap(text, role, self.width) {
            let y = self.reserve(self.line_height(role));
            let offset = ((self.width - self.text_width(&line, role)) / 2.0).max(0.0);
            self.place(self.x + offset, y, &line, role);
        }
    }

    /// `left` wraps in the space `right` leaves free; `right` is
    /// right-aligned on the first line.
    fn row(&mut self, left: &str, left_role: TextRole, right: &str, right_role: TextRole) {
        let right = right.trim();
        if right.is_empty() {
            self.paragraph(left, left_role);
            return;
        }
        let right_width = self.text_width(right, right_role);
        let left_width = (self.width - right_width - ROW_GAP_PT).max(self.width / 2.0);
        let left_lines = self.wrap(left, left_role, left_width);

        let first_height = self.line_height(left_role).max(self.line_height(right_role));
        let y = self.reserve(first_height);
        if let Some(first) = left_lines.first() {
            self.place(self.x, y, first, left_role);
        }
        let right_x = self.x + (self.width - right_width).max(0.0);
        self.place(right_x, y, right, right_role);

        for line in left_lines.iter().skip(1) {
            let y = self.reserve(self.line_height(left_role));
            self.place(self.x, y, line, left_role);
        }
    }

    fn bullet(&mut self, text: &str, role: TextRole) {
        let lines = self.wrap(text, role, self.width - BULLET_INDENT_PT);
        for (i, line) in lines.iter().enumerate() {
            let y = self.reserve(self.line_height(role));
            if i == 0 {
                self.place(self.x, y, BULLET, role);
            }
            self.place(self.x + BULLET_INDENT_PT, y, line, role);
        }
    }

    fn rule(&mut self) {
        let y = self.reserve(RULE_SPACING_PT * 2.0 + RULE_THICKNESS_PT);
        self.elements.push(Element::Rule {
            x_pt: self.x,
            y_pt: y + RULE_SPACING_PT,
            width_pt: self.width,
            thickness_pt: RULE_THICKNESS_PT,
        });
    }

    fn heading(&mut self, title: &str) {
        self.paragraph(title, TextRole::Heading);
        self.rule();
    }

    fn absorb(&mut self, columns: Vec<Cursor<'a>>) {
        for column in columns {
            self.y = self.y.max(column.y);
            self.elements.extend(column.elements);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

/// `start – end`, with "Présent" standing in for the end of a current role.
pub fn date_range(start: &str, end: &str, current: bool) -> String {
    let end = if current { PRESENT_LABEL } else { end };
    match (start.trim().is_empty(), end.trim().is_empty()) {
        (true, true) => String::new(),
        (false, true) => start.to_string(),
        (true, false) => end.to_string(),
        (false, false) => format!("{start}{DATE_SEPARATOR}{end}"),
    }
}

fn header(cursor: &mut Cursor, doc: &Document, variant: Variant) {
    let start = cursor.elements.len();

    let name = match (doc.full_name.trim().is_empty(), variant) {
        (false, _) => Some(doc.full_name.as_str()),
        (true, Variant::Live) => Some(NAME_PLACEHOLDER),
        (true, Variant::Final) => None,
    };
    if let Some(name) = name {
        cursor.centered(name, TextRole::Name);
    }

    let job_title = match (doc.job_title.trim().is_empty(), variant) {
        (false, _) => Some(doc.job_title.as_str()),
        (true, Variant::Live) => Some(JOB_TITLE_PLACEHOLDER),
        (true, Variant::Final) => None,
    };
    if let Some(job_title) = job_title {
        cursor.centered(job_title, TextRole::JobTitle);
    }

    let contact = contact_line(doc);
    if !contact.is_empty() {
        cursor.gap(2.0);
        cursor.centered(&contact, TextRole::Detail);
    }

    if cursor.elements.len() > start {
        cursor.rule();
        cursor.gap(SECTION_GAP_PT);
    }
}

/// Non-empty contact fields in display order, joined by " • ".
pub fn contact_line(doc: &Document) -> String {
    [
        &doc.email,
        &doc.phone,
        &doc.location,
        &doc.linked_in,
        &doc.github,
        &doc.portfolio,
    ]
    .into_iter()
    .map(|field| field.trim())
    .filter(|field| !field.is_empty())
    .collect::<Vec<_>>()
    .join(CONTACT_SEPARATOR)
}

fn summary(cursor: &mut Cursor, doc: &Document) {
    if doc.summary.trim().is_empty() {
        return;
    }
    cursor.heading("Résumé Professionnel");
    cursor.paragraph(&doc.summary, TextRole::Body);
    cursor.gap(SECTION_GAP_PT);
}

fn experience_entry(cursor: &mut Cursor, exp: &Experience) {
    let dates = date_range(&exp.start_date, &exp.end_date, exp.current);
    cursor.row(&exp.title, TextRole::EntryTitle, &dates, TextRole::Detail);
    if !exp.company.trim().is_empty() || !exp.location.trim().is_empty() {
        cursor.row(&exp.company, TextRole::Body, &exp.location, TextRole::Detail);
    }
    for responsibility in exp
        .responsibilities
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
    {
        cursor.bullet(responsibility, TextRole::Body);
    }
}

fn education_entry(cursor: &mut Cursor, edu: &Education) {
    let dates = date_range(&edu.start_date, &edu.end_date, false);
    cursor.row(&edu.degree, TextRole::EntryTitle, &dates, TextRole::Detail);
    if !edu.school.trim().is_empty() || !edu.location.trim().is_empty() {
        cursor.row(&edu.school, TextRole::Body, &edu.location, TextRole::Detail);
    }
    if !edu.gpa.trim().is_empty() {
        cursor.paragraph(&format!("{GPA_LABEL}{}", edu.gpa.trim()), TextRole::Detail);
    }
}

fn project_entry(cursor: &mut Cursor, project: &Project) {
    cursor.paragraph(&project.name, TextRole::EntryTitle);
    cursor.paragraph(&project.description, TextRole::Body);
    let technologies = project
        .technologies
        .iter()
        .map(|tech| tech.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    cursor.paragraph(&technologies, TextRole::Detail);
    cursor.paragraph(&project.url, TextRole::Detail);
}

fn certificate_entry(cursor: &mut Cursor, cert: &Certificate) {
    cursor.row(&cert.name, TextRole::EntryTitle, &cert.date, TextRole::Detail);
    cursor.paragraph(&cert.issuer, TextRole::Body);
}

pub fn language_line(lang: &Language) -> String {
    match lang.level {
        Some(level) if lang.name.trim().is_empty() => level.label().to_string(),
        Some(level) => format!("{}{LEVEL_SEPARATOR}{}", lang.name.trim(), level.label()),
        None => lang.name.trim().to_string(),
    }
}

fn entries<T>(cursor: &mut Cursor, title: &str, items: &[T], entry: fn(&mut Cursor, &T)) {
    if items.is_empty() {
        return;
    }
    cursor.heading(title);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            cursor.gap(ENTRY_GAP_PT);
        }
        entry(cursor, item);
    }
    cursor.gap(SECTION_GAP_PT);
}

fn skills(cursor: &mut Cursor, doc: &Document) {
    if doc.skills.is_empty() {
        return;
    }
    cursor.heading("Compétences");
    let joined = doc
        .skills
        .iter()
        .map(|skill| skill.name.trim())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(CONTACT_SEPARATOR);
    cursor.paragraph(&joined, TextRole::Body);
    cursor.gap(SECTION_GAP_PT);
}

fn languages(cursor: &mut Cursor, doc: &Document) {
    if doc.languages.is_empty() {
        return;
    }
    cursor.heading("Langues");
    for lang in &doc.languages {
        cursor.paragraph(&language_line(lang), TextRole::Body);
    }
    cursor.gap(SECTION_GAP_PT);
}

fn skills_and_languages_columns(cursor: &mut Cursor, doc: &Document) {
    if doc.skills.is_empty() || doc.languages.is_empty() {
        skills(cursor, doc);
        languages(cursor, doc);
        return;
    }
    let half = ((cursor.width - COLUMN_GAP_PT) / 2.0).max(0.0);
    let mut left = cursor.column(cursor.x, half);
    let mut right = cursor.column(cursor.x + half + COLUMN_GAP_PT, half);
    skills(&mut left, doc);
    languages(&mut right, doc);
    cursor.absorb(vec![left, right]);
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Lays out `doc` for display. Pure: same inputs, same layout.
pub fn render(doc: &Document, style: &StyleConfig, variant: Variant) -> PageLayout {
    let mut cursor = Cursor::new(style);

    header(&mut cursor, doc, variant);
    summary(&mut cursor, doc);
    entries(
        &mut cursor,
        "Expérience Professionnelle",
        &doc.experience,
        experience_entry,
    );
    entries(&mut cursor, "Formation", &doc.education, education_entry);
    match style.arrangement {
        Arrangement::Linear => {
            skills(&mut cursor, doc);
            entries(&mut cursor, "Projets", &doc.projects, project_entry);
            entries(
                &mut cursor,
                "Certifications",
                &doc.certificates,
                certificate_entry,
            );
            languages(&mut cursor, doc);
        }
        Arrangement::SkillsLanguagesColumns => {
            skills_and_languages_columns(&mut cursor, doc);
            entries(&mut cursor, "Projets", &doc.projects, project_entry);
            entries(
                &mut cursor,
                "Certifications",
                &doc.certificates,
                certificate_entry,
            );
        }
    }

    let lowest = cursor
        .elements
        .iter()
        .map(Element::bottom)
        .fold(style.margin_pt(), f32::max);

    PageLayout {
        width_pt: style.page_width_pt(),
        page_height_pt: style.page_height_pt(),
        content_height_pt: lowest + style.margin_pt(),
        font_family: style.font_family,
        elements: cursor.elements,
    }
}
