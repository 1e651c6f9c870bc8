use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Suffix appended to the runner token to build the stored PDF name.
pub const BIB_FILE_SUFFIX: &str = "_BN_1RACARRERA.pdf";

/// Builds the deterministic display name of a generated bib.
pub fn bib_file_name(token: &str) -> String {
    format!("{}{}", token, BIB_FILE_SUFFIX)
}

/// One roster row keyed by normalized header label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerRecord {
    fields: HashMap<String, String>,
}

impl RunnerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts win, so duplicate header labels overwrite earlier columns.
    pub fn insert(&mut self, key: String, value: String) {
        self.fields.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn token(&self) -> Option<&str> {
        self.get("token")
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    pub fn distance(&self) -> Option<&str> {
        self.get("distance")
    }

    /// Accepts both `BibNumber` and `Bib Number` style headers.
    pub fn bib_number(&self) -> Option<&str> {
        self.get("bibnumber").or_else(|| self.get("bib_number"))
    }
}

/// The values substituted into one copy of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibRequest {
    pub token: String,
    pub name: String,
    pub distance: String,
    pub bib_number: String,
}

impl BibRequest {
    pub fn file_name(&self) -> String {
        bib_file_name(&self.token)
    }

    pub fn value_for(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::Number => &self.bib_number,
            Placeholder::Name => &self.name,
            Placeholder::Distance => &self.distance,
        }
    }
}

/// The three text markers a bib template must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Number,
    Name,
    Distance,
}

impl Placeholder {
    pub const ALL: [Placeholder; 3] = [
        Placeholder::Number,
        Placeholder::Name,
        Placeholder::Distance,
    ];

    pub fn marker(&self) -> &'static str {
        match self {
            Placeholder::Number => "{{NUM}}",
            Placeholder::Name => "{{NAME}}",
            Placeholder::Distance => "{{DIST}}",
        }
    }
}

/// A text-bearing shape on a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideShape {
    pub object_id: String,
    pub text: String,
}

/// The first page of a presentation, with its shapes in template order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub object_id: String,
    pub shapes: Vec<SlideShape>,
}

/// A literal find/replace applied to one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReplacement {
    pub find: String,
    pub replace_with: String,
}

/// Raw response of a PDF export call, before any policy is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ExportedDocument {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or("").trim())
            .is_some_and(|mime| mime.eq_ignore_ascii_case(PDF_MIME_TYPE))
    }
}

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A bib that made it into the output folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedBib {
    pub file_id: String,
    pub file_name: String,
}

/// What happened to one roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Generated { file_id: String, file_name: String },
    Skipped,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowReport {
    /// 1-based sheet row, counting the header as row 1.
    pub row_number: usize,
    pub token: Option<String>,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

/// Result of one full pass over the roster.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub rows: Vec<RowReport>,
}

impl BatchReport {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            rows: Vec::new(),
        }
    }

    pub fn record(&mut self, row_number: usize, token: Option<String>, outcome: RowOutcome) {
        self.rows.push(RowReport {
            row_number,
            token,
            outcome,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn generated_count(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Generated { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Skipped))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }
}
