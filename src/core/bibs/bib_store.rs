use super::bib_models::{ExportedDocument, Slide, TextReplacement};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum BibError {
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Sheets API error: {0}")]
    Sheets(String),
    #[error("Slides API error: {0}")]
    Slides(String),
    #[error("Drive API error: {0}")]
    Drive(String),
    #[error("Template {0} has no slides")]
    TemplateHasNoSlides(String),
    #[error("Template is missing placeholder {0}")]
    PlaceholderMissing(&'static str),
    #[error("PDF export rejected (status {status}, content type {content_type})")]
    ExportRejected { status: u16, content_type: String },
    #[error("Roster row has no '{0}' column")]
    MissingField(&'static str),
    #[error("Report error: {0}")]
    Report(String),
}

/// Where the roster comes from.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Returns every row of the sheet, header first, as displayed text.
    async fn load_roster(&self, sheet_name: &str) -> Result<Vec<Vec<String>>, BibError>;
}

/// Editing access to a presentation.
#[async_trait]
pub trait PresentationEditor: Send + Sync {
    /// The first slide, or `None` when the presentation is empty.
    async fn first_slide(&self, presentation_id: &str) -> Result<Option<Slide>, BibError>;

    /// Applies all replacements to one slide as a single committed update.
    async fn replace_text(
        &self,
        presentation_id: &str,
        slide_id: &str,
        replacements: &[TextReplacement],
    ) -> Result<(), BibError>;
}

/// File operations against the storage service.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Copies a file and returns the id of the copy.
    async fn copy_file(&self, file_id: &str, copy_name: &str) -> Result<String, BibError>;

    /// Requests a PDF rendering. Non-success responses are returned, not raised.
    async fn export_pdf(&self, file_id: &str) -> Result<ExportedDocument, BibError>;

    /// Creates a new file in `folder_id` and returns its id.
    async fn upload_file(
        &self,
        folder_id: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BibError>;

    /// Anyone with the link can view.
    async fn share_publicly(&self, file_id: &str) -> Result<(), BibError>;

    async fn delete_file(&self, file_id: &str) -> Result<(), BibError>;
}
