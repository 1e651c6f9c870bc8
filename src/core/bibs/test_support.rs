// In-memory stand-ins for the Google services, shared by the bibs tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::bib_config::{BibConfig, ExportPolicy};
use super::bib_models::{BibRequest, ExportedDocument, Slide, SlideShape, TextReplacement};
use super::bib_store::{BibError, FileStore, PresentationEditor, RosterSource};

pub fn bib_template() -> Slide {
    Slide {
        object_id: "p1".into(),
        shapes: ["{{NUM}}", "{{NAME}}", "{{DIST}}"]
            .iter()
            .enumerate()
            .map(|(i, text)| SlideShape {
                object_id: format!("shape{}", i),
                text: text.to_string(),
            })
            .collect(),
    }
}

pub fn config(export_policy: ExportPolicy) -> BibConfig {
    BibConfig {
        spreadsheet_id: "sheet".into(),
        sheet_name: "Runners".into(),
        template_id: "tpl".into(),
        output_folder_id: "folder".into(),
        export_policy,
        report_path: None,
    }
}

pub fn request(token: &str, name: &str, distance: &str, bib_number: &str) -> BibRequest {
    BibRequest {
        token: token.into(),
        name: name.into(),
        distance: distance.into(),
        bib_number: bib_number.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_id: String,
    pub folder_id: String,
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

struct WorkspaceState {
    // `None` marks a presentation without slides.
    presentations: HashMap<String, Option<Slide>>,
    next_id: usize,
    copies: Vec<String>,
    deleted: Vec<String>,
    uploads: Vec<Upload>,
    shared: Vec<String>,
    export: ExportedDocument,
    fail_all_copies: bool,
    fail_copy_tokens: Vec<String>,
    fail_deletes: bool,
    fail_shares: bool,
}

/// One fake backing both the presentation editor and the file store,
/// so clones made through the store are visible to the editor.
#[derive(Clone)]
pub struct FakeWorkspace {
    state: Arc<Mutex<WorkspaceState>>,
}

impl FakeWorkspace {
    fn with_presentation(id: &str, slide: Option<Slide>) -> Self {
        let mut presentations = HashMap::new();
        presentations.insert(id.to_string(), slide);
        Self {
            state: Arc::new(Mutex::new(WorkspaceState {
                presentations,
                next_id: 1,
                copies: Vec::new(),
                deleted: Vec::new(),
                uploads: Vec::new(),
                shared: Vec::new(),
                export: ExportedDocument {
                    status: 200,
                    content_type: Some("application/pdf".into()),
                    bytes: b"%PDF-1.4 fake".to_vec(),
                },
                fail_all_copies: false,
                fail_copy_tokens: Vec::new(),
                fail_deletes: false,
                fail_shares: false,
            })),
        }
    }

    pub fn with_template(id: &str, slide: Slide) -> Self {
        Self::with_presentation(id, Some(slide))
    }

    pub fn empty_template(id: &str) -> Self {
        Self::with_presentation(id, None)
    }

    pub fn set_export(&self, status: u16, content_type: &str, body: &[u8]) {
        self.state.lock().unwrap().export = ExportedDocument {
            status,
            content_type: Some(content_type.to_string()),
            bytes: body.to_vec(),
        };
    }

    pub fn fail_copies(&self) {
        self.state.lock().unwrap().fail_all_copies = true;
    }

    pub fn fail_copies_for_token(&self, token: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_copy_tokens
            .push(token.to_string());
    }

    pub fn fail_deletes(&self) {
        self.state.lock().unwrap().fail_deletes = true;
    }

    pub fn fail_shares(&self) {
        self.state.lock().unwrap().fail_shares = true;
    }

    pub fn texts_of(&self, presentation_id: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .presentations
            .get(presentation_id)
            .and_then(|p| p.as_ref())
            .map(|slide| slide.shapes.iter().map(|s| s.text.clone()).collect())
            .unwrap_or_default()
    }

    pub fn copies(&self) -> Vec<String> {
        self.state.lock().unwrap().copies.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn shared(&self) -> Vec<String> {
        self.state.lock().unwrap().shared.clone()
    }

    pub fn live_copies(&self) -> usize {
        let state = self.state.lock().unwrap();
        state
            .copies
            .iter()
            .filter(|id| !state.deleted.contains(*id))
            .count()
    }
}

#[async_trait]
impl PresentationEditor for FakeWorkspace {
    async fn first_slide(&self, presentation_id: &str) -> Result<Option<Slide>, BibError> {
        let state = self.state.lock().unwrap();
        state
            .presentations
            .get(presentation_id)
            .cloned()
            .ok_or_else(|| BibError::Slides(format!("no presentation {}", presentation_id)))
    }

    async fn replace_text(
        &self,
        presentation_id: &str,
        slide_id: &str,
        replacements: &[TextReplacement],
    ) -> Result<(), BibError> {
        let mut state = self.state.lock().unwrap();
        let slide = state
            .presentations
            .get_mut(presentation_id)
            .and_then(|p| p.as_mut())
            .filter(|s| s.object_id == slide_id)
            .ok_or_else(|| BibError::Slides(format!("no slide {}", slide_id)))?;

        for shape in &mut slide.shapes {
            for r in replacements {
                shape.text = shape.text.replace(&r.find, &r.replace_with);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for FakeWorkspace {
    async fn copy_file(&self, file_id: &str, copy_name: &str) -> Result<String, BibError> {
        let mut state = self.state.lock().unwrap();
        let token_blocked = state
            .fail_copy_tokens
            .iter()
            .any(|t| copy_name.ends_with(t.as_str()));
        if state.fail_all_copies || token_blocked {
            return Err(BibError::Drive(format!("File not found: {}", file_id)));
        }

        let source = state
            .presentations
            .get(file_id)
            .cloned()
            .ok_or_else(|| BibError::Drive(format!("File not found: {}", file_id)))?;

        let copy_id = format!("copy{}", state.next_id);
        state.next_id += 1;
        state.presentations.insert(copy_id.clone(), source);
        state.copies.push(copy_id.clone());
        Ok(copy_id)
    }

    async fn export_pdf(&self, _file_id: &str) -> Result<ExportedDocument, BibError> {
        Ok(self.state.lock().unwrap().export.clone())
    }

    async fn upload_file(
        &self,
        folder_id: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BibError> {
        let mut state = self.state.lock().unwrap();
        let file_id = format!("file{}", state.next_id);
        state.next_id += 1;
        state.uploads.push(Upload {
            file_id: file_id.clone(),
            folder_id: folder_id.to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
        });
        Ok(file_id)
    }

    async fn share_publicly(&self, file_id: &str) -> Result<(), BibError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_shares {
            return Err(BibError::Drive("permission denied".into()));
        }
        state.shared.push(file_id.to_string());
        Ok(())
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), BibError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_deletes {
            return Err(BibError::Drive("delete forbidden".into()));
        }
        // Contents stay around so tests can inspect what was rendered.
        state.deleted.push(file_id.to_string());
        Ok(())
    }
}

/// Roster fake that also counts how often it was read.
#[derive(Clone)]
pub struct FakeRoster {
    rows: Option<Vec<Vec<String>>>,
    requested_sheets: Arc<Mutex<Vec<String>>>,
}

impl FakeRoster {
    pub fn new(rows: &[&[&str]]) -> Self {
        Self {
            rows: Some(
                rows.iter()
                    .map(|row| row.iter().map(|c| c.to_string()).collect())
                    .collect(),
            ),
            requested_sheets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            rows: None,
            requested_sheets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requested_sheets(&self) -> Vec<String> {
        self.requested_sheets.lock().unwrap().clone()
    }
}

#[async_trait]
impl RosterSource for FakeRoster {
    async fn load_roster(&self, sheet_name: &str) -> Result<Vec<Vec<String>>, BibError> {
        self.requested_sheets
            .lock()
            .unwrap()
            .push(sheet_name.to_string());
        self.rows
            .clone()
            .ok_or_else(|| BibError::Sheets(format!("Unable to parse range: {}", sheet_name)))
    }
}
