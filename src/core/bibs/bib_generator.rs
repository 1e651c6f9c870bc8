use super::bib_config::{BibConfig, ExportPolicy};
use super::bib_models::{
    BibRequest, ExportedDocument, GeneratedBib, Placeholder, Slide, TextReplacement,
    PDF_MIME_TYPE,
};
use super::bib_store::{BibError, FileStore, PresentationEditor};

/// Produces one personalized bib PDF per call from the template presentation.
pub struct BibGenerator<P: PresentationEditor, F: FileStore> {
    slides: P,
    files: F,
}

impl<P: PresentationEditor, F: FileStore> BibGenerator<P, F> {
    pub fn new(slides: P, files: F) -> Self {
        Self { slides, files }
    }

    pub async fn generate_bib(
        &self,
        config: &BibConfig,
        request: &BibRequest,
    ) -> Result<GeneratedBib, BibError> {
        let copy_name = format!("bib-{}", request.token);
        let clone_id = self
            .files
            .copy_file(&config.template_id, &copy_name)
            .await?;
        tracing::debug!(clone_id = %clone_id, token = %request.token, "Template cloned");

        let result = self.fill_and_store(&clone_id, config, request).await;

        // The clone is only a scratch copy, drop it whatever happened above.
        if let Err(e) = self.files.delete_file(&clone_id).await {
            tracing::warn!("Failed to delete template copy {}: {}", clone_id, e);
        }

        let generated = result?;
        tracing::info!("BibNumber Generado! idfile={}", generated.file_id);
        Ok(generated)
    }

    async fn fill_and_store(
        &self,
        clone_id: &str,
        config: &BibConfig,
        request: &BibRequest,
    ) -> Result<GeneratedBib, BibError> {
        let slide = self
            .slides
            .first_slide(clone_id)
            .await?
            .ok_or_else(|| BibError::TemplateHasNoSlides(clone_id.to_string()))?;

        let replacements = plan_replacements(&slide, request)?;
        self.slides
            .replace_text(clone_id, &slide.object_id, &replacements)
            .await?;

        let export = self.files.export_pdf(clone_id).await?;
        let bytes = accept_export(export, config.export_policy)?;

        let file_name = request.file_name();
        let file_id = self
            .files
            .upload_file(&config.output_folder_id, &file_name, PDF_MIME_TYPE, bytes)
            .await?;
        self.files.share_publicly(&file_id).await?;

        Ok(GeneratedBib { file_id, file_name })
    }
}

/// Checks every placeholder appears on the slide and pairs it with its value.
pub fn plan_replacements(
    slide: &Slide,
    request: &BibRequest,
) -> Result<Vec<TextReplacement>, BibError> {
    Placeholder::ALL
        .iter()
        .map(|placeholder| {
            let marker = placeholder.marker();
            if !slide.shapes.iter().any(|s| s.text.contains(marker)) {
                return Err(BibError::PlaceholderMissing(marker));
            }
            Ok(TextReplacement {
                find: marker.to_string(),
                replace_with: request.value_for(*placeholder).to_string(),
            })
        })
        .collect()
}

/// Applies the export policy and hands back the bytes to upload.
pub fn accept_export(export: ExportedDocument, policy: ExportPolicy) -> Result<Vec<u8>, BibError> {
    match policy {
        ExportPolicy::Lenient => {
            if !export.is_success() {
                tracing::warn!(
                    status = export.status,
                    "PDF export returned a non-success status, uploading body anyway"
                );
            }
            Ok(export.bytes)
        }
        ExportPolicy::Strict if export.is_success() && export.is_pdf() => Ok(export.bytes),
        ExportPolicy::Strict => Err(BibError::ExportRejected {
            status: export.status,
            content_type: export.content_type.unwrap_or_else(|| "none".to_string()),
        }),
    }
}
