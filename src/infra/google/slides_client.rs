use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::auth::AccessTokenProvider;
use crate::core::bibs::bib_models::{Slide, SlideShape, TextReplacement};
use crate::core::bibs::{BibError, PresentationEditor};

const SLIDES_BASE_URL: &str = "https://slides.googleapis.com/v1";

// Only what we need to find the placeholders.
const PRESENTATION_FIELDS: &str = "slides(objectId,pageElements(objectId,\
    shape(text(textElements(textRun(content)))),\
    elementGroup(children(objectId,shape(text(textElements(textRun(content))))))))";

// =============================================================================
// GOOGLE SLIDES API RESPONSE STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Presentation {
    #[serde(default)]
    slides: Vec<Page>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page {
    object_id: String,
    #[serde(default)]
    page_elements: Vec<PageElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageElement {
    object_id: String,
    shape: Option<Shape>,
    element_group: Option<Group>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Group {
    #[serde(default)]
    children: Vec<PageElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Shape {
    text: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextContent {
    #[serde(default)]
    text_elements: Vec<TextElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextElement {
    text_run: Option<TextRun>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextRun {
    content: Option<String>,
}

// =============================================================================
// GOOGLE SLIDES CLIENT
// =============================================================================

/// Reads and edits template copies through the Slides API.
pub struct GoogleSlidesClient {
    client: Client,
    auth: Arc<dyn AccessTokenProvider>,
    base_url: String,
}

impl GoogleSlidesClient {
    pub fn new(client: Client, auth: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            client,
            auth,
            base_url: SLIDES_BASE_URL.to_string(),
        }
    }

    fn collect_shapes(elements: Vec<PageElement>, out: &mut Vec<SlideShape>) {
        for element in elements {
            if let Some(shape) = element.shape {
                let text = shape
                    .text
                    .map(|t| {
                        t.text_elements
                            .into_iter()
                            .filter_map(|e| e.text_run.and_then(|r| r.content))
                            .collect::<String>()
                    })
                    .unwrap_or_default();
                out.push(SlideShape {
                    object_id: element.object_id,
                    text,
                });
            } else if let Some(group) = element.element_group {
                Self::collect_shapes(group.children, out);
            }
        }
    }

    fn first_slide_of(presentation: Presentation) -> Option<Slide> {
        let page = presentation.slides.into_iter().next()?;
        let mut shapes = Vec::new();
        Self::collect_shapes(page.page_elements, &mut shapes);
        Some(Slide {
            object_id: page.object_id,
            shapes,
        })
    }

    fn batch_update_body(slide_id: &str, replacements: &[TextReplacement]) -> Value {
        let requests: Vec<Value> = replacements
            .iter()
            .map(|r| {
                json!({
                    "replaceAllText": {
                        "containsText": { "text": r.find, "matchCase": true },
                        "replaceText": r.replace_with,
                        "pageObjectIds": [slide_id],
                    }
                })
            })
            .collect();
        json!({ "requests": requests })
    }
}

#[async_trait]
impl PresentationEditor for GoogleSlidesClient {
    async fn first_slide(&self, presentation_id: &str) -> Result<Option<Slide>, BibError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/presentations/{}", self.base_url, presentation_id);

        tracing::debug!("Reading presentation {}", presentation_id);

        let response = self
            .client
            .get(&url)
            .query(&[("fields", PRESENTATION_FIELDS)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BibError::Slides(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BibError::Slides(format!(
                "Failed to open presentation {} ({}): {}",
                presentation_id, status, text
            )));
        }

        let presentation: Presentation = response
            .json()
            .await
            .map_err(|e| BibError::Slides(e.to_string()))?;

        Ok(Self::first_slide_of(presentation))
    }

    async fn replace_text(
        &self,
        presentation_id: &str,
        slide_id: &str,
        replacements: &[TextReplacement],
    ) -> Result<(), BibError> {
        let token = self.auth.access_token().await?;
        let url = format!(
            "{}/presentations/{}:batchUpdate",
            self.base_url, presentation_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&Self::batch_update_body(slide_id, replacements))
            .send()
            .await
            .map_err(|e| BibError::Slides(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BibError::Slides(format!(
                "batchUpdate on {} failed ({}): {}",
                presentation_id, status, text
            )));
        }

        tracing::debug!(
            presentation_id,
            replacements = replacements.len(),
            "Placeholders replaced"
        );
        Ok(())
    }
}
