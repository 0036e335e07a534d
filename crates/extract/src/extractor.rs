use async_trait::async_trait;
use std::time::Instant;

use crate::error::ExtractionError;
use crate::gemini::{Content, GenerateContentRequest, GenerationConfig, GenerativeBackend, Part, Tool};
use crate::normalizer::parse_record;
use crate::payload::ImagePayload;
use crate::prompt;
use crate::record::ExtractionRecord;
use crate::schema::profile_schema;

/// Mime type declared for inline screenshots sent to the backend.
pub const INLINE_IMAGE_MIME: &str = "image/png";

/// Turns a profile reference into an [`ExtractionRecord`].
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract_from_image(&self, image: &ImagePayload) -> Result<ExtractionRecord, ExtractionError>;

    async fn extract_from_url(&self, url: &str) -> Result<ExtractionRecord, ExtractionError>;
}

/// Extractor backed by a generative model with structured JSON output.
pub struct ProfileExtractor<B> {
    backend: B,
}

impl<B: GenerativeBackend> ProfileExtractor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn build_request(&self, parts: Vec<Part>, tools: Vec<Tool>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: Some(Content::system(prompt::SYSTEM_INSTRUCTION)),
            tools,
            generation_config: GenerationConfig::json(profile_schema()),
        }
    }

    async fn run(&self, request: GenerateContentRequest, mode: &str) -> Result<ExtractionRecord, ExtractionError> {
        let start = Instant::now();

        let text = self.backend.generate_content(&request).await?;
        let record = parse_record(text.as_deref())?;

        tracing::info!(
            mode,
            elapsed_ms = %start.elapsed().as_millis(),
            emails = record.emails.len(),
            phones = record.phone_numbers.len(),
            confidence = record.confidence_score,
            "Profile extraction complete"
        );

        Ok(record)
    }
}

#[async_trait]
impl<B: GenerativeBackend> Extractor for ProfileExtractor<B> {
    async fn extract_from_image(&self, image: &ImagePayload) -> Result<ExtractionRecord, ExtractionError> {
        let request = self.build_request(
            vec![
                Part::inline_data(INLINE_IMAGE_MIME, image.data()),
                Part::text(prompt::IMAGE_PROMPT),
            ],
            Vec::new(),
        );

        self.run(request, "image").await
    }

    async fn extract_from_url(&self, url: &str) -> Result<ExtractionRecord, ExtractionError> {
        if url.trim().is_empty() {
            return Err(ExtractionError::Input("profile URL is empty".to_string()));
        }

        let request = self.build_request(
            vec![Part::text(prompt::build_url_prompt(url))],
            vec![Tool::google_search()],
        );

        let mut record = self.run(request, "url").await?;

        // Keep the record traceable to the submitted URL
        if record.linkedin_url.is_none() {
            record.linkedin_url = Some(url.to_string());
        }

        Ok(record)
    }
}
