//! Profile contact extraction backed by a generative model.
//!
//! A profile URL or a screenshot goes in, an [`ExtractionRecord`] comes out.
//! [`ExtractionSession`] sequences one user-initiated attempt at a time.

pub mod error;
pub mod extractor;
pub mod gemini;
pub mod normalizer;
pub mod payload;
pub mod prompt;
pub mod record;
pub mod schema;
pub mod session;

pub use error::{ExtractionError, SessionError};
pub use extractor::{Extractor, ProfileExtractor};
pub use gemini::{GeminiClient, GeminiConfig, GenerativeBackend};
pub use payload::{ImageFile, ImagePayload};
pub use record::{ConfidenceTier, ExtractionRecord};
pub use session::{
    ExtractionSession, ExtractionSource, ExtractionStatus, SessionSnapshot, IMAGE_FAILURE_MESSAGE,
    URL_FAILURE_MESSAGE,
};

/// Extractor talking to Gemini with the given settings.
pub fn gemini_extractor(config: GeminiConfig) -> Result<ProfileExtractor<GeminiClient>, ExtractionError> {
    let client = GeminiClient::new(config)?;
    Ok(ProfileExtractor::new(client))
}
