use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::ExtractionError;

/// A chosen file before it has been turned into a previewable payload.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Base64 image with its declared mime type, i.e. the parts of a
/// `data:<mime>;base64,<data>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime_type: String,
    data: String,
}

impl ImagePayload {
    /// Encode raw file bytes. Only `image/*` types are accepted.
    pub fn encode(file: &ImageFile) -> Result<Self, ExtractionError> {
        let mime_type = file.mime_type.trim().to_ascii_lowercase();

        if !mime_type.starts_with("image/") {
            return Err(ExtractionError::Input(format!(
                "unsupported file type '{}', expected an image",
                file.mime_type
            )));
        }
        if file.bytes.is_empty() {
            return Err(ExtractionError::Input("image file is empty".to_string()));
        }

        Ok(Self {
            mime_type,
            data: STANDARD.encode(&file.bytes),
        })
    }

    /// Split a data URI into mime type and raw base64 data.
    ///
    /// For callers that already hold an encoded image, such as a preview
    /// read back from [`SessionSnapshot`](crate::SessionSnapshot). Raw file
    /// bytes go through [`ImagePayload::encode`] instead.
    pub fn from_data_uri(uri: &str) -> Result<Self, ExtractionError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| ExtractionError::Input("not a data URI".to_string()))?;

        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| ExtractionError::Input("data URI has no payload".to_string()))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ExtractionError::Input("data URI is not base64 encoded".to_string()))?;

        if data.is_empty() {
            return Err(ExtractionError::Input("data URI payload is empty".to_string()));
        }

        Ok(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Raw base64 data with the URI prefix stripped.
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
