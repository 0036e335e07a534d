use serde_json::{Value, json};

/// Fields the backend must always return, even if null.
pub const REQUIRED_FIELDS: [&str; 2] = ["fullName", "confidenceScore"];

/// Structured-output schema shared by the image and URL extraction calls.
///
/// Uses the Gemini OpenAPI subset (upper-case type names).
pub fn profile_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "fullName": { "type": "STRING" },
            "emails": { "type": "ARRAY", "items": { "type": "STRING" } },
            "phoneNumbers": { "type": "ARRAY", "items": { "type": "STRING" } },
            "jobTitle": { "type": "STRING" },
            "company": { "type": "STRING" },
            "location": { "type": "STRING" },
            "linkedinUrl": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "confidenceScore": { "type": "NUMBER" }
        },
        "required": REQUIRED_FIELDS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_shape() {
        let schema = profile_schema();

        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"].as_object().unwrap().len(), 9);
        assert_eq!(schema["properties"]["emails"]["items"]["type"], "STRING");
        assert_eq!(schema["properties"]["confidenceScore"]["type"], "NUMBER");
        assert_eq!(schema["required"], json!(["fullName", "confidenceScore"]));
    }
}
