use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::error::ExtractionError;
use crate::record::ExtractionRecord;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("code fence pattern is valid")
});

/// Loose mirror of the response schema: every field optional, nulls allowed
/// inside the arrays.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    full_name: Option<String>,
    emails: Option<Vec<Option<String>>>,
    phone_numbers: Option<Vec<Option<String>>>,
    job_title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    linkedin_url: Option<String>,
    summary: Option<String>,
    confidence_score: Option<f64>,
}

/// Parse backend response text into a normalized record.
///
/// Missing text is read as an empty object, so every field comes back absent
/// and the confidence is 0.
pub fn parse_record(text: Option<&str>) -> Result<ExtractionRecord, ExtractionError> {
    let body = text.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("{}");
    let body = strip_code_fence(body);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::Parse(format!("response is not valid JSON: {e}")))?;

    if !value.is_object() {
        return Err(ExtractionError::Parse(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    let raw: RawRecord = serde_json::from_value(value)
        .map_err(|e| ExtractionError::Parse(format!("response does not match schema: {e}")))?;

    Ok(normalize(raw))
}

fn normalize(raw: RawRecord) -> ExtractionRecord {
    ExtractionRecord {
        full_name: clean_text(raw.full_name),
        emails: dedupe(raw.emails, |e| e.to_lowercase()),
        phone_numbers: dedupe(raw.phone_numbers, phone_key),
        job_title: clean_text(raw.job_title),
        company: clean_text(raw.company),
        location: clean_text(raw.location),
        linkedin_url: clean_text(raw.linkedin_url),
        summary: clean_text(raw.summary),
        confidence_score: clamp_confidence(raw.confidence_score),
    }
}

/// Trim, collapse internal whitespace, and treat blank as absent.
fn clean_text(value: Option<String>) -> Option<String> {
    let value = value?;
    let collapsed = WHITESPACE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

/// Drop blanks and repeated entries, keeping first-seen order.
fn dedupe<F>(values: Option<Vec<Option<String>>>, key: F) -> Vec<String>
where
    F: Fn(&str) -> String,
{
    let mut seen = HashSet::new();

    values
        .unwrap_or_default()
        .into_iter()
        .filter_map(clean_text)
        .filter(|v| {
            let k = key(v.as_str());
            // Entries with no comparable characters are kept as-is
            k.is_empty() || seen.insert(k)
        })
        .collect()
}

/// Formatting separators are ignored; letters in vanity numbers still count.
fn phone_key(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '(' | ')' | '/'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn clamp_confidence(score: Option<f64>) -> f64 {
    match score {
        Some(s) if s.is_finite() => {
            let clamped = s.clamp(0.0, 1.0);
            if clamped != s {
                tracing::debug!(reported = s, clamped, "Confidence score out of range");
            }
            clamped
        }
        _ => 0.0,
    }
}

fn strip_code_fence(body: &str) -> &str {
    CODE_FENCE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(body)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
