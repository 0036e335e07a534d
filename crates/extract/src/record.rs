use serde::{Deserialize, Serialize};

/// Structured contact and career data for one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    pub full_name: Option<String>,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub summary: Option<String>,
    pub confidence_score: f64,
}

impl Default for ExtractionRecord {
    fn default() -> Self {
        Self {
            full_name: None,
            emails: Vec::new(),
            phone_numbers: Vec::new(),
            job_title: None,
            company: None,
            location: None,
            linkedin_url: None,
            summary: None,
            confidence_score: 0.0,
        }
    }
}

/// Coarse bucket for the model's self-reported confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Self::High
        } else if score >= 0.7 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl ExtractionRecord {
    /// First email, if any were found
    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }

    /// First phone number, treated as the direct line
    pub fn primary_phone(&self) -> Option<&str> {
        self.phone_numbers.first().map(String::as_str)
    }

    pub fn secondary_phones(&self) -> &[String] {
        self.phone_numbers.get(1..).unwrap_or(&[])
    }

    pub fn first_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
    }

    pub fn confidence_tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_score(self.confidence_score)
    }

    /// Confidence as a whole percentage, e.g. 0.95 -> 95
    pub fn accuracy_percent(&self) -> u8 {
        (self.confidence_score.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}
