use extract::{ConfidenceTier, ExtractionRecord};
use serde::Serialize;

const NOT_FOUND: &str = "Not found";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRow {
    pub label: String,
    pub value: Option<String>,
    pub display: String,
    pub copyable: bool,
    pub primary: bool,
}

impl CardRow {
    fn new(label: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            label: label.into(),
            value: value.map(str::to_string),
            display: value.unwrap_or(NOT_FOUND).to_string(),
            copyable: false,
            primary: false,
        }
    }

    fn copyable(mut self) -> Self {
        self.copyable = self.value.is_some();
        self
    }

    fn primary(mut self) -> Self {
        self.primary = self.value.is_some();
        self
    }
}

/// Render-ready view of one extraction record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileCard {
    pub headline: String,
    pub subtitle: Option<String>,
    pub accuracy: String,
    pub confidence: ConfidenceTier,
    pub public_profile: Option<String>,
    pub summary: Option<String>,
    pub identity: Vec<CardRow>,
    pub emails: Vec<CardRow>,
    pub other_contacts: Vec<CardRow>,
}

impl ProfileCard {
    pub fn from_record(record: &ExtractionRecord) -> Self {
        let subtitle = match (record.job_title.as_deref(), record.company.as_deref()) {
            (Some(title), Some(company)) => Some(format!("{title} at {company}")),
            (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
            (None, None) => None,
        };

        let direct_line = format!("{}'s Direct Number", record.first_name().unwrap_or("Person"));

        let identity = vec![
            CardRow::new("Full Name", record.full_name.as_deref()).copyable(),
            CardRow::new(direct_line, record.primary_phone()).copyable().primary(),
            CardRow::new("Current Role", record.job_title.as_deref()),
            CardRow::new("Organization", record.company.as_deref()),
            CardRow::new("Geography", record.location.as_deref()),
        ];

        Self {
            headline: record.full_name.clone().unwrap_or_else(|| "Unknown".to_string()),
            subtitle,
            accuracy: format!("{}% Accuracy", record.accuracy_percent()),
            confidence: record.confidence_tier(),
            public_profile: record.linkedin_url.clone(),
            summary: record.summary.clone(),
            identity,
            emails: email_rows(&record.emails),
            other_contacts: record
                .secondary_phones()
                .iter()
                .enumerate()
                .map(|(i, phone)| {
                    CardRow::new(format!("Alternative Number {}", i + 1), Some(phone.as_str())).copyable()
                })
                .collect(),
        }
    }
}

fn email_rows(emails: &[String]) -> Vec<CardRow> {
    match emails {
        [] => vec![CardRow::new("Email Address", None)],
        [only] => vec![CardRow::new("Email Address", Some(only.as_str())).copyable().primary()],
        many => many
            .iter()
            .enumerate()
            .map(|(i, email)| {
                let row = CardRow::new(format!("Email Address {}", i + 1), Some(email.as_str())).copyable();
                if i == 0 { row.primary() } else { row }
            })
            .collect(),
    }
}
