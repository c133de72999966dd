//! Shared types for the offer letter pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Candidate record as written by HR tooling (one JSON file per candidate)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CandidateData {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub salary: String,
    /// Date of the interview or test task
    #[serde(default)]
    pub test_date: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    /// Profile id used to pick the company template
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub probation_period: Option<String>,
    #[serde(default)]
    pub probation_salary: Option<String>,
    #[serde(default)]
    pub ongoing_salary: Option<String>,
    /// Any other string fields, kept so templates can grow without code changes
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Subset of candidate data shown on the signature page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferPreview {
    pub name: String,
    pub position: String,
    pub start_date: String,
    pub interview_date: String,
    pub salary: String,
}

impl From<&CandidateData> for OfferPreview {
    fn from(data: &CandidateData) -> Self {
        Self {
            name: data.name.clone(),
            position: data.position.clone(),
            start_date: data.start_date.clone(),
            interview_date: data.test_date.clone().unwrap_or_default(),
            salary: data.salary.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferPreviewResponse {
    pub success: bool,
    pub candidate: OfferPreview,
    pub company_name: String,
    pub probation_months: u32,
}

/// Body of `POST /api/submit-signature`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSignatureRequest {
    /// Candidate file stem, e.g. `Jane_Doe`
    pub candidate: String,
    #[serde(default)]
    pub profile: Option<String>,
    /// PNG as a data URL (`data:image/png;base64,...`) or bare base64
    pub signature: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSignatureResponse {
    pub success: bool,
    pub message: String,
    pub signed_pdf_url: String,
}

/// Body of `POST /api/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub profile: Option<String>,
    pub candidate: CandidateData,
    #[serde(default)]
    pub send_email: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub docx_path: String,
    pub pdf_path: Option<String>,
    pub emailed: bool,
}

/// JSON error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_parses_sample_file() {
        let json = r#"{
            "name": "Mariya Fatima",
            "email": "mariya@example.com",
            "position": "Interior Designer",
            "start_date": "1st December 2025",
            "salary": "13000-15000",
            "test_date": "20th November 2025",
            "notice": "immediate"
        }"#;

        let data: CandidateData = serde_json::from_str(json).unwrap();
        assert_eq!(data.name, "Mariya Fatima");
        assert_eq!(data.test_date.as_deref(), Some("20th November 2025"));
        assert_eq!(data.extra.get("notice").and_then(|v| v.as_str()), Some("immediate"));
    }

    #[test]
    fn test_preview_maps_test_date_to_interview_date() {
        let data = CandidateData {
            name: "Jane Doe".to_string(),
            test_date: Some("3 March".to_string()),
            ..Default::default()
        };

        let preview = OfferPreview::from(&data);
        assert_eq!(preview.interview_date, "3 March");
        assert_eq!(preview.name, "Jane Doe");
    }

    #[test]
    fn test_error_response_is_unsuccessful() {
        let body = serde_json::to_value(ErrorResponse::new("PDF not found")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "PDF not found");
    }
}
