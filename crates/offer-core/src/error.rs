//! Error types for the offer pipeline

use thiserror::Error;

/// Main error type for all offer operations
#[derive(Error, Debug)]
pub enum OfferError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Candidate data error: {0}")]
    CandidateData(String),

    #[error("Malformed document: {0}")]
    Document(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("PDF conversion failed: {0}")]
    Conversion(String),

    #[error("Email delivery failed: {0}")]
    Email(String),

    #[error("Email credentials not configured for {0}")]
    EmailNotConfigured(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for offer operations
pub type Result<T> = std::result::Result<T, OfferError>;
