//! Offer Core Library
//!
//! Business logic for offer letter automation: company profiles, DOCX
//! template filling, signature stamping, PDF conversion and email delivery.

pub mod clients;
pub mod config;
pub mod docx;
pub mod error;
pub mod paths;
pub mod services;

// Re-export main types for easy access
pub use config::{CompanyProfile, OfferSettings, ScheduleConfig};
pub use error::{OfferError, Result};

pub use clients::{LibreOfficeConverter, OfferEmail, OfferMailer, PdfConverter, SmtpMailer};

pub use services::{
    fill_offer_letter, stamp_signature, GenerateOptions, GeneratedOffer, OfferPipeline,
    PlaceholderMap, SignedOffer,
};

pub use offer_types::CandidateData;
