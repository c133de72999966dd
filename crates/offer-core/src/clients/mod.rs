//! Client modules for external tools and services

pub mod converter;
pub mod mailer;

pub use converter::{validate_pdf, LibreOfficeConverter, PdfConverter};
pub use mailer::{OfferEmail, OfferMailer, SmtpMailer};
