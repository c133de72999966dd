//! Service modules for offer letter business logic

pub mod offer_letter;
pub mod pipeline;
pub mod placeholder;
pub mod signature;

pub use offer_letter::{fill_document, fill_offer_letter};
pub use pipeline::{load_candidate, GenerateOptions, GeneratedOffer, OfferPipeline, SignedOffer};
pub use placeholder::{substitute_document, substitute_paragraph, PlaceholderMap};
pub use signature::stamp_signature;
