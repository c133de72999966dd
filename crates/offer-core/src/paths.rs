/// Output path layout for generated offer letters
///
/// Everything lives under `<output_dir>/<profile>/` and is keyed by the
/// candidate's file stem (name with spaces replaced by underscores).
use crate::error::{OfferError, Result};
use std::path::{Path, PathBuf};

pub const OFFER_PREFIX: &str = "offer_letter_";
pub const SIGNATURE_PREFIX: &str = "signature_";
pub const SIGNED_SUFFIX: &str = "_signed";
pub const SAMPLE_CANDIDATE_FILE: &str = "sample_candidate.json";

/// Replace spaces with underscores
pub fn candidate_stem(name: &str) -> String {
    name.replace(' ', "_")
}

/// Reject path components that could escape the output tree
pub fn validate_component(kind: &str, value: &str) -> Result<()> {
    if value.is_empty()
        || value == "."
        || value.contains("..")
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0')
    {
        return Err(OfferError::Validation(format!("invalid {}: '{}'", kind, value)));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    root: PathBuf,
}

impl OutputPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn profile_dir(&self, profile: &str) -> PathBuf {
        self.root.join(profile)
    }

    pub fn offer_docx(&self, profile: &str, stem: &str) -> PathBuf {
        self.profile_dir(profile)
            .join(format!("{}{}.docx", OFFER_PREFIX, stem))
    }

    pub fn offer_pdf(&self, profile: &str, stem: &str) -> PathBuf {
        self.offer_docx(profile, stem).with_extension("pdf")
    }

    pub fn signed_docx(&self, profile: &str, stem: &str) -> PathBuf {
        self.profile_dir(profile)
            .join(format!("{}{}{}.docx", OFFER_PREFIX, stem, SIGNED_SUFFIX))
    }

    pub fn signed_pdf(&self, profile: &str, stem: &str) -> PathBuf {
        self.signed_docx(profile, stem).with_extension("pdf")
    }

    pub fn signature_image(&self, profile: &str, stem: &str) -> PathBuf {
        self.profile_dir(profile)
            .join(format!("{}{}.png", SIGNATURE_PREFIX, stem))
    }

    /// Letters generated before profiles existed sit directly in the root
    pub fn legacy_offer_docx(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{}{}.docx", OFFER_PREFIX, stem))
    }

    pub fn legacy_offer_pdf(&self, stem: &str) -> PathBuf {
        self.legacy_offer_docx(stem).with_extension("pdf")
    }

    /// Profile location first, legacy root location second
    pub fn find_offer_docx(&self, profile: &str, stem: &str) -> Option<PathBuf> {
        first_existing([self.offer_docx(profile, stem), self.legacy_offer_docx(stem)])
    }

    pub fn find_offer_pdf(&self, profile: &str, stem: &str) -> Option<PathBuf> {
        first_existing([self.offer_pdf(profile, stem), self.legacy_offer_pdf(stem)])
    }
}

/// Candidate JSON for the preview page: `<stem lowercase>.json`, else the sample file
pub fn candidate_data_file(candidates_dir: &Path, stem: &str) -> PathBuf {
    let specific = candidates_dir.join(format!("{}.json", stem.to_lowercase()));
    if specific.is_file() {
        specific
    } else {
        candidates_dir.join(SAMPLE_CANDIDATE_FILE)
    }
}

fn first_existing<const N: usize>(candidates: [PathBuf; N]) -> Option<PathBuf> {
    candidates.into_iter().find(|p| p.is_file())
}
