//! End-to-end offer handling: fill, convert, email, sign

use crate::clients::{LibreOfficeConverter, OfferEmail, OfferMailer, PdfConverter, SmtpMailer};
use crate::config::{CompanyProfile, OfferSettings};
use crate::docx::DocxPackage;
use crate::error::{OfferError, Result};
use crate::paths::{candidate_data_file, candidate_stem, validate_component, OutputPaths};
use crate::services::offer_letter::fill_offer_letter;
use crate::services::signature::{png_dimensions, stamp_signature};
use offer_types::{CandidateData, OfferPreview, OfferPreviewResponse};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What `generate` should do after the DOCX is written
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    pub convert_pdf: bool,
    pub send_email: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            convert_pdf: true,
            send_email: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedOffer {
    pub docx_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
    pub emailed: bool,
}

#[derive(Debug, Clone)]
pub struct SignedOffer {
    pub signature_path: PathBuf,
    pub signed_docx: PathBuf,
    pub signed_pdf: PathBuf,
}

pub struct OfferPipeline {
    settings: OfferSettings,
    paths: OutputPaths,
    converter: Arc<dyn PdfConverter>,
    mailer: Arc<dyn OfferMailer>,
}

impl OfferPipeline {
    pub fn new(
        settings: OfferSettings,
        converter: Arc<dyn PdfConverter>,
        mailer: Arc<dyn OfferMailer>,
    ) -> Self {
        let paths = OutputPaths::new(&settings.output_dir);
        Self {
            settings,
            paths,
            converter,
            mailer,
        }
    }

    /// Pipeline backed by the office suite and SMTP relay named in `settings`
    pub fn from_settings(settings: OfferSettings) -> Self {
        let converter = Arc::new(LibreOfficeConverter::new(&settings.converter));
        let mailer = Arc::new(SmtpMailer::new(&settings.smtp));
        Self::new(settings, converter, mailer)
    }

    pub fn settings(&self) -> &OfferSettings {
        &self.settings
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    pub fn load_profile(&self, name: &str) -> Result<CompanyProfile> {
        validate_component("profile", name)?;
        CompanyProfile::load(&self.settings.profiles_dir, name)
    }

    /// Fill the profile's template for `candidate` and return the DOCX bytes
    pub async fn render_docx(&self, profile_name: &str, candidate: &CandidateData) -> Result<Vec<u8>> {
        let profile = self.load_profile(profile_name)?;
        let candidate = candidate.clone();
        blocking(move || fill_offer_letter(&profile.template_path(), &candidate, &profile)?.to_bytes()).await
    }

    pub async fn generate(
        &self,
        profile_name: &str,
        candidate: &CandidateData,
        options: GenerateOptions,
    ) -> Result<GeneratedOffer> {
        let profile = self.load_profile(profile_name)?;
        let stem = candidate_stem(&candidate.name);
        validate_component("candidate", &stem)?;

        log::info!(
            "Generating offer for {} ({}) with profile '{}'",
            candidate.name,
            candidate.position,
            profile_name
        );

        let docx_path = self.paths.offer_docx(profile_name, &stem);
        {
            let (profile, candidate, path) = (profile.clone(), candidate.clone(), docx_path.clone());
            blocking(move || fill_offer_letter(&profile.template_path(), &candidate, &profile)?.save(&path))
                .await?;
        }
        log::info!("Offer letter written to {}", docx_path.display());

        let pdf_path = if options.convert_pdf {
            Some(
                self.converter
                    .convert(&docx_path, &self.paths.profile_dir(profile_name))
                    .await?,
            )
        } else {
            None
        };

        let emailed = match (&pdf_path, options.send_email) {
            (Some(pdf), true) => {
                self.deliver(&profile, candidate, pdf).await?;
                true
            }
            (None, true) => {
                log::warn!("Email skipped: no PDF was produced");
                false
            }
            _ => false,
        };

        Ok(GeneratedOffer {
            docx_path,
            pdf_path,
            emailed,
        })
    }

    /// Email a previously generated PDF
    pub async fn send_offer(&self, profile_name: &str, candidate: &CandidateData) -> Result<PathBuf> {
        let profile = self.load_profile(profile_name)?;
        let stem = candidate_stem(&candidate.name);

        let pdf = self
            .paths
            .find_offer_pdf(profile_name, &stem)
            .ok_or_else(|| {
                OfferError::NotFound(format!(
                    "PDF {}; run `generate {} <candidate.json>` first",
                    self.paths.offer_pdf(profile_name, &stem).display(),
                    profile_name
                ))
            })?;

        self.deliver(&profile, candidate, &pdf).await?;
        Ok(pdf)
    }

    async fn deliver(&self, profile: &CompanyProfile, candidate: &CandidateData, pdf: &Path) -> Result<()> {
        let data = tokio::fs::read(pdf).await?;
        let email = OfferEmail::compose(
            candidate,
            profile,
            self.settings.server.portal_url.as_deref(),
            data,
        )?;
        self.mailer.send(profile, &email).await
    }

    /// Stamp `png` into the candidate's generated letter and convert the result
    pub async fn sign(
        &self,
        profile_name: &str,
        stem: &str,
        png: &[u8],
        date: Option<&str>,
    ) -> Result<SignedOffer> {
        validate_component("profile", profile_name)?;
        validate_component("candidate", stem)?;

        let offer = self
            .paths
            .find_offer_docx(profile_name, stem)
            .ok_or_else(|| OfferError::NotFound(format!("offer letter for {}", stem)))?;

        // An invalid upload must not replace an earlier signature
        png_dimensions(png)?;

        let signature_path = self.paths.signature_image(profile_name, stem);
        if let Some(parent) = signature_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&signature_path, png).await?;

        let date = match date {
            Some(d) if !d.trim().is_empty() => d.to_string(),
            _ => chrono::Local::now().format("%B %d, %Y").to_string(),
        };

        let signed_docx = self.paths.signed_docx(profile_name, stem);
        {
            let (png, path) = (png.to_vec(), signed_docx.clone());
            blocking(move || {
                let mut package = DocxPackage::open(&offer)?;
                stamp_signature(&mut package, &png, &date)?;
                package.save(&path)
            })
            .await?;
        }
        log::info!("Signed letter written to {}", signed_docx.display());

        let signed_pdf = self
            .converter
            .convert(&signed_docx, &self.paths.profile_dir(profile_name))
            .await?;

        Ok(SignedOffer {
            signature_path,
            signed_docx,
            signed_pdf,
        })
    }

    /// Candidate details for the signature page
    pub fn preview(&self, profile_name: &str, stem: &str) -> Result<OfferPreviewResponse> {
        validate_component("candidate", stem)?;
        let profile = self.load_profile(profile_name)?;

        let file = candidate_data_file(&self.settings.candidates_dir, stem);
        let candidate = load_candidate(&file)?;

        Ok(OfferPreviewResponse {
            success: true,
            candidate: OfferPreview::from(&candidate),
            company_name: profile.company_name,
            probation_months: profile.probation_months,
        })
    }
}

/// Run zip and XML work off the async runtime
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Read a candidate JSON file
pub fn load_candidate<P: AsRef<Path>>(path: P) -> Result<CandidateData> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        OfferError::CandidateData(format!("cannot read {}: {}", path.display(), e))
    })?;
    let candidate: CandidateData = serde_json::from_str(&content)
        .map_err(|e| OfferError::CandidateData(format!("{}: {}", path.display(), e)))?;
    Ok(candidate)
}
