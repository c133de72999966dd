//! DOCX to PDF conversion through a headless office suite

use crate::config::ConverterConfig;
use crate::error::{OfferError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Converts a DOCX file into a PDF placed in `out_dir`
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Returns the path of the written PDF
    async fn convert(&self, docx: &Path, out_dir: &Path) -> Result<PathBuf>;
}

/// Runs `<binary> --headless --convert-to pdf --outdir <dir> <docx>`
pub struct LibreOfficeConverter {
    binary: String,
    timeout: Option<Duration>,
}

impl LibreOfficeConverter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Where the office suite writes its output for `docx`
    pub fn output_path(docx: &Path, out_dir: &Path) -> Result<PathBuf> {
        let stem = docx
            .file_stem()
            .ok_or_else(|| OfferError::Conversion(format!("{} has no file name", docx.display())))?;
        Ok(out_dir.join(stem).with_extension("pdf"))
    }
}

#[async_trait]
impl PdfConverter for LibreOfficeConverter {
    async fn convert(&self, docx: &Path, out_dir: &Path) -> Result<PathBuf> {
        if !docx.is_file() {
            return Err(OfferError::NotFound(format!("DOCX {}", docx.display())));
        }
        tokio::fs::create_dir_all(out_dir).await?;

        log::info!("Converting {} to PDF with {}", docx.display(), self.binary);

        let mut command = Command::new(&self.binary);
        command
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(docx)
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| {
                    OfferError::Conversion(format!(
                        "{} did not finish within {}s",
                        self.binary,
                        limit.as_secs()
                    ))
                })?,
            None => command.output().await,
        }
        .map_err(|e| OfferError::Conversion(format!("cannot run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OfferError::Conversion(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        let pdf_path = Self::output_path(docx, out_dir)?;
        let data = tokio::fs::read(&pdf_path).await.map_err(|_| {
            OfferError::Conversion(format!("no PDF produced at {}", pdf_path.display()))
        })?;

        if !validate_pdf(&data) {
            return Err(OfferError::Conversion(format!(
                "{} is not a PDF",
                pdf_path.display()
            )));
        }

        log::info!("PDF written to {}", pdf_path.display());
        Ok(pdf_path)
    }
}

/// Check PDF magic bytes
pub fn validate_pdf(pdf_data: &[u8]) -> bool {
    pdf_data.len() >= 4 && pdf_data.starts_with(b"%PDF")
}
