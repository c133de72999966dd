//! Configuration management: company profiles and global settings

use crate::error::{OfferError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Placeholder password shipped in fresh profile files
pub const UNCONFIGURED_PASSWORD: &str = "TO_BE_CONFIGURED";

/// Name of the profile file inside each profile directory
pub const PROFILE_FILE_NAME: &str = "config.json";

/// One company's template, offer rules and mail identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_name: String,

    #[serde(alias = "template")]
    pub template_docx: String,

    #[serde(default = "default_offer_validity_days")]
    pub offer_validity_days: u32,

    #[serde(default = "default_probation_months")]
    pub probation_months: u32,

    #[serde(default)]
    pub email: String,

    #[serde(default = "default_app_password")]
    pub app_password: String,

    #[serde(default = "default_email_signature")]
    pub email_signature: String,

    #[serde(rename = "schedule_1_config", alias = "schedule", default)]
    pub schedule: Option<ScheduleConfig>,

    /// Additional literal token -> value pairs for company-specific templates
    #[serde(default)]
    pub extra_placeholders: BTreeMap<String, String>,

    /// Directory the profile was loaded from; used to resolve a relative template path
    #[serde(skip)]
    pub profile_dir: Option<PathBuf>,
}

/// Compensation schedule table settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
    /// Zero-based index of the schedule among the document's top-level tables
    #[serde(default = "default_schedule_table_index")]
    pub table_index: usize,

    /// For salary ranges take the lower bound instead of the midpoint
    #[serde(default = "default_true")]
    pub use_lower_bound: bool,

    #[serde(default = "default_true")]
    pub all_same_value: bool,

    /// Row labels (first column) whose amount column gets filled
    #[serde(default = "default_fill_rows")]
    pub fill_rows: Vec<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            table_index: default_schedule_table_index(),
            use_lower_bound: true,
            all_same_value: true,
            fill_rows: default_fill_rows(),
        }
    }
}

fn default_offer_validity_days() -> u32 {
    2
}

fn default_probation_months() -> u32 {
    3
}

fn default_app_password() -> String {
    UNCONFIGURED_PASSWORD.to_string()
}

fn default_email_signature() -> String {
    "Best regards,\nHR Team".to_string()
}

fn default_schedule_table_index() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_fill_rows() -> Vec<String> {
    vec![
        "Basic".to_string(),
        "Gross Compensation".to_string(),
        "Fixed Compensation".to_string(),
        "Cost to Company Compensation".to_string(),
    ]
}

impl CompanyProfile {
    /// Load `<profiles_dir>/<name>/config.json`
    pub fn load<P: AsRef<Path>>(profiles_dir: P, name: &str) -> Result<Self> {
        let profiles_dir = profiles_dir.as_ref();
        let profile_dir = profiles_dir.join(name);
        let profile_path = profile_dir.join(PROFILE_FILE_NAME);

        if !profile_path.is_file() {
            return Err(OfferError::ProfileNotFound {
                name: name.to_string(),
                available: list_profiles(profiles_dir).join(", "),
            });
        }

        let mut profile = Self::from_file(&profile_path)?;
        profile.profile_dir = Some(profile_dir);
        log::debug!("Loaded profile '{}' for {}", name, profile.company_name);
        Ok(profile)
    }

    /// Load a profile from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            OfferError::Config(format!(
                "Failed to read profile {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json_str(&content)
    }

    /// Load a profile from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(json)
            .map_err(|e| OfferError::Config(format!("Failed to parse profile: {}", e)))?;

        profile.validate()?;
        Ok(profile)
    }

    /// Validate required fields
    pub fn validate(&self) -> Result<()> {
        if self.company_name.trim().is_empty() {
            return Err(OfferError::Config("company_name is required".to_string()));
        }

        if self.template_docx.trim().is_empty() {
            return Err(OfferError::Config("template_docx is required".to_string()));
        }

        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(OfferError::Config(format!(
                "email '{}' is not a valid address",
                self.email
            )));
        }

        if let Some(schedule) = &self.schedule {
            if schedule.fill_rows.is_empty() {
                return Err(OfferError::Config(
                    "schedule_1_config.fill_rows must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Whether the profile carries usable mail credentials
    pub fn email_configured(&self) -> bool {
        !self.email.is_empty()
            && !self.app_password.is_empty()
            && self.app_password != UNCONFIGURED_PASSWORD
    }

    /// Template location: absolute paths as-is, relative paths tried against the
    /// working directory first and the profile directory second.
    pub fn template_path(&self) -> PathBuf {
        let template = PathBuf::from(&self.template_docx);
        if template.is_absolute() || template.exists() {
            return template;
        }

        match &self.profile_dir {
            Some(dir) if dir.join(&template).exists() => dir.join(&template),
            _ => template,
        }
    }
}

/// Names of all directories under `profiles_dir` that contain a profile file
pub fn list_profiles<P: AsRef<Path>>(profiles_dir: P) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(profiles_dir.as_ref())
        .into_iter()
        .flatten()
        .flatten()
        .filter(|entry| entry.path().join(PROFILE_FILE_NAME).is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

/// Global settings shared by the CLI and the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferSettings {
    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_candidates_dir")]
    pub candidates_dir: PathBuf,

    #[serde(default = "default_web_dir")]
    pub web_dir: PathBuf,

    #[serde(default)]
    pub smtp: SmtpConfig,

    #[serde(default)]
    pub converter: ConverterConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    #[serde(default = "default_converter_binary")]
    pub binary: String,

    /// Unset waits for the converter indefinitely
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,

    #[serde(default = "default_profile_name")]
    pub default_profile: String,

    /// Public URL of the signature page, linked from offer emails
    #[serde(default)]
    pub portal_url: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            binary: default_converter_binary(),
            timeout_secs: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            default_profile: default_profile_name(),
            portal_url: None,
        }
    }
}

impl Default for OfferSettings {
    fn default() -> Self {
        Self {
            profiles_dir: default_profiles_dir(),
            output_dir: default_output_dir(),
            candidates_dir: default_candidates_dir(),
            web_dir: default_web_dir(),
            smtp: SmtpConfig::default(),
            converter: ConverterConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

fn default_profiles_dir() -> PathBuf {
    PathBuf::from("profiles")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_candidates_dir() -> PathBuf {
    PathBuf::from("candidates")
}

fn default_web_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_converter_binary() -> String {
    "soffice".to_string()
}

fn default_server_port() -> u16 {
    5000
}

fn default_profile_name() -> String {
    "melange".to_string()
}

/// Environment prefix for overrides, e.g. `OFFER__SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "OFFER";

impl OfferSettings {
    /// Load settings from an optional TOML/JSON file layered with `OFFER__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(OfferError::Config(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        let settings: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| OfferError::Config(format!("Failed to load settings: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.converter.binary.trim().is_empty() {
            return Err(OfferError::Config("converter.binary is required".to_string()));
        }

        if self.smtp.host.trim().is_empty() {
            return Err(OfferError::Config("smtp.host is required".to_string()));
        }

        if self.server.default_profile.trim().is_empty() {
            return Err(OfferError::Config(
                "server.default_profile is required".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = OfferSettings::default();
        assert_eq!(settings.smtp.host, "smtp.gmail.com");
        assert_eq!(settings.smtp.port, 587);
        assert_eq!(settings.converter.binary, "soffice");
        assert_eq!(settings.converter.timeout_secs, None);
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.server.default_profile, "melange");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_email_configured() {
        let mut profile = CompanyProfile::from_json_str(
            r#"{"company_name": "Deco Arte", "template_docx": "t.docx", "email": "hr@decoarte.in"}"#,
        )
        .unwrap();
        assert!(!profile.email_configured(), "default password is the placeholder");

        profile.app_password = "abcd efgh".to_string();
        assert!(profile.email_configured());
    }

    #[test]
    fn test_template_path_absolute_is_kept() {
        let profile = CompanyProfile {
            company_name: "X".to_string(),
            template_docx: "/srv/templates/offer.docx".to_string(),
            offer_validity_days: 2,
            probation_months: 3,
            email: String::new(),
            app_password: String::new(),
            email_signature: String::new(),
            schedule: None,
            extra_placeholders: BTreeMap::new(),
            profile_dir: Some(PathBuf::from("/elsewhere")),
        };
        assert_eq!(profile.template_path(), PathBuf::from("/srv/templates/offer.docx"));
    }

    #[test]
    fn test_schedule_defaults() {
        let schedule = ScheduleConfig::default();
        assert_eq!(schedule.table_index, 1);
        assert!(schedule.use_lower_bound);
        assert_eq!(schedule.fill_rows.len(), 4);
    }
}
