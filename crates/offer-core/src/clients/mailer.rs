//! Offer letter delivery over SMTP

use crate::config::{CompanyProfile, SmtpConfig};
use crate::error::{OfferError, Result};
use crate::paths::candidate_stem;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use offer_types::CandidateData;

const APP_PASSWORD_HINT: &str =
    "use an app password, not the account password (https://myaccount.google.com/apppasswords)";

/// A composed offer email, independent of the transport
#[derive(Debug, Clone)]
pub struct OfferEmail {
    pub from: String,
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

impl OfferEmail {
    pub fn compose(
        candidate: &CandidateData,
        profile: &CompanyProfile,
        portal_url: Option<&str>,
        pdf: Vec<u8>,
    ) -> Result<Self> {
        if !candidate.email.contains('@') {
            return Err(OfferError::CandidateData(format!(
                "candidate '{}' has no valid email address",
                candidate.name
            )));
        }

        Ok(Self {
            from: profile.email.clone(),
            to: candidate.email.clone(),
            to_name: candidate.name.clone(),
            subject: subject(candidate, profile),
            body: body(candidate, profile, portal_url),
            attachment_name: attachment_name(&candidate.name),
            attachment: pdf,
        })
    }

    /// MIME message: plain-text body plus the PDF attachment
    pub fn to_message(&self) -> Result<Message> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| OfferError::Email(format!("invalid sender '{}': {}", self.from, e)))?;
        let to = Mailbox::new(
            Some(self.to_name.clone()),
            self.to
                .parse()
                .map_err(|e| OfferError::Email(format!("invalid recipient '{}': {}", self.to, e)))?,
        );
        let pdf_type = ContentType::parse("application/pdf")
            .map_err(|e| OfferError::Email(e.to_string()))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject.as_str())
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(self.body.clone()))
                    .singlepart(
                        Attachment::new(self.attachment_name.clone())
                            .body(self.attachment.clone(), pdf_type),
                    ),
            )
            .map_err(|e| OfferError::Email(format!("cannot build message: {}", e)))
    }
}

pub fn subject(candidate: &CandidateData, profile: &CompanyProfile) -> String {
    format!(
        "Offer Letter - {} Position at {}",
        candidate.position, profile.company_name
    )
}

pub fn attachment_name(candidate_name: &str) -> String {
    format!("Offer_Letter_{}.pdf", candidate_stem(candidate_name))
}

pub fn body(candidate: &CandidateData, profile: &CompanyProfile, portal_url: Option<&str>) -> String {
    let steps = match portal_url {
        Some(url) => format!(
            "1. Review the attached offer letter\n\
             2. Visit the signature portal: {}\n\
             3. Sign digitally and submit",
            url
        ),
        None => "1. Review the attached offer letter\n\
                 2. Print, sign and scan the last page\n\
                 3. Reply to this email with the signed copy"
            .to_string(),
    };

    format!(
        "Dear {name},\n\n\
         Congratulations!\n\n\
         We are delighted to extend an offer for the position of {position} at {company}.\n\n\
         Please find your offer letter attached to this email. Kindly review the terms and conditions carefully.\n\n\
         To accept this offer, please:\n{steps}\n\n\
         If you have any questions or need clarification, please don't hesitate to reach out.\n\n\
         We look forward to welcoming you to our team!\n\n\
         {signature}\n",
        name = candidate.name,
        position = candidate.position,
        company = profile.company_name,
        steps = steps,
        signature = profile.email_signature,
    )
}

/// Sends a composed offer email with the profile's credentials
#[async_trait]
pub trait OfferMailer: Send + Sync {
    async fn send(&self, profile: &CompanyProfile, email: &OfferEmail) -> Result<()>;
}

pub struct SmtpMailer {
    host: String,
    port: u16,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

#[async_trait]
impl OfferMailer for SmtpMailer {
    async fn send(&self, profile: &CompanyProfile, email: &OfferEmail) -> Result<()> {
        if !profile.email_configured() {
            return Err(OfferError::EmailNotConfigured(profile.company_name.clone()));
        }

        let message = email.to_message()?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|e| OfferError::Email(format!("cannot reach {}: {}", self.host, e)))?
            .port(self.port)
            .credentials(Credentials::new(
                profile.email.clone(),
                profile.app_password.clone(),
            ))
            .build();

        log::info!(
            "Sending offer to {} <{}> via {}:{}",
            email.to_name,
            email.to,
            self.host,
            self.port
        );

        transport.send(message).await.map_err(|e| {
            let auth_failed = e
                .status()
                .map(|code| code.to_string().starts_with("535"))
                .unwrap_or(false);
            if auth_failed {
                OfferError::Email(format!(
                    "authentication failed for {}; {}",
                    profile.email, APP_PASSWORD_HINT
                ))
            } else {
                OfferError::Email(e.to_string())
            }
        })?;

        log::info!("Email sent to {} ({})", email.to_name, email.to);
        Ok(())
    }
}
