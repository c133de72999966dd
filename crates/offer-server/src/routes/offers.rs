//! Offer preview, generation and signature endpoints

use crate::errors::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use offer_core::docx::DOCX_MIME_TYPE;
use offer_core::paths::{candidate_stem, validate_component};
use offer_core::GenerateOptions;
use offer_types::{
    CandidateData, GenerateRequest, GenerateResponse, OfferPreviewResponse,
    SubmitSignatureRequest, SubmitSignatureResponse,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    pub profile: Option<String>,
}

/// Decode a PNG sent as a data URL or bare base64
pub fn decode_signature(signature: &str) -> ApiResult<Vec<u8>> {
    let encoded = match signature.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ApiError::BadRequest("malformed signature data URL".to_string()))?,
        None => signature,
    };

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiError::BadRequest(format!("signature is not valid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("signature is empty".to_string()));
    }
    Ok(bytes)
}

fn file_response(data: Vec<u8>, content_type: &str, attachment: Option<&str>) -> Response {
    match attachment {
        Some(name) => (
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", name),
                ),
            ],
            data,
        )
            .into_response(),
        None => ([(header::CONTENT_TYPE, content_type.to_string())], data).into_response(),
    }
}

/// GET /api/offer-preview/:candidate
pub async fn offer_preview(
    State(state): State<AppState>,
    Path(candidate): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> ApiResult<Json<OfferPreviewResponse>> {
    let profile = state.profile_or_default(query.profile.as_deref());
    Ok(Json(state.pipeline.preview(&profile, &candidate)?))
}

/// GET /api/offer-pdf/:candidate
pub async fn offer_pdf(
    State(state): State<AppState>,
    Path(candidate): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> ApiResult<Response> {
    let profile = state.profile_or_default(query.profile.as_deref());
    validate_component("profile", &profile)?;
    validate_component("candidate", &candidate)?;

    let pdf = state
        .pipeline
        .paths()
        .find_offer_pdf(&profile, &candidate)
        .ok_or_else(|| ApiError::NotFound("PDF not found".to_string()))?;

    let data = tokio::fs::read(&pdf).await.map_err(offer_core::OfferError::from)?;
    Ok(file_response(data, "application/pdf", None))
}

/// POST /api/submit-signature
pub async fn submit_signature(
    State(state): State<AppState>,
    Json(request): Json<SubmitSignatureRequest>,
) -> ApiResult<Json<SubmitSignatureResponse>> {
    let profile = state.profile_or_default(request.profile.as_deref());
    let png = decode_signature(&request.signature)?;

    let signed = state
        .pipeline
        .sign(&profile, &request.candidate, &png, request.date.as_deref())
        .await?;
    log::info!(
        "Signature received for {} ({})",
        request.candidate,
        signed.signed_pdf.display()
    );

    Ok(Json(SubmitSignatureResponse {
        success: true,
        message: "Signature submitted successfully".to_string(),
        signed_pdf_url: format!(
            "/api/signed-pdf/{}?profile={}",
            request.candidate, profile
        ),
    }))
}

/// GET /api/signed-pdf/:candidate
pub async fn signed_pdf(
    State(state): State<AppState>,
    Path(candidate): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> ApiResult<Response> {
    let profile = state.profile_or_default(query.profile.as_deref());
    validate_component("profile", &profile)?;
    validate_component("candidate", &candidate)?;

    let path = state.pipeline.paths().signed_pdf(&profile, &candidate);
    if !path.is_file() {
        return Err(ApiError::NotFound("Signed PDF not found".to_string()));
    }

    let data = tokio::fs::read(&path).await.map_err(offer_core::OfferError::from)?;
    let name = format!("offer_letter_{}_signed.pdf", candidate);
    Ok(file_response(data, "application/pdf", Some(&name)))
}

/// POST /api/generate
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let profile = state.profile_or_default(
        request
            .profile
            .as_deref()
            .or(request.candidate.template.as_deref()),
    );

    let options = GenerateOptions {
        convert_pdf: true,
        send_email: request.send_email,
    };
    let generated = state
        .pipeline
        .generate(&profile, &request.candidate, options)
        .await?;

    Ok(Json(GenerateResponse {
        success: true,
        docx_path: generated.docx_path.display().to_string(),
        pdf_path: generated.pdf_path.map(|p| p.display().to_string()),
        emailed: generated.emailed,
    }))
}

/// POST /api/generate-docx
pub async fn generate_docx(
    State(state): State<AppState>,
    Json(candidate): Json<CandidateData>,
) -> ApiResult<Response> {
    let profile = state.profile_or_default(candidate.template.as_deref());
    let data = state.pipeline.render_docx(&profile, &candidate).await?;

    let name = format!("offer_letter_{}.docx", candidate_stem(&candidate.name));
    Ok(file_response(data, DOCX_MIME_TYPE, Some(&name)))
}
