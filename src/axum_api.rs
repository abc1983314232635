use crate::email::TemplateKey;
use crate::errors::GateError;
use crate::service::OtpService;
use crate::validation::{require, validate_email};
use axum::{
    extract::{Json, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub otp_service: Arc<OtpService>,
}

#[derive(Deserialize)]
pub struct RequestOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub template: Option<TemplateKey>,
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

impl GateError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GateError::CooldownActive { .. }
            | GateError::RequestThrottled { .. }
            | GateError::AccountLocked { .. } => StatusCode::TOO_MANY_REQUESTS,
            GateError::OtpExpiredOrMissing
            | GateError::InvalidOtp { .. }
            | GateError::Validation(_) => StatusCode::BAD_REQUEST,
            GateError::RedisError(_) | GateError::StorageError(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GateError::EmailError(_) | GateError::DeliveryFailed | GateError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_client_error() {
            self.to_string()
        } else {
            tracing::error!("OTP gate failure: {}", self);
            match self {
                GateError::DeliveryFailed | GateError::EmailError(_) => {
                    "Failed to send email".to_string()
                }
                _ => "Internal server error".to_string(),
            }
        };

        let body = Json(serde_json::json!({ "error": message }));
        let mut response = (status, body).into_response();
        if let Some(secs) = self.retry_after_secs() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

pub async fn request_otp(
    State(state): State<AppState>,
    Json(payload): Json<RequestOtpRequest>,
) -> Result<Json<serde_json::Value>, GateError> {
    validate_email(&payload.email)?;
    require("name", &payload.name)?;

    let template = payload.template.unwrap_or(TemplateKey::UserActivation);
    state
        .otp_service
        .request_otp(&payload.email, &payload.name, template)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "OTP sent to email. Please verify your account."
    })))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<serde_json::Value>, GateError> {
    validate_email(&payload.email)?;
    require("otp", &payload.otp)?;

    state
        .otp_service
        .verify_otp(&payload.email, &payload.otp)
        .await?;

    Ok(Json(serde_json::json!({ "message": "OTP verified" })))
}

pub fn otp_router(otp_service: Arc<OtpService>) -> Router {
    let state = AppState { otp_service };
    Router::new()
        .route("/request-otp", post(request_otp))
        .route("/verify-otp", post(verify_otp))
        .with_state(state)
}
