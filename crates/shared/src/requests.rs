use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::models::{ConsultationStatus, UserRole};

pub const MIN_PASSWORD_LEN: usize = 6;

/// A request body field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Shape rules checked before a request reaches a service
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

fn require_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ValidationError::new(field, "must be an http(s) URL")),
    }
}

fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None)
            if !local.is_empty() && !domain.is_empty() && !value.contains(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(ValidationError::new(field, "must be an email address")),
    }
}

fn optional<T: ?Sized>(
    value: Option<&T>,
    check: impl FnOnce(&T) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), check)
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_email("email", &self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        require_text("firstName", &self.first_name)?;
        require_text("lastName", &self.last_name)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("email", &self.email)?;
        require_text("password", &self.password)
    }
}

// ============================================================================
// Consultations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsultationRequest {
    pub doctor_id: String,
    pub title: String,
    pub description: String,
}

impl Validate for CreateConsultationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Uuid::parse_str(&self.doctor_id)
            .map_err(|_| ValidationError::new("doctorId", "must be a UUID"))?;
        require_text("title", &self.title)?;
        require_text("description", &self.description)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub message: String,
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
}

impl Validate for CreateMessageRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("message", &self.message)?;
        for attachment in self.attachments.iter().flatten() {
            require_text("attachments", attachment)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ConsultationStatus,
}

impl Validate for UpdateStatusRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

// ============================================================================
// Before/after results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResultRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub before_image: String,
    pub after_image: String,
    pub procedure: String,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl Validate for CreateResultRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_url("beforeImage", &self.before_image)?;
        require_url("afterImage", &self.after_image)?;
        require_text("procedure", &self.procedure)
    }
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResultRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub before_image: Option<String>,
    #[serde(default)]
    pub after_image: Option<String>,
    #[serde(default)]
    pub procedure: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl Validate for UpdateResultRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        optional(self.title.as_deref(), |v| require_text("title", v))?;
        optional(self.before_image.as_deref(), |v| require_url("beforeImage", v))?;
        optional(self.after_image.as_deref(), |v| require_url("afterImage", v))?;
        optional(self.procedure.as_deref(), |v| require_text("procedure", v))
    }
}
