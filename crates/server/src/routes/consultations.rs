use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{
    ConsultationInfo, CreateConsultationRequest, CreateMessageRequest, DoctorInfo, MessageInfo,
    UpdateStatusRequest,
};

use crate::{
    auth::{AuthUser, ValidJson},
    error::AppError,
    state::AppState,
};

/// POST /consultations
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidJson(req): ValidJson<CreateConsultationRequest>,
) -> Result<(StatusCode, Json<ConsultationInfo>), AppError> {
    let consultation = state.consultations.create_consultation(&caller, req).await?;
    Ok((StatusCode::CREATED, Json(consultation)))
}

/// GET /consultations
pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<ConsultationInfo>>, AppError> {
    Ok(Json(state.consultations.get_user_consultations(&caller).await?))
}

/// GET /consultations/doctors
pub async fn doctors(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Result<Json<Vec<DoctorInfo>>, AppError> {
    Ok(Json(state.consultations.get_doctors().await?))
}

/// GET /consultations/:id
pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ConsultationInfo>, AppError> {
    Ok(Json(
        state.consultations.get_consultation_by_id(&id, &caller).await?,
    ))
}

/// POST /consultations/:id/messages
pub async fn add_message(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<CreateMessageRequest>,
) -> Result<(StatusCode, Json<MessageInfo>), AppError> {
    let message = state.consultations.add_message(&id, &caller, req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// PATCH /consultations/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateStatusRequest>,
) -> Result<Json<ConsultationInfo>, AppError> {
    Ok(Json(
        state
            .consultations
            .update_consultation_status(&id, &caller, req.status)
            .await?,
    ))
}
