use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{CreateResultRequest, ResultInfo, UpdateResultRequest};

use crate::{
    access::RESULT_REVIEWERS,
    auth::{AuthUser, MaybeAuthUser, ValidJson},
    error::AppError,
    state::AppState,
};

/// GET /results/public
pub async fn public(State(state): State<AppState>) -> Result<Json<Vec<ResultInfo>>, AppError> {
    Ok(Json(state.results.get_public_results().await?))
}

/// GET /results/procedure/:procedure
pub async fn by_procedure(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
) -> Result<Json<Vec<ResultInfo>>, AppError> {
    Ok(Json(state.results.get_results_by_procedure(&procedure).await?))
}

/// POST /results
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidJson(req): ValidJson<CreateResultRequest>,
) -> Result<(StatusCode, Json<ResultInfo>), AppError> {
    let result = state.results.create_result(&caller, req).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// GET /results/my
pub async fn mine(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<ResultInfo>>, AppError> {
    Ok(Json(state.results.get_user_results(&caller).await?))
}

/// GET /results/all (staff only)
pub async fn all(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<ResultInfo>>, AppError> {
    caller.ensure_role(&RESULT_REVIEWERS)?;
    Ok(Json(state.results.get_all_results().await?))
}

/// GET /results/:id
pub async fn get_one(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<Json<ResultInfo>, AppError> {
    Ok(Json(state.results.get_result_by_id(&id, caller.as_ref()).await?))
}

/// PUT /results/:id
pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateResultRequest>,
) -> Result<Json<ResultInfo>, AppError> {
    Ok(Json(state.results.update_result(&id, &caller, req).await?))
}

/// DELETE /results/:id
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ResultInfo>, AppError> {
    Ok(Json(state.results.delete_result(&id, &caller).await?))
}
