use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::de::DeserializeOwned;
use shared::Validate;

use super::verify_token;
use crate::{access::Caller, error::AppError, services::parse_role, state::AppState};

/// JWT guard: a valid bearer token naming an existing, active user
#[derive(Debug, Clone)]
pub struct AuthUser(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AppError::AuthError("Missing or invalid Authorization header".to_string())
                })?;

        let claims = verify_token(bearer.token(), &state.config.auth.jwt_secret)?;

        // Role and activity come from the database so revocations apply immediately
        let user = state
            .db
            .get_user_by_id(&claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::AuthError("Account not found or inactive".to_string()))?;

        Ok(AuthUser(Caller {
            role: parse_role(&user.role)?,
            id: user.id,
            email: user.email,
        }))
    }
}

/// Like [`AuthUser`] but lets anonymous requests through.
///
/// A request that does send an Authorization header must still carry a
/// valid token.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Caller>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }
        let AuthUser(caller) = AuthUser::from_request_parts(parts, state).await?;
        Ok(MaybeAuthUser(Some(caller)))
    }
}

/// Validation layer: a JSON body that deserialized and passed [`Validate`]
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}
