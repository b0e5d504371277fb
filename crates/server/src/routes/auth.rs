use axum::{extract::State, http::StatusCode, Json};
use shared::{AuthResponse, Identity, LoginRequest, RegisterRequest, UserProfile, UserRole};
use uuid::Uuid;

use crate::{
    auth::{generate_token, hash_password, verify_password, AuthUser, ValidJson},
    db::{self, User},
    error::AppError,
    services::parse_role,
    state::AppState,
};

const BAD_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_TAKEN: &str = "Email already registered";

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let role = req.role.unwrap_or_default();
    if role != UserRole::Patient && !state.config.auth.open_role_registration {
        return Err(AppError::Forbidden(format!(
            "Self-registration as {} is not allowed",
            role
        )));
    }

    // Check if user already exists
    let email = normalize_email(&req.email);
    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest(EMAIL_TAKEN.to_string()));
    }

    let now = db::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash: hash_password(&req.password)?,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        phone: req.phone.filter(|phone| !phone.trim().is_empty()),
        avatar: None,
        role: role.to_string(),
        is_active: true,
        created_at: now.clone(),
        updated_at: now,
    };
    // A concurrent registration can win between the lookup and the insert
    if let Err(err) = state.db.create_user(&user).await {
        return Err(if db::is_unique_violation(&err) {
            AppError::BadRequest(EMAIL_TAKEN.to_string())
        } else {
            err.into()
        });
    }
    tracing::info!("Registered user {} as {}", user.id, role);

    let response = auth_response(user, &state)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .db
        .get_user_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(|| AppError::AuthError(BAD_CREDENTIALS.to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::AuthError(BAD_CREDENTIALS.to_string()));
    }
    if !user.is_active {
        return Err(AppError::AuthError("Account is deactivated".to_string()));
    }

    tracing::debug!("User {} logged in", user.id);
    Ok(Json(auth_response(user, &state)?))
}

/// GET /auth/profile
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let user = state
        .db
        .get_user_by_id(&caller.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(to_profile(user)?))
}

/// GET /auth/me
pub async fn me(AuthUser(caller): AuthUser) -> Json<Identity> {
    Json(Identity {
        id: caller.id,
        email: caller.email,
        role: caller.role,
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn auth_response(user: User, state: &AppState) -> Result<AuthResponse, AppError> {
    let profile = to_profile(user)?;
    let access_token = generate_token(&profile.id, &profile.email, profile.role, &state.config.auth)?;
    Ok(AuthResponse {
        access_token,
        user: profile,
    })
}

fn to_profile(user: User) -> Result<UserProfile, AppError> {
    Ok(UserProfile {
        role: parse_role(&user.role)?,
        id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        phone: user.phone,
        avatar: user.avatar,
        is_active: user.is_active,
        created_at: user.created_at,
    })
}
