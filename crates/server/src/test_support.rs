use shared::UserRole;
use uuid::Uuid;

use crate::{
    access::Caller,
    auth::generate_token,
    config::Config,
    db::{self, Database, User},
    state::AppState,
};

pub struct TestUser {
    pub caller: Caller,
    pub token: String,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = "test-secret".to_string();
    config.auth.open_role_registration = true;
    config
}

pub async fn test_state() -> AppState {
    let db = Database::in_memory().await.unwrap();
    AppState::new(db, test_config())
}

/// Insert a user directly, bypassing registration and password hashing
pub async fn seed_user(db: &Database, role: UserRole, email: &str) -> TestUser {
    let now = db::now();
    let name = email.split('@').next().unwrap_or("user").to_string();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        password_hash: "unused".to_string(),
        first_name: name.clone(),
        last_name: format!("{}-family", name),
        phone: None,
        avatar: None,
        role: role.to_string(),
        is_active: true,
        created_at: now.clone(),
        updated_at: now,
    };
    db.create_user(&user).await.unwrap();

    let token = generate_token(&user.id, &user.email, role, &test_config().auth).unwrap();
    TestUser {
        caller: Caller {
            id: user.id,
            email: user.email,
            role,
        },
        token,
    }
}
