//! Resource services: the business rules between routes and the database.

mod consultations;
mod results;

pub use consultations::ConsultationService;
pub use results::ResultService;

use shared::{UserRole, UserSummary};

use crate::error::AppError;

fn summary(id: &str, first_name: String, last_name: String, avatar: Option<String>) -> UserSummary {
    UserSummary {
        id: Some(id.to_string()),
        first_name,
        last_name,
        avatar,
    }
}

pub(crate) fn parse_role(raw: &str) -> Result<UserRole, AppError> {
    raw.parse()
        .map_err(|e: shared::UnknownVariant| AppError::Internal(e.to_string()))
}
