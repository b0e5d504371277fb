use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewConsultation {
    pub id: String,
    pub user_id: String,
    pub doctor_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_at: String,
}

/// Consultation joined with both participants' summaries
#[derive(Debug, Clone, FromRow)]
pub struct ConsultationRow {
    pub id: String,
    pub user_id: String,
    pub doctor_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub user_first_name: String,
    pub user_last_name: String,
    pub user_avatar: Option<String>,
    pub doctor_first_name: String,
    pub doctor_last_name: String,
    pub doctor_avatar: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ConsultationMessage {
    pub id: String,
    pub consultation_id: String,
    pub sender_id: String,
    pub message: String,
    /// JSON array of strings
    pub attachments: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewResult {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub before_image: String,
    pub after_image: String,
    pub procedure: String,
    pub is_public: bool,
    pub created_at: String,
}

/// Before/after result joined with its owner's summary
#[derive(Debug, Clone, FromRow)]
pub struct ResultRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub before_image: String,
    pub after_image: String,
    pub procedure: String,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
    pub user_first_name: String,
    pub user_last_name: String,
    pub user_avatar: Option<String>,
}

/// Column changes for a result; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ResultChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub before_image: Option<String>,
    pub after_image: Option<String>,
    pub procedure: Option<String>,
    pub is_public: Option<bool>,
}
