use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Enumerations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Role of a user account, drives route authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Patient,
    Doctor,
    MedicalStaff,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Patient,
        UserRole::Doctor,
        UserRole::MedicalStaff,
        UserRole::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Patient => "PATIENT",
            UserRole::Doctor => "DOCTOR",
            UserRole::MedicalStaff => "MEDICAL_STAFF",
            UserRole::Admin => "ADMIN",
        }
    }

    /// Staff may manage rows owned by other users
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::MedicalStaff | UserRole::Admin)
    }

    /// Roles listed in the doctor picker
    pub fn is_practitioner(&self) -> bool {
        matches!(self, UserRole::Doctor | UserRole::MedicalStaff)
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Patient
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "role",
                value: s.to_string(),
            })
    }
}

/// Lifecycle of a consultation.
///
/// `Active` is the only starting state. `Completed` and `Cancelled` are
/// terminal: once reached, the status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsultationStatus {
    Active,
    Completed,
    Cancelled,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Active => "ACTIVE",
            ConsultationStatus::Completed => "COMPLETED",
            ConsultationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConsultationStatus::Active)
    }

    pub fn can_transition_to(&self, next: ConsultationStatus) -> bool {
        matches!(
            (self, next),
            (ConsultationStatus::Active, ConsultationStatus::Completed)
                | (ConsultationStatus::Active, ConsultationStatus::Cancelled)
        )
    }
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsultationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ConsultationStatus::Active),
            "COMPLETED" => Ok(ConsultationStatus::Completed),
            "CANCELLED" => Ok(ConsultationStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "consultation status",
                value: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// Full account view returned by register, login and profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: String,
}

/// Identity carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

/// Minimal projection of a user embedded in other resources.
///
/// `id` and `avatar` are omitted for anonymized (public) listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserSummary {
    pub fn anonymized(self) -> Self {
        Self {
            id: None,
            avatar: None,
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorInfo {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserProfile,
}

// ============================================================================
// Consultations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub id: String,
    pub consultation_id: String,
    pub sender_id: String,
    pub message: String,
    pub attachments: Vec<String>,
    pub created_at: String,
}

/// A consultation with both participants.
///
/// In listings `messages` holds only the latest message; in the detail view
/// it holds the whole thread, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationInfo {
    pub id: String,
    pub user_id: String,
    pub doctor_id: String,
    pub title: String,
    pub description: String,
    pub status: ConsultationStatus,
    pub created_at: String,
    pub updated_at: String,
    pub user: UserSummary,
    pub doctor: UserSummary,
    pub messages: Vec<MessageInfo>,
}

// ============================================================================
// Before/after results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub before_image: String,
    pub after_image: String,
    pub procedure: String,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
    pub user: UserSummary,
}

impl ResultInfo {
    /// Strip owner identifiers for unauthenticated galleries
    pub fn anonymized(self) -> Self {
        Self {
            user_id: None,
            user: self.user.anonymized(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        let json = serde_json::to_string(&UserRole::MedicalStaff).unwrap();
        assert_eq!(json, "\"MEDICAL_STAFF\"");
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_groups() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::MedicalStaff.is_staff());
        assert!(!UserRole::Doctor.is_staff());
        assert!(UserRole::Doctor.is_practitioner());
        assert!(!UserRole::Patient.is_practitioner());
    }

    #[test]
    fn test_status_transitions() {
        use ConsultationStatus::*;
        assert!(Active.can_transition_to(Completed));
        assert!(Active.can_transition_to(Cancelled));
        assert!(!Active.can_transition_to(Active));
        assert!(!Completed.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Completed));
        assert!(Completed.is_terminal());
        assert!(!Active.is_terminal());
    }

    #[test]
    fn test_anonymized_result_hides_owner() {
        let result = ResultInfo {
            id: "r1".to_string(),
            user_id: Some("u1".to_string()),
            title: "Hair transplant".to_string(),
            description: None,
            before_image: "https://cdn.example.com/b.jpg".to_string(),
            after_image: "https://cdn.example.com/a.jpg".to_string(),
            procedure: "FUE".to_string(),
            is_public: true,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            user: UserSummary {
                id: Some("u1".to_string()),
                first_name: "Ana".to_string(),
                last_name: "Lima".to_string(),
                avatar: Some("https://cdn.example.com/ana.png".to_string()),
            },
        };

        let json = serde_json::to_value(result.anonymized()).unwrap();
        assert!(json.get("userId").is_none());
        assert!(json["user"].get("id").is_none());
        assert!(json["user"].get("avatar").is_none());
        assert_eq!(json["user"]["firstName"], "Ana");
        assert_eq!(json["isPublic"], true);
    }
}
