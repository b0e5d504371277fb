use anyhow::Context;
use shared::{
    ConsultationInfo, ConsultationStatus, CreateConsultationRequest, CreateMessageRequest,
    DoctorInfo, MessageInfo, UserRole,
};
use uuid::Uuid;

use super::{parse_role, summary};
use crate::{
    access::Caller,
    db::{self, ConsultationMessage, ConsultationRow, Database, NewConsultation},
    error::AppError,
};

const NOT_FOUND: &str = "Consultation not found";
const NOT_FOUND_OR_DENIED: &str = "Consultation not found or access denied";

#[derive(Clone)]
pub struct ConsultationService {
    db: Database,
}

impl ConsultationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open a consultation between the caller (as patient) and a doctor
    pub async fn create_consultation(
        &self,
        patient: &Caller,
        req: CreateConsultationRequest,
    ) -> Result<ConsultationInfo, AppError> {
        if self.db.get_user_by_id(&req.doctor_id).await?.is_none() {
            return Err(AppError::BadRequest("Doctor not found".to_string()));
        }

        let consultation = NewConsultation {
            id: Uuid::new_v4().to_string(),
            user_id: patient.id.clone(),
            doctor_id: req.doctor_id,
            title: req.title,
            description: req.description,
            status: ConsultationStatus::Active.to_string(),
            created_at: db::now(),
        };
        self.db.insert_consultation(&consultation).await?;

        tracing::info!(
            "Consultation {} opened by {} with doctor {}",
            consultation.id,
            consultation.user_id,
            consultation.doctor_id
        );

        let row = self
            .db
            .find_consultation(&consultation.id, &patient.consultation_scope())
            .await?
            .ok_or_else(|| AppError::Internal("Created consultation vanished".to_string()))?;
        to_info(row, Vec::new())
    }

    /// Every consultation the caller takes part in, each with its latest
    /// message as a preview
    pub async fn get_user_consultations(
        &self,
        caller: &Caller,
    ) -> Result<Vec<ConsultationInfo>, AppError> {
        let rows = self
            .db
            .list_consultations(&caller.consultation_scope())
            .await?;

        let mut consultations = Vec::with_capacity(rows.len());
        for row in rows {
            let preview = self.db.get_latest_message(&row.id).await?;
            let messages = preview.into_iter().map(to_message).collect::<Result<_, _>>()?;
            consultations.push(to_info(row, messages)?);
        }
        Ok(consultations)
    }

    /// Full thread, oldest message first
    pub async fn get_consultation_by_id(
        &self,
        id: &str,
        caller: &Caller,
    ) -> Result<ConsultationInfo, AppError> {
        let row = self
            .db
            .find_consultation(id, &caller.consultation_scope())
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

        let messages = self
            .db
            .get_messages_for_consultation(&row.id)
            .await?
            .into_iter()
            .map(to_message)
            .collect::<Result<_, _>>()?;
        to_info(row, messages)
    }

    pub async fn add_message(
        &self,
        consultation_id: &str,
        sender: &Caller,
        req: CreateMessageRequest,
    ) -> Result<MessageInfo, AppError> {
        let consultation = self
            .db
            .find_consultation(consultation_id, &sender.consultation_scope())
            .await?
            .ok_or_else(|| AppError::Forbidden(NOT_FOUND_OR_DENIED.to_string()))?;

        let attachments = serde_json::to_string(&req.attachments.unwrap_or_default())
            .context("encoding attachments")?;
        let message = ConsultationMessage {
            id: Uuid::new_v4().to_string(),
            consultation_id: consultation.id,
            sender_id: sender.id.clone(),
            message: req.message,
            attachments,
            created_at: db::now(),
        };
        self.db.append_message(&message).await?;

        tracing::info!(
            "Message {} added to consultation {} by {}",
            message.id,
            message.consultation_id,
            message.sender_id
        );
        to_message(message)
    }

    /// Move an active consultation to a terminal status
    pub async fn update_consultation_status(
        &self,
        consultation_id: &str,
        caller: &Caller,
        status: ConsultationStatus,
    ) -> Result<ConsultationInfo, AppError> {
        let scope = caller.consultation_scope();
        let row = self
            .db
            .find_consultation(consultation_id, &scope)
            .await?
            .ok_or_else(|| AppError::Forbidden(NOT_FOUND_OR_DENIED.to_string()))?;

        let current = parse_status(&row.status)?;
        if current.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Consultation is already {}",
                current
            )));
        }
        if !current.can_transition_to(status) {
            return Err(AppError::Conflict(format!(
                "Cannot change consultation status from {} to {}",
                current, status
            )));
        }

        let applied = self
            .db
            .transition_consultation_status(&row.id, current.as_str(), status.as_str(), &db::now())
            .await?;
        if !applied {
            return Err(AppError::Conflict(
                "Consultation status changed concurrently".to_string(),
            ));
        }

        tracing::info!(
            "Consultation {} moved from {} to {} by {}",
            row.id,
            current,
            status,
            caller.id
        );

        let updated = self
            .db
            .find_consultation(&row.id, &scope)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
        to_info(updated, Vec::new())
    }

    /// Practitioners a patient can open a consultation with
    pub async fn get_doctors(&self) -> Result<Vec<DoctorInfo>, AppError> {
        let roles: Vec<UserRole> = UserRole::ALL
            .into_iter()
            .filter(|role| role.is_practitioner())
            .collect();
        self.db
            .list_active_users_with_roles(&roles)
            .await?
            .into_iter()
            .map(|user| {
                Ok::<_, AppError>(DoctorInfo {
                    role: parse_role(&user.role)?,
                    id: user.id,
                    first_name: user.first_name,
                    last_name: user.last_name,
                    avatar: user.avatar,
                })
            })
            .collect()
    }
}

fn parse_status(raw: &str) -> Result<ConsultationStatus, AppError> {
    raw.parse()
        .map_err(|e: shared::UnknownVariant| AppError::Internal(e.to_string()))
}

fn to_message(message: ConsultationMessage) -> Result<MessageInfo, AppError> {
    let attachments: Vec<String> =
        serde_json::from_str(&message.attachments).context("decoding attachments")?;
    Ok(MessageInfo {
        id: message.id,
        consultation_id: message.consultation_id,
        sender_id: message.sender_id,
        message: message.message,
        attachments,
        created_at: message.created_at,
    })
}

fn to_info(row: ConsultationRow, messages: Vec<MessageInfo>) -> Result<ConsultationInfo, AppError> {
    Ok(ConsultationInfo {
        status: parse_status(&row.status)?,
        user: summary(&row.user_id, row.user_first_name, row.user_last_name, row.user_avatar),
        doctor: summary(
            &row.doctor_id,
            row.doctor_first_name,
            row.doctor_last_name,
            row.doctor_avatar,
        ),
        id: row.id,
        user_id: row.user_id,
        doctor_id: row.doctor_id,
        title: row.title,
        description: row.description,
        created_at: row.created_at,
        updated_at: row.updated_at,
        messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_user, TestUser};

    async fn setup() -> (ConsultationService, Caller, Caller, Caller) {
        let db = Database::in_memory().await.unwrap();
        let patient = seed_user(&db, UserRole::Patient, "a@example.com").await;
        let doctor = seed_user(&db, UserRole::Doctor, "b@example.com").await;
        let outsider = seed_user(&db, UserRole::Patient, "c@example.com").await;
        (ConsultationService::new(db), patient.caller, doctor.caller, outsider.caller)
    }

    fn hair_loss(doctor: &Caller) -> CreateConsultationRequest {
        CreateConsultationRequest {
            doctor_id: doctor.id.clone(),
            title: "Hair loss".to_string(),
            description: "Thinning at the crown for six months".to_string(),
        }
    }

    fn text(message: &str) -> CreateMessageRequest {
        CreateMessageRequest {
            message: message.to_string(),
            attachments: None,
        }
    }

    #[tokio::test]
    async fn test_create_starts_active() {
        let (service, patient, doctor, _) = setup().await;

        let consultation = service
            .create_consultation(&patient, hair_loss(&doctor))
            .await
            .unwrap();

        assert_eq!(consultation.status, ConsultationStatus::Active);
        assert_eq!(consultation.user_id, patient.id);
        assert_eq!(consultation.doctor_id, doctor.id);
        assert_eq!(consultation.doctor.id.as_deref(), Some(doctor.id.as_str()));
        assert!(consultation.messages.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_unknown_doctor_fails() {
        let (service, patient, _, _) = setup().await;

        let req = CreateConsultationRequest {
            doctor_id: Uuid::new_v4().to_string(),
            ..hair_loss(&patient)
        };
        let err = service.create_consultation(&patient, req).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_get_by_id_only_for_participants() {
        let (service, patient, doctor, outsider) = setup().await;
        let created = service
            .create_consultation(&patient, hair_loss(&doctor))
            .await
            .unwrap();

        assert!(service.get_consultation_by_id(&created.id, &patient).await.is_ok());
        assert!(service.get_consultation_by_id(&created.id, &doctor).await.is_ok());

        let err = service
            .get_consultation_by_id(&created.id, &outsider)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // A missing row looks the same as someone else's
        let err = service
            .get_consultation_by_id(&Uuid::new_v4().to_string(), &patient)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_scenario_latest_message_preview() {
        let (service, patient, doctor, outsider) = setup().await;
        let created = service
            .create_consultation(&patient, hair_loss(&doctor))
            .await
            .unwrap();

        service
            .add_message(&created.id, &patient, text("First question"))
            .await
            .unwrap();
        let latest = service
            .add_message(
                &created.id,
                &doctor,
                CreateMessageRequest {
                    message: "Please send a photo".to_string(),
                    attachments: Some(vec!["https://cdn.example.com/guide.pdf".to_string()]),
                },
            )
            .await
            .unwrap();

        let listed = service.get_user_consultations(&doctor).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].messages.len(), 1);
        assert_eq!(listed[0].messages[0].id, latest.id);
        assert_eq!(listed[0].messages[0].attachments.len(), 1);
        assert!(listed[0].updated_at >= latest.created_at);

        let full = service.get_consultation_by_id(&created.id, &patient).await.unwrap();
        let bodies: Vec<_> = full.messages.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(bodies, ["First question", "Please send a photo"]);

        assert!(service.get_user_consultations(&outsider).await.unwrap().is_empty());
        assert!(service
            .get_consultation_by_id(&created.id, &outsider)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_outsider_message_is_rejected_without_insert() {
        let (service, patient, doctor, outsider) = setup().await;
        let created = service
            .create_consultation(&patient, hair_loss(&doctor))
            .await
            .unwrap();

        let err = service
            .add_message(&created.id, &outsider, text("hello?"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(service.db.count_messages(&created.id).await.unwrap(), 0);

        let unchanged = service.get_consultation_by_id(&created.id, &patient).await.unwrap();
        assert_eq!(unchanged.updated_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_listing_orders_by_recent_activity() {
        let (service, patient, doctor, _) = setup().await;
        let older = service
            .create_consultation(&patient, hair_loss(&doctor))
            .await
            .unwrap();
        let newer = service
            .create_consultation(&patient, hair_loss(&doctor))
            .await
            .unwrap();

        let ids: Vec<_> = service
            .get_user_consultations(&patient)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, [newer.id.clone(), older.id.clone()]);

        // A new message moves the older consultation to the top
        service.add_message(&older.id, &doctor, text("Update")).await.unwrap();
        let ids: Vec<_> = service
            .get_user_consultations(&patient)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, [older.id, newer.id]);
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let (service, patient, doctor, outsider) = setup().await;
        let created = service
            .create_consultation(&patient, hair_loss(&doctor))
            .await
            .unwrap();

        let err = service
            .update_consultation_status(&created.id, &outsider, ConsultationStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = service
            .update_consultation_status(&created.id, &doctor, ConsultationStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let completed = service
            .update_consultation_status(&created.id, &doctor, ConsultationStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.status, ConsultationStatus::Completed);

        // Terminal
        for next in [ConsultationStatus::Active, ConsultationStatus::Cancelled] {
            let err = service
                .update_consultation_status(&created.id, &patient, next)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Conflict(ref m) if m.contains("already COMPLETED")));
        }
        let stored = service.get_consultation_by_id(&created.id, &patient).await.unwrap();
        assert_eq!(stored.status, ConsultationStatus::Completed);
    }

    #[tokio::test]
    async fn test_doctors_lists_active_practitioners() {
        let db = Database::in_memory().await.unwrap();
        seed_user(&db, UserRole::Patient, "p@example.com").await;
        let doctor = seed_user(&db, UserRole::Doctor, "d@example.com").await;
        let staff = seed_user(&db, UserRole::MedicalStaff, "s@example.com").await;
        let TestUser { caller: retired, .. } =
            seed_user(&db, UserRole::Doctor, "r@example.com").await;
        seed_user(&db, UserRole::Admin, "admin@example.com").await;
        db.set_user_active(&retired.id, false).await.unwrap();

        let service = ConsultationService::new(db);
        let mut ids: Vec<_> = service
            .get_doctors()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        ids.sort();
        let mut expected = vec![doctor.caller.id, staff.caller.id];
        expected.sort();
        assert_eq!(ids, expected);
    }
}
