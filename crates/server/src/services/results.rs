use shared::{CreateResultRequest, ResultInfo, UpdateResultRequest};
use uuid::Uuid;

use super::summary;
use crate::{
    access::{Caller, Scope},
    db::{self, Database, NewResult, ResultChanges, ResultRow},
    error::AppError,
};

const NOT_FOUND: &str = "Result not found";
const NOT_FOUND_OR_DENIED: &str = "Result not found or access denied";

#[derive(Clone)]
pub struct ResultService {
    db: Database,
}

impl ResultService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_result(
        &self,
        owner: &Caller,
        req: CreateResultRequest,
    ) -> Result<ResultInfo, AppError> {
        let result = NewResult {
            id: Uuid::new_v4().to_string(),
            user_id: owner.id.clone(),
            title: req.title,
            description: req.description,
            before_image: req.before_image,
            after_image: req.after_image,
            procedure: req.procedure,
            is_public: req.is_public.unwrap_or(false),
            created_at: db::now(),
        };
        self.db.insert_result(&result).await?;

        tracing::info!(
            "Result {} created by {} (procedure={}, public={})",
            result.id,
            result.user_id,
            result.procedure,
            result.is_public
        );

        self.db
            .find_result(&result.id, &owner.own_results_scope())
            .await?
            .map(to_info)
            .ok_or_else(|| AppError::Internal("Created result vanished".to_string()))
    }

    /// Public gallery; owners are anonymized
    pub async fn get_public_results(&self) -> Result<Vec<ResultInfo>, AppError> {
        self.list_anonymized(None).await
    }

    pub async fn get_results_by_procedure(
        &self,
        procedure: &str,
    ) -> Result<Vec<ResultInfo>, AppError> {
        self.list_anonymized(Some(procedure)).await
    }

    async fn list_anonymized(&self, procedure: Option<&str>) -> Result<Vec<ResultInfo>, AppError> {
        let rows = self.db.list_results(&Scope::Public, procedure).await?;
        Ok(rows.into_iter().map(|row| to_info(row).anonymized()).collect())
    }

    pub async fn get_user_results(&self, caller: &Caller) -> Result<Vec<ResultInfo>, AppError> {
        let rows = self.db.list_results(&caller.own_results_scope(), None).await?;
        Ok(rows.into_iter().map(to_info).collect())
    }

    /// Every result; callers are expected to have passed the roles guard
    pub async fn get_all_results(&self) -> Result<Vec<ResultInfo>, AppError> {
        let rows = self.db.list_results(&Scope::Everything, None).await?;
        Ok(rows.into_iter().map(to_info).collect())
    }

    pub async fn get_result_by_id(
        &self,
        id: &str,
        caller: Option<&Caller>,
    ) -> Result<ResultInfo, AppError> {
        let row = self
            .db
            .find_result(id, &Caller::result_read_scope(caller))
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

        let info = to_info(row);
        Ok(match caller {
            Some(_) => info,
            None => info.anonymized(),
        })
    }

    pub async fn update_result(
        &self,
        id: &str,
        caller: &Caller,
        req: UpdateResultRequest,
    ) -> Result<ResultInfo, AppError> {
        let scope = caller.result_write_scope();
        let changes = ResultChanges {
            title: req.title,
            description: req.description,
            before_image: req.before_image,
            after_image: req.after_image,
            procedure: req.procedure,
            is_public: req.is_public,
        };

        if !self.db.update_result(id, &scope, &changes, &db::now()).await? {
            return Err(AppError::Forbidden(NOT_FOUND_OR_DENIED.to_string()));
        }
        tracing::info!("Result {} updated by {}", id, caller.id);

        self.db
            .find_result(id, &scope)
            .await?
            .map(to_info)
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    /// Physically delete a result, returning the row as it was
    pub async fn delete_result(&self, id: &str, caller: &Caller) -> Result<ResultInfo, AppError> {
        let scope = caller.result_write_scope();
        let existing = self
            .db
            .find_result(id, &scope)
            .await?
            .ok_or_else(|| AppError::Forbidden(NOT_FOUND_OR_DENIED.to_string()))?;

        if !self.db.delete_result(id, &scope).await? {
            return Err(AppError::Forbidden(NOT_FOUND_OR_DENIED.to_string()));
        }
        tracing::info!("Result {} deleted by {}", id, caller.id);

        Ok(to_info(existing))
    }
}

fn to_info(row: ResultRow) -> ResultInfo {
    ResultInfo {
        user: summary(&row.user_id, row.user_first_name, row.user_last_name, row.user_avatar),
        id: row.id,
        user_id: Some(row.user_id),
        title: row.title,
        description: row.description,
        before_image: row.before_image,
        after_image: row.after_image,
        procedure: row.procedure,
        is_public: row.is_public,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seed_user;
    use shared::UserRole;

    struct Fixture {
        service: ResultService,
        owner: Caller,
        other: Caller,
        staff: Caller,
        doctor: Caller,
    }

    async fn setup() -> Fixture {
        let db = Database::in_memory().await.unwrap();
        Fixture {
            owner: seed_user(&db, UserRole::Patient, "owner@example.com").await.caller,
            other: seed_user(&db, UserRole::Patient, "other@example.com").await.caller,
            staff: seed_user(&db, UserRole::MedicalStaff, "staff@example.com").await.caller,
            doctor: seed_user(&db, UserRole::Doctor, "doc@example.com").await.caller,
            service: ResultService::new(db),
        }
    }

    fn result(procedure: &str, is_public: Option<bool>) -> CreateResultRequest {
        CreateResultRequest {
            title: format!("{} outcome", procedure),
            description: Some("Twelve months post-op".to_string()),
            before_image: "https://cdn.example.com/before.jpg".to_string(),
            after_image: "https://cdn.example.com/after.jpg".to_string(),
            procedure: procedure.to_string(),
            is_public,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_private() {
        let f = setup().await;
        let created = f.service.create_result(&f.owner, result("FUE", None)).await.unwrap();

        assert!(!created.is_public);
        assert_eq!(created.user_id.as_deref(), Some(f.owner.id.as_str()));
        assert!(f.service.get_public_results().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_public_result_visible_in_gallery_and_procedure() {
        let f = setup().await;
        let public = f
            .service
            .create_result(&f.owner, result("FUE", Some(true)))
            .await
            .unwrap();
        f.service
            .create_result(&f.owner, result("FUE", Some(false)))
            .await
            .unwrap();
        f.service
            .create_result(&f.other, result("Rhinoplasty", Some(true)))
            .await
            .unwrap();

        let gallery = f.service.get_public_results().await.unwrap();
        assert_eq!(gallery.len(), 2);
        assert!(gallery.iter().all(|r| r.is_public));
        assert!(gallery.iter().all(|r| r.user_id.is_none() && r.user.id.is_none()));

        let fue = f.service.get_results_by_procedure("FUE").await.unwrap();
        assert_eq!(fue.len(), 1);
        assert_eq!(fue[0].id, public.id);

        assert!(f.service.get_results_by_procedure("Botox").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_my_and_all_results() {
        let f = setup().await;
        let first = f.service.create_result(&f.owner, result("FUE", None)).await.unwrap();
        let second = f
            .service
            .create_result(&f.owner, result("DHI", Some(true)))
            .await
            .unwrap();
        f.service.create_result(&f.other, result("FUE", None)).await.unwrap();

        let mine: Vec<_> = f
            .service
            .get_user_results(&f.owner)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(mine, [second.id, first.id]);

        assert_eq!(f.service.get_all_results().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_get_by_id_visibility() {
        let f = setup().await;
        let private = f.service.create_result(&f.owner, result("FUE", None)).await.unwrap();
        let public = f
            .service
            .create_result(&f.owner, result("FUE", Some(true)))
            .await
            .unwrap();

        assert!(f.service.get_result_by_id(&private.id, Some(&f.owner)).await.is_ok());
        assert!(f.service.get_result_by_id(&private.id, Some(&f.staff)).await.is_ok());
        for caller in [None, Some(&f.other), Some(&f.doctor)] {
            let err = f.service.get_result_by_id(&private.id, caller).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }

        let anonymous = f.service.get_result_by_id(&public.id, None).await.unwrap();
        assert!(anonymous.user_id.is_none());
        let signed_in = f.service.get_result_by_id(&public.id, Some(&f.other)).await.unwrap();
        assert_eq!(signed_in.user_id.as_deref(), Some(f.owner.id.as_str()));
    }

    #[tokio::test]
    async fn test_update_requires_owner_or_staff() {
        let f = setup().await;
        let created = f.service.create_result(&f.owner, result("FUE", None)).await.unwrap();

        let publish = UpdateResultRequest {
            is_public: Some(true),
            ..Default::default()
        };

        for intruder in [&f.other, &f.doctor] {
            let err = f
                .service
                .update_result(&created.id, intruder, publish.clone())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }
        let unchanged = f
            .service
            .get_result_by_id(&created.id, Some(&f.owner))
            .await
            .unwrap();
        assert!(!unchanged.is_public);
        assert_eq!(unchanged.updated_at, created.updated_at);

        let updated = f
            .service
            .update_result(&created.id, &f.owner, publish)
            .await
            .unwrap();
        assert!(updated.is_public);
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.description, created.description);

        let retitled = f
            .service
            .update_result(
                &created.id,
                &f.staff,
                UpdateResultRequest {
                    title: Some("Moderated title".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(retitled.title, "Moderated title");
        assert!(retitled.is_public);
    }

    #[tokio::test]
    async fn test_delete_requires_owner_or_staff() {
        let f = setup().await;
        let mine = f.service.create_result(&f.owner, result("FUE", None)).await.unwrap();
        let moderated = f.service.create_result(&f.owner, result("DHI", None)).await.unwrap();

        let err = f.service.delete_result(&mine.id, &f.other).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(f.service.get_result_by_id(&mine.id, Some(&f.owner)).await.is_ok());

        let deleted = f.service.delete_result(&mine.id, &f.owner).await.unwrap();
        assert_eq!(deleted.id, mine.id);
        assert!(f.service.get_result_by_id(&mine.id, Some(&f.owner)).await.is_err());

        f.service.delete_result(&moderated.id, &f.staff).await.unwrap();
        assert!(f.service.get_user_results(&f.owner).await.unwrap().is_empty());

        // Deleting twice reports the same error as deleting someone else's row
        let err = f.service.delete_result(&mine.id, &f.owner).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
