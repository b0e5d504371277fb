use anyhow::Result;
use sqlx::{QueryBuilder, Sqlite};

use super::{Database, NewResult, ResultChanges, ResultRow};
use crate::access::Scope;

const RESULT_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.title, r.description, r.before_image, r.after_image, r.procedure,
           r.is_public, r.created_at, r.updated_at,
           u.first_name AS user_first_name, u.last_name AS user_last_name, u.avatar AS user_avatar
    FROM before_after_results r
    JOIN users u ON u.id = r.user_id
    WHERE "#;

impl Database {
    pub async fn insert_result(&self, result: &NewResult) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO before_after_results
                (id, user_id, title, description, before_image, after_image, procedure, is_public, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&result.id)
        .bind(&result.user_id)
        .bind(&result.title)
        .bind(&result.description)
        .bind(&result.before_image)
        .bind(&result.after_image)
        .bind(&result.procedure)
        .bind(result.is_public)
        .bind(&result.created_at)
        .bind(&result.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_result(&self, id: &str, scope: &Scope) -> Result<Option<ResultRow>> {
        let mut qb = QueryBuilder::<Sqlite>::new(RESULT_SELECT);
        scope.push_predicate(&mut qb, "r.");
        qb.push(" AND r.id = ");
        qb.push_bind(id.to_string());

        let row = qb
            .build_query_as::<ResultRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Results in scope, newest first, optionally narrowed to one procedure
    pub async fn list_results(&self, scope: &Scope, procedure: Option<&str>) -> Result<Vec<ResultRow>> {
        let mut qb = QueryBuilder::<Sqlite>::new(RESULT_SELECT);
        scope.push_predicate(&mut qb, "r.");
        if let Some(procedure) = procedure {
            qb.push(" AND r.procedure = ");
            qb.push_bind(procedure.to_string());
        }
        qb.push(" ORDER BY r.created_at DESC, r.rowid DESC");

        let rows = qb
            .build_query_as::<ResultRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Apply changes to a result in scope; returns false if nothing matched
    pub async fn update_result(
        &self,
        id: &str,
        scope: &Scope,
        changes: &ResultChanges,
        updated_at: &str,
    ) -> Result<bool> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE before_after_results SET updated_at = ");
        qb.push_bind(updated_at.to_string());
        qb.push(", title = COALESCE(");
        qb.push_bind(changes.title.clone());
        qb.push(", title), description = COALESCE(");
        qb.push_bind(changes.description.clone());
        qb.push(", description), before_image = COALESCE(");
        qb.push_bind(changes.before_image.clone());
        qb.push(", before_image), after_image = COALESCE(");
        qb.push_bind(changes.after_image.clone());
        qb.push(", after_image), procedure = COALESCE(");
        qb.push_bind(changes.procedure.clone());
        qb.push(", procedure), is_public = COALESCE(");
        qb.push_bind(changes.is_public);
        qb.push(", is_public) WHERE id = ");
        qb.push_bind(id.to_string());
        qb.push(" AND ");
        scope.push_predicate(&mut qb, "");

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a result in scope; returns false if nothing matched
    pub async fn delete_result(&self, id: &str, scope: &Scope) -> Result<bool> {
        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM before_after_results WHERE id = ");
        qb.push_bind(id.to_string());
        qb.push(" AND ");
        scope.push_predicate(&mut qb, "");

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
