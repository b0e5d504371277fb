use anyhow::Result;
use sqlx::{QueryBuilder, Sqlite};

use super::{ConsultationMessage, ConsultationRow, Database, NewConsultation};
use crate::access::Scope;

const CONSULTATION_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.doctor_id, c.title, c.description, c.status, c.created_at, c.updated_at,
           u.first_name AS user_first_name, u.last_name AS user_last_name, u.avatar AS user_avatar,
           d.first_name AS doctor_first_name, d.last_name AS doctor_last_name, d.avatar AS doctor_avatar
    FROM consultations c
    JOIN users u ON u.id = c.user_id
    JOIN users d ON d.id = c.doctor_id
    WHERE "#;

impl Database {
    pub async fn insert_consultation(&self, consultation: &NewConsultation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO consultations (id, user_id, doctor_id, title, description, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&consultation.id)
        .bind(&consultation.user_id)
        .bind(&consultation.doctor_id)
        .bind(&consultation.title)
        .bind(&consultation.description)
        .bind(&consultation.status)
        .bind(&consultation.created_at)
        .bind(&consultation.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_consultation(&self, id: &str, scope: &Scope) -> Result<Option<ConsultationRow>> {
        let mut qb = QueryBuilder::<Sqlite>::new(CONSULTATION_SELECT);
        scope.push_predicate(&mut qb, "c.");
        qb.push(" AND c.id = ");
        qb.push_bind(id.to_string());

        let row = qb
            .build_query_as::<ConsultationRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Consultations in scope, most recently active first
    pub async fn list_consultations(&self, scope: &Scope) -> Result<Vec<ConsultationRow>> {
        let mut qb = QueryBuilder::<Sqlite>::new(CONSULTATION_SELECT);
        scope.push_predicate(&mut qb, "c.");
        qb.push(" ORDER BY c.updated_at DESC, c.rowid DESC");

        let rows = qb
            .build_query_as::<ConsultationRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Compare-and-set on the status column; returns false when the stored
    /// status was no longer `from`
    pub async fn transition_consultation_status(
        &self,
        id: &str,
        from: &str,
        to: &str,
        updated_at: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE consultations SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(to)
        .bind(updated_at)
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // Message operations

    /// Insert a message and bump the consultation's `updated_at` atomically
    pub async fn append_message(&self, message: &ConsultationMessage) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO consultation_messages (id, consultation_id, sender_id, message, attachments, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.consultation_id)
        .bind(&message.sender_id)
        .bind(&message.message)
        .bind(&message.attachments)
        .bind(&message.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE consultations SET updated_at = ? WHERE id = ?")
            .bind(&message.created_at)
            .bind(&message.consultation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_messages_for_consultation(
        &self,
        consultation_id: &str,
    ) -> Result<Vec<ConsultationMessage>> {
        let messages = sqlx::query_as::<_, ConsultationMessage>(
            r#"
            SELECT id, consultation_id, sender_id, message, attachments, created_at
            FROM consultation_messages
            WHERE consultation_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(consultation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    pub async fn get_latest_message(
        &self,
        consultation_id: &str,
    ) -> Result<Option<ConsultationMessage>> {
        let message = sqlx::query_as::<_, ConsultationMessage>(
            r#"
            SELECT id, consultation_id, sender_id, message, attachments, created_at
            FROM consultation_messages
            WHERE consultation_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(consultation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    #[cfg(test)]
    pub async fn count_messages(&self, consultation_id: &str) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM consultation_messages WHERE consultation_id = ?")
                .bind(consultation_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }
}
