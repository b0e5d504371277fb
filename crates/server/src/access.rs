//! Row-level authorization.
//!
//! Every query that reads or mutates an owned row goes through a [`Scope`].
//! The scope is derived from the authenticated [`Caller`] in exactly one
//! place per rule, and rendered into the SQL `WHERE` clause by
//! [`Scope::push_predicate`]. Services never write ownership SQL themselves.

use shared::UserRole;
use sqlx::{QueryBuilder, Sqlite};

use crate::error::AppError;

/// Roles allowed to browse every before/after result
pub const RESULT_REVIEWERS: [UserRole; 3] =
    [UserRole::Admin, UserRole::Doctor, UserRole::MedicalStaff];

/// The authenticated user behind a request
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

impl Caller {
    /// Roles guard: the caller's role must be on the route's allow-list
    pub fn ensure_role(&self, allowed: &[UserRole]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            tracing::debug!("Role {} denied, allowed: {:?}", self.role, allowed);
            Err(AppError::Forbidden("Insufficient role for this resource".to_string()))
        }
    }

    /// Consultations are visible and writable by both participants only
    pub fn consultation_scope(&self) -> Scope {
        Scope::Participant(self.id.clone())
    }

    /// Results the caller has created
    pub fn own_results_scope(&self) -> Scope {
        Scope::Owner(self.id.clone())
    }

    /// Results the caller may change or delete
    pub fn result_write_scope(&self) -> Scope {
        if self.role.is_staff() {
            Scope::Everything
        } else {
            Scope::Owner(self.id.clone())
        }
    }

    /// Results the caller may read: public ones plus whatever they may write
    pub fn result_read_scope(caller: Option<&Caller>) -> Scope {
        match caller {
            None => Scope::Public,
            Some(caller) if caller.role.is_staff() => Scope::Everything,
            Some(caller) => Scope::OwnerOrPublic(caller.id.clone()),
        }
    }
}

/// Row filter applied to owned tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Everything,
    /// `user_id` matches
    Owner(String),
    /// `user_id` or `doctor_id` matches
    Participant(String),
    /// `is_public` is set
    Public,
    OwnerOrPublic(String),
}

impl Scope {
    /// Append this scope as a parenthesized boolean expression.
    ///
    /// `qualifier` is prefixed to every column name, e.g. `"c."` for an
    /// aliased table or `""` for a bare `UPDATE`/`DELETE`.
    pub fn push_predicate(&self, qb: &mut QueryBuilder<'_, Sqlite>, qualifier: &str) {
        match self {
            Scope::Everything => {
                qb.push("(1 = 1)");
            }
            Scope::Owner(id) => {
                qb.push(format!("({}user_id = ", qualifier));
                qb.push_bind(id.clone());
                qb.push(")");
            }
            Scope::Participant(id) => {
                qb.push(format!("({}user_id = ", qualifier));
                qb.push_bind(id.clone());
                qb.push(format!(" OR {}doctor_id = ", qualifier));
                qb.push_bind(id.clone());
                qb.push(")");
            }
            Scope::Public => {
                qb.push(format!("({}is_public = 1)", qualifier));
            }
            Scope::OwnerOrPublic(id) => {
                qb.push(format!("({}is_public = 1 OR {}user_id = ", qualifier, qualifier));
                qb.push_bind(id.clone());
                qb.push(")");
            }
        }
    }
}
