//! User lookups for admin sign-in, and role changes made from the CLI.

use sqlx::PgPool;

use elegance_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::CurrentAdmin;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for sign-in lookups.
#[derive(Debug, sqlx::FromRow)]
struct LoginRow {
    id: UserId,
    email: String,
    first_name: String,
    last_name: String,
    role: UserRole,
    password_hash: String,
}

/// A user found by email, with the hash to check their password against.
#[derive(Debug)]
pub struct AdminLogin {
    pub admin: CurrentAdmin,
    pub password_hash: String,
}

impl TryFrom<LoginRow> for AdminLogin {
    type Error = RepositoryError;

    fn try_from(row: LoginRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let name = format!("{} {}", row.first_name.trim(), row.last_name.trim())
            .trim()
            .to_owned();
        let name = if name.is_empty() {
            email.to_string()
        } else {
            name
        };

        Ok(Self {
            admin: CurrentAdmin {
                id: row.id,
                email,
                name,
                role: row.role,
            },
            password_hash: row.password_hash,
        })
    }
}

/// Repository for reading users during admin sign-in.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by email (case-insensitive), whatever their role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn login_by_email(&self, email: &Email) -> Result<Option<AdminLogin>, RepositoryError> {
        let row = sqlx::query_as::<_, LoginRow>(
            r"
            SELECT id, email, first_name, last_name, role, password_hash
            FROM users
            WHERE LOWER(email) = LOWER($1)
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(AdminLogin::try_from).transpose()
    }

    /// Current role of a user, if they still exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn role(&self, id: UserId) -> Result<Option<UserRole>, RepositoryError> {
        let role = sqlx::query_scalar::<_, UserRole>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(role)
    }

    /// Give the user with this email a new role.
    ///
    /// Returns the user's ID, or `None` if no account has this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_role(
        &self,
        email: &Email,
        role: UserRole,
    ) -> Result<Option<UserId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, UserId>(
            r"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE LOWER(email) = LOWER($1)
            RETURNING id
            ",
        )
        .bind(email.as_str())
        .bind(role)
        .fetch_optional(self.pool)
        .await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(email: &str, first: &str, last: &str) -> LoginRow {
        LoginRow {
            id: UserId::new(1),
            email: email.to_owned(),
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            role: UserRole::Admin,
            password_hash: "$argon2id$stub".to_owned(),
        }
    }

    #[test]
    fn test_login_row_builds_display_name() {
        let login = AdminLogin::try_from(row("noor@elegance.test", "Noor", "Saleh"));
        assert!(matches!(login, Ok(ref l) if l.admin.name == "Noor Saleh"));

        let login = AdminLogin::try_from(row("noor@elegance.test", "", ""));
        assert!(matches!(login, Ok(ref l) if l.admin.name == "noor@elegance.test"));
    }

    #[test]
    fn test_login_row_rejects_corrupt_email() {
        let login = AdminLogin::try_from(row("not-an-email", "Noor", "Saleh"));
        assert!(matches!(login, Err(RepositoryError::DataCorruption(_))));
    }
}
