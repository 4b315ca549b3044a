//! Address book repository.
//!
//! At most one address per user is the default (enforced by a partial unique
//! index). The first address saved becomes the default.

use sqlx::PgPool;

use elegance_core::checkout::Address;
use elegance_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::SavedAddress;

const ADDRESS_COLUMNS: &str = "id, user_id, label, first_name, last_name, address, apartment, \
     city, state, zip_code, country, phone, is_default";

/// Fields written when creating or editing an address.
#[derive(Debug, Clone)]
pub struct AddressFields {
    pub label: String,
    pub address: Address,
    pub phone: Option<String>,
    pub is_default: bool,
}

/// Repository for `addresses`.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All of a user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<SavedAddress>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 \
             ORDER BY is_default DESC, created_at DESC"
        );
        let addresses = sqlx::query_as::<_, SavedAddress>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(addresses)
    }

    /// One address, if it belongs to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<SavedAddress>, RepositoryError> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND user_id = $2");
        let address = sqlx::query_as::<_, SavedAddress>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(address)
    }

    /// The user's default address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_default(
        &self,
        user_id: UserId,
    ) -> Result<Option<SavedAddress>, RepositoryError> {
        let sql =
            format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 AND is_default");
        let address = sqlx::query_as::<_, SavedAddress>(&sql)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(address)
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        fields: &AddressFields,
    ) -> Result<AddressId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM addresses WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        let make_default = fields.is_default || existing == 0;

        if make_default {
            sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let a = &fields.address;
        let id: AddressId = sqlx::query_scalar(
            r"
            INSERT INTO addresses
                (user_id, label, first_name, last_name, address, apartment,
                 city, state, zip_code, country, phone, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(&fields.label)
        .bind(&a.first_name)
        .bind(&a.last_name)
        .bind(&a.address)
        .bind(a.apartment.as_deref())
        .bind(&a.city)
        .bind(&a.state)
        .bind(&a.zip_code)
        .bind(&a.country)
        .bind(fields.phone.as_deref())
        .bind(make_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Edit an address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address isn't the user's.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if fields.is_default {
            sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND id <> $2")
                .bind(user_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let a = &fields.address;
        let result = sqlx::query(
            r"
            UPDATE addresses SET
                label = $3, first_name = $4, last_name = $5, address = $6, apartment = $7,
                city = $8, state = $9, zip_code = $10, country = $11, phone = $12,
                is_default = is_default OR $13
            WHERE id = $2 AND user_id = $1
            ",
        )
        .bind(user_id)
        .bind(id)
        .bind(&fields.label)
        .bind(&a.first_name)
        .bind(&a.last_name)
        .bind(&a.address)
        .bind(a.apartment.as_deref())
        .bind(&a.city)
        .bind(&a.state)
        .bind(&a.zip_code)
        .bind(&a.country)
        .bind(fields.phone.as_deref())
        .bind(fields.is_default)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Make an address the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address isn't the user's.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_default(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result =
            sqlx::query("UPDATE addresses SET is_default = TRUE WHERE id = $2 AND user_id = $1")
                .bind(user_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete an address. If it was the default, the newest remaining
    /// address takes over.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address isn't the user's.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let was_default: Option<bool> = sqlx::query_scalar(
            "DELETE FROM addresses WHERE id = $2 AND user_id = $1 RETURNING is_default",
        )
        .bind(user_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        match was_default {
            None => return Err(RepositoryError::NotFound),
            Some(true) => {
                sqlx::query(
                    r"
                    UPDATE addresses SET is_default = TRUE
                    WHERE id = (
                        SELECT id FROM addresses WHERE user_id = $1
                        ORDER BY created_at DESC LIMIT 1
                    )
                    ",
                )
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            }
            Some(false) => {}
        }

        tx.commit().await?;
        Ok(())
    }
}
