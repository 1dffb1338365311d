//! User repository for Gotcha.
//!
//! SQL implementation of [`UserStore`] on top of [`Database`].

use async_trait::async_trait;
use uuid::Uuid;

use super::user::User;
use super::Database;
use crate::storage::UserStore;
use crate::{GotchaError, Result};

/// Map a failed insert to a domain error.
///
/// Unique violations become `EntityDuplicate(entity)`, foreign-key violations
/// become `NotFound(missing)`; everything else is a generic database error.
pub(super) fn insert_error(e: sqlx::Error, entity: &str, missing: &str) -> GotchaError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return GotchaError::EntityDuplicate(entity.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return GotchaError::NotFound(missing.to_string());
        }
    }
    GotchaError::Database(e.to_string())
}

#[async_trait]
impl UserStore for Database {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, hash, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| insert_error(e, "user", "user"))?;
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            "SELECT id, username, email, hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;

        Ok(result)
    }

    async fn find_user_by_sobriquet(&self, sobriquet: &str) -> Result<Option<User>> {
        let result = sqlx::query_as::<_, User>(
            "SELECT id, username, email, hash, created_at
             FROM users WHERE username = $1 OR email = $1
             ORDER BY created_at, id
             LIMIT 1",
        )
        .bind(sobriquet)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;

        Ok(result)
    }

    async fn list_users_except(&self, id: Uuid) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, email, hash, created_at
             FROM users WHERE id <> $1
             ORDER BY created_at, id",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| GotchaError::Database(e.to_string()))?;

        Ok(users)
    }

    async fn count_users(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await
            .map_err(|e| GotchaError::Database(e.to_string()))?;
        Ok(count.0)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::db::NewUser;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn alice() -> User {
        NewUser::new("alice_1", "alice@example.com", "$argon2id$hash").into_user()
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let db = setup_db().await;
        let user = alice();
        db.insert_user(&user).await.unwrap();

        let found = db.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found, user);
        assert_eq!(found.password_hash, "$argon2id$hash");
    }

    #[tokio::test]
    async fn test_find_user_not_found() {
        let db = setup_db().await;
        assert!(db.find_user_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(db.find_user_by_sobriquet("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_user_by_sobriquet() {
        let db = setup_db().await;
        let user = alice();
        db.insert_user(&user).await.unwrap();

        let by_name = db.find_user_by_sobriquet("alice_1").await.unwrap().unwrap();
        let by_email = db
            .find_user_by_sobriquet("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let db = setup_db().await;
        db.insert_user(&alice()).await.unwrap();

        let same_name = NewUser::new("alice_1", "other@example.com", "h").into_user();
        let same_email = NewUser::new("other_1", "alice@example.com", "h").into_user();

        assert!(matches!(
            db.insert_user(&same_name).await,
            Err(GotchaError::EntityDuplicate(_))
        ));
        assert!(matches!(
            db.insert_user(&same_email).await,
            Err(GotchaError::EntityDuplicate(_))
        ));
        assert_eq!(db.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_users_except() {
        let db = setup_db().await;
        let a = alice();
        let b = NewUser::new("bob_123", "bob@example.com", "h").into_user();
        db.insert_user(&a).await.unwrap();
        db.insert_user(&b).await.unwrap();

        let others = db.list_users_except(a.id).await.unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].id, b.id);
    }
}
