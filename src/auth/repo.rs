use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::auth::repo_types::{NewUser, User};

impl User {
    /// Find a user by exact username.
    pub async fn find_by_username(db: &SqlitePool, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, created_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await
    }

    /// All users, oldest id first.
    pub async fn list_all(db: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await
    }

    /// Insert, or update every column but `id` when the username exists.
    pub async fn upsert(tx: &mut Transaction<'_, Sqlite>, user: &NewUser) -> Result<i64, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(username) DO UPDATE SET
                email = excluded.email,
                password_hash = excluded.password_hash,
                role = excluded.role,
                created_at = excluded.created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(&user.created_at)
        .execute(&mut **tx)
        .await?;
        Self::id_for(tx, &user.username).await
    }

    /// Delete-and-reinsert on conflict. The row gets a fresh id.
    pub async fn replace(tx: &mut Transaction<'_, Sqlite>, user: &NewUser) -> Result<i64, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO users (username, email, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(&user.created_at)
        .execute(&mut **tx)
        .await?;
        Self::id_for(tx, &user.username).await
    }

    async fn id_for(tx: &mut Transaction<'_, Sqlite>, username: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?1")
            .bind(username)
            .fetch_one(&mut **tx)
            .await
    }
}
