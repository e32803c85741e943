use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::auth::repo_types::{NewUser, UpsertMode, UpsertOutcome, User};
use crate::db;
use crate::error::StoreError;

/// First SQLite release with `INSERT ... ON CONFLICT ... DO UPDATE`.
const UPSERT_MIN_VERSION: (u32, u32, u32) = (3, 24, 0);

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn ensure_schema(&self) -> Result<(), StoreError>;
    /// Insert-or-update keyed on the unique username, atomic per call.
    async fn upsert_by_username(&self, user: &NewUser) -> Result<UpsertOutcome, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn list_all(&self) -> Result<Vec<User>, StoreError>;
}

/// Which conflict clause the linked SQLite understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictSupport {
    OnConflictUpdate,
    ReplaceOnly,
}

#[derive(Clone)]
pub struct SqliteUserStore {
    db: SqlitePool,
    conflict: ConflictSupport,
}

impl SqliteUserStore {
    /// Probes the SQLite version once and picks the upsert strategy.
    pub async fn new(db: SqlitePool) -> Result<Self, StoreError> {
        let version = db::sqlite_version(&db).await?;
        let conflict = if version >= UPSERT_MIN_VERSION {
            ConflictSupport::OnConflictUpdate
        } else {
            warn!(
                version = ?version,
                "sqlite lacks ON CONFLICT DO UPDATE; re-imported users will get new ids"
            );
            ConflictSupport::ReplaceOnly
        };
        debug!(?conflict, "user store ready");
        Ok(Self { db, conflict })
    }

    #[cfg(test)]
    pub fn with_conflict_support(db: SqlitePool, conflict: ConflictSupport) -> Self {
        Self { db, conflict }
    }

    pub fn conflict_support(&self) -> ConflictSupport {
        self.conflict
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        db::ensure_schema(&self.db).await?;
        Ok(())
    }

    async fn upsert_by_username(&self, user: &NewUser) -> Result<UpsertOutcome, StoreError> {
        let mut tx = self.db.begin().await?;
        let (id, mode) = match self.conflict {
            ConflictSupport::OnConflictUpdate => (User::upsert(&mut tx, user).await?, UpsertMode::Atomic),
            ConflictSupport::ReplaceOnly => (User::replace(&mut tx, user).await?, UpsertMode::Replaced),
        };
        tx.commit().await?;
        Ok(UpsertOutcome { id, mode })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_username(&self.db, username).await?)
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(User::list_all(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str, hash: &str, at: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: hash.into(),
            role: "student".into(),
            created_at: at.into(),
        }
    }

    async fn store_with(conflict: ConflictSupport) -> SqliteUserStore {
        let db = db::connect_memory().await.unwrap();
        let store = SqliteUserStore::with_conflict_support(db, conflict);
        store.ensure_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn bundled_sqlite_supports_on_conflict() {
        let db = db::connect_memory().await.unwrap();
        let store = SqliteUserStore::new(db).await.unwrap();
        assert_eq!(store.conflict_support(), ConflictSupport::OnConflictUpdate);
    }

    #[tokio::test]
    async fn upsert_preserves_id_and_updates_fields() {
        let store = store_with(ConflictSupport::OnConflictUpdate).await;
        let first = store
            .upsert_by_username(&new_user("alice", "a@x.com", "h1", "2024-01-01T00:00:00"))
            .await
            .unwrap();
        store
            .upsert_by_username(&new_user("bob", "b@x.com", "h2", "2024-01-01T00:00:00"))
            .await
            .unwrap();
        let second = store
            .upsert_by_username(&new_user("alice", "a2@x.com", "h3", "2024-02-02T10:00:00"))
            .await
            .unwrap();

        assert_eq!(first, UpsertOutcome { id: 1, mode: UpsertMode::Atomic });
        assert_eq!(second.id, 1);

        let alice = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.id, 1);
        assert_eq!(alice.email, "a2@x.com");
        assert_eq!(alice.password_hash, "h3");
        assert_eq!(alice.created_at, "2024-02-02T10:00:00");
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn replace_fallback_reports_new_id() {
        let store = store_with(ConflictSupport::ReplaceOnly).await;
        let first = store
            .upsert_by_username(&new_user("alice", "a@x.com", "h1", "t1"))
            .await
            .unwrap();
        let second = store
            .upsert_by_username(&new_user("alice", "a2@x.com", "h2", "t2"))
            .await
            .unwrap();

        assert_eq!(second.mode, UpsertMode::Replaced);
        assert_ne!(first.id, second.id);
        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].email, "a2@x.com");
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive() {
        let store = store_with(ConflictSupport::OnConflictUpdate).await;
        store.upsert_by_username(&new_user("Alice", "a@x", "h", "t")).await.unwrap();
        store.upsert_by_username(&new_user("alice", "b@x", "h", "t")).await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 2);
        assert!(store.find_by_username("ALICE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_all_on_empty_store() {
        let store = store_with(ConflictSupport::OnConflictUpdate).await;
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_table_is_a_storage_fault() {
        let db = db::connect_memory().await.unwrap();
        let store = SqliteUserStore::with_conflict_support(db, ConflictSupport::OnConflictUpdate);
        let err = store.find_by_username("alice").await.unwrap_err();
        assert!(err.to_string().starts_with("storage fault"));
    }
}
