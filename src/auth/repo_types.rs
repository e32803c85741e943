use serde::Serialize;
use sqlx::FromRow;

pub const DEFAULT_ROLE: &str = "student";

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,                // stable across upserts
    pub username: String,       // unique, case-sensitive
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,  // bcrypt artifact, never serialized
    pub role: String,
    pub created_at: String,     // local time, second precision
}

/// A fully validated row ready to be written.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

/// How an upsert resolved a username conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    /// `ON CONFLICT ... DO UPDATE`; the existing id was kept.
    Atomic,
    /// `INSERT OR REPLACE`; an existing row was deleted and re-inserted under a new id.
    Replaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: i64,
    pub mode: UpsertMode,
}
