use crate::auth::repo_types::UpsertMode;
use crate::error::RowError;

pub const REQUIRED_COLUMNS: [&str; 3] = ["username", "email", "temp_password"];

/// Positions of the required columns in the CSV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub username: usize,
    pub email: usize,
    pub temp_password: usize,
}

/// One trimmed, non-empty input row.
#[derive(Debug)]
pub struct ImportRow {
    pub username: String,
    pub email: String,
    pub temp_password: String,
}

#[derive(Debug)]
pub struct WrittenUser {
    pub line: usize,
    pub username: String,
    pub id: i64,
    pub mode: UpsertMode,
}

#[derive(Debug)]
pub struct SkippedRow {
    pub line: usize,
    pub username: Option<String>,
    pub reason: RowError,
}

/// Outcome of one load: rows are numbered from 1, the first line after the header.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub written: Vec<WrittenUser>,
    pub skipped: Vec<SkippedRow>,
}

impl ImportReport {
    pub fn written_count(&self) -> usize {
        self.written.len()
    }

    /// Rows that went through the delete-and-reinsert path.
    pub fn ids_not_preserved(&self) -> usize {
        self.written
            .iter()
            .filter(|w| w.mode == UpsertMode::Replaced)
            .count()
    }
}
