use std::path::PathBuf;

use thiserror::Error;

/// Errors from the credential hasher.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("empty password")]
    EmptyPassword,
    #[error("bcrypt: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Storage faults: I/O, constraint violations outside the upsert path, bad schema.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage fault: {0}")]
    Fault(#[from] sqlx::Error),
}

/// Errors that abort a whole import before any row is written.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV file not found at {}", .0.display())]
    MissingInputFile(PathBuf),
    #[error("CSV must contain headers: email, temp_password, username (missing: {})", .missing.join(", "))]
    MissingHeader { missing: Vec<String> },
    #[error("cannot read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Why a single row was skipped. None of these stop the batch.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("missing {}", .empty_fields.join("/"))]
    InvalidRow { empty_fields: Vec<&'static str> },
    #[error("unreadable row: {0}")]
    Malformed(String),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = ImportError::MissingInputFile(PathBuf::from("students.csv"));
        assert_eq!(err.to_string(), "CSV file not found at students.csv");

        let err = ImportError::MissingHeader {
            missing: vec!["temp_password".into()],
        };
        assert!(err.to_string().contains("missing: temp_password"));

        let err = RowError::InvalidRow {
            empty_fields: vec!["email", "temp_password"],
        };
        assert_eq!(err.to_string(), "missing email/temp_password");

        let err = RowError::from(CredentialError::EmptyPassword);
        assert_eq!(err.to_string(), "empty password");
    }
}
