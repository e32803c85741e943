use std::{fs::File, io::Read, path::Path, sync::Arc};

use csv::{ReaderBuilder, StringRecord};
use time::{macros::format_description, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::auth::{
    password::PasswordHasher,
    repo_types::{NewUser, UpsertMode, UpsertOutcome, DEFAULT_ROLE},
};
use crate::error::{ImportError, RowError};
use crate::import::dto::{Columns, ImportReport, ImportRow, SkippedRow, WrittenUser, REQUIRED_COLUMNS};
use crate::storage::UserStore;

/// A CSV input whose header already passed validation.
pub struct CsvSource<R> {
    reader: csv::Reader<R>,
    columns: Columns,
}

impl CsvSource<File> {
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ImportError::MissingInputFile(path.to_path_buf()),
            _ => ImportError::Csv(e.into()),
        })?;
        Self::from_reader(file)
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(input: R) -> Result<Self, ImportError> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);
        let columns = locate_columns(reader.headers()?)?;
        Ok(Self { reader, columns })
    }
}

fn locate_columns(headers: &StringRecord) -> Result<Columns, ImportError> {
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    match (
        position("username"),
        position("email"),
        position("temp_password"),
    ) {
        (Some(username), Some(email), Some(temp_password)) => Ok(Columns {
            username,
            email,
            temp_password,
        }),
        _ => Err(ImportError::MissingHeader {
            missing: REQUIRED_COLUMNS
                .into_iter()
                .filter(|&c| position(c).is_none())
                .map(String::from)
                .collect(),
        }),
    }
}

fn parse_row(record: &StringRecord, columns: Columns) -> Result<ImportRow, RowError> {
    let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
    let row = ImportRow {
        username: field(columns.username),
        email: field(columns.email),
        temp_password: field(columns.temp_password),
    };

    let empty_fields: Vec<&'static str> = [
        ("username", &row.username),
        ("email", &row.email),
        ("temp_password", &row.temp_password),
    ]
    .into_iter()
    .filter(|(_, v)| v.is_empty())
    .map(|(name, _)| name)
    .collect();

    if empty_fields.is_empty() {
        Ok(row)
    } else {
        Err(RowError::InvalidRow { empty_fields })
    }
}

/// Local wall-clock time, `YYYY-MM-DDTHH:MM:SS`.
pub fn timestamp_now() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]"
    ))
    .unwrap_or_default()
}

/// Bulk loader: hashes each row's temporary password and upserts it.
#[derive(Clone)]
pub struct Importer {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl Importer {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Bad rows are skipped and reported; they never abort the batch.
    #[instrument(skip_all, fields(cost = self.hasher.cost()))]
    pub async fn load<R: Read>(&self, source: CsvSource<R>) -> ImportReport {
        let CsvSource { reader, columns } = source;
        let mut report = ImportReport::default();

        for (idx, record) in reader.into_records().enumerate() {
            let line = idx + 1;
            let row = match record
                .map_err(|e| RowError::Malformed(e.to_string()))
                .and_then(|r| parse_row(&r, columns))
            {
                Ok(row) => row,
                Err(reason) => {
                    warn!(line, reason = %reason, "skipping row");
                    report.skipped.push(SkippedRow {
                        line,
                        username: None,
                        reason,
                    });
                    continue;
                }
            };

            match self.write_row(row.username.clone(), row.email, row.temp_password).await {
                Ok(outcome) => {
                    if outcome.mode == UpsertMode::Replaced {
                        warn!(line, username = %row.username, id = outcome.id, "upsert fell back to replace; id not preserved");
                    }
                    info!(line, username = %row.username, id = outcome.id, "user added/updated");
                    report.written.push(WrittenUser {
                        line,
                        username: row.username,
                        id: outcome.id,
                        mode: outcome.mode,
                    });
                }
                Err(reason) => {
                    error!(line, username = %row.username, reason = %reason, "failed to add user");
                    report.skipped.push(SkippedRow {
                        line,
                        username: Some(row.username),
                        reason,
                    });
                }
            }
        }

        info!(
            written = report.written_count(),
            skipped = report.skipped.len(),
            "import finished"
        );
        report
    }

    async fn write_row(
        &self,
        username: String,
        email: String,
        temp_password: String,
    ) -> Result<UpsertOutcome, RowError> {
        let password_hash = self.hasher.hash(&temp_password)?;
        drop(temp_password);

        let user = NewUser {
            username,
            email,
            password_hash,
            role: DEFAULT_ROLE.to_string(),
            created_at: timestamp_now(),
        };
        Ok(self.store.upsert_by_username(&user).await?)
    }
}
