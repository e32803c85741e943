use std::path::PathBuf;

use tracing::warn;

pub const DEFAULT_DB_PATH: &str = "students.db";
pub const DEFAULT_CSV_PATH: &str = "students.csv";
pub const DEFAULT_BCRYPT_COST: u32 = 12;

// bcrypt rejects costs outside this range.
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite file holding the `users` table.
    pub database_path: PathBuf,
    /// CSV file read by `load`.
    pub csv_path: PathBuf,
    pub bcrypt_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DB_PATH.into(),
            csv_path: DEFAULT_CSV_PATH.into(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to defaults.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("STUDENTS_DB")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.into());
        let csv_path = lookup("STUDENTS_CSV")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CSV_PATH.into());
        let bcrypt_cost = match lookup("BCRYPT_ROUNDS") {
            None => DEFAULT_BCRYPT_COST,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(cost) if (MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) => cost,
                _ => {
                    warn!(value = %raw, "BCRYPT_ROUNDS invalid; using {}", DEFAULT_BCRYPT_COST);
                    DEFAULT_BCRYPT_COST
                }
            },
        };
        Self {
            database_path: database_path.into(),
            csv_path: csv_path.into(),
            bcrypt_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_vars(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        assert_eq!(config_from(&[]), AppConfig::default());
        assert_eq!(AppConfig::default().bcrypt_cost, 12);
    }

    #[test]
    fn reads_overrides() {
        let cfg = config_from(&[
            ("STUDENTS_DB", "/tmp/x.db"),
            ("STUDENTS_CSV", "in.csv"),
            ("BCRYPT_ROUNDS", "10"),
        ]);
        assert_eq!(cfg.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.csv_path, PathBuf::from("in.csv"));
        assert_eq!(cfg.bcrypt_cost, 10);
    }

    #[test]
    fn bad_rounds_fall_back_to_default() {
        assert_eq!(config_from(&[("BCRYPT_ROUNDS", "lots")]).bcrypt_cost, 12);
        assert_eq!(config_from(&[("BCRYPT_ROUNDS", "3")]).bcrypt_cost, 12);
        assert_eq!(config_from(&[("BCRYPT_ROUNDS", "32")]).bcrypt_cost, 12);
    }
}
