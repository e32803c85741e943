use serde::Serialize;

use crate::auth::repo_types::User;
use crate::error::StoreError;
use crate::storage::UserStore;

const HEADERS: [&str; 6] = ["id", "username", "email", "role", "created_at", "password_hash"];

/// How much of the stored hash artifact to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashDisplay {
    /// Algorithm and cost only, e.g. `$2b$12$…`.
    #[default]
    Redacted,
    /// The full artifact. Admin/debug use only.
    Full,
}

impl HashDisplay {
    fn render(self, artifact: &str) -> String {
        match self {
            HashDisplay::Full => artifact.to_string(),
            HashDisplay::Redacted => {
                // `$2b$12$` is everything up to the third '$'
                match artifact.match_indices('$').nth(2) {
                    Some((idx, _)) => format!("{}…", &artifact[..=idx]),
                    None => "…".to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportRow<'a> {
    #[serde(flatten)]
    pub user: &'a User,
    pub password_hash: String,
}

/// Every stored user, ascending by id.
pub async fn list_users(store: &dyn UserStore) -> Result<Vec<User>, StoreError> {
    store.list_all().await
}

pub fn render_table(users: &[User], hashes: HashDisplay) -> String {
    let rows: Vec<[String; 6]> = users
        .iter()
        .map(|u| {
            [
                u.id.to_string(),
                u.username.clone(),
                u.email.clone(),
                u.role.clone(),
                u.created_at.clone(),
                hashes.render(&u.password_hash),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(String::from), &widths);
    let total = widths.iter().sum::<usize>() + 3 * (widths.len() - 1);
    out.push_str(&"-".repeat(total));
    out.push('\n');
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn render_json(users: &[User], hashes: HashDisplay) -> serde_json::Result<String> {
    let rows: Vec<ReportRow<'_>> = users
        .iter()
        .map(|user| ReportRow {
            user,
            password_hash: hashes.render(&user.password_hash),
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}
