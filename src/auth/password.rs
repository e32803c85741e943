use tracing::{debug, error};

use crate::error::CredentialError;

/// Salt and digest of a real bcrypt artifact; nothing verifies against it.
const DUMMY_SALT_AND_DIGEST: &str = "R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";

/// Salted bcrypt hashing with a fixed work factor.
///
/// Artifacts are self-describing (`$2b$<cost>$<salt><digest>`), so verification
/// uses whatever cost the stored artifact was produced with.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy: dummy_artifact(cost),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, plain: &str) -> Result<String, CredentialError> {
        if plain.is_empty() {
            return Err(CredentialError::EmptyPassword);
        }
        // bcrypt draws a fresh salt from the OS rng on every call
        bcrypt::hash(plain, self.cost).map_err(|e| {
            error!(error = %e, cost = self.cost, "bcrypt hash error");
            CredentialError::from(e)
        })
    }

    /// Malformed artifacts verify as `false`.
    pub fn verify(&self, plain: &str, artifact: &str) -> bool {
        match bcrypt::verify(plain, artifact) {
            Ok(ok) => ok,
            Err(e) => {
                debug!(error = %e, "unparseable password hash");
                false
            }
        }
    }

    /// Spends exactly one verification at the configured cost and returns `false`.
    pub fn burn(&self, plain: &str) -> bool {
        if let Err(e) = bcrypt::verify(plain, &self.dummy) {
            debug!(error = %e, cost = self.cost, "dummy verification did no work");
        }
        false
    }
}

fn dummy_artifact(cost: u32) -> String {
    format!("$2b${:02}${}", cost, DUMMY_SALT_AND_DIGEST)
}
