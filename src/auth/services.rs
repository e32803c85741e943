use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::auth::password::PasswordHasher;
use crate::error::StoreError;
use crate::storage::UserStore;

/// Checks a username/password pair against the stored hash.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl Authenticator {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// `Ok(false)` for both unknown users and wrong passwords; `Err` only on storage faults.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let username = username.trim();
        let user = match self.store.find_by_username(username).await? {
            Some(u) => u,
            None => {
                warn!("login unknown username");
                return Ok(self.hasher.burn(password));
            }
        };

        if self.hasher.verify(password, &user.password_hash) {
            info!(user_id = user.id, "user logged in");
            Ok(true)
        } else {
            warn!(user_id = user.id, "login invalid password");
            Ok(false)
        }
    }
}
