//! API authentication

use crate::Result;

const KEYRING_SERVICE: &str = "sprintboard";

pub struct ApiAuth {
    token: String,
}

impl ApiAuth {
    pub fn new(token: String) -> Self {
        Self { token }
    }

    /// Read the token stored for `username` in the OS keyring
    pub fn from_keyring(username: &str) -> Result<Self> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, username)?;
        Ok(Self::new(entry.get_password()?))
    }

    pub fn store_in_keyring(&self, username: &str) -> Result<()> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, username)?;
        entry.set_password(&self.token)?;
        Ok(())
    }

    pub fn to_bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for ApiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiAuth").field("token", &"***").finish()
    }
}
