use crate::config::AdminConfig;

/// Static credential check for the admin login endpoint.
///
/// Stateless: nothing is issued on success, and no other route consults it.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    email: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn check(&self, email: &str, password: &str) -> bool {
        email == self.email && password == self.password
    }
}

impl From<&AdminConfig> for AdminCredentials {
    fn from(config: &AdminConfig) -> Self {
        Self::new(config.email.clone(), config.password.clone())
    }
}
