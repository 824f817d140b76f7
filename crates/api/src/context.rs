use uuid::Uuid;

/// Session context for a request (the signed-in technician).
///
/// Inserted by the session middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    token: Uuid,
    username: String,
}

impl SessionContext {
    pub fn new(token: Uuid, username: impl Into<String>) -> Self {
        Self {
            token,
            username: username.into(),
        }
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
