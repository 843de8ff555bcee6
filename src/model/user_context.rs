use serde::{Deserialize, Serialize};

/// Caller identity, as resolved by the authentication layer in front of the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

impl UserContext {
    /// Create a new UserContext with just a user ID
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            user_email: None,
            user_name: None,
            admin: false,
        }
    }

    /// Create a UserContext with full user information
    pub fn with_details(user_id: String, email: Option<String>, name: Option<String>) -> Self {
        Self {
            user_id,
            user_email: email,
            user_name: name,
            admin: false,
        }
    }

    pub fn as_admin(mut self) -> Self {
        self.admin = true;
        self
    }

    /// Create a system user context for internal operations
    pub fn system() -> Self {
        Self {
            user_id: "system".to_string(),
            user_email: Some("system@phenolink.internal".to_string()),
            user_name: Some("System".to_string()),
            admin: true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_context_creation() {
        let ctx = UserContext::with_details(
            "user123".to_string(),
            Some("user@example.com".to_string()),
            Some("Test User".to_string()),
        );

        assert_eq!(ctx.user_id, "user123");
        assert_eq!(ctx.user_email, Some("user@example.com".to_string()));
        assert!(!ctx.is_admin());
        assert!(ctx.as_admin().is_admin());
    }

    #[test]
    fn test_system_user_is_admin() {
        assert!(UserContext::system().is_admin());
    }
}
