//! User identity record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trk_core::Id;

/// A registered user.
///
/// `password_hash` is `None` for accounts created through federation; such
/// accounts can only sign in via the external provider until a password is
/// set.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this account was created via an external identity provider
    pub fn is_federated(&self) -> bool {
        self.password_hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(hash: Option<&str>) -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: hash.map(String::from),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_federated_detection() {
        assert!(user(None).is_federated());
        assert!(!user(Some("$argon2id$...")).is_federated());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_value(user(Some("$argon2id$..."))).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }
}
