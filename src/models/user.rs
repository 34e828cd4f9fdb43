use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered user, as returned by the API.
///
/// The bcrypt password hash lives in the `password_hash` column but is never
/// selected into this type, so it cannot leak into a response body.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_has_no_password_field() {
        let user = User {
            id: 1,
            email: "test@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            is_active: true,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["is_active"], true);
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
