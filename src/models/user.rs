use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::Id;

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub email: String,
    #[serde(default, alias = "full_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Response of `/auth/login` and `/auth/register`.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "token")]
    pub access_token: SecretString,
    pub user: User,
}

/// Partial profile update for `PUT /auth/profile`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn auth_response_accepts_token_alias() {
        let auth: AuthResponse = serde_json::from_str(
            r#"{"token": "abc", "user": {"email": "a@example.com", "name": "A"}}"#,
        )
        .unwrap();
        assert_eq!(auth.access_token.expose_secret(), "abc");
        assert_eq!(auth.user.id, None);
    }

    #[test]
    fn empty_profile_update_serializes_to_empty_object() {
        let body = serde_json::to_string(&ProfileUpdate::default()).unwrap();
        assert_eq!(body, "{}");
    }
}
