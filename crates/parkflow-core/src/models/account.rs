use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Accounts are keyed by email
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Acknowledgement carrying an optional human-readable message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthMessage {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "firstName", alias = "first_name", default)]
    pub first_name: String,
    #[serde(rename = "lastName", alias = "last_name", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_accepts_both_spellings() {
        let camel: Profile =
            serde_json::from_str(r#"{"firstName":"Ada","lastName":"Lovelace","email":"a@x.io"}"#).unwrap();
        let snake: Profile =
            serde_json::from_str(r#"{"first_name":"Ada","last_name":"Lovelace"}"#).unwrap();

        assert_eq!(camel.full_name(), "Ada Lovelace");
        assert_eq!(snake.full_name(), "Ada Lovelace");
        assert_eq!(snake.email, "");
    }

    #[test]
    fn test_register_request_is_camel_case() {
        let body = serde_json::to_value(RegisterRequest {
            username: "a@x.io".into(),
            password: "pw".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        })
        .unwrap();
        assert_eq!(body["firstName"], "Ada");
        assert_eq!(body["lastName"], "Lovelace");
    }
}
