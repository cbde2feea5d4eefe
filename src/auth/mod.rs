pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};

// Re-export necessary items
pub use extractors::{AuthenticatedUserId, ResetUserId};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenKeys, TokenPurpose};

/// Minimum accepted password length for signup and password changes.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Minimal syntactic email check: the address must contain both an "@" and a
/// ".". Deliberately not RFC validation.
pub fn has_email_shape(email: &str) -> bool {
    email.contains('@') && email.contains('.')
}

/// Represents the payload for a user login request.
///
/// Fields are optional so that a missing field maps to the API's 401
/// "missing credentials" contract instead of a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// User's email address.
    pub email: Option<String>,
    /// User's password.
    pub password: Option<String>,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// Email address for the new account.
    pub email: Option<String>,
    /// Password for the new account; must be at least 8 characters long.
    pub password: Option<String>,
    /// The user's given name.
    pub given_name: Option<String>,
    /// The user's last name.
    pub last_name: Option<String>,
}

/// Response structure after a successful login.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The JWT (JSON Web Token) for session authentication.
    pub token: String,
    /// Remaining lifetime of the token, in seconds.
    pub expires_in: u64,
}

/// Payload for requesting a password-reset email.
#[derive(Debug, Deserialize)]
pub struct ResetEmailRequest {
    pub email: Option<String>,
}

/// Payload for applying a password reset (bearer reset token required).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: Option<String>,
}

/// Payload for an authenticated password change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape_check() {
        assert!(has_email_shape("test@example.com"));
        assert!(has_email_shape("a@b.c"));

        assert!(!has_email_shape("testexample.com")); // no @
        assert!(!has_email_shape("test@examplecom")); // no .
        assert!(!has_email_shape(""));
    }

    #[test]
    fn test_signup_request_tolerates_missing_fields() {
        // Missing fields deserialize to None so handlers can answer 401
        // instead of actix's generic deserialization 400.
        let parsed: SignupRequest = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(parsed.email.as_deref(), Some("a@b.c"));
        assert!(parsed.password.is_none());
        assert!(parsed.given_name.is_none());
        assert!(parsed.last_name.is_none());
    }

    #[test]
    fn test_auth_response_wire_shape() {
        let response = AuthResponse {
            token: "abc".to_string(),
            expires_in: 7200,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token"], "abc");
        assert_eq!(json["expiresIn"], 7200);
    }
}
