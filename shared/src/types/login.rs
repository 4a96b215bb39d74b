use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Login wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Successful / failed login response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginResponse {
    Success {
        username: String,
        expires_in: u64,
        message: String,
        redirect: String,
    },
    Error {
        code: String,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Login errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    InvalidCredentials,
    MissingField(String),
    InvalidBody,
    LoginDisabled,
    InternalError,
}

impl LoginError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidBody => "INVALID_BODY",
            Self::LoginDisabled => "LOGIN_DISABLED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid username or password".to_string(),
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::InvalidBody => "Request body could not be parsed".to_string(),
            Self::LoginDisabled => "Admin login is not configured".to_string(),
            Self::InternalError => "An internal error occurred".to_string(),
        }
    }

    pub fn to_response(&self) -> LoginResponse {
        LoginResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}

impl LoginData {
    /// Trim the username and reject empty fields.
    pub fn validated(mut self) -> Result<Self, LoginError> {
        self.username = self.username.trim().to_string();
        if self.username.is_empty() {
            return Err(LoginError::MissingField("username".to_string()));
        }
        if self.password.is_empty() {
            return Err(LoginError::MissingField("password".to_string()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_username_is_missing() {
        let data = LoginData {
            username: "   ".into(),
            password: "pw".into(),
        };
        assert_eq!(
            data.validated().unwrap_err(),
            LoginError::MissingField("username".into())
        );
    }

    #[test]
    fn username_is_trimmed() {
        let data = LoginData {
            username: " admin ".into(),
            password: "pw".into(),
        };
        assert_eq!(data.validated().unwrap().username, "admin");
    }

    #[test]
    fn error_response_is_tagged() {
        let v = serde_json::to_value(LoginError::InvalidCredentials.to_response()).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["code"], "INVALID_CREDENTIALS");
    }
}
