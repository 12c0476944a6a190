use async_graphql::{Error, ErrorExtensions};

/// The value of the ``code`` extension of a user facing error
pub const USER_ERROR: &str = "USER_ERROR";
/// The value of the ``code`` extension if the request lacks valid credentials
pub const AUTHENTICATION_ERROR: &str = "AUTHENTICATION_ERROR";

/// UserError
///
/// An error the client caused and can act on, e.g. a password confirmation that
/// does not match. The detailed errors end up in ``extensions.detailed_errors``
/// next to ``extensions.code``.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserError {
    pub message: String,
    pub code: &'static str,
    pub detailed_errors: Vec<String>,
}

impl UserError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: USER_ERROR,
            detailed_errors: vec![],
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self {
            code: AUTHENTICATION_ERROR,
            ..Self::new(message)
        }
    }

    pub fn with_details(mut self, detailed_errors: Vec<String>) -> Self {
        self.detailed_errors = detailed_errors;
        self
    }
}

impl From<UserError> for Error {
    fn from(err: UserError) -> Self {
        let UserError {
            message,
            code,
            detailed_errors,
        } = err;
        Error::new(message).extend_with(|_, e| {
            e.set("code", code);
            if !detailed_errors.is_empty() {
                e.set("detailed_errors", detailed_errors);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::Value;

    #[test]
    fn test_user_error_extensions() {
        let err: Error = UserError::new("Invalid password")
            .with_details(vec!["Password confirmation doesn't match".to_string()])
            .into();
        let extensions = err.extensions.expect("extensions are set");
        assert_eq!(
            extensions.get("code"),
            Some(&Value::String(USER_ERROR.to_string()))
        );
        assert_eq!(
            extensions.get("detailed_errors"),
            Some(&Value::List(vec![Value::String(
                "Password confirmation doesn't match".to_string()
            )]))
        );
    }

    #[test]
    fn test_authentication_error_has_no_details() {
        let err: Error = UserError::authentication("User is not logged in.").into();
        let extensions = err.extensions.expect("extensions are set");
        assert!(extensions.get("detailed_errors").is_none());
    }
}
