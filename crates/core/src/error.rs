/// Domain errors raised before or after a store interaction.
///
/// `Http` carries an HTTP-class status so a routing layer can forward it
/// unchanged; everything a caller can fix by changing the request is a
/// 4xx status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The `HttpError` tag: validation failures and classified store
    /// constraint violations.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The mapper deliberately does not support this operation.
    #[error("Method not implemented: {0}")]
    MethodNotImplemented(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// A 400 carrying a validation message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::http(400, message)
    }

    pub fn not_supported() -> Self {
        Self::MethodNotImplemented("This method is not supported by this class".into())
    }

    /// HTTP-class status a caller should report for this error.
    pub fn status(&self) -> u16 {
        match self {
            CoreError::Http { status, .. } => *status,
            CoreError::MethodNotImplemented(_) => 501,
            CoreError::NotFound(_) => 404,
            CoreError::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_bare_message() {
        let err = CoreError::validation("data.name should NOT be shorter than 1 characters");
        assert_eq!(
            err.to_string(),
            "data.name should NOT be shorter than 1 characters"
        );
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn not_supported_is_501() {
        assert_eq!(CoreError::not_supported().status(), 501);
    }
}
