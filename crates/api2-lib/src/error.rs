use thiserror::Error;

/// Convenient result alias for the api2 library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Every variant maps to an HTTP status through [`Error::status_code`], so the
/// HTTP layer can shape a response without probing the error at runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// No credential was supplied with the request.
    #[error("Missing authorization credential")]
    MissingCredential,

    /// The `select` query parameter was not a valid filter document.
    #[error("Invalid select parameter: {message}")]
    InvalidSelect { message: String },

    /// The remote service rejected the request.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The remote service answered with a body that could not be decoded.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// A path segment could not be placed into the remote URL.
    #[error("invalid remote url: {0}")]
    InvalidUrl(String),

    /// Wrapper for HTTP transport errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// HTTP status code carried by this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MissingCredential => 401,
            Error::InvalidSelect { .. } => 400,
            Error::Upstream { status, .. } => *status,
            Error::Http(err) => match err.status() {
                Some(status) => status.as_u16(),
                None if err.is_timeout() || err.is_connect() || err.is_request() => 502,
                None => 500,
            },
            Error::Decode { .. } | Error::InvalidUrl(_) => 500,
        }
    }

    /// Build an upstream error from a status code and message.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::MissingCredential.status_code(), 401);
        assert_eq!(
            Error::InvalidSelect {
                message: "eof".to_string()
            }
            .status_code(),
            400
        );
        assert_eq!(Error::upstream(404, "Record not found").status_code(), 404);
        assert_eq!(Error::InvalidUrl("bad".to_string()).status_code(), 500);
    }

    #[test]
    fn test_upstream_message_is_verbatim() {
        let err = Error::upstream(422, "Unknown field name: \"Nope\"");
        assert_eq!(err.to_string(), "Unknown field name: \"Nope\"");
    }
}
