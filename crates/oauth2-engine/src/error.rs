//! OAuth 2.0 error taxonomy.
//!
//! Uses `thiserror` for structured error handling. Every protocol error
//! carries a stable machine name (the RFC 6749 `error` code), an HTTP status
//! and a human-readable message. Adapter failures that are not already OAuth
//! errors are wrapped as `Server` errors with the original preserved as the
//! source.

/// Protocol errors returned by the engine.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// The request is missing a parameter or is otherwise malformed (RFC 6749 §5.2).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client authentication failed (RFC 6749 §5.2).
    ///
    /// The status defaults to 400 and is upgraded to 401 when the request
    /// attempted HTTP Basic authentication.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Error detail.
        message: String,
        /// HTTP status to respond with (400 or 401).
        status: u16,
    },

    /// The provided grant (code, credentials, refresh token) is invalid,
    /// expired, revoked or was issued to another client (RFC 6749 §5.2).
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    /// The authenticated client is not authorized to use this grant type.
    #[error("Unauthorized client: {0}")]
    UnauthorizedClient(String),

    /// The grant type is not supported by the authorization server.
    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// The requested scope is invalid, unknown or malformed.
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// The access token is invalid, expired or revoked (RFC 6750 §3.1).
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token's scope does not cover the protected resource (RFC 6750 §3.1).
    #[error("Insufficient scope: {0}")]
    InsufficientScope(String),

    /// The resource owner denied the authorization request.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The request lacks any form of authentication (RFC 6750 §3).
    #[error("Unauthorized request: {0}")]
    UnauthorizedRequest(String),

    /// The authorization server does not support this response type.
    #[error("Unsupported response type: {0}")]
    UnsupportedResponseType(String),

    /// An adapter contract violation or any other non-protocol failure.
    #[error("Server error: {message}")]
    Server {
        /// Error detail.
        message: String,
        /// The underlying failure, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Construction-time misconfiguration. Never produced by request handling.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Multiple failures from concurrent lookups (revocation's dual search).
    #[error("{}", aggregate_message(.0))]
    Aggregate(Vec<OAuthError>),
}

fn aggregate_message(errors: &[OAuthError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl OAuthError {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an invalid client error with the default 400 status.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient { message: message.into(), status: 400 }
    }

    /// Create an invalid grant error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant(message.into())
    }

    /// Create an invalid scope error.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::InvalidScope(message.into())
    }

    /// Create an invalid token error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    /// Create a server error without an underlying cause.
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server { message: message.into(), source: None }
    }

    /// Create a server error that preserves the underlying cause.
    #[must_use]
    pub fn server_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Server { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Convert a model (adapter) failure into a protocol error.
    ///
    /// A model may fail with an `OAuthError` of its own, which passes through
    /// untouched. Anything else is an integration failure and is wrapped as a
    /// `Server` error with the cause preserved.
    #[must_use]
    pub fn from_model_error(err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(oauth) => oauth,
            Err(other) => Self::Server {
                message: other.to_string(),
                source: Some(other.into()),
            },
        }
    }

    /// Upgrade an `InvalidClient` error to 401 after a failed HTTP Basic
    /// authentication attempt. Other kinds are returned unchanged.
    #[must_use]
    pub fn with_unauthorized_status(self) -> Self {
        match self {
            Self::InvalidClient { message, .. } => Self::InvalidClient { message, status: 401 },
            other => other,
        }
    }

    /// The stable machine-readable error code (RFC `error` field).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnauthorizedClient(_) => "unauthorized_client",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::InvalidScope(_) => "invalid_scope",
            Self::InvalidToken(_) => "invalid_token",
            Self::InsufficientScope(_) => "insufficient_scope",
            Self::AccessDenied(_) => "access_denied",
            Self::UnauthorizedRequest(_) => "unauthorized_request",
            Self::UnsupportedResponseType(_) => "unsupported_response_type",
            Self::Server { .. } => "server_error",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Aggregate(errors) => Self::primary_of(errors).map_or("server_error", Self::name),
        }
    }

    /// The HTTP status code associated with this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidGrant(_)
            | Self::UnauthorizedClient(_)
            | Self::UnsupportedGrantType(_)
            | Self::InvalidScope(_)
            | Self::UnsupportedResponseType(_) => 400,
            Self::InvalidClient { status, .. } => *status,
            Self::InvalidToken(_) | Self::UnauthorizedRequest(_) => 401,
            Self::InsufficientScope(_) | Self::AccessDenied(_) => 403,
            Self::Server { .. } | Self::InvalidArgument(_) => 500,
            Self::Aggregate(errors) => Self::primary_of(errors).map_or(500, Self::status_code),
        }
    }

    /// Whether this error reports an invalid token, per RFC 7009 §2.2.
    ///
    /// An aggregate counts only when every member does, so a revocation where
    /// both the access-token and refresh-token lookups missed is suppressed
    /// from the response while a mixed failure is not.
    #[must_use]
    pub fn is_invalid_token(&self) -> bool {
        match self {
            Self::InvalidToken(_) => true,
            Self::Aggregate(errors) => {
                !errors.is_empty() && errors.iter().all(Self::is_invalid_token)
            }
            _ => false,
        }
    }

    /// The error used to render an aggregate: its first member that is not an
    /// invalid-token error, falling back to the first member.
    fn primary_of(errors: &[OAuthError]) -> Option<&OAuthError> {
        errors.iter().find(|e| !e.is_invalid_token()).or_else(|| errors.first())
    }
}
