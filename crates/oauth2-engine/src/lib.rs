//! An embeddable OAuth 2.0 authorization-server engine.
//!
//! Implements the RFC 6749 grant flows (authorization code, client
//! credentials, password, refresh token, implicit), bearer-token resource
//! protection (RFC 6750), token revocation (RFC 7009) and PKCE (RFC 7636)
//! without binding to any web framework or storage backend. Hosts implement
//! the capability traits in [`model`] over their own persistence and
//! identity systems, translate their framework's requests into [`Request`]
//! values, and hand both to an [`OAuth2Server`].
//!
//! ```
//! use oauth2_engine::Request;
//!
//! let request = Request::new("POST")
//!     .with_header("Content-Type", "application/x-www-form-urlencoded")
//!     .with_body_param("grant_type", "password")
//!     .with_body_param("username", "ada")
//!     .with_body_param("password", "pa55word");
//!
//! assert!(request.is_form_encoded());
//! assert_eq!(request.body_param("grant_type"), Some("password"));
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod grammar;
pub mod grants;
pub mod handlers;
pub mod model;
pub mod pkce;
pub mod request;
pub mod response_types;
pub mod scope;
pub mod server;
pub mod types;

pub use config::{
    AuthenticateOptions, AuthorizeOptions, RevokeOptions, ServerOptions, TokenOptions,
};
pub use error::OAuthError;
pub use handlers::{AuthenticateHandler, AuthorizeHandler, AuthorizeSuccess, RevokeHandler, TokenHandler};
pub use model::{
    AuthenticateModel, AuthorizationCodeModel, ClientCredentialsModel, ClientModel, IssueModel,
    Model, PasswordModel, RefreshTokenModel,
};
pub use request::{Request, Response};
pub use scope::Scope;
pub use server::OAuth2Server;
pub use types::{
    AccessToken, AuthorizationCode, BearerToken, Client, CodeChallengeMethod, RefreshToken,
    Token, User,
};
