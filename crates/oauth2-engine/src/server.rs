//! The embeddable authorization-server facade.

use std::sync::Arc;

use crate::config::{
    AuthenticateOptions, AuthorizeOptions, RevokeOptions, ServerOptions, TokenOptions,
};
use crate::error::OAuthError;
use crate::handlers::{
    AuthenticateHandler, AuthorizeHandler, AuthorizeSuccess, RevokeHandler, TokenHandler,
    write_error_response,
};
use crate::model::Model;
use crate::request::{Request, Response};
use crate::types::{AccessToken, Token};

/// An OAuth 2.0 authorization server over a host-provided model.
///
/// The server is transport-agnostic: the host maps its framework's request
/// into a [`Request`], calls an endpoint method, and maps the [`Response`]
/// back out. Handlers are built per call so per-call option overrides apply
/// cleanly.
pub struct OAuth2Server<M> {
    model: Arc<M>,
    options: ServerOptions,
}

impl<M: Model + 'static> OAuth2Server<M> {
    /// Create a server with default options.
    pub fn new(model: Arc<M>) -> Self {
        Self::with_options(model, ServerOptions::default())
    }

    /// Create a server with the given options.
    pub fn with_options(model: Arc<M>, options: ServerOptions) -> Self {
        Self { model, options }
    }

    /// Validate the bearer token on a protected-resource request.
    pub async fn authenticate(
        &self,
        request: &Request,
        response: &mut Response,
        options: Option<AuthenticateOptions>,
    ) -> Result<AccessToken, OAuthError> {
        let effective = options.unwrap_or_default().apply(&self.options);
        let handler = AuthenticateHandler::new(Arc::clone(&self.model), &effective);
        let result = handler.handle(request, response).await;
        if let Err(err) = &result {
            write_error_response(response, err);
        }
        result
    }

    /// Process an authorization request (`response_type=code` or `token`).
    pub async fn authorize(
        &self,
        request: &Request,
        response: &mut Response,
        options: Option<AuthorizeOptions>,
    ) -> Result<AuthorizeSuccess, OAuthError> {
        let effective = options.unwrap_or_default().apply(&self.options);
        let handler = AuthorizeHandler::new(Arc::clone(&self.model), &effective);
        let result = handler.handle(request, response).await;
        if let Err(err) = &result {
            // Redirected errors already wrote a Location header; everything
            // else gets the standard error body.
            if response.header("location").is_none() {
                write_error_response(response, err);
            }
        }
        result
    }

    /// Process a token request.
    pub async fn token(
        &self,
        request: &Request,
        response: &mut Response,
        options: Option<TokenOptions>,
    ) -> Result<Token, OAuthError> {
        let effective = options.unwrap_or_default().apply(&self.options);
        let handler = TokenHandler::new(Arc::clone(&self.model), &effective);
        handler.handle(request, response).await
    }

    /// Process a token revocation request.
    pub async fn revoke(
        &self,
        request: &Request,
        response: &mut Response,
        options: Option<RevokeOptions>,
    ) -> Result<(), OAuthError> {
        let handler = RevokeHandler::new(Arc::clone(&self.model), &options.unwrap_or_default());
        handler.handle(request, response).await
    }
}
