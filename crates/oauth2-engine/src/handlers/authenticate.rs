//! Resource-protection handler: bearer token validation (RFC 6750).

use std::sync::Arc;

use chrono::Utc;

use super::BEARER_CHALLENGE;
use crate::config::ServerOptions;
use crate::error::OAuthError;
use crate::model::AuthenticateModel;
use crate::request::{Request, Response};
use crate::scope::Scope;
use crate::types::AccessToken;

/// Validates the bearer token presented with a protected-resource request.
pub struct AuthenticateHandler<M> {
    model: Arc<M>,
    scope: Option<Scope>,
    add_accepted_scopes_header: bool,
    add_authorized_scopes_header: bool,
    allow_bearer_tokens_in_query_string: bool,
}

impl<M: AuthenticateModel> AuthenticateHandler<M> {
    /// Create the handler from the effective options.
    pub fn new(model: Arc<M>, options: &ServerOptions) -> Self {
        Self {
            model,
            scope: options.scope.clone(),
            add_accepted_scopes_header: options.add_accepted_scopes_header,
            add_authorized_scopes_header: options.add_authorized_scopes_header,
            allow_bearer_tokens_in_query_string: options.allow_bearer_tokens_in_query_string,
        }
    }

    /// Validate the request's bearer token and return its record.
    ///
    /// On a missing token the response gains a `WWW-Authenticate: Bearer`
    /// challenge; scope headers are written on success when enabled.
    pub async fn handle(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<AccessToken, OAuthError> {
        let token_value = match self.token_from_request(request) {
            Ok(value) => value,
            Err(err) => {
                if matches!(err, OAuthError::UnauthorizedRequest(_)) {
                    response.set_header("www-authenticate", BEARER_CHALLENGE);
                }
                return Err(err);
            }
        };

        let token = self
            .model
            .get_access_token(token_value)
            .await
            .map_err(OAuthError::from_model_error)?
            .ok_or_else(|| OAuthError::invalid_token("access token is invalid"))?;

        let Some(expires_at) = token.access_token_expires_at else {
            return Err(OAuthError::server("`access_token_expires_at` must be set"));
        };
        if expires_at <= Utc::now() {
            return Err(OAuthError::invalid_token("access token has expired"));
        }

        if let Some(required) = &self.scope {
            let authorized = self
                .model
                .verify_scope(&token, required)
                .await
                .map_err(OAuthError::from_model_error)?;
            if !authorized {
                return Err(OAuthError::InsufficientScope(
                    "authorized scope is insufficient".into(),
                ));
            }
            if self.add_accepted_scopes_header {
                response.set_header("x-accepted-oauth-scopes", required.to_string());
            }
            if self.add_authorized_scopes_header {
                let granted = token.scope.as_ref().map(ToString::to_string).unwrap_or_default();
                response.set_header("x-oauth-scopes", granted);
            }
        }

        tracing::debug!(client_id = %token.client.id, "bearer token accepted");

        Ok(token)
    }

    /// Extract the bearer token from exactly one of header, query or body.
    fn token_from_request<'a>(&self, request: &'a Request) -> Result<&'a str, OAuthError> {
        let header = request.header("authorization");
        let query = request.query_param("access_token");
        let body = request.body_param("access_token");

        let presented = [header.is_some(), query.is_some(), body.is_some()]
            .iter()
            .filter(|p| **p)
            .count();
        if presented > 1 {
            return Err(OAuthError::invalid_request(
                "only one authentication method is allowed",
            ));
        }

        if let Some(header) = header {
            let token = header
                .split_once(' ')
                .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
                .map(|(_, value)| value.trim());
            return token.filter(|t| !t.is_empty()).ok_or_else(|| {
                OAuthError::invalid_request("malformed authorization header")
            });
        }

        if let Some(token) = query {
            if !self.allow_bearer_tokens_in_query_string {
                return Err(OAuthError::invalid_request(
                    "do not send bearer tokens in query URLs",
                ));
            }
            return Ok(token);
        }

        if let Some(token) = body {
            if request.method() == "GET" {
                return Err(OAuthError::invalid_request(
                    "token may not be passed in the body when using GET",
                ));
            }
            if !request.is_form_encoded() {
                return Err(OAuthError::invalid_request(
                    "content must be application/x-www-form-urlencoded",
                ));
            }
            return Ok(token);
        }

        Err(OAuthError::UnauthorizedRequest("no authentication given".into()))
    }
}
