//! Token endpoint handler (RFC 6749 §3.2).
//!
//! Validates the request envelope, authenticates the client, then dispatches
//! to the grant engine registered for the request's `grant_type`. Extension
//! grants register under an absolute URI.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::to_value;

use super::{authenticated_client, write_error_response};
use crate::config::ServerOptions;
use crate::error::OAuthError;
use crate::grammar;
use crate::grants::{
    AuthorizationCodeGrant, ClientCredentialsGrant, GrantEngine, GrantOptions, PasswordGrant,
    RefreshTokenGrant,
};
use crate::model::Model;
use crate::request::{Request, Response};
use crate::types::{BearerToken, Client, Token};

/// Builds a grant engine for one dispatch, with per-client lifetimes resolved.
pub type GrantFactory<M> = Arc<dyn Fn(Arc<M>, GrantOptions) -> Box<dyn GrantEngine> + Send + Sync>;

/// Handles `POST /token` requests.
pub struct TokenHandler<M> {
    model: Arc<M>,
    options: ServerOptions,
    grants: HashMap<String, GrantFactory<M>>,
}

impl<M: Model + 'static> TokenHandler<M> {
    /// Create the handler with the four built-in grant types registered.
    pub fn new(model: Arc<M>, options: &ServerOptions) -> Self {
        let mut grants: HashMap<String, GrantFactory<M>> = HashMap::new();
        grants.insert(
            "authorization_code".to_owned(),
            Arc::new(|model, opts| Box::new(AuthorizationCodeGrant::new(model, opts))),
        );
        grants.insert(
            "client_credentials".to_owned(),
            Arc::new(|model, opts| Box::new(ClientCredentialsGrant::new(model, opts))),
        );
        grants.insert(
            "password".to_owned(),
            Arc::new(|model, opts| Box::new(PasswordGrant::new(model, opts))),
        );
        grants.insert(
            "refresh_token".to_owned(),
            Arc::new(|model, opts| Box::new(RefreshTokenGrant::new(model, opts))),
        );
        Self { model, options: options.clone(), grants }
    }

    /// Register an extension grant under its absolute URI (RFC 6749 §4.5).
    pub fn register_extension_grant(
        &mut self,
        grant_type: impl Into<String>,
        factory: GrantFactory<M>,
    ) -> Result<(), OAuthError> {
        let grant_type = grant_type.into();
        if !grammar::is_uri(&grant_type) {
            return Err(OAuthError::invalid_argument(
                "Invalid argument: extension grant type must be a valid URI",
            ));
        }
        self.grants.insert(grant_type, factory);
        Ok(())
    }

    /// Process a token request, writing the bearer token or error body into
    /// `response` and returning the issued token to the caller.
    pub async fn handle(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<Token, OAuthError> {
        match self.handle_inner(request, response).await {
            Ok(token) => {
                let bearer =
                    BearerToken::from_token(&token, self.options.allow_extended_token_attributes);
                let body = to_value(&bearer)
                    .map_err(|e| OAuthError::server_with_source("failed to serialize token", e))?;
                response.set_status(200);
                response.set_header("cache-control", "no-store");
                response.set_header("pragma", "no-cache");
                response.set_body(body);
                Ok(token)
            }
            Err(err) => {
                write_error_response(response, &err);
                Err(err)
            }
        }
    }

    async fn handle_inner(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<Token, OAuthError> {
        if request.method() != "POST" {
            return Err(OAuthError::invalid_request("method must be POST"));
        }
        if !request.is_form_encoded() {
            return Err(OAuthError::invalid_request(
                "content must be application/x-www-form-urlencoded",
            ));
        }

        let credentials_required = request
            .body_param("grant_type")
            .is_none_or(|gt| self.options.client_authentication_required(gt));

        let client =
            authenticated_client(&*self.model, request, response, credentials_required).await?;

        let grant = self.resolve_grant(request, &client)?;
        let token = grant.handle(request, &client).await?;

        tracing::info!(client_id = %client.id, "token issued");

        Ok(token)
    }

    fn resolve_grant(
        &self,
        request: &Request,
        client: &Client,
    ) -> Result<Box<dyn GrantEngine>, OAuthError> {
        let grant_type = request
            .body_param("grant_type")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `grant_type`"))?;
        if !grammar::is_nchar(grant_type) && !grammar::is_uri(grant_type) {
            return Err(OAuthError::invalid_request("Invalid parameter: `grant_type`"));
        }

        let factory = self
            .grants
            .get(grant_type)
            .ok_or_else(|| OAuthError::UnsupportedGrantType("`grant_type` is invalid".into()))?;

        if !client.grants.iter().any(|g| g == grant_type) {
            return Err(OAuthError::UnauthorizedClient("`grant_type` is invalid".into()));
        }

        let options = GrantOptions {
            access_token_lifetime: client
                .access_token_lifetime
                .unwrap_or(self.options.access_token_lifetime),
            refresh_token_lifetime: client
                .refresh_token_lifetime
                .unwrap_or(self.options.refresh_token_lifetime),
            always_issue_new_refresh_token: self.options.always_issue_new_refresh_token,
        };

        Ok(factory(Arc::clone(&self.model), options))
    }
}
