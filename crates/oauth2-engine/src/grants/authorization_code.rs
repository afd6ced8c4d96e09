//! Authorization code grant (RFC 6749 §4.1.3), with PKCE (RFC 7636).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Map;

use super::common;
use super::{GrantEngine, GrantOptions};
use crate::error::OAuthError;
use crate::grammar;
use crate::model::AuthorizationCodeModel;
use crate::pkce;
use crate::request::Request;
use crate::types::{AuthorizationCode, Client, Token};

/// Exchanges a single-use authorization code for an access + refresh token.
pub struct AuthorizationCodeGrant<M> {
    model: Arc<M>,
    options: GrantOptions,
}

impl<M: AuthorizationCodeModel> AuthorizationCodeGrant<M> {
    /// Create the grant engine over the given model.
    pub fn new(model: Arc<M>, options: GrantOptions) -> Self {
        Self { model, options }
    }

    /// Fetch the code named by the request and run the ownership and expiry
    /// checks.
    async fn get_code(
        &self,
        request: &Request,
        client: &Client,
    ) -> Result<AuthorizationCode, OAuthError> {
        let code = request
            .body_param("code")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `code`"))?;
        if !grammar::is_vschar(code) {
            return Err(OAuthError::invalid_request("Invalid parameter: `code`"));
        }

        let auth_code = self
            .model
            .get_authorization_code(code)
            .await
            .map_err(OAuthError::from_model_error)?
            .ok_or_else(|| OAuthError::invalid_grant("authorization code is invalid"))?;

        // A code issued to another client is indistinguishable from an
        // invalid one.
        if auth_code.client.id != client.id {
            return Err(OAuthError::invalid_grant("authorization code is invalid"));
        }
        if auth_code.is_expired(Utc::now()) {
            return Err(OAuthError::invalid_grant("authorization code has expired"));
        }

        Ok(auth_code)
    }

    /// Re-validate the redirect URI when the code was bound to one: the token
    /// request must present an identical URI string.
    fn validate_redirect_uri(
        request: &Request,
        code: &AuthorizationCode,
    ) -> Result<(), OAuthError> {
        let Some(expected) = code.redirect_uri.as_deref() else {
            return Ok(());
        };

        let presented =
            request.body_param("redirect_uri").or_else(|| request.query_param("redirect_uri"));
        match presented {
            Some(uri) if uri == expected => Ok(()),
            _ => Err(OAuthError::invalid_request("`redirect_uri` is invalid")),
        }
    }

    /// Verify the PKCE code verifier when the stored code carries a challenge
    /// method.
    fn verify_pkce(request: &Request, code: &AuthorizationCode) -> Result<(), OAuthError> {
        let Some(method) = code.code_challenge_method else {
            return Ok(());
        };
        let Some(challenge) = code.code_challenge.as_deref() else {
            return Err(OAuthError::server("missing `code_challenge`"));
        };

        let verified = request
            .body_param("code_verifier")
            .filter(|v| grammar::is_vschar(v))
            .is_some_and(|verifier| pkce::verify(method, verifier, challenge));
        if !verified {
            return Err(OAuthError::invalid_grant("code verifier is invalid"));
        }

        Ok(())
    }
}

#[async_trait]
impl<M: AuthorizationCodeModel + 'static> GrantEngine for AuthorizationCodeGrant<M> {
    async fn handle(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        let code = self.get_code(request, client).await?;
        Self::validate_redirect_uri(request, &code)?;
        Self::verify_pkce(request, &code)?;

        // The code is single-use: revoke before issuing, and treat a failed
        // revoke as an invalid grant.
        let revoked = self
            .model
            .revoke_authorization_code(&code)
            .await
            .map_err(OAuthError::from_model_error)?;
        if !revoked {
            return Err(OAuthError::invalid_grant("authorization code is invalid"));
        }

        let scope =
            common::validate_scope(&*self.model, &code.user, client, code.scope.as_ref()).await?;

        let access_token =
            common::generate_access_token(&*self.model, client, &code.user, scope.as_ref())
                .await?;
        let refresh_token =
            common::generate_refresh_token(&*self.model, client, &code.user, scope.as_ref())
                .await?;

        let token = Token {
            access_token,
            access_token_expires_at: Some(common::expires_at(self.options.access_token_lifetime)),
            refresh_token: Some(refresh_token),
            refresh_token_expires_at: Some(common::expires_at(
                self.options.refresh_token_lifetime,
            )),
            scope,
            client: client.clone(),
            user: code.user.clone(),
            authorization_code: Some(code.code.clone()),
            extra: Map::new(),
        };

        let saved = self.model.save_token(token).await.map_err(OAuthError::from_model_error)?;
        saved.validate()?;

        tracing::debug!(client_id = %client.id, "issued token via authorization_code grant");

        Ok(saved)
    }
}
