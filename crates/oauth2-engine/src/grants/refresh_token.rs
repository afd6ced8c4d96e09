//! Refresh token grant (RFC 6749 §6).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Map;

use super::common;
use super::{GrantEngine, GrantOptions};
use crate::error::OAuthError;
use crate::grammar;
use crate::model::RefreshTokenModel;
use crate::request::Request;
use crate::types::{Client, RefreshToken, Token};

/// Exchanges a refresh token for a new access token, rotating the refresh
/// token unless rotation is disabled.
pub struct RefreshTokenGrant<M> {
    model: Arc<M>,
    options: GrantOptions,
}

impl<M: RefreshTokenModel> RefreshTokenGrant<M> {
    /// Create the grant engine over the given model.
    pub fn new(model: Arc<M>, options: GrantOptions) -> Self {
        Self { model, options }
    }

    /// Fetch the refresh token named by the request and run the ownership
    /// and expiry checks.
    async fn get_refresh_token(
        &self,
        request: &Request,
        client: &Client,
    ) -> Result<RefreshToken, OAuthError> {
        let value = request
            .body_param("refresh_token")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `refresh_token`"))?;
        if !grammar::is_vschar(value) {
            return Err(OAuthError::invalid_request("Invalid parameter: `refresh_token`"));
        }

        let refresh_token = self
            .model
            .get_refresh_token(value)
            .await
            .map_err(OAuthError::from_model_error)?
            .ok_or_else(|| OAuthError::invalid_grant("refresh token is invalid"))?;

        if refresh_token.client.id != client.id {
            return Err(OAuthError::invalid_grant("refresh token is invalid"));
        }
        if refresh_token.is_expired(Utc::now()) {
            return Err(OAuthError::invalid_grant("refresh token has expired"));
        }

        Ok(refresh_token)
    }
}

#[async_trait]
impl<M: RefreshTokenModel + 'static> GrantEngine for RefreshTokenGrant<M> {
    async fn handle(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        let old = self.get_refresh_token(request, client).await?;

        // Rotation: the previous refresh token is revoked only when a new
        // one will be issued in its place.
        if self.options.always_issue_new_refresh_token {
            let revoked = self
                .model
                .revoke_token(&old.refresh_token)
                .await
                .map_err(OAuthError::from_model_error)?;
            if !revoked {
                return Err(OAuthError::invalid_grant("refresh token is invalid"));
            }
        }

        let scope =
            common::validate_scope(&*self.model, &old.user, client, old.scope.as_ref()).await?;

        let access_token =
            common::generate_access_token(&*self.model, client, &old.user, scope.as_ref())
                .await?;

        let (refresh_token, refresh_token_expires_at) =
            if self.options.always_issue_new_refresh_token {
                let rotated =
                    common::generate_refresh_token(&*self.model, client, &old.user, scope.as_ref())
                        .await?;
                (Some(rotated), Some(common::expires_at(self.options.refresh_token_lifetime)))
            } else {
                (None, None)
            };

        let token = Token {
            access_token,
            access_token_expires_at: Some(common::expires_at(self.options.access_token_lifetime)),
            refresh_token,
            refresh_token_expires_at,
            scope,
            client: client.clone(),
            user: old.user.clone(),
            authorization_code: None,
            extra: Map::new(),
        };

        let saved = self.model.save_token(token).await.map_err(OAuthError::from_model_error)?;
        saved.validate()?;

        tracing::debug!(client_id = %client.id, "issued token via refresh_token grant");

        Ok(saved)
    }
}
