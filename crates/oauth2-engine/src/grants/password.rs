//! Resource owner password credentials grant (RFC 6749 §4.3.2).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;

use super::common;
use super::{GrantEngine, GrantOptions};
use crate::error::OAuthError;
use crate::grammar;
use crate::model::PasswordModel;
use crate::request::Request;
use crate::types::{Client, Token, User};

/// Exchanges resource-owner credentials for an access + refresh token.
pub struct PasswordGrant<M> {
    model: Arc<M>,
    options: GrantOptions,
}

impl<M: PasswordModel> PasswordGrant<M> {
    /// Create the grant engine over the given model.
    pub fn new(model: Arc<M>, options: GrantOptions) -> Self {
        Self { model, options }
    }

    /// Read a credential parameter; credentials accept any Unicode except
    /// CR/LF.
    fn credential<'a>(request: &'a Request, name: &str) -> Result<&'a str, OAuthError> {
        let value = request
            .body_param(name)
            .ok_or_else(|| OAuthError::invalid_request(format!("Missing parameter: `{name}`")))?;
        if !grammar::is_uchar(value) {
            return Err(OAuthError::invalid_request(format!("Invalid parameter: `{name}`")));
        }
        Ok(value)
    }

    async fn get_user(&self, request: &Request) -> Result<User, OAuthError> {
        let username = Self::credential(request, "username")?;
        let password = Self::credential(request, "password")?;

        self.model
            .get_user(username, password)
            .await
            .map_err(OAuthError::from_model_error)?
            .ok_or_else(|| OAuthError::invalid_grant("user credentials are invalid"))
    }
}

#[async_trait]
impl<M: PasswordModel + 'static> GrantEngine for PasswordGrant<M> {
    async fn handle(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        let requested_scope = common::scope_from_request(request)?;
        let user = self.get_user(request).await?;

        let scope =
            common::validate_scope(&*self.model, &user, client, requested_scope.as_ref()).await?;

        let access_token =
            common::generate_access_token(&*self.model, client, &user, scope.as_ref()).await?;
        let refresh_token =
            common::generate_refresh_token(&*self.model, client, &user, scope.as_ref()).await?;

        let token = Token {
            access_token,
            access_token_expires_at: Some(common::expires_at(self.options.access_token_lifetime)),
            refresh_token: Some(refresh_token),
            refresh_token_expires_at: Some(common::expires_at(
                self.options.refresh_token_lifetime,
            )),
            scope,
            client: client.clone(),
            user,
            authorization_code: None,
            extra: Map::new(),
        };

        let saved = self.model.save_token(token).await.map_err(OAuthError::from_model_error)?;
        saved.validate()?;

        tracing::debug!(client_id = %client.id, "issued token via password grant");

        Ok(saved)
    }
}
