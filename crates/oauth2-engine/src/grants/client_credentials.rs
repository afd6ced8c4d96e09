//! Client credentials grant (RFC 6749 §4.4.2).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;

use super::common;
use super::{GrantEngine, GrantOptions};
use crate::error::OAuthError;
use crate::model::ClientCredentialsModel;
use crate::request::Request;
use crate::types::{Client, Token};

/// Issues an access token directly to a confidential client. No refresh
/// token is ever issued.
pub struct ClientCredentialsGrant<M> {
    model: Arc<M>,
    options: GrantOptions,
}

impl<M: ClientCredentialsModel> ClientCredentialsGrant<M> {
    /// Create the grant engine over the given model.
    pub fn new(model: Arc<M>, options: GrantOptions) -> Self {
        Self { model, options }
    }
}

#[async_trait]
impl<M: ClientCredentialsModel + 'static> GrantEngine for ClientCredentialsGrant<M> {
    async fn handle(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        let requested_scope = common::scope_from_request(request)?;

        let user = self
            .model
            .get_user_from_client(client)
            .await
            .map_err(OAuthError::from_model_error)?
            .ok_or_else(|| OAuthError::invalid_grant("user credentials are invalid"))?;

        let scope =
            common::validate_scope(&*self.model, &user, client, requested_scope.as_ref()).await?;

        let access_token =
            common::generate_access_token(&*self.model, client, &user, scope.as_ref()).await?;

        let token = Token {
            access_token,
            access_token_expires_at: Some(common::expires_at(self.options.access_token_lifetime)),
            refresh_token: None,
            refresh_token_expires_at: None,
            scope,
            client: client.clone(),
            user,
            authorization_code: None,
            extra: Map::new(),
        };

        let saved = self.model.save_token(token).await.map_err(OAuthError::from_model_error)?;
        saved.validate()?;

        tracing::debug!(client_id = %client.id, "issued token via client_credentials grant");

        Ok(saved)
    }
}
