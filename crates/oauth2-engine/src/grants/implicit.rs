//! Implicit grant (RFC 6749 §4.2), used by the token response type on the
//! authorize endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;

use super::common;
use super::{GrantEngine, GrantOptions};
use crate::error::OAuthError;
use crate::model::IssueModel;
use crate::request::Request;
use crate::scope::Scope;
use crate::types::{Client, Token, User};

/// Issues an access token directly from the authorize endpoint for an
/// already-authenticated resource owner. Never issues a refresh token.
pub struct ImplicitGrant<M> {
    model: Arc<M>,
    options: GrantOptions,
    user: User,
    scope: Option<Scope>,
}

impl<M: IssueModel> ImplicitGrant<M> {
    /// Create the grant engine for a pre-authenticated user and validated
    /// scope.
    pub fn new(model: Arc<M>, options: GrantOptions, user: User, scope: Option<Scope>) -> Self {
        Self { model, options, user, scope }
    }
}

#[async_trait]
impl<M: IssueModel + 'static> GrantEngine for ImplicitGrant<M> {
    async fn handle(&self, _request: &Request, client: &Client) -> Result<Token, OAuthError> {
        let scope =
            common::validate_scope(&*self.model, &self.user, client, self.scope.as_ref()).await?;

        let access_token =
            common::generate_access_token(&*self.model, client, &self.user, scope.as_ref())
                .await?;

        let token = Token {
            access_token,
            access_token_expires_at: Some(common::expires_at(self.options.access_token_lifetime)),
            refresh_token: None,
            refresh_token_expires_at: None,
            scope,
            client: client.clone(),
            user: self.user.clone(),
            authorization_code: None,
            extra: Map::new(),
        };

        let saved = self.model.save_token(token).await.map_err(OAuthError::from_model_error)?;
        saved.validate()?;

        tracing::debug!(client_id = %client.id, "issued token via implicit grant");

        Ok(saved)
    }
}
