//! Token revocation handler (RFC 7009).
//!
//! The `token` parameter may name an access token or a refresh token; both
//! stores are searched concurrently and the first hit wins. Per RFC 7009
//! §2.2 an invalid token still yields a 200 response, so invalid-token
//! errors are suppressed from the body while remaining visible to the caller.

use std::sync::Arc;

use chrono::Utc;
use futures::future::{Either, select};
use serde_json::json;

use super::{authenticated_client, write_error_response};
use crate::config::RevokeOptions;
use crate::error::OAuthError;
use crate::grammar;
use crate::model::{AuthenticateModel, ClientModel, RefreshTokenModel};
use crate::request::{Request, Response};
use crate::types::Client;

/// Handles `POST /revoke` requests.
pub struct RevokeHandler<M> {
    model: Arc<M>,
    credentials_required: bool,
}

impl<M> RevokeHandler<M>
where
    M: ClientModel + AuthenticateModel + RefreshTokenModel + 'static,
{
    /// Create the handler from the effective options.
    pub fn new(model: Arc<M>, options: &RevokeOptions) -> Self {
        Self { model, credentials_required: options.client_authentication_required() }
    }

    /// Process a revocation request.
    ///
    /// The response body is `{}` on success and on invalid-token failures;
    /// the returned `Result` always reflects what actually happened.
    pub async fn handle(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<(), OAuthError> {
        match self.handle_inner(request, response).await {
            Ok(()) => {
                response.set_status(200);
                response.set_body(json!({}));
                Ok(())
            }
            Err(err) => {
                if err.is_invalid_token() {
                    response.set_status(200);
                    response.set_body(json!({}));
                } else {
                    write_error_response(response, &err);
                }
                Err(err)
            }
        }
    }

    async fn handle_inner(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<(), OAuthError> {
        if request.method() != "POST" {
            return Err(OAuthError::invalid_request("method must be POST"));
        }
        if !request.is_form_encoded() {
            return Err(OAuthError::invalid_request(
                "content must be application/x-www-form-urlencoded",
            ));
        }

        let client =
            authenticated_client(&*self.model, request, response, self.credentials_required)
                .await?;

        let token = request
            .body_param("token")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `token`"))?;
        if !grammar::is_vschar(token) {
            return Err(OAuthError::invalid_request("Invalid parameter: `token`"));
        }

        self.find_token(token, &client).await?;

        let revoked =
            self.model.revoke_token(token).await.map_err(OAuthError::from_model_error)?;
        if !revoked {
            return Err(OAuthError::invalid_token("token is invalid"));
        }

        tracing::info!(client_id = %client.id, "token revoked");

        Ok(())
    }

    /// Search both token stores concurrently; the first successful lookup
    /// settles the search. When both fail the errors are aggregated.
    async fn find_token(&self, token: &str, client: &Client) -> Result<(), OAuthError> {
        let access = Box::pin(self.find_access_token(token, client));
        let refresh = Box::pin(self.find_refresh_token(token, client));

        match select(access, refresh).await {
            Either::Left((Ok(()), _)) | Either::Right((Ok(()), _)) => Ok(()),
            Either::Left((Err(access_err), pending)) => match pending.await {
                Ok(()) => Ok(()),
                Err(refresh_err) => Err(OAuthError::Aggregate(vec![access_err, refresh_err])),
            },
            Either::Right((Err(refresh_err), pending)) => match pending.await {
                Ok(()) => Ok(()),
                Err(access_err) => Err(OAuthError::Aggregate(vec![access_err, refresh_err])),
            },
        }
    }

    async fn find_access_token(&self, token: &str, client: &Client) -> Result<(), OAuthError> {
        let record = self
            .model
            .get_access_token(token)
            .await
            .map_err(OAuthError::from_model_error)?
            .ok_or_else(|| OAuthError::invalid_token("access token is invalid"))?;

        if record.client.id != client.id {
            return Err(OAuthError::invalid_grant("access token is invalid"));
        }
        if record.is_expired(Utc::now()) {
            return Err(OAuthError::invalid_grant("access token has expired"));
        }
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str, client: &Client) -> Result<(), OAuthError> {
        let record = self
            .model
            .get_refresh_token(token)
            .await
            .map_err(OAuthError::from_model_error)?
            .ok_or_else(|| OAuthError::invalid_token("refresh token is invalid"))?;

        if record.client.id != client.id {
            return Err(OAuthError::invalid_grant("refresh token is invalid"));
        }
        if record.is_expired(Utc::now()) {
            return Err(OAuthError::invalid_grant("refresh token has expired"));
        }
        Ok(())
    }
}
