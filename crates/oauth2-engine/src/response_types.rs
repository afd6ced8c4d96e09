//! Response-type adapters for the authorize endpoint.
//!
//! `code` wraps authorization-code issuance; `token` wraps the implicit
//! grant. The authorize handler picks one and splices its parameters into
//! the redirect URI (query for codes, fragment for tokens).

use std::sync::Arc;

use crate::error::OAuthError;
use crate::generator;
use crate::grammar;
use crate::grants::{GrantEngine, GrantOptions, ImplicitGrant, common};
use crate::model::{AuthorizationCodeModel, IssueModel};
use crate::request::Request;
use crate::scope::Scope;
use crate::types::{AuthorizationCode, Client, CodeChallengeMethod, Token, User};

/// Issues and persists an authorization code (`response_type=code`).
pub struct CodeResponseType {
    authorization_code_lifetime: u64,
}

impl CodeResponseType {
    /// Create the adapter with the effective code lifetime in seconds.
    #[must_use]
    pub fn new(authorization_code_lifetime: u64) -> Self {
        Self { authorization_code_lifetime }
    }

    /// Issue a code bound to the resolved redirect URI and persist it.
    pub async fn handle<M: AuthorizationCodeModel + ?Sized>(
        &self,
        model: &M,
        request: &Request,
        client: &Client,
        user: &User,
        scope: Option<Scope>,
        redirect_uri: &str,
    ) -> Result<AuthorizationCode, OAuthError> {
        let (code_challenge, code_challenge_method) = pkce_params(request)?;

        let code = model
            .generate_authorization_code(client, user, scope.as_ref())
            .await
            .map_err(OAuthError::from_model_error)?
            .unwrap_or_else(generator::random_token);

        let record = AuthorizationCode {
            code,
            expires_at: common::expires_at(self.authorization_code_lifetime),
            redirect_uri: Some(redirect_uri.to_owned()),
            scope,
            client: client.clone(),
            user: user.clone(),
            code_challenge,
            code_challenge_method,
        };

        let saved = model
            .save_authorization_code(record)
            .await
            .map_err(OAuthError::from_model_error)?;

        tracing::debug!(client_id = %client.id, "issued authorization code");

        Ok(saved)
    }
}

/// Issues an access token via the implicit grant (`response_type=token`).
pub struct TokenResponseType {
    access_token_lifetime: u64,
}

impl TokenResponseType {
    /// Create the adapter with the effective access token lifetime in seconds.
    #[must_use]
    pub fn new(access_token_lifetime: u64) -> Self {
        Self { access_token_lifetime }
    }

    /// Run the implicit grant for the authenticated user.
    pub async fn handle<M: IssueModel + 'static>(
        &self,
        model: Arc<M>,
        request: &Request,
        client: &Client,
        user: User,
        scope: Option<Scope>,
    ) -> Result<Token, OAuthError> {
        let options = GrantOptions {
            access_token_lifetime: self.access_token_lifetime,
            // The implicit grant never issues refresh tokens.
            refresh_token_lifetime: 0,
            always_issue_new_refresh_token: false,
        };
        let grant = ImplicitGrant::new(model, options, user, scope);
        grant.handle(request, client).await
    }
}

/// Read the PKCE parameters from an authorize request.
///
/// A challenge without a method defaults to `plain`; a method the engine
/// does not support is rejected before anything is persisted.
fn pkce_params(
    request: &Request,
) -> Result<(Option<String>, Option<CodeChallengeMethod>), OAuthError> {
    let challenge = request
        .query_param("code_challenge")
        .or_else(|| request.body_param("code_challenge"));
    let Some(challenge) = challenge else {
        return Ok((None, None));
    };
    if !grammar::is_vschar(challenge) {
        return Err(OAuthError::invalid_request("Invalid parameter: `code_challenge`"));
    }

    let method = request
        .query_param("code_challenge_method")
        .or_else(|| request.body_param("code_challenge_method"));
    let method = match method {
        None | Some("plain") => CodeChallengeMethod::Plain,
        Some("S256") => CodeChallengeMethod::S256,
        Some(other) => {
            return Err(OAuthError::invalid_request(format!(
                "transform algorithm '{other}' not supported"
            )));
        }
    };

    Ok((Some(challenge.to_owned()), Some(method)))
}
