//! Authorize endpoint handler (RFC 6749 §3.1).
//!
//! Authenticates the resource owner via their bearer token, validates the
//! client and redirect URI, then delegates to a response type. Errors raised
//! before the redirect URI is known come back to the caller directly; once it
//! is known they are delivered as a redirect.

use std::sync::Arc;

use url::Url;

use super::AuthenticateHandler;
use crate::config::ServerOptions;
use crate::error::OAuthError;
use crate::grammar;
use crate::model::{AuthenticateModel, AuthorizationCodeModel, ClientModel};
use crate::request::{Request, Response};
use crate::response_types::{CodeResponseType, TokenResponseType};
use crate::scope::Scope;
use crate::types::{AuthorizationCode, BearerToken, Client, Token, User};

/// What the authorize endpoint issued.
#[derive(Debug)]
pub enum AuthorizeSuccess {
    /// An authorization code (`response_type=code`).
    Code(AuthorizationCode),
    /// A token via the implicit flow (`response_type=token`).
    Token(Token),
}

/// Handles `GET`/`POST /authorize` requests.
pub struct AuthorizeHandler<M> {
    model: Arc<M>,
    authenticate: AuthenticateHandler<M>,
    options: ServerOptions,
}

impl<M> AuthorizeHandler<M>
where
    M: AuthorizationCodeModel + ClientModel + AuthenticateModel + 'static,
{
    /// Create the handler from the effective options.
    pub fn new(model: Arc<M>, options: &ServerOptions) -> Self {
        // The bearer check here authenticates the resource owner; the
        // endpoint's own scope handling happens afterwards.
        let mut authenticate_options = options.clone();
        authenticate_options.scope = None;
        let authenticate = AuthenticateHandler::new(Arc::clone(&model), &authenticate_options);
        Self { model, authenticate, options: options.clone() }
    }

    /// Process an authorization request.
    ///
    /// On success the response carries a 302 redirect with the code (query)
    /// or token (fragment). Errors after redirect-URI resolution are also
    /// delivered as redirects, with `error`/`error_description` query
    /// parameters.
    pub async fn handle(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<AuthorizeSuccess, OAuthError> {
        // Resource-owner authentication failures are never redirected.
        let access_token = self.authenticate.handle(request, response).await?;
        let user = access_token.user;

        let client = self.get_client(request).await?;
        let redirect_uri = self.get_redirect_uri(request, &client)?;

        let state = param(request, "state");
        match self.handle_inner(request, &client, &user, &redirect_uri).await {
            Ok(success) => {
                let location = match &success {
                    AuthorizeSuccess::Code(code) => {
                        code_redirect(&redirect_uri, &code.code, state)?
                    }
                    AuthorizeSuccess::Token(token) => token_redirect(
                        &redirect_uri,
                        token,
                        state,
                        self.options.allow_extended_token_attributes,
                    )?,
                };
                response.set_status(302);
                response.set_header("location", location);
                Ok(success)
            }
            Err(err) => {
                let location = error_redirect(&redirect_uri, &err, state)?;
                response.set_status(302);
                response.set_header("location", location);
                Err(err)
            }
        }
    }

    async fn handle_inner(
        &self,
        request: &Request,
        client: &Client,
        user: &User,
        redirect_uri: &str,
    ) -> Result<AuthorizeSuccess, OAuthError> {
        if param(request, "allowed") == Some("false") {
            return Err(OAuthError::AccessDenied("user denied access to application".into()));
        }

        self.validate_state(request)?;

        let scope = param(request, "scope").map(Scope::parse).transpose()?;

        let response_type = param(request, "response_type")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `response_type`"))?;

        match response_type {
            "code" => {
                let scope = self.validate_scope(user, client, scope).await?;
                let code = CodeResponseType::new(self.options.authorization_code_lifetime)
                    .handle(&*self.model, request, client, user, scope, redirect_uri)
                    .await?;
                Ok(AuthorizeSuccess::Code(code))
            }
            "token" => {
                let token = TokenResponseType::new(
                    client.access_token_lifetime.unwrap_or(self.options.access_token_lifetime),
                )
                .handle(Arc::clone(&self.model), request, client, user.clone(), scope)
                .await?;
                Ok(AuthorizeSuccess::Token(token))
            }
            _ => Err(OAuthError::UnsupportedResponseType(
                "`response_type` is not supported".into(),
            )),
        }
    }

    /// Validate the client, including whether its registered grants cover
    /// the requested response type. Failures here precede redirect-URI
    /// resolution and are delivered directly.
    async fn get_client(&self, request: &Request) -> Result<Client, OAuthError> {
        let client_id = param(request, "client_id")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `client_id`"))?;
        if !grammar::is_vschar(client_id) {
            return Err(OAuthError::invalid_request("Invalid parameter: `client_id`"));
        }

        let client = self
            .model
            .get_client(client_id, None)
            .await
            .map_err(OAuthError::from_model_error)?
            .ok_or_else(|| OAuthError::invalid_client("client credentials are invalid"))?;

        if client.grants.is_empty() {
            return Err(OAuthError::invalid_client("missing client `grants`"));
        }

        let required_grant = match param(request, "response_type") {
            Some("code") => Some("authorization_code"),
            Some("token") => Some("implicit"),
            // Unknown response types are rejected later, after the
            // redirect URI is resolved.
            _ => None,
        };
        if let Some(required) = required_grant {
            if !client.grants.iter().any(|g| g == required) {
                return Err(OAuthError::UnauthorizedClient("`grant_type` is invalid".into()));
            }
        }

        Ok(client)
    }

    /// Resolve the redirect URI: a presented one must exactly match a
    /// registered URI; absent, the first registered URI is used.
    fn get_redirect_uri(&self, request: &Request, client: &Client) -> Result<String, OAuthError> {
        if client.redirect_uris.is_empty() {
            return Err(OAuthError::invalid_client("missing client `redirectUri`"));
        }

        match param(request, "redirect_uri") {
            Some(uri) => {
                if !grammar::is_uri(uri) {
                    return Err(OAuthError::invalid_request(
                        "`redirect_uri` is not a valid URI",
                    ));
                }
                if !client.redirect_uris.iter().any(|registered| registered == uri) {
                    return Err(OAuthError::invalid_client(
                        "`redirect_uri` does not match client value",
                    ));
                }
                Ok(uri.to_owned())
            }
            None => Ok(client.redirect_uris[0].clone()),
        }
    }

    fn validate_state(&self, request: &Request) -> Result<(), OAuthError> {
        match param(request, "state") {
            Some(state) if !grammar::is_vschar(state) => {
                Err(OAuthError::invalid_request("Invalid parameter: `state`"))
            }
            None if !self.options.allow_empty_state => {
                Err(OAuthError::invalid_request("Missing parameter: `state`"))
            }
            _ => Ok(()),
        }
    }

    async fn validate_scope(
        &self,
        user: &User,
        client: &Client,
        scope: Option<Scope>,
    ) -> Result<Option<Scope>, OAuthError> {
        let validated = self
            .model
            .validate_scope(user, client, scope.as_ref())
            .await
            .map_err(OAuthError::from_model_error)?;
        if validated.is_none() && scope.is_some() {
            return Err(OAuthError::invalid_scope("requested scope is invalid"));
        }
        Ok(validated)
    }
}

/// Look up a parameter in the query string, falling back to the body.
fn param<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.query_param(name).or_else(|| request.body_param(name))
}

fn parse_redirect(redirect_uri: &str) -> Result<Url, OAuthError> {
    Url::parse(redirect_uri).map_err(|e| {
        OAuthError::server_with_source("`redirect_uri` could not be parsed", e)
    })
}

fn code_redirect(
    redirect_uri: &str,
    code: &str,
    state: Option<&str>,
) -> Result<String, OAuthError> {
    let mut url = parse_redirect(redirect_uri)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("code", code);
        if let Some(state) = state {
            pairs.append_pair("state", state);
        }
    }
    Ok(url.into())
}

fn token_redirect(
    redirect_uri: &str,
    token: &Token,
    state: Option<&str>,
    allow_extended_attributes: bool,
) -> Result<String, OAuthError> {
    let mut url = parse_redirect(redirect_uri)?;
    let bearer = BearerToken::from_token(token, allow_extended_attributes);

    let mut fragment = url::form_urlencoded::Serializer::new(String::new());
    fragment.append_pair("access_token", &bearer.access_token);
    fragment.append_pair("token_type", bearer.token_type);
    if let Some(expires_in) = bearer.expires_in {
        fragment.append_pair("expires_in", &expires_in.to_string());
    }
    if let Some(scope) = &bearer.scope {
        fragment.append_pair("scope", &scope.to_string());
    }
    if let Some(state) = state {
        fragment.append_pair("state", state);
    }

    url.set_fragment(Some(&fragment.finish()));
    Ok(url.into())
}

fn error_redirect(
    redirect_uri: &str,
    error: &OAuthError,
    state: Option<&str>,
) -> Result<String, OAuthError> {
    let mut url = parse_redirect(redirect_uri)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("error", error.name());
        pairs.append_pair("error_description", &error.to_string());
        if let Some(state) = state {
            pairs.append_pair("state", state);
        }
    }
    Ok(url.into())
}
