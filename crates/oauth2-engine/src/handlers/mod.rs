//! Request handlers: the four orchestration surfaces over the grant engines.

pub mod authenticate;
pub mod authorize;
pub mod revoke;
pub mod token;

pub use authenticate::AuthenticateHandler;
pub use authorize::{AuthorizeHandler, AuthorizeSuccess};
pub use revoke::RevokeHandler;
pub use token::{GrantFactory, TokenHandler};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use crate::error::OAuthError;
use crate::grammar;
use crate::model::ClientModel;
use crate::request::{Request, Response};
use crate::types::Client;

/// The `WWW-Authenticate` challenge sent after a failed Basic attempt.
pub(crate) const BASIC_CHALLENGE: &str = "Basic realm=\"Service\"";

/// The `WWW-Authenticate` challenge sent when no bearer token was presented.
pub(crate) const BEARER_CHALLENGE: &str = "Bearer realm=\"Service\"";

/// Write the standard `{error, error_description}` body and status.
pub(crate) fn write_error_response(response: &mut Response, error: &OAuthError) {
    response.set_status(error.status_code());
    response.set_body(json!({
        "error": error.name(),
        "error_description": error.to_string(),
    }));
}

/// Client credentials extracted from a request.
#[derive(Debug)]
pub(crate) struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
}

/// Resolve client credentials: the HTTP Basic header takes precedence over
/// form-body fields. A lone `client_id` is accepted only when authentication
/// is not required (public clients).
pub(crate) fn client_credentials_from_request(
    request: &Request,
    credentials_required: bool,
) -> Result<ClientCredentials, OAuthError> {
    if let Some(header) = request.header("authorization") {
        return basic_credentials(header);
    }

    let client_id = request.body_param("client_id");
    let client_secret = request.body_param("client_secret");
    match (client_id, client_secret) {
        (Some(id), Some(secret)) => Ok(ClientCredentials {
            client_id: id.to_owned(),
            client_secret: Some(secret.to_owned()),
        }),
        (Some(id), None) if !credentials_required => {
            Ok(ClientCredentials { client_id: id.to_owned(), client_secret: None })
        }
        _ => Err(OAuthError::invalid_client("cannot retrieve client credentials")),
    }
}

fn basic_credentials(header: &str) -> Result<ClientCredentials, OAuthError> {
    let malformed = || OAuthError::invalid_client("cannot retrieve client credentials");

    let (scheme, value) = header.split_once(' ').ok_or_else(malformed)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(malformed());
    }

    let decoded = BASE64.decode(value.trim()).map_err(|_| malformed())?;
    let decoded = String::from_utf8(decoded).map_err(|_| malformed())?;
    let (id, secret) = decoded.split_once(':').ok_or_else(malformed)?;

    Ok(ClientCredentials { client_id: id.to_owned(), client_secret: Some(secret.to_owned()) })
}

/// Authenticate the client behind a token or revocation request.
///
/// When the lookup rejects the client and the request attempted an
/// Authorization header, the response gains a Basic challenge and the error
/// is upgraded to 401 (RFC 6749 §5.2).
pub(crate) async fn authenticated_client<M: ClientModel + ?Sized>(
    model: &M,
    request: &Request,
    response: &mut Response,
    credentials_required: bool,
) -> Result<Client, OAuthError> {
    let result = resolve_client(model, request, credentials_required).await;
    result.map_err(|err| {
        if matches!(err, OAuthError::InvalidClient { .. })
            && request.header("authorization").is_some()
        {
            response.set_header("www-authenticate", BASIC_CHALLENGE);
            return err.with_unauthorized_status();
        }
        err
    })
}

async fn resolve_client<M: ClientModel + ?Sized>(
    model: &M,
    request: &Request,
    credentials_required: bool,
) -> Result<Client, OAuthError> {
    let credentials = client_credentials_from_request(request, credentials_required)?;
    if !grammar::is_vschar(&credentials.client_id) {
        return Err(OAuthError::invalid_request("Invalid parameter: `client_id`"));
    }
    if let Some(secret) = credentials.client_secret.as_deref() {
        if !grammar::is_vschar(secret) {
            return Err(OAuthError::invalid_request("Invalid parameter: `client_secret`"));
        }
    }

    let client = model
        .get_client(&credentials.client_id, credentials.client_secret.as_deref())
        .await
        .map_err(OAuthError::from_model_error)?
        .ok_or_else(|| OAuthError::invalid_client("client is invalid"))?;

    if client.grants.is_empty() {
        return Err(OAuthError::server("missing client `grants`"));
    }

    Ok(client)
}
