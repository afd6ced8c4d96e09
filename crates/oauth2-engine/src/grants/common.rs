//! Validation and issuance steps shared across grant engines.

use chrono::{DateTime, Duration, Utc};

use crate::error::OAuthError;
use crate::generator;
use crate::model::IssueModel;
use crate::request::Request;
use crate::scope::Scope;
use crate::types::{Client, User};

/// Read and validate the `scope` parameter from the request body or query.
///
/// Grammar violations reject at this point, before any model call.
pub(crate) fn scope_from_request(request: &Request) -> Result<Option<Scope>, OAuthError> {
    request
        .body_param("scope")
        .or_else(|| request.query_param("scope"))
        .map(Scope::parse)
        .transpose()
}

/// Delegate scope validation to the model.
///
/// A `None` result while a scope was requested is a rejection.
pub(crate) async fn validate_scope<M: IssueModel + ?Sized>(
    model: &M,
    user: &User,
    client: &Client,
    scope: Option<&Scope>,
) -> Result<Option<Scope>, OAuthError> {
    let validated = model
        .validate_scope(user, client, scope)
        .await
        .map_err(OAuthError::from_model_error)?;

    if validated.is_none() && scope.is_some() {
        return Err(OAuthError::invalid_scope("requested scope is invalid"));
    }

    Ok(validated)
}

/// Absolute expiry for a lifetime in seconds, measured from now.
///
/// Lifetimes beyond what the timestamp type can represent saturate at its
/// maximum instead of overflowing.
pub(crate) fn expires_at(lifetime_secs: u64) -> DateTime<Utc> {
    let lifetime = i64::try_from(lifetime_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX);
    Utc::now().checked_add_signed(lifetime).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Generate an access token string: model override or engine default.
pub(crate) async fn generate_access_token<M: IssueModel + ?Sized>(
    model: &M,
    client: &Client,
    user: &User,
    scope: Option<&Scope>,
) -> Result<String, OAuthError> {
    let generated = model
        .generate_access_token(client, user, scope)
        .await
        .map_err(OAuthError::from_model_error)?;
    Ok(generated.unwrap_or_else(generator::random_token))
}

/// Generate a refresh token string: model override or engine default.
pub(crate) async fn generate_refresh_token<M: IssueModel + ?Sized>(
    model: &M,
    client: &Client,
    user: &User,
    scope: Option<&Scope>,
) -> Result<String, OAuthError> {
    let generated = model
        .generate_refresh_token(client, user, scope)
        .await
        .map_err(OAuthError::from_model_error)?;
    Ok(generated.unwrap_or_else(generator::random_token))
}
