//! Configuration for the engine's handlers.

use std::collections::HashMap;

use crate::scope::Scope;

/// Default lifetimes and flags (RFC-conventional values).
pub mod defaults {
    /// Access token lifetime: 1 hour.
    pub const ACCESS_TOKEN_LIFETIME: u64 = 3600;

    /// Refresh token lifetime: 2 weeks.
    pub const REFRESH_TOKEN_LIFETIME: u64 = 1_209_600;

    /// Authorization code lifetime: 5 minutes.
    pub const AUTHORIZATION_CODE_LIFETIME: u64 = 300;
}

/// Engine-wide options, merged with per-call overrides by the facade.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Access token lifetime in seconds (per-client override wins).
    pub access_token_lifetime: u64,

    /// Refresh token lifetime in seconds (per-client override wins).
    pub refresh_token_lifetime: u64,

    /// Authorization code lifetime in seconds.
    pub authorization_code_lifetime: u64,

    /// Accept authorize requests without a `state` parameter.
    pub allow_empty_state: bool,

    /// Emit `X-Accepted-OAuth-Scopes` when authenticating with a scope.
    pub add_accepted_scopes_header: bool,

    /// Emit `X-OAuth-Scopes` when authenticating with a scope.
    pub add_authorized_scopes_header: bool,

    /// Accept bearer tokens in the query string (RFC 6750 discourages this).
    pub allow_bearer_tokens_in_query_string: bool,

    /// Rotate refresh tokens on every refresh_token grant.
    pub always_issue_new_refresh_token: bool,

    /// Surface adapter-supplied custom token attributes in the bearer JSON.
    pub allow_extended_token_attributes: bool,

    /// Per-grant-type client authentication requirement. Grant types absent
    /// from the map require authentication.
    pub require_client_authentication: HashMap<String, bool>,

    /// Scope required by the authenticate handler, when protecting resources.
    pub scope: Option<Scope>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            access_token_lifetime: defaults::ACCESS_TOKEN_LIFETIME,
            refresh_token_lifetime: defaults::REFRESH_TOKEN_LIFETIME,
            authorization_code_lifetime: defaults::AUTHORIZATION_CODE_LIFETIME,
            allow_empty_state: false,
            add_accepted_scopes_header: true,
            add_authorized_scopes_header: true,
            allow_bearer_tokens_in_query_string: false,
            always_issue_new_refresh_token: true,
            allow_extended_token_attributes: false,
            require_client_authentication: HashMap::new(),
            scope: None,
        }
    }
}

impl ServerOptions {
    /// Whether the given grant type requires full client authentication.
    #[must_use]
    pub fn client_authentication_required(&self, grant_type: &str) -> bool {
        self.require_client_authentication.get(grant_type).copied().unwrap_or(true)
    }
}

/// Per-call overrides for the token endpoint.
#[derive(Debug, Clone, Default)]
pub struct TokenOptions {
    /// Access token lifetime override.
    pub access_token_lifetime: Option<u64>,
    /// Refresh token lifetime override.
    pub refresh_token_lifetime: Option<u64>,
    /// Refresh token rotation override.
    pub always_issue_new_refresh_token: Option<bool>,
    /// Extended token attribute override.
    pub allow_extended_token_attributes: Option<bool>,
    /// Per-grant client authentication override.
    pub require_client_authentication: Option<HashMap<String, bool>>,
}

impl TokenOptions {
    /// Merge these overrides over the server defaults.
    #[must_use]
    pub fn apply(self, base: &ServerOptions) -> ServerOptions {
        let mut options = base.clone();
        if let Some(v) = self.access_token_lifetime {
            options.access_token_lifetime = v;
        }
        if let Some(v) = self.refresh_token_lifetime {
            options.refresh_token_lifetime = v;
        }
        if let Some(v) = self.always_issue_new_refresh_token {
            options.always_issue_new_refresh_token = v;
        }
        if let Some(v) = self.allow_extended_token_attributes {
            options.allow_extended_token_attributes = v;
        }
        if let Some(v) = self.require_client_authentication {
            options.require_client_authentication = v;
        }
        options
    }
}

/// Per-call overrides for the authorize endpoint.
#[derive(Debug, Clone, Default)]
pub struct AuthorizeOptions {
    /// Authorization code lifetime override.
    pub authorization_code_lifetime: Option<u64>,
    /// Access token lifetime override (implicit flow).
    pub access_token_lifetime: Option<u64>,
    /// Empty-state acceptance override.
    pub allow_empty_state: Option<bool>,
}

impl AuthorizeOptions {
    /// Merge these overrides over the server defaults.
    #[must_use]
    pub fn apply(self, base: &ServerOptions) -> ServerOptions {
        let mut options = base.clone();
        if let Some(v) = self.authorization_code_lifetime {
            options.authorization_code_lifetime = v;
        }
        if let Some(v) = self.access_token_lifetime {
            options.access_token_lifetime = v;
        }
        if let Some(v) = self.allow_empty_state {
            options.allow_empty_state = v;
        }
        options
    }
}

/// Per-call overrides for resource-protection checks.
#[derive(Debug, Clone, Default)]
pub struct AuthenticateOptions {
    /// Scope the protected resource requires.
    pub scope: Option<Scope>,
    /// `X-Accepted-OAuth-Scopes` header override.
    pub add_accepted_scopes_header: Option<bool>,
    /// `X-OAuth-Scopes` header override.
    pub add_authorized_scopes_header: Option<bool>,
    /// Query-string bearer token override.
    pub allow_bearer_tokens_in_query_string: Option<bool>,
}

impl AuthenticateOptions {
    /// Merge these overrides over the server defaults.
    #[must_use]
    pub fn apply(self, base: &ServerOptions) -> ServerOptions {
        let mut options = base.clone();
        if let Some(v) = self.scope {
            options.scope = Some(v);
        }
        if let Some(v) = self.add_accepted_scopes_header {
            options.add_accepted_scopes_header = v;
        }
        if let Some(v) = self.add_authorized_scopes_header {
            options.add_authorized_scopes_header = v;
        }
        if let Some(v) = self.allow_bearer_tokens_in_query_string {
            options.allow_bearer_tokens_in_query_string = v;
        }
        options
    }
}

/// Per-call overrides for the revocation endpoint.
#[derive(Debug, Clone, Default)]
pub struct RevokeOptions {
    /// Whether revocation requires full client authentication (RFC 7009
    /// §2.1). Unset means required; public clients may relax this to a bare
    /// `client_id`.
    pub require_client_authentication: Option<bool>,
}

impl RevokeOptions {
    /// Whether the client must present a secret.
    #[must_use]
    pub fn client_authentication_required(&self) -> bool {
        self.require_client_authentication.unwrap_or(true)
    }
}
