//! OAuth2 password-grant client for a Drupal site.
//!
//! [`AuthClient`] logs users in against `simple_oauth`'s token endpoint,
//! keeps the resulting token in a [`TokenStore`], refreshes it when it
//! expires, and attaches it to outgoing requests.

use std::fmt;
use std::sync::Arc;

use drupal_auth_domain::{
    AUTHORIZATION, ApiResponse, AuthError, ClientConfig, CSRF_TOKEN, DEBUG_PATH, HttpMethod,
    OAuthErrorBody, RefreshOutcome, RequestOptions, SESSION_TOKEN_PATH, Token, TokenGrant,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::registry::{RefreshRegistry, RefreshResult};
use super::token_store::TokenStore;
use crate::csrf;
use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{Clock, HttpClient, HttpClientError, TokenStorage};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// What the token endpoint answered.
enum GrantResponse {
    Granted(TokenGrant),
    Refused(OAuthErrorBody),
}

struct Inner {
    config: ClientConfig,
    http: Arc<dyn HttpClient>,
    store: TokenStore,
    refreshes: RefreshRegistry,
}

/// Client for one OAuth consumer of one Drupal site.
///
/// Cheap to clone; clones share the token store and the refresh registry.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<Inner>,
}

impl fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthClient")
            .field("config", &self.inner.config)
            .field("store", &self.inner.store)
            .field("refreshes", &self.inner.refreshes)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    /// Creates a client. The token is stored under `config.token_name`.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        http: Arc<dyn HttpClient>,
        storage: Arc<dyn TokenStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = TokenStore::new(
            storage,
            clock,
            config.token_name.clone(),
            config.expire_margin,
        );
        Self {
            inner: Arc::new(Inner {
                config,
                http,
                store,
                refreshes: RefreshRegistry::new(),
            }),
        }
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The persisted token slot.
    #[must_use]
    pub fn token_store(&self) -> &TokenStore {
        &self.inner.store
    }

    /// Exchanges a username and password for a token and persists it.
    ///
    /// # Errors
    ///
    /// - `AuthError::Rejected` if the server refused the credentials; nothing is stored.
    /// - `AuthError::Transport` if the token endpoint could not be reached.
    /// - `AuthError::InvalidResponse` if the answer is neither a token nor an OAuth error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Token, AuthError> {
        let config = &self.inner.config;
        let form = [
            ("grant_type", "password"),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("scope", config.scope.as_str()),
            ("username", username),
            ("password", password),
        ];

        match self.inner.request_token(&form).await? {
            GrantResponse::Granted(grant) => {
                let token = self.inner.store.save(grant).await?;
                info!(token = %token.preview(), "logged in");
                Ok(token)
            }
            GrantResponse::Refused(body) => {
                warn!(code = %body.error, "login rejected");
                Err(AuthError::rejected(&body))
            }
        }
    }

    /// Forgets the stored token. Never fails; calling it twice is harmless.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.store.clear().await {
            warn!(error = %e, "could not delete stored token");
        }
        info!("logged out");
    }

    /// Succeeds if a usable token exists or can be obtained by refreshing.
    ///
    /// # Errors
    ///
    /// Returns why there is no usable token, as [`get_token`](Self::get_token) does.
    pub async fn is_logged_in(&self) -> Result<(), AuthError> {
        self.get_token().await.map(|_| ())
    }

    /// Returns the stored token, refreshing it first if it has expired.
    ///
    /// # Errors
    ///
    /// - `AuthError::NoToken` if nothing is stored.
    /// - `AuthError::TokenExpiredNoRefresh` if the token expired and cannot be refreshed.
    /// - `AuthError::Rejected` if the server refused the refresh token.
    /// - `AuthError::Transport` if the refresh could not reach the server.
    pub async fn get_token(&self) -> Result<Token, AuthError> {
        let token = self.inner.store.load().await?.ok_or(AuthError::NoToken)?;
        if self.inner.store.is_usable(&token) {
            return Ok(token);
        }

        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or(AuthError::TokenExpiredNoRefresh)?;
        debug!(expires_at = token.expires_at, "stored token expired, refreshing");
        self.refresh_token(refresh_token).await?.into_result()
    }

    /// Exchanges `refresh_token` for a new token and persists it.
    ///
    /// Concurrent calls with the same refresh token share one request to the
    /// server and all receive its result. The request runs to completion even
    /// if every caller stops waiting.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Transport` if the server could not be reached. A
    /// refusal is reported as [`RefreshOutcome::Rejected`], not as an error.
    pub async fn refresh_token(&self, refresh_token: &str) -> RefreshResult {
        let inner = Arc::clone(&self.inner);
        let owned = refresh_token.to_string();
        self.inner
            .refreshes
            .join_or_start(refresh_token, move || async move {
                inner.request_refresh(&owned).await
            })
            .await
    }

    /// Sends a request to `base_url + path`, bearing the current token if
    /// there is one.
    ///
    /// An `Authorization` header already in `options` is left alone. When no
    /// token can be had the request goes out anonymously. The response is
    /// returned whatever its status.
    ///
    /// # Errors
    ///
    /// Returns the transport failure if the request itself could not be sent.
    pub async fn fetch_with_authentication(
        &self,
        path: &str,
        mut options: RequestOptions,
    ) -> Result<ApiResponse, HttpClientError> {
        if !options.headers.contains(AUTHORIZATION) {
            match self.get_token().await {
                Ok(token) => options
                    .headers
                    .append(AUTHORIZATION, token.authorization_header()),
                Err(e) => debug!(reason = %e, "sending request without a token"),
            }
        }

        let request = options.into_request(self.inner.config.resolve(path));
        debug!(method = %request.method, url = %request.url, "sending request");
        self.inner.http.execute(&request).await
    }

    /// Like [`fetch_with_authentication`](Self::fetch_with_authentication),
    /// adding an `X-CSRF-Token` from the site's session token endpoint when
    /// `options` has none.
    ///
    /// No cookies are kept, so the session token is fetched anonymously and
    /// the request authenticates with the bearer token alone.
    ///
    /// # Errors
    ///
    /// Returns the transport failure of either request.
    pub async fn fetch_with_csrf(
        &self,
        path: &str,
        mut options: RequestOptions,
    ) -> Result<ApiResponse, HttpClientError> {
        if !options.headers.contains(CSRF_TOKEN) {
            let csrf_url = self.inner.config.resolve(SESSION_TOKEN_PATH);
            let token = csrf::request_csrf_token(self.inner.http.as_ref(), &csrf_url).await?;
            options.headers.append(CSRF_TOKEN, token);
        }
        self.fetch_with_authentication(path, options).await
    }

    /// Asks the site who the current token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Http` if the site could not be reached and
    /// `ApplicationError::UnexpectedResponse` if it did not answer with JSON.
    pub async fn debug(&self) -> ApplicationResult<Value> {
        let response = self
            .fetch_with_authentication(DEBUG_PATH, RequestOptions::json_api_get())
            .await?;
        response.json().map_err(|e| {
            ApplicationError::UnexpectedResponse(format!(
                "{} from {DEBUG_PATH}: {e}",
                response.status
            ))
        })
    }
}

impl Inner {
    async fn request_refresh(&self, refresh_token: &str) -> RefreshResult {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ];

        match self.request_token(&form).await {
            Ok(GrantResponse::Granted(grant)) => {
                let token = self.store.save(grant).await?;
                info!(token = %token.preview(), "token refreshed");
                Ok(RefreshOutcome::Refreshed(token))
            }
            Ok(GrantResponse::Refused(body)) => {
                warn!(code = %body.error, "refresh rejected");
                Ok(RefreshOutcome::Rejected {
                    message: body.display_message(),
                    code: body.error,
                })
            }
            Err(e) => {
                warn!(error = %e, "refresh failed");
                Err(e)
            }
        }
    }

    /// POSTs a form to the token endpoint.
    async fn request_token(&self, form: &[(&str, &str)]) -> Result<GrantResponse, AuthError> {
        let body = serde_urlencoded::to_string(form)
            .map_err(|e| AuthError::transport(format!("failed to encode form: {e}")))?;
        let request = RequestOptions::new(HttpMethod::Post)
            .with_header("Accept", "application/json")
            .with_header("Content-Type", FORM_CONTENT_TYPE)
            .with_body(body)
            .into_request(self.config.token_url());

        let response = self.http.execute(&request).await?;
        parse_grant_response(&response)
    }
}

/// A body carrying a non-null `error` is a refusal whatever the status code.
fn parse_grant_response(response: &ApiResponse) -> Result<GrantResponse, AuthError> {
    let invalid = |e: serde_json::Error| AuthError::InvalidResponse {
        message: format!("{} from token endpoint: {e}", response.status),
    };

    let value: Value = response.json().map_err(invalid)?;
    if value.get("error").is_some_and(|error| !error.is_null()) {
        return serde_json::from_value(value)
            .map(GrantResponse::Refused)
            .map_err(invalid);
    }
    serde_json::from_value(value)
        .map(GrantResponse::Granted)
        .map_err(invalid)
}
