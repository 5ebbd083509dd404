//! Requests guarded by Drupal's session CSRF token.
//!
//! Cookie-authenticated writes to Drupal must carry `X-CSRF-Token`, whose
//! value is the plain-text body of `/session/token`. The `HttpClient` keeps
//! no cookies, so the token is always fetched anonymously and pairs with
//! bearer authentication on the guarded request.

use drupal_auth_domain::{ApiResponse, CSRF_TOKEN, HttpMethod, RequestOptions};
use tracing::debug;

use crate::ports::{HttpClient, HttpClientError};

/// Fetches a CSRF token from `csrf_url`.
///
/// # Errors
///
/// Returns the transport failure if the token could not be fetched, or
/// `HttpClientError::Other` if the endpoint answered with an error status.
pub async fn request_csrf_token(
    http: &dyn HttpClient,
    csrf_url: &str,
) -> Result<String, HttpClientError> {
    let request = RequestOptions::new(HttpMethod::Get).into_request(csrf_url);
    let response = http.execute(&request).await?;
    if !response.is_success() {
        return Err(HttpClientError::Other(format!(
            "{csrf_url} answered {}",
            response.status
        )));
    }
    let token = response.text().trim().to_string();
    debug!(url = %csrf_url, "fetched CSRF token");
    Ok(token)
}

/// Sends `options` to `fetch_url`, adding an `X-CSRF-Token` fetched from
/// `csrf_url` unless one is already set.
///
/// # Errors
///
/// Returns the transport failure of either request.
pub async fn fetch_with_csrf_token(
    http: &dyn HttpClient,
    csrf_url: &str,
    fetch_url: &str,
    mut options: RequestOptions,
) -> Result<ApiResponse, HttpClientError> {
    if !options.headers.contains(CSRF_TOKEN) {
        let token = request_csrf_token(http, csrf_url).await?;
        options.headers.append(CSRF_TOKEN, token);
    }
    http.execute(&options.into_request(fetch_url)).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::MockHttp;
    use pretty_assertions::assert_eq;

    fn session_site() -> MockHttp {
        MockHttp::new(|request| {
            if request.url.ends_with("/session/token") {
                Ok(ApiResponse::new(200, [], b"  tok-123 \n".to_vec()))
            } else {
                Ok(ApiResponse::new(200, [], b"{}".to_vec()))
            }
        })
    }

    #[tokio::test]
    async fn test_fetches_token_when_missing() {
        let http = session_site();
        let options = RequestOptions::new(HttpMethod::Delete);

        fetch_with_csrf_token(
            &http,
            "http://drupal.test/session/token",
            "http://drupal.test/jsonapi/node/article/1",
            options,
        )
        .await
        .unwrap();

        let requests = http.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[1].method, HttpMethod::Delete);
        assert_eq!(requests[1].headers.get("x-csrf-token"), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_existing_token_is_kept() {
        let http = session_site();
        let options = RequestOptions::new(HttpMethod::Post).with_header("x-csrf-token", "mine");

        fetch_with_csrf_token(
            &http,
            "http://drupal.test/session/token",
            "http://drupal.test/node",
            options,
        )
        .await
        .unwrap();

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].headers.get(CSRF_TOKEN), Some("mine"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let http = MockHttp::new(|_| Ok(ApiResponse::new(403, [], Vec::new())));

        let err = request_csrf_token(&http, "http://drupal.test/session/token")
            .await
            .unwrap_err();
        assert!(matches!(err, HttpClientError::Other(_)));
    }
}
