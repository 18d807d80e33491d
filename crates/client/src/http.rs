//! The single configured HTTP client every API module goes through.
//!
//! - Credentials: the cookie store replays the session cookie on every call.
//! - 401: the host is redirected to the login path and the call rejects.
//! - One attempt per call. No retry, no backoff, no explicit timeout.

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode, multipart::Form};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::ui::Navigator;

/// Paths whose 401 means "nobody is signed in" rather than "session expired".
const REDIRECT_EXEMPT: &[&str] = &["/auth/me"];

/// Message used when a 401 carries no body.
const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Maximum number of body characters written to logs.
const LOG_BODY_LIMIT: usize = 500;

/// The `{ "data": ... }` wrapper used by auth, product, cart, order and
/// address endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Shared HTTP client.
///
/// Cheaply cloneable; all clones share one connection pool and cookie jar.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    client: reqwest::Client,
    base_url: String,
    login_path: String,
    navigator: Arc<dyn Navigator>,
}

impl HttpClient {
    /// Create a client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(config: &ApiConfig, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            inner: Arc::new(HttpClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                login_path: config.login_path.clone(),
                navigator,
            }),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.inner.base_url, path)
    }

    /// `GET path`, decoding the body as `T`.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures, non-2xx statuses or
    /// unexpected bodies.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.inner.client.get(self.url(path));
        self.execute("GET", path, request).await
    }

    /// `GET path?query`, decoding the body as `T`.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn get_query<Q, T>(&self, path: &str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.inner.client.get(self.url(path)).query(query);
        self.execute("GET", path, request).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.inner.client.post(self.url(path)).json(body);
        self.execute("POST", path, request).await
    }

    /// `POST path` without a body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.inner.client.post(self.url(path));
        self.execute("POST", path, request).await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.inner.client.patch(self.url(path)).json(body);
        self.execute("PATCH", path, request).await
    }

    /// `PATCH path` without a body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn patch_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.inner.client.patch(self.url(path));
        self.execute("PATCH", path, request).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.inner.client.delete(self.url(path));
        self.execute("DELETE", path, request).await
    }

    /// `POST path` with a multipart form.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        let request = self.inner.client.post(self.url(path)).multipart(form);
        self.execute("POST", path, request).await
    }

    /// Send a request once and decode the outcome.
    #[instrument(skip(self, request))]
    async fn execute<T: DeserializeOwned>(
        &self,
        method: &'static str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Request failed before a response");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            let message = error_message(&body).unwrap_or_else(|| SESSION_EXPIRED.to_string());
            if is_redirect_exempt(path) {
                debug!("Unauthenticated session probe");
            } else {
                tracing::warn!(
                    login_path = %self.inner.login_path,
                    "401 response, redirecting to login"
                );
                self.inner.navigator.redirect(&self.inner.login_path);
            }
            return Err(ApiError::Unauthorized { message });
        }

        if !status.is_success() {
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %truncate(&body),
                    "API returned server error"
                );
            } else {
                debug!(status = %status, body = %truncate(&body), "API returned client error");
            }
            let message = error_message(&body)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        decode(path, &body)
    }
}

/// Append `path` to `base`, tolerating a missing leading slash.
fn join_url(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn is_redirect_exempt(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    REDIRECT_EXEMPT.contains(&path)
}

/// Pull `message` out of an error body, if there is one.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

/// Decode a success body. Empty bodies decode as JSON `null`.
fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    let raw = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(raw).map_err(|source| {
        tracing::error!(
            error = %source,
            body = %truncate(body),
            "Failed to decode API response"
        );
        ApiError::Decode {
            path: path.to_string(),
            source,
        }
    })
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:8080/api", "/cart"),
            "http://localhost:8080/api/cart"
        );
        assert_eq!(
            join_url("http://localhost:8080/api", "cart"),
            "http://localhost:8080/api/cart"
        );
    }

    #[test]
    fn test_session_probe_is_exempt() {
        assert!(is_redirect_exempt("/auth/me"));
        assert!(!is_redirect_exempt("/auth/login"));
        assert!(!is_redirect_exempt("/cart"));
    }

    #[test]
    fn test_error_message_parsing() {
        assert_eq!(
            error_message(r#"{"message": "Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(error_message(r#"{"message": ""}"#), None);
        assert_eq!(error_message("<html>Bad Gateway</html>"), None);
    }

    #[test]
    fn test_decode_envelope() {
        let value: Envelope<Vec<i32>> = decode("/x", r#"{"data": [1, 2]}"#).unwrap();
        assert_eq!(value.data, vec![1, 2]);
    }

    #[test]
    fn test_decode_empty_body_as_null() {
        let value: Option<i32> = decode("/x", "").unwrap();
        assert_eq!(value, None);
        let (): () = decode("/x", "  ").unwrap();
    }

    #[test]
    fn test_decode_error_names_path() {
        let err = decode::<Envelope<i32>>("/products/home", "{}").unwrap_err();
        assert!(
            matches!(err, ApiError::Decode { ref path, .. } if path == "/products/home")
        );
    }
}
