//! HTTP gateway for the PeopleHub API.
//!
//! Wraps a single `reqwest::Client` with the two interception stages
//! the SPA applied to every call: credential/tenant header injection
//! on the way out, and failure classification with recovery policies
//! on the way back (silent refresh + one retry for 401, Retry-After +
//! one retry for 429, structured normalization for everything else).

use crate::error::{ApiError, ErrorCode};
use crate::events::{LogoutReason, SessionEvent, SessionEvents};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use session_store::CredentialStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Endpoints that never receive an `Authorization` header, matched
/// against the request path (relative to the API base) by exact match
/// or prefix-with-trailing-slash.
const PUBLIC_PATHS: &[&str] = &[
    "/health",
    "/info",
    "/plans",
    "/subscriptions",
    "/auth/challenge",
    "/auth/login",
    "/auth/token",
    "/auth/register",
    "/auth/forgot-password",
    "/uas",
];

/// Fallback delay for a 429 without a `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// OAuth client settings threaded through the handshake and the
/// gateway's silent refresh.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Check whether a path (relative to the API base) is public.
pub fn is_public_path(path: &str) -> bool {
    let normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    // Ignore any query component
    let normalized = normalized.split('?').next().unwrap_or(&normalized);

    PUBLIC_PATHS.iter().any(|public| {
        normalized == *public || normalized.starts_with(&format!("{}/", public))
    })
}

/// HTTP gateway over the remote API.
#[derive(Clone)]
pub struct ApiGateway {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
    oauth: OAuthClient,
    events: SessionEvents,
}

#[derive(serde::Deserialize)]
struct RefreshedTokens {
    access_token: String,
}

impl ApiGateway {
    /// Create a new gateway.
    pub fn new(
        base_url: Url,
        credentials: Arc<dyn CredentialStore>,
        oauth: OAuthClient,
        events: SessionEvents,
    ) -> Self {
        let mut base_url = base_url;
        // join() replaces the last path segment unless the base ends
        // with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            http: reqwest::Client::new(),
            base_url,
            credentials,
            oauth,
            events,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::new(ErrorCode::UnknownError, e.to_string()))?;
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::new(ErrorCode::UnknownError, e.to_string()))?;
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::new(ErrorCode::UnknownError, e.to_string()))?;
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, None).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let value = self.execute(method, path, body).await?;
        serde_json::from_value(value).map_err(|e| {
            ApiError::new(
                ErrorCode::UnknownError,
                format!("unexpected response shape: {}", e),
            )
        })
    }

    /// Path of `url` relative to the API base, for allow-list matching.
    fn relative_path(&self, url: &Url) -> String {
        let base = self.base_url.path();
        match url.path().strip_prefix(base) {
            Some(rest) => format!("/{}", rest),
            None => url.path().to_string(),
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::new(ErrorCode::UnknownError, format!("bad path: {}", e)))?;
        let public = is_public_path(&self.relative_path(&url));

        // Retry markers live on this call, not on the gateway, so
        // concurrent requests never interfere with each other's counts.
        let mut retried_auth = false;
        let mut retried_rate_limit = false;

        loop {
            let mut req = self.http.request(method.clone(), url.clone());

            if !public {
                if let Ok(Some(token)) = self.credentials.access_token() {
                    req = req.bearer_auth(token);
                }
            }

            // Informational tenant headers go on every request
            if let Ok(Some(ctx)) = self.credentials.company_context() {
                req = req.header("X-Company-Id", &ctx.company_id);
                if let Some(subdomain) = &ctx.subdomain {
                    req = req.header("X-Subdomain", subdomain);
                }
            }

            if let Some(body) = &body {
                req = req.json(body);
            }

            let response = match req.send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!(url = %url, error = %e, "request failed without a response");
                    return Err(ApiError::new(ErrorCode::NetworkError, e.to_string()));
                }
            };

            let status = response.status();

            if status.is_success() {
                let text = response.text().await.unwrap_or_default();
                if text.trim().is_empty() {
                    return Ok(Value::Null);
                }
                return serde_json::from_str(&text).map_err(|e| {
                    ApiError::new(
                        ErrorCode::UnknownError,
                        format!("invalid JSON in response: {}", e),
                    )
                });
            }

            if status == StatusCode::UNAUTHORIZED {
                let had_refresh_token =
                    matches!(self.credentials.refresh_token(), Ok(Some(_)));

                if !retried_auth && had_refresh_token {
                    match self.silent_refresh().await {
                        Ok(()) => {
                            debug!(url = %url, "silent refresh succeeded, retrying request");
                            retried_auth = true;
                            continue;
                        }
                        Err(e) => {
                            warn!(url = %url, error = %e, "silent refresh failed");
                        }
                    }
                }

                // Unrecoverable: tear the session down and tell the app
                let _ = self.credentials.clear_session();
                self.events.emit(SessionEvent::LoggedOut {
                    reason: LogoutReason::AuthExpired,
                    user_id: None,
                    email: None,
                });

                let code = if had_refresh_token {
                    ErrorCode::AuthExpired
                } else {
                    ErrorCode::Unauthorized
                };
                let body = read_error_body(response).await;
                return Err(classified(code, &body, "Session expired"));
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if !retried_rate_limit {
                    let delay = retry_after_secs(&response);
                    debug!(url = %url, delay_secs = delay, "rate limited, backing off");
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    retried_rate_limit = true;
                    continue;
                }
                let body = read_error_body(response).await;
                return Err(classified(
                    ErrorCode::RateLimited,
                    &body,
                    "Too many requests",
                ));
            }

            let body = read_error_body(response).await;
            return Err(classify_failure(status, &body));
        }
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Goes straight through the inner `reqwest` client rather than
    /// `execute`, so the refresh itself is never intercepted, and
    /// writes the new access token through the credential store.
    async fn silent_refresh(&self) -> Result<(), ApiError> {
        let refresh_token = self
            .credentials
            .refresh_token()
            .ok()
            .flatten()
            .ok_or_else(|| ApiError::new(ErrorCode::Unauthorized, "no refresh token"))?;

        let url = self
            .base_url
            .join("auth/token")
            .map_err(|e| ApiError::new(ErrorCode::UnknownError, e.to_string()))?;

        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
                "client_id": self.oauth.client_id,
                "client_secret": self.oauth.client_secret,
                "redirect_uri": self.oauth.redirect_uri,
            }))
            .send()
            .await
            .map_err(|e| ApiError::new(ErrorCode::NetworkError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ApiError::new(
                ErrorCode::AuthExpired,
                format!("refresh rejected with status {}", status),
            ));
        }

        let tokens: RefreshedTokens = response
            .json()
            .await
            .map_err(|e| ApiError::new(ErrorCode::UnknownError, e.to_string()))?;

        self.credentials
            .set_access_token(&tokens.access_token)
            .map_err(|e| ApiError::new(ErrorCode::UnknownError, e.to_string()))?;

        Ok(())
    }
}

/// Seconds to wait before the single 429 retry.
fn retry_after_secs(response: &reqwest::Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

async fn read_error_body(response: reqwest::Response) -> Value {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or(Value::Null)
}

fn server_message(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(String::from)
}

fn field_errors(body: &Value) -> Option<HashMap<String, Vec<String>>> {
    let map = body.get("errors")?.as_object()?;
    let mut out = HashMap::new();
    for (field, value) in map {
        let messages = match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
            _ => continue,
        };
        out.insert(field.clone(), messages);
    }
    Some(out)
}

fn classified(code: ErrorCode, body: &Value, fallback: &str) -> ApiError {
    ApiError::new(code, server_message(body).unwrap_or_else(|| fallback.to_string()))
}

/// Map a non-retryable failure status onto the error taxonomy.
fn classify_failure(status: StatusCode, body: &Value) -> ApiError {
    match status {
        StatusCode::FORBIDDEN => classified(ErrorCode::Forbidden, body, "Access denied"),
        StatusCode::NOT_FOUND => classified(ErrorCode::NotFound, body, "Resource not found"),
        StatusCode::CONFLICT => classified(ErrorCode::Conflict, body, "Conflict"),
        StatusCode::UNPROCESSABLE_ENTITY => {
            let mut err = classified(ErrorCode::ValidationError, body, "Validation failed");
            if let Some(fields) = field_errors(body) {
                err = err.with_errors(fields);
            }
            err
        }
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            classified(ErrorCode::ServerError, body, "Server error")
        }
        _ => classified(
            ErrorCode::UnknownError,
            body,
            &format!("Unexpected status {}", status),
        ),
    }
}
