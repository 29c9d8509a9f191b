//! Session orchestration.
//!
//! `SessionManager` sequences the login handshake (challenge →
//! credentials → token exchange → user info), keeps the in-memory
//! `Session` mirror and the persistent vault in step, and owns the
//! logout event bus. Authentication is derived from data: the session
//! is authenticated exactly when an access token and a user record are
//! both present. The state machine exists for tracing and status
//! output, never as the source of truth.

use crate::claims::{decode_claims, IdentityClaims};
use crate::error::{AuthError, AuthResult};
use crate::events::{LogoutReason, SessionEvent, SessionEvents};
use crate::gateway::{ApiGateway, OAuthClient};
use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionPhase};
use chrono::{Duration as ChronoDuration, Utc};
use serde::Deserialize;
use serde_json::Value;
use session_store::{CompanyProfile, CredentialStore, NavItem, SessionVault, UserProfile};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use url::Url;

/// In-memory mirror of the persisted session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub identity_token: Option<String>,
    /// Absolute expiry (RFC 3339), informational only
    pub expires_at: Option<String>,
    pub user: Option<UserProfile>,
    pub company: Option<CompanyProfile>,
    pub navigation: Option<Vec<NavItem>>,
    pub dashboard_url: Option<String>,
    pub routes: Option<Value>,
    /// Raw challenge payload from the handshake's first step
    pub challenge: Option<Value>,
    /// Correlator threaded through credential submission
    pub login_challenge: Option<String>,
}

impl Session {
    /// A session is authenticated exactly when an access token and a
    /// user record are both present.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.user.is_some()
    }

    /// Role of the signed-in user, if known.
    pub fn role(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.role.as_deref())
    }

    /// Reset every field.
    pub fn clear(&mut self) {
        *self = Session::default();
    }
}

/// Result of the challenge step.
#[derive(Debug, Clone)]
pub enum ChallengeOutcome {
    /// The host must perform a full navigation to this URL
    Redirect(String),
    /// A challenge was issued; credentials come next
    Issued(Value),
}

/// Result of credential submission.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// OAuth continuation; the host must navigate to this URL
    Redirect(String),
    /// Password-direct login, fully signed in
    Authenticated(UserProfile),
    /// Neither a redirect nor a direct login; caller interprets
    Pending(Value),
}

/// Result of the token exchange.
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    /// Identity resolved (from the response or the identity token)
    Authenticated(UserProfile),
    /// Tokens stored, but no usable identity yet
    TokensOnly,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    id_token: Option<String>,
    navigation: Option<Vec<NavItem>>,
    #[serde(alias = "dashboardUrl")]
    dashboard_url: Option<String>,
    routes: Option<Value>,
    user: Option<UserProfile>,
    company: Option<CompanyProfile>,
}

/// Orchestrates the login handshake and session lifecycle.
pub struct SessionManager {
    vault: Arc<SessionVault>,
    gateway: ApiGateway,
    oauth: OAuthClient,
    session: Mutex<Session>,
    machine: Mutex<SessionMachine>,
    events: SessionEvents,
}

impl SessionManager {
    /// Create a new manager over the given vault and API base.
    pub fn new(vault: Arc<SessionVault>, base_url: Url, oauth: OAuthClient) -> Self {
        let events = SessionEvents::new();
        let credentials: Arc<dyn CredentialStore> = vault.clone();
        let gateway = ApiGateway::new(base_url, credentials, oauth.clone(), events.clone());

        Self {
            vault,
            gateway,
            oauth,
            session: Mutex::new(Session::default()),
            machine: Mutex::new(SessionMachine::new()),
            events,
        }
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.lock().unwrap().clone()
    }

    /// Current handshake phase.
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from(self.machine.lock().unwrap().state())
    }

    /// Event bus for logout notifications.
    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Gateway for authenticated calls outside the auth namespace.
    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    /// Feed the state machine, tolerating out-of-order inputs.
    ///
    /// The machine is trace state; a server that short-circuits the
    /// handshake must not wedge the client.
    fn advance(&self, input: SessionMachineInput) {
        let mut machine = self.machine.lock().unwrap();
        if machine.consume(&input).is_err() {
            debug!(state = ?machine.state(), input = ?input, "ignoring out-of-order transition");
        }
    }

    // ==========================================
    // Startup
    // ==========================================

    /// Rebuild the in-memory session from the vault.
    ///
    /// When no structured user record was persisted but an identity
    /// token was, a provisional user is decoded from the token so a
    /// reload lands signed in without a round trip.
    pub fn rehydrate(&self) -> AuthResult<()> {
        let mut restored = Session {
            access_token: self.vault.get_access_token()?,
            refresh_token: self.vault.get_refresh_token()?,
            identity_token: self.vault.get_identity_token()?,
            expires_at: self.vault.get_expires_at()?,
            user: self.vault.get_user()?,
            company: self.vault.get_company()?,
            navigation: self.vault.get_navigation()?,
            dashboard_url: self.vault.get_dashboard_url()?,
            routes: self.vault.get_routes()?,
            challenge: None,
            login_challenge: None,
        };

        if restored.user.is_none() {
            if let Some(token) = &restored.identity_token {
                restored.user = provisional_user(token);
            }
        }

        let authenticated = restored.is_authenticated();
        *self.session.lock().unwrap() = restored;

        if authenticated {
            self.advance(SessionMachineInput::SessionRestored);
            info!("session restored from storage");
        }
        Ok(())
    }

    // ==========================================
    // Login handshake
    // ==========================================

    /// Start the login flow by requesting a challenge.
    pub async fn request_challenge(
        &self,
        email: &str,
        scope: &str,
        state: &str,
    ) -> AuthResult<ChallengeOutcome> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("email", email)
            .append_pair("client_id", &self.oauth.client_id)
            .append_pair("response_type", "code")
            .append_pair("scope", scope)
            .append_pair("state", state)
            .append_pair("redirect_uri", &self.oauth.redirect_uri)
            .finish();

        let payload: Value = self.gateway.get(&format!("auth/challenge?{}", query)).await?;

        self.advance(SessionMachineInput::ChallengeAccepted);

        if let Some(url) = string_field(&payload, &["loginUrl", "login_url"]) {
            // The flow continues in a full-page navigation; nothing
            // local is meaningful past this point
            self.advance(SessionMachineInput::RedirectHandoff);
            return Ok(ChallengeOutcome::Redirect(url));
        }

        let correlator = string_field(&payload, &["login_challenge", "loginChallenge", "challenge"]);
        {
            let mut session = self.session.lock().unwrap();
            session.challenge = Some(payload.clone());
            session.login_challenge = correlator;
        }

        Ok(ChallengeOutcome::Issued(payload))
    }

    /// Submit credentials against the stored challenge.
    pub async fn submit_credentials(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> AuthResult<LoginOutcome> {
        let login_challenge = self
            .session
            .lock()
            .unwrap()
            .login_challenge
            .clone()
            .ok_or(AuthError::MissingChallenge)?;

        let payload: Value = self
            .gateway
            .post(
                "auth/login",
                &serde_json::json!({
                    "login_challenge": login_challenge,
                    "email": email,
                    "password": password,
                    "remember_me": remember_me,
                }),
            )
            .await?;

        self.advance(SessionMachineInput::CredentialsAccepted);

        if let Some(url) = string_field(&payload, &["redirectUrl", "redirect_url"]) {
            self.advance(SessionMachineInput::RedirectHandoff);
            return Ok(LoginOutcome::Redirect(url));
        }

        if payload.get("user").map_or(false, |u| u.is_object()) {
            let user: UserProfile = serde_json::from_value(payload["user"].clone())?;
            let company: Option<CompanyProfile> = payload
                .get("company")
                .filter(|c| c.is_object())
                .map(|c| serde_json::from_value(c.clone()))
                .transpose()?;

            self.vault.set_user(&user)?;
            if let Some(company) = &company {
                self.vault.set_company(company)?;
            }

            // Password-direct login may hand tokens over in the same
            // response
            if let Some(access) = string_field(&payload, &["access_token"]) {
                let refresh = string_field(&payload, &["refresh_token"]);
                let identity = string_field(&payload, &["id_token"]);
                let expires = payload
                    .get("expires_in")
                    .and_then(Value::as_i64)
                    .map(expires_at_from_now);
                self.vault.store_tokens(
                    &access,
                    refresh.as_deref(),
                    identity.as_deref(),
                    expires.as_deref(),
                )?;

                let mut session = self.session.lock().unwrap();
                session.access_token = Some(access);
                if refresh.is_some() {
                    session.refresh_token = refresh;
                }
                if identity.is_some() {
                    session.identity_token = identity;
                }
                if expires.is_some() {
                    session.expires_at = expires;
                }
            }

            {
                let mut session = self.session.lock().unwrap();
                session.user = Some(user.clone());
                session.company = company;
                session.challenge = None;
                session.login_challenge = None;
            }

            self.advance(SessionMachineInput::DirectLogin);
            info!(user_id = %user.id, "signed in via direct login");
            return Ok(LoginOutcome::Authenticated(user));
        }

        Ok(LoginOutcome::Pending(payload))
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_token(&self, code: &str) -> AuthResult<ExchangeOutcome> {
        let response: TokenResponse = self
            .gateway
            .post(
                "auth/token",
                &serde_json::json!({
                    "grant_type": "authorization_code",
                    "code": code,
                    "client_id": self.oauth.client_id,
                    "client_secret": self.oauth.client_secret,
                    "redirect_uri": self.oauth.redirect_uri,
                }),
            )
            .await?;

        self.advance(SessionMachineInput::TokensIssued);
        let outcome = self.adopt_tokens(response)?;

        if let ExchangeOutcome::Authenticated(user) = &outcome {
            self.advance(SessionMachineInput::IdentityResolved);
            info!(user_id = %user.id, "token exchange complete");
        } else {
            info!("token exchange stored credentials without an identity");
        }
        Ok(outcome)
    }

    /// Persist a token response and update the mirror.
    ///
    /// Navigation, dashboard URL and routes are stored together in the
    /// same step they arrive, independent of whether the response also
    /// carried a user.
    fn adopt_tokens(&self, response: TokenResponse) -> AuthResult<ExchangeOutcome> {
        let expires_at = response.expires_in.map(expires_at_from_now);

        self.vault.store_tokens(
            &response.access_token,
            response.refresh_token.as_deref(),
            response.id_token.as_deref(),
            expires_at.as_deref(),
        )?;
        self.vault.store_login_artifacts(
            response.navigation.as_deref(),
            response.dashboard_url.as_deref(),
            response.routes.as_ref(),
        )?;

        let user = match response.user {
            Some(user) => Some(user),
            None => response.id_token.as_deref().and_then(provisional_user),
        };
        if let Some(user) = &user {
            self.vault.set_user(user)?;
        }
        if let Some(company) = &response.company {
            self.vault.set_company(company)?;
        }

        {
            let mut session = self.session.lock().unwrap();
            session.access_token = Some(response.access_token);
            if response.refresh_token.is_some() {
                session.refresh_token = response.refresh_token;
            }
            if response.id_token.is_some() {
                session.identity_token = response.id_token;
            }
            if expires_at.is_some() {
                session.expires_at = expires_at;
            }
            if response.navigation.is_some() {
                session.navigation = response.navigation;
            }
            if response.dashboard_url.is_some() {
                session.dashboard_url = response.dashboard_url;
            }
            if response.routes.is_some() {
                session.routes = response.routes;
            }
            if user.is_some() {
                session.user = user.clone();
            }
            if response.company.is_some() {
                session.company = response.company;
            }
            session.challenge = None;
            session.login_challenge = None;
        }

        match user {
            Some(user) => Ok(ExchangeOutcome::Authenticated(user)),
            None => Ok(ExchangeOutcome::TokensOnly),
        }
    }

    // ==========================================
    // Established-session operations
    // ==========================================

    /// Fetch the authoritative user record.
    ///
    /// An auth-shaped failure means the whole session is unusable, so
    /// every stored credential is cleared, not just this call failed.
    pub async fn fetch_user_info(&self) -> AuthResult<UserProfile> {
        if self.session.lock().unwrap().access_token.is_none() {
            return Err(AuthError::NotLoggedIn);
        }

        match self.gateway.get::<UserProfile>("auth/userinfo").await {
            Ok(user) => {
                self.vault.set_user(&user)?;
                self.session.lock().unwrap().user = Some(user.clone());
                self.advance(SessionMachineInput::IdentityResolved);
                Ok(user)
            }
            Err(err) if err.is_auth_failure() => {
                warn!(code = %err.code, "user-info rejected the session, clearing credentials");
                self.clear_session_state()?;
                self.advance(SessionMachineInput::SessionRevoked);
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Sign out.
    ///
    /// The server is informed on a best-effort basis when a refresh
    /// token exists; local state is cleared unconditionally and the
    /// operation always resolves.
    pub async fn logout(&self) -> AuthResult<()> {
        self.advance(SessionMachineInput::LogoutRequested);

        let (refresh_token, user_id, email) = {
            let session = self.session.lock().unwrap();
            (
                session.refresh_token.clone(),
                session.user.as_ref().map(|u| u.id.clone()),
                session.user.as_ref().and_then(|u| u.email.clone()),
            )
        };

        if let Some(refresh_token) = refresh_token {
            let result: Result<Value, _> = self
                .gateway
                .post(
                    "auth/logout",
                    &serde_json::json!({ "refresh_token": refresh_token }),
                )
                .await;
            if let Err(err) = result {
                warn!(error = %err, "server logout failed, clearing local state anyway");
            }
        }

        self.clear_session_state()?;
        self.advance(SessionMachineInput::LogoutComplete);
        self.events.emit(SessionEvent::LoggedOut {
            reason: LogoutReason::UserRequested,
            user_id,
            email,
        });
        info!("signed out");
        Ok(())
    }

    /// Exchange the refresh token for fresh credentials.
    ///
    /// A failed refresh ends the session; it is never retried.
    pub async fn refresh_access_token(&self) -> AuthResult<()> {
        let refresh_token = self
            .session
            .lock()
            .unwrap()
            .refresh_token
            .clone()
            .ok_or(AuthError::NoRefreshToken)?;

        let result: Result<TokenResponse, _> = self
            .gateway
            .post(
                "auth/token",
                &serde_json::json!({
                    "grant_type": "refresh_token",
                    "refresh_token": refresh_token,
                    "client_id": self.oauth.client_id,
                    "client_secret": self.oauth.client_secret,
                    "redirect_uri": self.oauth.redirect_uri,
                }),
            )
            .await;

        match result {
            Ok(response) => {
                self.advance(SessionMachineInput::TokensIssued);
                let outcome = self.adopt_tokens(response)?;
                if matches!(outcome, ExchangeOutcome::Authenticated(_)) {
                    self.advance(SessionMachineInput::IdentityResolved);
                }
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "refresh failed, session is over");
                let (user_id, email) = {
                    let session = self.session.lock().unwrap();
                    (
                        session.user.as_ref().map(|u| u.id.clone()),
                        session.user.as_ref().and_then(|u| u.email.clone()),
                    )
                };
                self.clear_session_state()?;
                self.advance(SessionMachineInput::SessionRevoked);
                self.events.emit(SessionEvent::LoggedOut {
                    reason: LogoutReason::RefreshFailed,
                    user_id,
                    email,
                });
                Err(err.into())
            }
        }
    }

    /// Clear the vault and the mirror together.
    fn clear_session_state(&self) -> AuthResult<()> {
        self.vault.clear_all()?;
        self.session.lock().unwrap().clear();
        Ok(())
    }
}

/// Absolute RFC 3339 expiry from a relative lifetime.
fn expires_at_from_now(expires_in: i64) -> String {
    (Utc::now() + ChronoDuration::seconds(expires_in)).to_rfc3339()
}

/// Decode a provisional user from an identity token. An undecodable
/// token yields `None`, never an error.
fn provisional_user(token: &str) -> Option<UserProfile> {
    let claims = decode_claims(token).ok()?;
    IdentityClaims::from_map(&claims).map(IdentityClaims::into_profile)
}

/// First string value under any of the given keys.
fn string_field(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| payload.get(*k))
        .and_then(Value::as_str)
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use session_store::{SessionStore, StorageResult};
    use std::collections::HashMap;

    /// In-memory storage for testing
    struct MemoryStore {
        data: Mutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                data: Mutex::new(HashMap::new()),
            }
        }
    }

    impl SessionStore for MemoryStore {
        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        fn delete(&self, key: &str) -> StorageResult<bool> {
            Ok(self.data.lock().unwrap().remove(key).is_some())
        }
    }

    fn test_manager() -> SessionManager {
        let vault = Arc::new(SessionVault::new(Box::new(MemoryStore::new())));
        SessionManager::new(
            vault,
            Url::parse("http://localhost:9/api/v1").unwrap(),
            OAuthClient {
                client_id: "portal".into(),
                client_secret: "secret".into(),
                redirect_uri: "http://localhost:4200/auth/callback".into(),
            },
        )
    }

    fn sample_user() -> UserProfile {
        UserProfile {
            id: "u-1".into(),
            email: Some("ada@acme.test".into()),
            first_name: Some("Ada".into()),
            last_name: None,
            role: Some("ADMIN".into()),
            company_id: Some("c-1".into()),
            permissions: vec![],
        }
    }

    fn identity_token(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{}.{}.sig", header, payload)
    }

    #[test]
    fn test_is_authenticated_requires_token_and_user() {
        let mut session = Session::default();
        assert!(!session.is_authenticated());

        session.access_token = Some("a-1".into());
        assert!(!session.is_authenticated());

        session.user = Some(sample_user());
        assert!(session.is_authenticated());

        session.access_token = None;
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_session_clear() {
        let mut session = Session {
            access_token: Some("a-1".into()),
            refresh_token: Some("r-1".into()),
            user: Some(sample_user()),
            dashboard_url: Some("https://acme.test/home".into()),
            ..Session::default()
        };
        session.clear();
        assert!(session.access_token.is_none());
        assert!(session.refresh_token.is_none());
        assert!(session.user.is_none());
        assert!(session.dashboard_url.is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_rehydrate_restores_session() {
        let manager = test_manager();
        manager
            .vault
            .store_tokens("a-1", Some("r-1"), None, None)
            .unwrap();
        manager.vault.set_user(&sample_user()).unwrap();

        manager.rehydrate().unwrap();

        let session = manager.session();
        assert!(session.is_authenticated());
        assert_eq!(session.access_token, Some("a-1".into()));
        assert_eq!(session.role(), Some("ADMIN"));
        assert!(manager.phase().is_authenticated());
    }

    #[test]
    fn test_rehydrate_synthesizes_user_from_identity_token() {
        let manager = test_manager();
        let token = identity_token(&serde_json::json!({
            "sub": "u-7",
            "email": "zoe@acme.test",
            "name": "Zoe Park",
            "role": "EMPLOYEE"
        }));
        manager
            .vault
            .store_tokens("a-1", None, Some(&token), None)
            .unwrap();

        manager.rehydrate().unwrap();

        let session = manager.session();
        assert!(session.is_authenticated());
        let user = session.user.unwrap();
        assert_eq!(user.id, "u-7");
        assert_eq!(user.first_name, Some("Zoe".into()));
        assert_eq!(user.last_name, Some("Park".into()));
    }

    #[test]
    fn test_rehydrate_with_undecodable_identity_token() {
        let manager = test_manager();
        manager
            .vault
            .store_tokens("a-1", None, Some("not-a-token"), None)
            .unwrap();

        manager.rehydrate().unwrap();

        // Tokens restored but not authenticated
        let session = manager.session();
        assert_eq!(session.access_token, Some("a-1".into()));
        assert!(!session.is_authenticated());
        assert!(!manager.phase().is_authenticated());
    }

    #[test]
    fn test_rehydrate_empty_store() {
        let manager = test_manager();
        manager.rehydrate().unwrap();
        assert!(!manager.session().is_authenticated());
        assert_eq!(manager.phase(), SessionPhase::SignedOut);
    }

    #[tokio::test]
    async fn test_submit_credentials_requires_challenge() {
        let manager = test_manager();
        let result = manager.submit_credentials("ada@acme.test", "pw", false).await;
        assert!(matches!(result, Err(AuthError::MissingChallenge)));
    }

    #[tokio::test]
    async fn test_fetch_user_info_requires_access_token() {
        let manager = test_manager();
        let result = manager.fetch_user_info().await;
        assert!(matches!(result, Err(AuthError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn test_refresh_requires_refresh_token() {
        let manager = test_manager();
        let result = manager.refresh_access_token().await;
        assert!(matches!(result, Err(AuthError::NoRefreshToken)));
    }

    #[tokio::test]
    async fn test_logout_without_refresh_token_clears_everything() {
        let manager = test_manager();
        // A session that never completed the exchange: access token
        // and user, no refresh token, so logout skips the network
        manager.vault.store_tokens("a-1", None, None, None).unwrap();
        manager.vault.set_user(&sample_user()).unwrap();
        manager
            .vault
            .store_login_artifacts(None, Some("https://acme.test/home"), None)
            .unwrap();
        manager.rehydrate().unwrap();
        assert!(manager.session().is_authenticated());

        let mut rx = manager.events().subscribe();
        manager.logout().await.unwrap();

        assert!(!manager.session().is_authenticated());
        assert_eq!(manager.vault.get_access_token().unwrap(), None);
        assert_eq!(manager.vault.get_user().unwrap(), None);
        assert_eq!(manager.vault.get_dashboard_url().unwrap(), None);
        assert_eq!(manager.phase(), SessionPhase::SignedOut);

        match rx.recv().await.unwrap() {
            SessionEvent::LoggedOut { reason, user_id, .. } => {
                assert_eq!(reason, LogoutReason::UserRequested);
                assert_eq!(user_id, Some("u-1".into()));
            }
        }
    }

    #[test]
    fn test_adopt_tokens_persists_artifacts_without_user() {
        let manager = test_manager();
        let token = identity_token(&serde_json::json!({ "sub": "u-3", "role": "ADMIN" }));

        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a-9",
            "refresh_token": "r-9",
            "expires_in": 3600,
            "id_token": token,
            "navigation": [{ "label": "Dashboard", "path": "/acme/dashboard" }],
            "dashboard_url": "https://acme.test/acme/home",
            "routes": { "admin": ["/acme/settings"] }
        }))
        .unwrap();

        let outcome = manager.adopt_tokens(response).unwrap();

        // Artifacts stored together, identity synthesized from token
        assert!(matches!(outcome, ExchangeOutcome::Authenticated(ref u) if u.id == "u-3"));
        assert_eq!(manager.vault.get_access_token().unwrap(), Some("a-9".into()));
        assert_eq!(manager.vault.get_navigation().unwrap().unwrap().len(), 1);
        assert_eq!(
            manager.vault.get_dashboard_url().unwrap(),
            Some("https://acme.test/acme/home".into())
        );
        assert!(manager.vault.get_routes().unwrap().is_some());
        assert!(manager.vault.get_expires_at().unwrap().is_some());
        assert!(manager.session().is_authenticated());
    }

    #[test]
    fn test_adopt_tokens_without_identity_stays_unauthenticated() {
        let manager = test_manager();

        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a-9",
            "refresh_token": "r-9"
        }))
        .unwrap();

        let outcome = manager.adopt_tokens(response).unwrap();

        assert!(matches!(outcome, ExchangeOutcome::TokensOnly));
        assert_eq!(manager.vault.get_access_token().unwrap(), Some("a-9".into()));
        assert!(!manager.session().is_authenticated());
    }

    #[test]
    fn test_token_response_accepts_camel_case_dashboard_url() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a-1",
            "dashboardUrl": "https://acme.test/home"
        }))
        .unwrap();
        assert_eq!(response.dashboard_url, Some("https://acme.test/home".into()));
    }

    #[test]
    fn test_string_field_spellings() {
        let payload = serde_json::json!({ "redirectUrl": "https://idp.test/continue" });
        assert_eq!(
            string_field(&payload, &["redirectUrl", "redirect_url"]),
            Some("https://idp.test/continue".into())
        );
        assert_eq!(string_field(&payload, &["loginUrl"]), None);
    }
}
