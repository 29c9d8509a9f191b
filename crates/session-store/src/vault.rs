//! High-level typed API over the raw session store.

use crate::{
    CompanyContext, CompanyProfile, NavItem, SessionKeys, SessionStore, StorageResult, StoreError,
    UserProfile,
};
use serde_json::Value;

/// Narrow capability handed to the HTTP gateway.
///
/// The gateway only needs to read credentials, write a silently
/// refreshed access token, and tear the session down on an
/// unrecoverable 401. It never sees the full vault API.
pub trait CredentialStore: Send + Sync {
    /// Current access token, if any
    fn access_token(&self) -> StorageResult<Option<String>>;

    /// Current refresh token, if any
    fn refresh_token(&self) -> StorageResult<Option<String>>;

    /// Persist a refreshed access token
    fn set_access_token(&self, token: &str) -> StorageResult<()>;

    /// Tenant context for the `X-Company-Id` / `X-Subdomain` headers
    fn company_context(&self) -> StorageResult<Option<CompanyContext>>;

    /// Remove every session key
    fn clear_session(&self) -> StorageResult<()>;
}

/// Typed facade for storing and retrieving session state.
pub struct SessionVault {
    store: Box<dyn SessionStore>,
}

impl SessionVault {
    /// Create a new vault over the given storage backend.
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self { store }
    }

    fn set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string(value).map_err(|e| StoreError::Encoding(e.to_string()))?;
        self.store.set(key, &json)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.store.get(key)? {
            Some(json) => {
                let value =
                    serde_json::from_str(&json).map_err(|e| StoreError::Encoding(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    // ==========================================
    // Tokens
    // ==========================================

    pub fn get_access_token(&self) -> StorageResult<Option<String>> {
        self.store.get(SessionKeys::ACCESS_TOKEN)
    }

    pub fn set_access_token_value(&self, token: &str) -> StorageResult<()> {
        self.store.set(SessionKeys::ACCESS_TOKEN, token)
    }

    pub fn get_refresh_token(&self) -> StorageResult<Option<String>> {
        self.store.get(SessionKeys::REFRESH_TOKEN)
    }

    pub fn get_identity_token(&self) -> StorageResult<Option<String>> {
        self.store.get(SessionKeys::IDENTITY_TOKEN)
    }

    pub fn get_expires_at(&self) -> StorageResult<Option<String>> {
        self.store.get(SessionKeys::EXPIRES_AT)
    }

    /// Store the token set from a successful exchange in one logical step.
    ///
    /// A rotated refresh token replaces the old one; an absent refresh or
    /// identity token leaves the previously stored value in place.
    pub fn store_tokens(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        identity_token: Option<&str>,
        expires_at: Option<&str>,
    ) -> StorageResult<()> {
        self.store.set(SessionKeys::ACCESS_TOKEN, access_token)?;
        if let Some(refresh) = refresh_token {
            self.store.set(SessionKeys::REFRESH_TOKEN, refresh)?;
        }
        if let Some(identity) = identity_token {
            self.store.set(SessionKeys::IDENTITY_TOKEN, identity)?;
        }
        if let Some(expires) = expires_at {
            self.store.set(SessionKeys::EXPIRES_AT, expires)?;
        }
        Ok(())
    }

    // ==========================================
    // Identity and tenant
    // ==========================================

    pub fn set_user(&self, user: &UserProfile) -> StorageResult<()> {
        self.set_json(SessionKeys::USER_INFO, user)
    }

    pub fn get_user(&self) -> StorageResult<Option<UserProfile>> {
        self.get_json(SessionKeys::USER_INFO)
    }

    pub fn set_company(&self, company: &CompanyProfile) -> StorageResult<()> {
        self.set_json(SessionKeys::COMPANY_INFO, company)
    }

    pub fn get_company(&self) -> StorageResult<Option<CompanyProfile>> {
        self.get_json(SessionKeys::COMPANY_INFO)
    }

    // ==========================================
    // Login artifacts
    // ==========================================

    /// Store navigation, dashboard URL, and route metadata together.
    ///
    /// These are replaced wholesale, never merged field-by-field: the
    /// persisted values must always describe the most recent exchange.
    pub fn store_login_artifacts(
        &self,
        navigation: Option<&[NavItem]>,
        dashboard_url: Option<&str>,
        routes: Option<&Value>,
    ) -> StorageResult<()> {
        if let Some(nav) = navigation {
            self.set_json(SessionKeys::NAVIGATION_DATA, &nav)?;
        }
        if let Some(url) = dashboard_url {
            self.store.set(SessionKeys::DASHBOARD_URL, url)?;
        }
        if let Some(routes) = routes {
            self.set_json(SessionKeys::ROUTES_DATA, routes)?;
        }
        Ok(())
    }

    pub fn get_navigation(&self) -> StorageResult<Option<Vec<NavItem>>> {
        self.get_json(SessionKeys::NAVIGATION_DATA)
    }

    pub fn get_dashboard_url(&self) -> StorageResult<Option<String>> {
        self.store.get(SessionKeys::DASHBOARD_URL)
    }

    pub fn get_routes(&self) -> StorageResult<Option<Value>> {
        self.get_json(SessionKeys::ROUTES_DATA)
    }

    // ==========================================
    // Session lifecycle
    // ==========================================

    /// Check whether a session exists (an access token is stored).
    pub fn has_session(&self) -> StorageResult<bool> {
        self.store.has(SessionKeys::ACCESS_TOKEN)
    }

    /// Remove every session key.
    ///
    /// Partial logout states are invalid, so this never stops at the
    /// first failed delete.
    pub fn clear_all(&self) -> StorageResult<()> {
        for key in SessionKeys::ALL {
            let _ = self.store.delete(key);
        }
        Ok(())
    }
}

impl CredentialStore for SessionVault {
    fn access_token(&self) -> StorageResult<Option<String>> {
        self.get_access_token()
    }

    fn refresh_token(&self) -> StorageResult<Option<String>> {
        self.get_refresh_token()
    }

    fn set_access_token(&self, token: &str) -> StorageResult<()> {
        self.set_access_token_value(token)
    }

    fn company_context(&self) -> StorageResult<Option<CompanyContext>> {
        let company = self.get_company()?;
        Ok(company.map(|c| CompanyContext {
            company_id: c.id,
            subdomain: c.subdomain,
        }))
    }

    fn clear_session(&self) -> StorageResult<()> {
        self.clear_all()
    }
}
