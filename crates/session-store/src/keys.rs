//! Storage key constants.

/// Storage keys used by the session cache.
pub struct SessionKeys;

impl SessionKeys {
    /// Bearer credential for authenticated API calls
    pub const ACCESS_TOKEN: &'static str = "access_token";

    /// Long-lived credential used to mint new access tokens
    pub const REFRESH_TOKEN: &'static str = "refresh_token";

    /// Token carrying identity claims for client-side bootstrap
    pub const IDENTITY_TOKEN: &'static str = "identity_token";

    /// Absolute access-token expiry (RFC 3339), informational only
    pub const EXPIRES_AT: &'static str = "expires_at";

    /// Resolved user profile (JSON)
    pub const USER_INFO: &'static str = "user_info";

    /// Tenant record (JSON)
    pub const COMPANY_INFO: &'static str = "company_info";

    /// Server-supplied menu tree (JSON array)
    pub const NAVIGATION_DATA: &'static str = "navigation_data";

    /// Server-supplied route metadata (JSON)
    pub const ROUTES_DATA: &'static str = "routes_data";

    /// Preferred admin landing URL (raw string)
    pub const DASHBOARD_URL: &'static str = "dashboard_url";

    /// All session keys, in clearing order.
    pub const ALL: &'static [&'static str] = &[
        Self::ACCESS_TOKEN,
        Self::REFRESH_TOKEN,
        Self::IDENTITY_TOKEN,
        Self::EXPIRES_AT,
        Self::USER_INFO,
        Self::COMPANY_INFO,
        Self::NAVIGATION_DATA,
        Self::ROUTES_DATA,
        Self::DASHBOARD_URL,
    ];
}
