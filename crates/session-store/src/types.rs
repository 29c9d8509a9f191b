//! Persisted session records.

use serde::{Deserialize, Serialize};

/// Resolved user identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// User id from the identity provider
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    /// Role name, e.g. `ADMIN` or `EMPLOYEE`
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, alias = "companyId")]
    pub company_id: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Tenant record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One entry of the server-supplied navigation tree.
///
/// Carries either an absolute `url` (parsed for its path component)
/// or an already-relative `path`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavItem {
    pub label: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Tenant context attached to outbound requests as informational headers.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyContext {
    pub company_id: String,
    pub subdomain: Option<String>,
}
