//! Identity-token claim decoding.
//!
//! Decodes the payload segment of a compact three-part token into a
//! claims map. No signature verification happens here — verification
//! is the server's job; these claims only bootstrap the UI before the
//! user-info round trip completes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};
use session_store::UserProfile;
use thiserror::Error;

/// Decode failure. Callers treat this as "no usable identity" and
/// proceed with the token absent.
#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error("token does not have three segments")]
    Shape,

    #[error("payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotObject,
}

/// Decode the middle segment of a `header.payload.signature` token
/// into a claims map.
pub fn decode_claims(token: &str) -> Result<Map<String, Value>, ClaimsError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(ClaimsError::Shape);
    }

    // Tolerate both padded and unpadded encodings
    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    let text = String::from_utf8(bytes)?;

    match serde_json::from_str(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(ClaimsError::NotObject),
    }
}

/// The identity fields this client recognizes inside a claims map.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaims {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub company_id: Option<String>,
    pub subdomain: Option<String>,
}

impl IdentityClaims {
    /// Extract recognized fields from a claims map.
    ///
    /// Returns `None` when no subject id is present in any accepted
    /// spelling — a claims map without an id is useless for bootstrap.
    pub fn from_map(claims: &Map<String, Value>) -> Option<Self> {
        let get = |keys: &[&str]| -> Option<String> {
            keys.iter()
                .find_map(|k| claims.get(*k))
                .and_then(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
        };

        let user_id = get(&["sub", "userId"])?;

        Some(Self {
            user_id,
            email: get(&["email"]),
            name: get(&["name"]),
            role: get(&["role"]),
            company_id: get(&["companyId", "company_id"]),
            subdomain: get(&["subdomain"]),
        })
    }

    /// Build a provisional user profile from the claims.
    ///
    /// The profile is replaced by the authoritative record once the
    /// user-info endpoint answers.
    pub fn into_profile(self) -> UserProfile {
        let (first_name, last_name) = match self.name {
            Some(full) => match full.split_once(char::is_whitespace) {
                Some((first, rest)) => (Some(first.to_string()), Some(rest.trim().to_string())),
                None => (Some(full), None),
            },
            None => (None, None),
        };

        UserProfile {
            id: self.user_id,
            email: self.email,
            first_name,
            last_name,
            role: self.role,
            company_id: self.company_id,
            permissions: Vec::new(),
        }
    }
}
