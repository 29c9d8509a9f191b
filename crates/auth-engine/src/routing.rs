//! Post-login landing-route policy.
//!
//! One pure function decides where a user lands after signing in, fed
//! by the session's navigation tree and dashboard URL. Hosts apply it
//! only on entry locations; everywhere else the current location wins.

use crate::session::Session;
use session_store::NavItem;
use url::Url;

/// Role granted the dashboard-first landing preference.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Locations where the landing policy applies.
const ENTRY_PATHS: &[&str] = &["/", "/login", "/auth/login"];

/// Landing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Landing {
    /// Not an entry location; leave the user where they are
    Stay,
    /// Unauthenticated; send to the login page
    Login,
    /// Navigate to this path
    Redirect(String),
    /// Authenticated but server data has not arrived yet
    Loading,
}

/// Decide the landing route for the current location.
pub fn resolve_landing(session: &Session, current_path: &str) -> Landing {
    if !ENTRY_PATHS.contains(&current_path) {
        return Landing::Stay;
    }

    if !session.is_authenticated() {
        return Landing::Login;
    }

    if session.role() == Some(ADMIN_ROLE) {
        // Malformed dashboard URLs fall through to the navigation tree
        if let Some(path) = session.dashboard_url.as_deref().and_then(url_path) {
            return Landing::Redirect(path);
        }
    }

    match first_navigation_path(session.navigation.as_deref()) {
        Some(path) => Landing::Redirect(path),
        None => Landing::Loading,
    }
}

/// Path component of an absolute URL, if it parses.
fn url_path(raw: &str) -> Option<String> {
    Url::parse(raw).ok().map(|u| u.path().to_string())
}

/// Landing path of the first resolvable navigation item.
///
/// An item's `url` takes precedence, reduced to its path component;
/// otherwise the `path` field is used directly.
fn first_navigation_path(navigation: Option<&[NavItem]>) -> Option<String> {
    navigation?.iter().find_map(|item| {
        if let Some(url) = item.url.as_deref() {
            if let Some(path) = url_path(url) {
                return Some(path);
            }
        }
        item.path.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_store::UserProfile;

    fn user(role: &str) -> UserProfile {
        UserProfile {
            id: "u-1".into(),
            email: Some("ada@acme.test".into()),
            first_name: None,
            last_name: None,
            role: Some(role.into()),
            company_id: None,
            permissions: vec![],
        }
    }

    fn nav(label: &str, url: Option<&str>, path: Option<&str>) -> NavItem {
        NavItem {
            label: label.into(),
            url: url.map(String::from),
            path: path.map(String::from),
        }
    }

    fn authenticated(role: &str) -> Session {
        Session {
            access_token: Some("a-1".into()),
            user: Some(user(role)),
            ..Session::default()
        }
    }

    #[test]
    fn test_non_entry_path_stays() {
        let session = Session::default();
        assert_eq!(resolve_landing(&session, "/acme/employees"), Landing::Stay);
        assert_eq!(resolve_landing(&session, "/settings"), Landing::Stay);
    }

    #[test]
    fn test_unauthenticated_goes_to_login() {
        let session = Session::default();
        assert_eq!(resolve_landing(&session, "/"), Landing::Login);
        assert_eq!(resolve_landing(&session, "/login"), Landing::Login);
        assert_eq!(resolve_landing(&session, "/auth/login"), Landing::Login);
    }

    #[test]
    fn test_token_without_user_is_not_authenticated() {
        let session = Session {
            access_token: Some("a-1".into()),
            ..Session::default()
        };
        assert_eq!(resolve_landing(&session, "/"), Landing::Login);
    }

    #[test]
    fn test_admin_prefers_dashboard_url() {
        let mut session = authenticated(ADMIN_ROLE);
        session.dashboard_url = Some("https://acme.test/acme/overview".into());
        session.navigation = Some(vec![nav("Dashboard", None, Some("/acme/dashboard"))]);

        assert_eq!(
            resolve_landing(&session, "/login"),
            Landing::Redirect("/acme/overview".into())
        );
    }

    #[test]
    fn test_admin_falls_back_to_navigation() {
        let mut session = authenticated(ADMIN_ROLE);
        session.navigation = Some(vec![
            nav("Dashboard", None, Some("/acme/dashboard")),
            nav("Employees", None, Some("/acme/employees")),
        ]);

        assert_eq!(
            resolve_landing(&session, "/"),
            Landing::Redirect("/acme/dashboard".into())
        );
    }

    #[test]
    fn test_admin_malformed_dashboard_url_is_not_fatal() {
        let mut session = authenticated(ADMIN_ROLE);
        session.dashboard_url = Some("::not a url::".into());
        session.navigation = Some(vec![nav("Dashboard", None, Some("/acme/dashboard"))]);

        assert_eq!(
            resolve_landing(&session, "/login"),
            Landing::Redirect("/acme/dashboard".into())
        );
    }

    #[test]
    fn test_admin_empty_navigation_shows_loading() {
        let mut session = authenticated(ADMIN_ROLE);
        session.navigation = Some(vec![]);
        assert_eq!(resolve_landing(&session, "/"), Landing::Loading);

        session.navigation = None;
        assert_eq!(resolve_landing(&session, "/"), Landing::Loading);
    }

    #[test]
    fn test_non_admin_uses_navigation() {
        let mut session = authenticated("EMPLOYEE");
        session.dashboard_url = Some("https://acme.test/acme/overview".into());
        session.navigation = Some(vec![nav("Leaves", None, Some("/acme/leaves"))]);

        // Dashboard URL is an admin-only preference
        assert_eq!(
            resolve_landing(&session, "/login"),
            Landing::Redirect("/acme/leaves".into())
        );
    }

    #[test]
    fn test_non_admin_empty_navigation_shows_loading() {
        let session = authenticated("EMPLOYEE");
        assert_eq!(resolve_landing(&session, "/"), Landing::Loading);
    }

    #[test]
    fn test_navigation_url_takes_precedence_over_path() {
        let mut session = authenticated("EMPLOYEE");
        session.navigation = Some(vec![nav(
            "Home",
            Some("https://acme.test/acme/home?tab=1"),
            Some("/ignored"),
        )]);

        assert_eq!(
            resolve_landing(&session, "/"),
            Landing::Redirect("/acme/home".into())
        );
    }

    #[test]
    fn test_navigation_bad_url_falls_back_to_path() {
        let mut session = authenticated("EMPLOYEE");
        session.navigation = Some(vec![nav("Home", Some("::bad::"), Some("/acme/home"))]);

        assert_eq!(
            resolve_landing(&session, "/"),
            Landing::Redirect("/acme/home".into())
        );
    }

    #[test]
    fn test_navigation_skips_unresolvable_items() {
        let mut session = authenticated("EMPLOYEE");
        session.navigation = Some(vec![
            nav("Broken", None, None),
            nav("Works", None, Some("/acme/works")),
        ]);

        assert_eq!(
            resolve_landing(&session, "/"),
            Landing::Redirect("/acme/works".into())
        );
    }
}
