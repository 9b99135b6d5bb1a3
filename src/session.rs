//! Session state and route guards.
//!
//! The session is a process-wide value recomputed from every identity
//! notification; guards are pure predicates over it, re-applied on
//! every session change and on every navigation.

use crate::auth::UserHandle;

/// Process-wide session state.
#[derive(Debug, Clone)]
pub struct Session {
    /// Signed-in account, if any.
    pub current_user: Option<UserHandle>,
    /// Whether the account email is on the admin allow-list.
    pub is_admin: bool,
    /// True until the first provider notification arrives. While
    /// loading, no screen renders.
    pub loading: bool,
}

impl Session {
    /// A session that has not yet heard from the identity provider.
    pub fn new() -> Self {
        Self {
            current_user: None,
            is_admin: false,
            loading: true,
        }
    }

    /// Apply a provider notification.
    pub fn apply(&mut self, user: Option<UserHandle>, admin_emails: &[String]) {
        self.is_admin = user
            .as_ref()
            .map(|u| is_admin_email(&u.email, admin_emails))
            .unwrap_or(false);
        self.current_user = user;
        self.loading = false;
    }

    pub fn signed_in(&self) -> bool {
        self.current_user.is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact, case-sensitive membership test against the allow-list.
pub fn is_admin_email(email: &str, admin_emails: &[String]) -> bool {
    admin_emails.iter().any(|allowed| allowed == email)
}

/// Access requirement of a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No session required.
    Public,
    /// Any signed-in account.
    AnyUser,
    /// Allow-listed admin account.
    Admin,
}

/// Where a denied navigation lands instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    SignIn,
    Home,
}

/// Evaluate a guard. `None` means access is granted.
pub fn check_access(access: Access, session: &Session) -> Option<Redirect> {
    match access {
        Access::Public => None,
        Access::AnyUser => {
            if session.signed_in() {
                None
            } else {
                Some(Redirect::SignIn)
            }
        }
        Access::Admin => {
            if !session.signed_in() {
                Some(Redirect::SignIn)
            } else if !session.is_admin {
                Some(Redirect::Home)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(email: &str) -> Option<UserHandle> {
        Some(UserHandle {
            id: Uuid::new_v4(),
            email: email.to_string(),
        })
    }

    fn admins() -> Vec<String> {
        vec!["admin@example.com".to_string()]
    }

    #[test]
    fn test_admin_derivation_is_exact() {
        let mut session = Session::new();
        assert!(session.loading);

        session.apply(user("admin@example.com"), &admins());
        assert!(!session.loading);
        assert!(session.is_admin);

        session.apply(user("Admin@Example.com"), &admins());
        assert!(!session.is_admin);

        session.apply(user("learner@example.com"), &admins());
        assert!(!session.is_admin);

        session.apply(None, &admins());
        assert!(!session.is_admin);
        assert!(!session.signed_in());
    }

    #[test]
    fn test_signed_out_guards_redirect_to_sign_in() {
        let mut session = Session::new();
        session.apply(None, &admins());

        assert_eq!(check_access(Access::Public, &session), None);
        assert_eq!(
            check_access(Access::AnyUser, &session),
            Some(Redirect::SignIn)
        );
        assert_eq!(check_access(Access::Admin, &session), Some(Redirect::SignIn));
    }

    #[test]
    fn test_non_admin_hits_home_from_admin() {
        let mut session = Session::new();
        session.apply(user("learner@example.com"), &admins());

        assert_eq!(check_access(Access::AnyUser, &session), None);
        assert_eq!(check_access(Access::Admin, &session), Some(Redirect::Home));
    }

    #[test]
    fn test_admin_passes_all_guards() {
        let mut session = Session::new();
        session.apply(user("admin@example.com"), &admins());

        assert_eq!(check_access(Access::AnyUser, &session), None);
        assert_eq!(check_access(Access::Admin, &session), None);
    }
}
