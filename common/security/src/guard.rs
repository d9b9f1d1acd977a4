use campus_auth::Role;

use crate::access::AccessEvaluator;

pub const LOGIN_ROUTE: &str = "/login";
pub const UNAUTHORIZED_ROUTE: &str = "/unauthorized";

/// Default landing destination per role, as wired into the login screen.
pub fn landing_route(role: Role) -> &'static str {
    match role {
        Role::Student => "/dashboard/student",
        Role::Teacher => "/teacher/dashboard",
        Role::Admin => "/admin/dashboard",
        Role::Parent => "/parent/dashboard",
    }
}

/// What a navigation target demands of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRule {
    Public,
    Authenticated,
    AnyRole(Vec<Role>),
    /// Login and signup screens; authenticated users are bounced to their
    /// dashboard.
    AnonymousOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// Applies access decisions at navigation boundaries.
#[derive(Clone)]
pub struct RouteGuard {
    evaluator: AccessEvaluator,
}

impl RouteGuard {
    pub fn new(evaluator: AccessEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &AccessEvaluator {
        &self.evaluator
    }

    pub fn evaluate(&self, rule: &RouteRule) -> RouteDecision {
        match rule {
            RouteRule::Public => RouteDecision::Allow,
            RouteRule::Authenticated => {
                if self.evaluator.is_authenticated() {
                    RouteDecision::Allow
                } else {
                    RouteDecision::Redirect(LOGIN_ROUTE)
                }
            }
            RouteRule::AnyRole(required) => {
                if !self.evaluator.is_authenticated() {
                    RouteDecision::Redirect(LOGIN_ROUTE)
                } else if self.evaluator.has_any_role(required) {
                    RouteDecision::Allow
                } else {
                    RouteDecision::Redirect(UNAUTHORIZED_ROUTE)
                }
            }
            RouteRule::AnonymousOnly => match self.evaluator.current_role() {
                Some(role) => RouteDecision::Redirect(landing_route(role)),
                None => RouteDecision::Allow,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use campus_auth::{codec, TokenLifetime};
    use campus_session::{
        AuthBackend, BackendError, LoginOutcome, LoginRequest, MemoryStorage, Profile,
        RefreshOutcome, SessionManager, SessionRecord, SessionStore,
    };

    struct NoBackend;

    #[async_trait]
    impl AuthBackend for NoBackend {
        async fn login(&self, _request: &LoginRequest) -> Result<LoginOutcome, BackendError> {
            Err(BackendError::Transport("no backend in this test".to_string()))
        }
        async fn refresh(&self, _: &str) -> Result<RefreshOutcome, BackendError> {
            Err(BackendError::Rejected("unsupported".to_string()))
        }
        async fn invalidate(&self, _: &str) -> Result<(), BackendError> {
            Ok(())
        }
    }

    fn guard_with_session(role: Option<Role>) -> RouteGuard {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        if let Some(role) = role {
            let claims = codec::issue_claims("user@school.test", role, "User", TokenLifetime::Day);
            let record = SessionRecord {
                token: codec::encode(&claims).expect("encode"),
                profile: Profile {
                    id: None,
                    email: "user@school.test".to_string(),
                    role,
                    name: "User".to_string(),
                },
                api_token: None,
                refresh_token: None,
            };
            store.save(&record).expect("save");
        }
        let manager = Arc::new(SessionManager::new(store, Arc::new(NoBackend)));
        RouteGuard::new(AccessEvaluator::new(manager))
    }

    #[test]
    fn public_routes_always_allow() {
        assert_eq!(
            guard_with_session(None).evaluate(&RouteRule::Public),
            RouteDecision::Allow
        );
        assert_eq!(
            guard_with_session(Some(Role::Admin)).evaluate(&RouteRule::Public),
            RouteDecision::Allow
        );
    }

    #[test]
    fn anonymous_is_sent_to_login() {
        let guard = guard_with_session(None);
        assert_eq!(
            guard.evaluate(&RouteRule::Authenticated),
            RouteDecision::Redirect(LOGIN_ROUTE)
        );
        assert_eq!(
            guard.evaluate(&RouteRule::AnyRole(vec![Role::Admin])),
            RouteDecision::Redirect(LOGIN_ROUTE)
        );
    }

    #[test]
    fn wrong_role_is_sent_to_unauthorized() {
        let guard = guard_with_session(Some(Role::Student));
        assert_eq!(
            guard.evaluate(&RouteRule::AnyRole(vec![Role::Admin, Role::Teacher])),
            RouteDecision::Redirect(UNAUTHORIZED_ROUTE)
        );
    }

    #[test]
    fn matching_role_is_allowed() {
        let guard = guard_with_session(Some(Role::Teacher));
        assert_eq!(
            guard.evaluate(&RouteRule::AnyRole(vec![Role::Admin, Role::Teacher])),
            RouteDecision::Allow
        );
        assert_eq!(
            guard.evaluate(&RouteRule::Authenticated),
            RouteDecision::Allow
        );
    }

    #[test]
    fn authenticated_users_bounce_off_login_screens() {
        for role in Role::ALL {
            let guard = guard_with_session(Some(*role));
            assert_eq!(
                guard.evaluate(&RouteRule::AnonymousOnly),
                RouteDecision::Redirect(landing_route(*role))
            );
        }
        assert_eq!(
            guard_with_session(None).evaluate(&RouteRule::AnonymousOnly),
            RouteDecision::Allow
        );
    }

    #[test]
    fn landing_routes_match_the_dashboard_map() {
        assert_eq!(landing_route(Role::Student), "/dashboard/student");
        assert_eq!(landing_route(Role::Teacher), "/teacher/dashboard");
        assert_eq!(landing_route(Role::Admin), "/admin/dashboard");
        assert_eq!(landing_route(Role::Parent), "/parent/dashboard");
    }
}
