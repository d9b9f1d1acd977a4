pub mod access;
pub mod error;
pub mod guard;

pub use access::AccessEvaluator;
pub use error::SecurityError;
pub use guard::{
    landing_route, RouteDecision, RouteGuard, RouteRule, LOGIN_ROUTE, UNAUTHORIZED_ROUTE,
};
