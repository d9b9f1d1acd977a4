pub mod claims;
pub mod codec;
pub mod error;
pub mod roles;

pub use claims::Claims;
pub use codec::{decode, encode, issue_claims, issue_claims_at, TokenLifetime};
pub use error::{AuthError, AuthResult};
pub use roles::Role;
