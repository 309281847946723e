//! Authentication and authorization gates

mod basic;
mod context;
pub mod jwt;
pub mod middleware;
mod ownership;

pub use basic::{BasicCredentialGate, require_basic};
pub use context::CurrentUser;
pub use jwt::{Subject, TokenAuthenticator, TokenClaims, TokenError};
pub use middleware::{AuthState, require_auth};
pub use ownership::{Access, OwnershipAuthorizer, OwnershipGuard, require_ownership};
