//! Session authentication: email/password login issuing HS256 bearer tokens.

pub mod handlers;
pub mod middleware;
pub mod service;

pub use middleware::AuthenticatedUser;
pub use service::{Claims, UserAuthService};
