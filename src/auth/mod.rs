// Public API - what other modules can use
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, MAX_TTL_SECS};
pub use headers::{as_bearer, bearer_token, TokenHeaders};
pub use issuer::TokenIssuer;
pub use keys::SigningKey;
pub use middleware::{jwt_auth, require_role};
pub use types::{IssuedToken, Principal, RejectionReason, TokenClaims, TokenPair, TokenType};
pub use validator::TokenValidator;

// Internal modules
mod clock;
mod config;
mod headers;
mod issuer;
pub mod keys;
mod middleware;
mod types;
mod validator;
