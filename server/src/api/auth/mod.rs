mod jwt;
mod middleware;

pub use jwt::{validate_token, Claims, JwtError};
pub use middleware::{require_auth, AuthState, UserId};
