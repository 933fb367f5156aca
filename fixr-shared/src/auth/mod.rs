/// Request identity
///
/// - [`jwt`]: HS256 bearer token validation
///
/// The API's auth middleware validates the token and inserts an
/// [`AuthContext`] into the request extensions; handlers pass
/// `auth.user_id` to the repositories as the owner.

pub mod jwt;

use serde::{Deserialize, Serialize};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Owner id from the token subject
    pub user_id: String,

    pub email: Option<String>,
}

impl From<jwt::Claims> for AuthContext {
    fn from(claims: jwt::Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}
