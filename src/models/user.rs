use serde::{Deserialize, Serialize};

/// Acting user as supplied by the identity provider. The engine treats both
/// fields as opaque; the token is only ever forwarded as a bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub auth_token: String,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            auth_token: auth_token.into(),
        }
    }
}
