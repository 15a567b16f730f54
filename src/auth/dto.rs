use serde::{Deserialize, Serialize};

use crate::users::dto::PublicUser;

/// `POST /auth/login` body. No `Debug`: it carries the plaintext password.
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair for one user, as returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct Session {
    pub token_type: &'static str,
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub refresh_token: String,
    pub user: PublicUser,
}
