//! Authentication API client methods
//!
//! Login and registration are public endpoints: they go out without a
//! bearer credential and a `401` from them is a plain credential rejection,
//! never a renewal trigger.

use reqwest::Method;
use tracing::info;

use super::{ApiClient, ClientError};
use crate::session::Credentials;
use crate::types::{LoginRequest, RegisterRequest, RegisterResponse, TokenPair, UserResponse};

impl ApiClient {
    /// Exchange username and password for a credential pair and store it
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let pair: TokenPair = self
            .send_public(Method::POST, "token/", &LoginRequest { username, password })
            .await?;
        self.session().store(Credentials::from(pair))?;
        info!(username, "Logged in");
        Ok(())
    }

    /// Create an account. Does not log in.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisterResponse, ClientError> {
        let response = self
            .send_public(Method::POST, "register/", &RegisterRequest { username, password })
            .await?;
        info!(username, "Registered");
        Ok(response)
    }

    /// Forget the session and move to the login path
    pub fn logout(&self) {
        self.end_session();
    }

    /// Get the authenticated user
    pub async fn me(&self) -> Result<UserResponse, ClientError> {
        self.get("me/").await
    }

    /// Whether an access credential is stored
    pub fn is_authenticated(&self) -> bool {
        self.session().access_token().is_some()
    }
}
