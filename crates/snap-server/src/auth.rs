use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use snap_core::Session;
use snap_types::UserProfile;

use crate::error::{ServerError, ServerResult};

pub const USER_NAME_HEADER: &str = "x-user-name";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer {
        token: String,
        display_name: Option<String>,
    },
    Anonymous,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> ServerResult<Self> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(Self::Anonymous);
        };
        let value = value.to_str().map_err(|_| ServerError::InvalidHeader {
            header: "authorization",
            reason: "not valid ASCII".into(),
        })?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServerError::InvalidHeader {
                header: "authorization",
                reason: "expected `Bearer <token>`".into(),
            })?;
        let display_name = headers
            .get(USER_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(Self::Bearer {
            token: token.to_string(),
            display_name,
        })
    }
}

/// Turns request credentials into the signed-in user.
///
/// Sign-in itself happens at an external identity provider; this only
/// resolves what the provider handed the client.
#[async_trait]
pub trait RequestIdentity: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Option<UserProfile>>;

    async fn session(&self, headers: &HeaderMap) -> ServerResult<Session> {
        let credentials = Credentials::from_headers(headers)?;
        Ok(Session::fixed(self.authenticate(&credentials).await?))
    }
}

/// Trusts the bearer token as the user id and `x-user-name` as the display
/// name. For deployments behind a gateway that has already verified the
/// token.
pub struct HeaderIdentity;

#[async_trait]
impl RequestIdentity for HeaderIdentity {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Option<UserProfile>> {
        match credentials {
            Credentials::Bearer {
                token,
                display_name,
            } => {
                let name = display_name.clone().unwrap_or_else(|| token.clone());
                Ok(Some(UserProfile::new(token.clone(), name)))
            }
            Credentials::Anonymous => Ok(None),
        }
    }
}
