// Backend authentication
//
// Password sign-in, token refresh, user lookup and sign-out against the
// auth endpoint. A successful sign-in installs the session on the client;
// every later REST/RPC call carries its access token.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::client::{BackendClient, parse_json};
use crate::error::Error;

/// The authenticated user as reported by the auth endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session: tokens plus the user they belong to.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl Session {
    /// Whether the access token is past (or within `skew` of) its expiry.
    pub fn is_expired(&self, skew: Duration) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() + skew >= at)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .or_else(|| self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)));
        Session {
            access_token: SecretString::from(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            expires_at,
            user: self.user,
        }
    }
}

impl BackendClient {
    /// Sign in with email and password.
    ///
    /// `POST /auth/v1/token?grant_type=password`. On success the session is
    /// installed on this client and the signed-in user returned.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthUser, Error> {
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        debug!("signing in at {}", url);

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        self.token_grant(url, &body).await
    }

    /// Exchange the held refresh token for a fresh session.
    pub async fn refresh_session(&self) -> Result<AuthUser, Error> {
        let current = self.session().ok_or(Error::NotAuthenticated)?;
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");
        debug!("refreshing session at {}", url);

        let body = json!({ "refresh_token": current.refresh_token.expose_secret() });
        self.token_grant(url, &body).await
    }

    /// Ask the auth endpoint who the held access token belongs to.
    ///
    /// `GET /auth/v1/user`. Fails with [`Error::NotAuthenticated`] without
    /// touching the network when no session is held.
    pub async fn fetch_user(&self) -> Result<AuthUser, Error> {
        if self.session().is_none() {
            return Err(Error::NotAuthenticated);
        }
        let url = self.auth_url("user")?;
        debug!("GET {}", url);
        let req = self.authorize(self.http().get(url));
        let resp = self.check_status(self.send(req).await?).await?;
        parse_json(resp).await
    }

    /// The user of the held session, without a network round trip.
    pub fn current_user(&self) -> Option<AuthUser> {
        self.session().map(|s| s.user.clone())
    }

    /// End the session server-side and drop it locally.
    ///
    /// The local session is dropped even if the logout call fails, so a
    /// dead network never leaves the client signed in.
    pub async fn sign_out(&self) -> Result<(), Error> {
        if self.session().is_none() {
            return Ok(());
        }
        let url = self.auth_url("logout")?;
        debug!("signing out at {}", url);
        let req = self.authorize(self.http().post(url));
        let result = match self.send(req).await {
            Ok(resp) => self.check_status(resp).await.map(|_| ()),
            Err(e) => Err(e),
        };
        self.clear_session();
        debug!("sign-out complete");
        result
    }

    async fn token_grant(
        &self,
        url: url::Url,
        body: &serde_json::Value,
    ) -> Result<AuthUser, Error> {
        let req = self.authorize(self.http().post(url).json(body));
        let resp = self.send(req).await?;

        let status = resp.status();
        if !status.is_success() {
            let resp_body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("sign-in failed (HTTP {status}): {resp_body}"),
            });
        }

        let token: TokenResponse = parse_json(resp).await?;
        let session = token.into_session();
        let user = session.user.clone();
        self.set_session(session);
        debug!(user_id = %user.id, "session established");
        Ok(user)
    }
}
