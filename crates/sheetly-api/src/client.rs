// Backend HTTP client
//
// Wraps `reqwest::Client` with REST/RPC/auth URL construction, header
// injection (`apikey` + bearer token) and error-body decoding. Endpoint
// groups (auth, likes, sheets, playlists) are inherent methods in separate files so
// this module stays focused on transport mechanics.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Session;
use crate::error::Error;
use crate::models::RestErrorBody;
use crate::transport::TransportConfig;

const REST_PREFIX: &str = "rest/v1/";
const RPC_PREFIX: &str = "rest/v1/rpc/";
const AUTH_PREFIX: &str = "auth/v1/";

/// Raw HTTP client for the hosted backend.
///
/// Every request carries the project's anon key in the `apikey` header and
/// a bearer token: the signed-in user's access token when a session is
/// held, the anon key otherwise. The session is swapped atomically so the
/// client can be shared behind an `Arc` across tasks.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    session: ArcSwapOption<Session>,
    timeout_secs: u64,
}

impl BackendClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the project root (e.g. `https://abc.supabase.co`).
    pub fn new(
        base_url: Url,
        anon_key: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = transport.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            base_url: normalize_base(base_url),
            anon_key,
            session: ArcSwapOption::empty(),
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, anon_key: SecretString) -> Self {
        Self {
            http,
            base_url: normalize_base(base_url),
            anon_key,
            session: ArcSwapOption::empty(),
            timeout_secs: 0,
        }
    }

    /// The project base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Session slot ─────────────────────────────────────────────────

    /// The session currently held, if any.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.load_full()
    }

    /// Install a session (after sign-in or token refresh).
    pub fn set_session(&self, session: Session) {
        self.session.store(Some(Arc::new(session)));
    }

    /// Drop the held session. Subsequent calls go out with the anon key.
    pub fn clear_session(&self) {
        self.session.store(None);
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/rest/v1/{table}`
    pub(crate) fn rest_url(&self, table: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(REST_PREFIX)?.join(table)?)
    }

    /// `{base}/rest/v1/rpc/{function}`
    pub(crate) fn rpc_url(&self, function: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(RPC_PREFIX)?.join(function)?)
    }

    /// `{base}/auth/v1/{path}`
    pub(crate) fn auth_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(AUTH_PREFIX)?.join(path)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Attach the `apikey` header and the best available bearer token.
    pub(crate) fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("apikey", self.anon_key.expose_secret());
        match self.session.load_full() {
            Some(session) => builder.bearer_auth(session.access_token.expose_secret()),
            None => builder.bearer_auth(self.anon_key.expose_secret()),
        }
    }

    /// Send a request, mapping client-side timeouts to [`Error::Timeout`].
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Response, Error> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    /// GET rows from a table, decoding the JSON array body.
    pub(crate) async fn get_rows<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, Error> {
        debug!("GET {}", url);
        let req = self.authorize(self.http.get(url).query(query));
        let resp = self.check_status(self.send(req).await?).await?;
        parse_json(resp).await
    }

    /// GET a row range with `Prefer: count=exact`, returning the rows
    /// and the total parsed from `Content-Range`.
    pub(crate) async fn get_rows_counted<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        range: (u64, u64),
    ) -> Result<(Vec<T>, Option<u64>), Error> {
        debug!("GET {} (range {}-{})", url, range.0, range.1);
        let req = self
            .authorize(self.http.get(url).query(query))
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", format!("{}-{}", range.0, range.1));
        let resp = self.check_status(self.send(req).await?).await?;
        let total = content_range_total(&resp);
        let rows = parse_json(resp).await?;
        Ok((rows, total))
    }

    /// HEAD with `Prefer: count=exact`: the exact number of matching rows.
    pub(crate) async fn count_rows(&self, url: Url, query: &[(&str, String)]) -> Result<u64, Error> {
        debug!("HEAD {} (count)", url);
        let req = self
            .authorize(self.http.head(url).query(query))
            .header("Prefer", "count=exact");
        let resp = self.check_status(self.send(req).await?).await?;
        content_range_total(&resp).ok_or_else(|| Error::Deserialization {
            message: "missing or open-ended Content-Range header".into(),
            body: resp
                .headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned(),
        })
    }

    /// POST a row into a table without asking for it back.
    pub(crate) async fn insert_row(&self, url: Url, body: &impl Serialize) -> Result<(), Error> {
        debug!("POST {}", url);
        let req = self
            .authorize(self.http.post(url).json(body))
            .header("Prefer", "return=minimal");
        self.check_status(self.send(req).await?).await?;
        Ok(())
    }

    /// POST a row and decode the stored representation the backend returns.
    pub(crate) async fn insert_row_returning<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        debug!("POST {} (returning)", url);
        let req = self
            .authorize(self.http.post(url).json(body))
            .header("Prefer", "return=representation")
            .header(ACCEPT, "application/vnd.pgrst.object+json");
        let resp = self.check_status(self.send(req).await?).await?;
        parse_json(resp).await
    }

    /// DELETE matching rows, returning the rows that were removed.
    pub(crate) async fn delete_rows<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, Error> {
        debug!("DELETE {}", url);
        let req = self
            .authorize(self.http.delete(url).query(query))
            .header("Prefer", "return=representation");
        let resp = self.check_status(self.send(req).await?).await?;
        parse_json(resp).await
    }

    /// Invoke a remote procedure whose result the caller ignores.
    pub(crate) async fn call_rpc(&self, function: &str, args: &impl Serialize) -> Result<(), Error> {
        let url = self.rpc_url(function)?;
        debug!("RPC {}", url);
        let req = self.authorize(self.http.post(url).json(args));
        self.check_status(self.send(req).await?).await?;
        Ok(())
    }

    /// Turn a non-2xx response into the matching [`Error`].
    pub(crate) async fn check_status(&self, resp: Response) -> Result<Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let parsed: RestErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let message = parsed
            .best_message()
            .unwrap_or_else(|| format!("HTTP {status}"));

        if status == StatusCode::UNAUTHORIZED {
            return Err(if self.session.load().is_some() {
                Error::SessionExpired
            } else {
                Error::Authentication { message }
            });
        }

        Err(Error::Api {
            message,
            code: parsed.code,
            status: status.as_u16(),
        })
    }
}

/// Decode a JSON body, keeping the raw text on failure.
pub(crate) async fn parse_json<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

/// Total from a `Content-Range: 0-11/42` or `*/42` header.
fn content_range_total(resp: &Response) -> Option<u64> {
    resp.headers()
        .get("content-range")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range_total)
}

pub(crate) fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// `Url::join` drops the last path segment unless it ends in `/`.
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range_total("0-11/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-11/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn base_url_keeps_project_path() {
        let client = BackendClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost:54321/project").unwrap(),
            SecretString::from("anon".to_string()),
        );
        let url = client.rest_url("likes").unwrap();
        assert_eq!(url.as_str(), "http://localhost:54321/project/rest/v1/likes");
        let url = client.rpc_url("increment_likes").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:54321/project/rest/v1/rpc/increment_likes"
        );
    }
}
