//! Session-holding HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use peerban_client_api::{ClientError, TorrentClient};
use peerban_primitives::{Peer, Transfer};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::types::{TorrentPeers, banned_ips_preferences};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const LOGIN_PATH: &str = "api/v2/auth/login";
const TORRENTS_INFO_PATH: &str = "api/v2/torrents/info";
const TORRENT_PEERS_PATH: &str = "api/v2/sync/torrentPeers";
const SET_PREFERENCES_PATH: &str = "api/v2/app/setPreferences";

/// WebUI login credentials.
#[derive(Clone)]
pub struct QbitCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for QbitCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QbitCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// qBittorrent WebUI client. The session cookie lives in the client's cookie
/// store, so [`TorrentClient::login`] refreshes it in place for every holder.
#[derive(Debug, Clone)]
pub struct QbitClient {
    http: reqwest::Client,
    base: Url,
    credentials: QbitCredentials,
}

impl QbitClient {
    pub fn new(
        base: Url,
        credentials: QbitCredentials,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            base: normalize_base(base),
            credentials,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|err| ClientError::InvalidUrl(err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        trace!(%url, "GET");
        let response = self.http.get(url).send().await.map_err(transport)?;
        check_status(response.status())?;
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))
    }

    /// Write a set of preferences through `setPreferences`.
    pub async fn set_preferences(
        &self,
        preferences: &serde_json::Value,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(SET_PREFERENCES_PATH)?;
        let body = preferences.to_string();
        let response = self
            .http
            .post(url)
            .form(&[("json", body.as_str())])
            .send()
            .await
            .map_err(transport)?;
        check_status(response.status())
    }
}

#[async_trait]
impl TorrentClient for QbitClient {
    async fn login(&self) -> Result<(), ClientError> {
        let url = self.endpoint(LOGIN_PATH)?;
        let response = self
            .http
            .post(url)
            .form(&[
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?;
        check_status(response.status())?;
        check_login_body(response).await?;
        debug!(base = %self.base, "logged in to qBittorrent");
        Ok(())
    }

    async fn list_transfers(&self) -> Result<Vec<Transfer>, ClientError> {
        self.get_json(self.endpoint(TORRENTS_INFO_PATH)?).await
    }

    async fn list_peers(&self, hash: &str) -> Result<Vec<Peer>, ClientError> {
        let mut url = self.endpoint(TORRENT_PEERS_PATH)?;
        url.query_pairs_mut().append_pair("hash", hash);
        let peers: TorrentPeers = self.get_json(url).await?;
        Ok(peers.into_peers())
    }

    async fn push_ban_list(&self, addresses: &[String]) -> Result<(), ClientError> {
        self.set_preferences(&banned_ips_preferences(addresses)).await
    }
}

/// Make relative joins land under the base path rather than replace its last segment.
fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

fn check_status(status: StatusCode) -> Result<(), ClientError> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::FORBIDDEN => Err(ClientError::Forbidden),
        other => Err(ClientError::Status(other.as_u16())),
    }
}

/// qBittorrent answers a bad login with `200 Fails.`.
async fn check_login_body(response: Response) -> Result<(), ClientError> {
    let body = response.text().await.map_err(transport)?;
    if body.trim() == "Fails." {
        return Err(ClientError::LoginRejected(
            "invalid username or password".to_string(),
        ));
    }
    Ok(())
}

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}
