use crate::error::{auth_error, config_error, CalendarResult};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Google's OAuth token endpoint
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens are treated as expired this many seconds early
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the token response omits `expires_in`
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// OAuth client credentials of an installed application
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

/// Layout of the client secrets file downloaded from the Google console
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Read an `installed` (or `web`) client secrets file
    pub fn from_file(path: &Path) -> CalendarResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            config_error(&format!(
                "Failed to read client secrets from {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> CalendarResult<Self> {
        let file: ClientSecretsFile = serde_json::from_str(content)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| config_error("Client secrets file has no 'installed' or 'web' section"))
    }

    /// Explicit id/secret win over the file; the file is only read when one is missing
    pub fn resolve(
        client_id: Option<&str>,
        client_secret: Option<&str>,
        credentials_path: &Path,
    ) -> CalendarResult<Self> {
        match (client_id, client_secret) {
            (Some(id), Some(secret)) => Ok(Self {
                client_id: id.to_string(),
                client_secret: secret.to_string(),
            }),
            _ => {
                let mut secrets = Self::from_file(credentials_path)?;
                if let Some(id) = client_id {
                    secrets.client_id = id.to_string();
                }
                if let Some(secret) = client_secret {
                    secrets.client_secret = secret.to_string();
                }
                Ok(secrets)
            }
        }
    }
}

/// Token data persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) after which the access token is invalid
    pub expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl StoredToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at - EXPIRY_MARGIN_SECS <= Utc::now().timestamp()
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// Body of a successful token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Turn the response into a stored token, keeping an earlier refresh token
    /// when the endpoint did not issue a new one
    pub fn into_stored(self, previous_refresh: Option<String>) -> StoredToken {
        let expires_in = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: Utc::now().timestamp() + expires_in,
            scope: self.scope,
            token_type: self.token_type,
        }
    }
}

/// Loads, refreshes and persists the cached OAuth token
#[derive(Clone)]
pub struct TokenManager {
    token_path: PathBuf,
    secrets: ClientSecrets,
    token_url: String,
    client: Client,
    cached: Arc<RwLock<Option<StoredToken>>>,
}

impl TokenManager {
    pub fn new(token_path: PathBuf, secrets: ClientSecrets) -> Self {
        Self::with_token_url(token_path, secrets, TOKEN_URL)
    }

    /// Use a different token endpoint
    pub fn with_token_url(token_path: PathBuf, secrets: ClientSecrets, token_url: &str) -> Self {
        Self {
            token_path,
            secrets,
            token_url: token_url.to_string(),
            client: Client::new(),
            cached: Arc::new(RwLock::new(None)),
        }
    }

    pub fn secrets(&self) -> &ClientSecrets {
        &self.secrets
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Read the token file, `None` when it does not exist yet
    pub fn load(&self) -> CalendarResult<Option<StoredToken>> {
        if !self.token_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.token_path)?;
        let token: StoredToken = serde_json::from_str(&content)?;
        Ok(Some(token))
    }

    /// Write the token file and update the in-memory copy
    pub async fn save(&self, token: &StoredToken) -> CalendarResult<()> {
        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        write_private(&self.token_path, serde_json::to_string_pretty(token)?.as_bytes())?;
        *self.cached.write().await = Some(token.clone());
        debug!("Token saved to {}", self.token_path.display());
        Ok(())
    }

    /// Get a valid access token, refreshing and persisting it when expired
    pub async fn access_token(&self) -> CalendarResult<String> {
        let cached = self.cached.read().await.clone();
        let token = match cached {
            Some(token) => token,
            None => self.load()?.ok_or_else(|| {
                auth_error(&format!(
                    "No token found at {}",
                    self.token_path.display()
                ))
            })?,
        };

        if !token.is_expired() {
            *self.cached.write().await = Some(token.clone());
            return Ok(token.access_token);
        }

        let refreshed = self.refresh(&token).await?;
        self.save(&refreshed).await?;
        Ok(refreshed.access_token)
    }

    /// Exchange the refresh token for a new access token
    pub async fn refresh(&self, token: &StoredToken) -> CalendarResult<StoredToken> {
        let refresh_token = token
            .refresh_token
            .clone()
            .ok_or_else(|| auth_error("Token expired and no refresh token is available"))?;

        warn!("Access token expired, refreshing");

        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self.client.post(&self.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: TokenResponse = response.json().await?;
        info!("Access token refreshed");
        Ok(body.into_stored(Some(refresh_token)))
    }
}

/// Write a file readable only by its owner
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // The mode only applies on creation
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}
