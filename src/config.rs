use crate::error::{config_error, env_error, CalendarResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Calendar used when none is configured
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Number of events fetched per listing
pub const DEFAULT_PAGE_SIZE: i32 = 10;

/// Optional file merged under the environment
pub const CONFIG_FILE: &str = "config/calendar.toml";

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Google Calendar ID to manage
    pub google_calendar_id: String,
    /// OAuth client ID, overrides the credentials file
    pub google_client_id: Option<String>,
    /// OAuth client secret, overrides the credentials file
    pub google_client_secret: Option<String>,
    /// Installed-app client secrets downloaded from the Google console
    pub credentials_path: PathBuf,
    /// Cached access and refresh token
    pub token_path: PathBuf,
    /// Maximum number of events per listing
    pub page_size: i32,
    /// Timezone used when displaying event times
    pub timezone: Tz,
    /// Port of the loopback listener used during authorization (0 picks one)
    pub redirect_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            google_client_id: None,
            google_client_secret: None,
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            page_size: DEFAULT_PAGE_SIZE,
            timezone: Tz::UTC,
            redirect_port: 0,
        }
    }
}

/// Keys accepted in the config file, all optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    google_calendar_id: Option<String>,
    google_client_id: Option<String>,
    google_client_secret: Option<String>,
    credentials_path: Option<PathBuf>,
    token_path: Option<PathBuf>,
    page_size: Option<i32>,
    timezone: Option<String>,
    redirect_port: Option<u16>,
}

impl Config {
    /// Load configuration from the config file and environment
    pub fn load() -> CalendarResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let file = Self::read_file(Path::new(CONFIG_FILE))?;

        let mut config = Self::default();
        config.apply_file(file)?;
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn parse_file(content: &str) -> CalendarResult<FileConfig> {
        Ok(toml::from_str::<FileConfig>(content)?)
    }

    fn apply_file(&mut self, file: FileConfig) -> CalendarResult<()> {
        if let Some(id) = file.google_calendar_id {
            self.google_calendar_id = id;
        }
        if file.google_client_id.is_some() {
            self.google_client_id = file.google_client_id;
        }
        if file.google_client_secret.is_some() {
            self.google_client_secret = file.google_client_secret;
        }
        if let Some(path) = file.credentials_path {
            self.credentials_path = path;
        }
        if let Some(path) = file.token_path {
            self.token_path = path;
        }
        if let Some(size) = file.page_size {
            self.page_size = size;
        }
        if let Some(tz) = file.timezone {
            self.timezone = parse_timezone(&tz)?;
        }
        if let Some(port) = file.redirect_port {
            self.redirect_port = port;
        }
        Ok(())
    }

    /// Overlay values from an environment lookup
    fn apply_env<F>(&mut self, var: F) -> CalendarResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = var("GOOGLE_CALENDAR_ID") {
            self.google_calendar_id = id;
        }
        if let Some(id) = var("GOOGLE_CLIENT_ID") {
            self.google_client_id = Some(id);
        }
        if let Some(secret) = var("GOOGLE_CLIENT_SECRET") {
            self.google_client_secret = Some(secret);
        }
        if let Some(path) = var("GOOGLE_CREDENTIALS_PATH") {
            self.credentials_path = PathBuf::from(path);
        }
        if let Some(path) = var("GOOGLE_TOKEN_PATH") {
            self.token_path = PathBuf::from(path);
        }
        if let Some(size) = var("CALENDAR_PAGE_SIZE") {
            self.page_size = size
                .parse::<i32>()
                .map_err(|_| env_error("CALENDAR_PAGE_SIZE"))?;
        }
        if let Some(tz) = var("TIMEZONE") {
            self.timezone = parse_timezone(&tz)?;
        }
        if let Some(port) = var("OAUTH_REDIRECT_PORT") {
            self.redirect_port = port
                .parse::<u16>()
                .map_err(|_| env_error("OAUTH_REDIRECT_PORT"))?;
        }
        Ok(())
    }

    /// Read the optional config file; only a missing file falls back to defaults
    fn read_file(path: &Path) -> CalendarResult<FileConfig> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse_file(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => Err(config_error(&format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn validate(&self) -> CalendarResult<()> {
        if self.page_size < 1 {
            return Err(config_error("page size must be at least 1"));
        }
        if self.google_calendar_id.trim().is_empty() {
            return Err(config_error("calendar id must not be empty"));
        }
        Ok(())
    }
}

fn parse_timezone(name: &str) -> CalendarResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| config_error(&format!("Unknown timezone: {}", name)))
}
