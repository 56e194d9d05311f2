use crate::components::google_calendar::auth;
use crate::components::google_calendar::token::{ClientSecrets, TokenManager};
use crate::components::google_calendar::{CalendarHandle, GoogleCalendarClient};
use crate::config::Config;
use crate::error::{CalendarResult, Error};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration.
///
/// Logs go to stderr so they do not interleave with the menu.
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,reqwest=warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Build the token manager from the configured client secrets and token path
pub fn token_manager(config: &Config) -> CalendarResult<TokenManager> {
    let secrets = ClientSecrets::resolve(
        config.google_client_id.as_deref(),
        config.google_client_secret.as_deref(),
        &config.credentials_path,
    )?;
    Ok(TokenManager::new(config.token_path.clone(), secrets))
}

/// Make sure a usable token exists, authorizing in the browser when there is
/// none or it can no longer be refreshed
pub async fn ensure_token(manager: &TokenManager, redirect_port: u16) -> CalendarResult<()> {
    match manager.load()? {
        Some(token) if !token.is_expired() => {
            info!("Using cached token");
        }
        Some(token) if token.can_refresh() => {
            let refreshed = manager.refresh(&token).await?;
            manager.save(&refreshed).await?;
        }
        _ => {
            info!("No usable token, starting authorization");
            auth::authorize(manager, redirect_port).await?;
        }
    }
    Ok(())
}

/// Authorize if needed and build a handle for the configured calendar
pub async fn connect(config: &Config) -> CalendarResult<CalendarHandle> {
    let manager = token_manager(config)?;
    ensure_token(&manager, config.redirect_port).await?;

    let client = GoogleCalendarClient::new(manager);
    info!("Connected to calendar {}", config.google_calendar_id);

    Ok(CalendarHandle::new(
        Arc::new(client),
        &config.google_calendar_id,
        config.page_size,
    ))
}
