use calendar_menu::components::google_calendar::auth;
use calendar_menu::config::Config;
use calendar_menu::error::CalendarResult;
use calendar_menu::startup;

#[tokio::main]
async fn main() -> CalendarResult<()> {
    // Load configuration
    let config = Config::load()?;

    // Token manager reads the client secrets and owns the token file
    let token_manager = startup::token_manager(&config)?;

    // Run the browser flow even when a token is already cached
    let token = auth::authorize(&token_manager, config.redirect_port).await?;

    println!(
        "Token successfully saved to {}{}",
        config.token_path.display(),
        if token.refresh_token.is_some() {
            ""
        } else {
            " (no refresh token issued)"
        }
    );

    Ok(())
}
