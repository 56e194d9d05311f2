use calendar_menu::menu::{LinePrompt, Menu, TerminalPrompt};
use calendar_menu::startup;
use std::io::{self, IsTerminal};
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting calendar menu");

    // Load configuration
    let config = startup::load_config()?;

    // Authorize and connect to the calendar
    let calendar = startup::connect(&config).await?;

    if io::stdin().is_terminal() {
        Menu::new(calendar, TerminalPrompt, io::stdout(), config.timezone)
            .run()
            .await?;
    } else {
        let prompt = LinePrompt::new(io::stdin().lock(), io::stdout());
        Menu::new(calendar, prompt, io::stdout(), config.timezone)
            .run()
            .await?;
    }

    Ok(())
}
