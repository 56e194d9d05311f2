use super::token::{StoredToken, TokenManager, TokenResponse};
use crate::error::{auth_error, CalendarResult};
use tracing::{debug, info, warn};
use url::Url;

/// Google's OAuth consent endpoint
pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Scopes requested during authorization
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.googleapis.com/auth/calendar.events",
];

/// Build the consent URL the user opens in a browser
pub fn authorization_url(client_id: &str, redirect_uri: &str, state: &str) -> CalendarResult<Url> {
    let scope = SCOPES.join(" ");
    Url::parse_with_params(
        AUTH_URL,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("scope", scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| auth_error(&format!("Failed to build authorization URL: {}", e)))
}

/// Extract the authorization code from the loopback callback path
pub fn parse_callback(request_url: &str, expected_state: &str) -> CalendarResult<String> {
    let url = Url::parse(&format!("http://localhost{}", request_url))
        .map_err(|e| auth_error(&format!("Malformed callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Err(auth_error(&format!("Authorization was denied: {}", value)));
            }
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return Err(auth_error("Callback state does not match the request"));
    }

    code.ok_or_else(|| auth_error("No authorization code found in callback"))
}

/// Run the desktop flow: open the consent page, wait for the loopback redirect,
/// exchange the code and persist the resulting token
pub async fn authorize(manager: &TokenManager, port: u16) -> CalendarResult<StoredToken> {
    let server = tiny_http::Server::http(("127.0.0.1", port))
        .map_err(|e| auth_error(&format!("Failed to start callback listener: {}", e)))?;
    let addr = server
        .server_addr()
        .to_ip()
        .ok_or_else(|| auth_error("Callback listener has no IP address"))?;
    let redirect_uri = format!("http://127.0.0.1:{}", addr.port());

    // Random state ties the callback to this request
    let state = uuid::Uuid::new_v4().to_string();
    let auth_url = authorization_url(&manager.secrets().client_id, &redirect_uri, &state)?;

    println!("Opening browser for Google Calendar authorization...");
    println!("If it does not open, visit:\n{}", auth_url);
    if let Err(e) = webbrowser::open(auth_url.as_str()) {
        warn!("Could not open browser: {}", e);
    }

    info!("Waiting for authorization callback on {}", redirect_uri);
    let code = tokio::task::spawn_blocking(move || wait_for_code(&server, &state))
        .await
        .map_err(|e| auth_error(&format!("Callback listener failed: {}", e)))??;

    let token = exchange_code(manager, &code, &redirect_uri).await?;
    manager.save(&token).await?;
    info!("Authorization complete");

    Ok(token)
}

fn wait_for_code(server: &tiny_http::Server, state: &str) -> CalendarResult<String> {
    loop {
        let request = server.recv()?;
        let url = request.url().to_string();

        // Browsers ask for a favicon before or after the redirect
        if !url.contains("code=") && !url.contains("error=") {
            debug!("Ignoring request to {}", url);
            request.respond(tiny_http::Response::empty(tiny_http::StatusCode(404)))?;
            continue;
        }

        let result = parse_callback(&url, state);
        let message = match &result {
            Ok(_) => "Authorization successful! You can close this window.".to_string(),
            Err(e) => format!("Authorization failed: {}", e),
        };
        request.respond(tiny_http::Response::from_string(message))?;
        return result;
    }
}

/// Exchange an authorization code at the token endpoint
pub async fn exchange_code(
    manager: &TokenManager,
    code: &str,
    redirect_uri: &str,
) -> CalendarResult<StoredToken> {
    let secrets = manager.secrets();
    let response = reqwest::Client::new()
        .post(manager.token_url())
        .form(&[
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        return Err(auth_error(&format!(
            "Failed to get token: HTTP {} - {}",
            status, error_text
        )));
    }

    let body: TokenResponse = response.json().await?;
    Ok(body.into_stored(None))
}
