use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::TwitchError;
use crate::models::settings::Session;
use crate::utils::query::encode_query;

const AUTH_URL: &str = "https://id.twitch.tv/oauth2/authorize";
const REDIRECT_URI: &str = "http://localhost:3000/callback";
const SCOPES: &str = "user:read:follows chat:read chat:edit";

/// Build the implicit-grant authorization URL the operator logs in
/// through. The token comes back in the redirect fragment; there is no
/// local listener, the operator pastes it by hand.
pub fn authorization_url(client_id: &str) -> Result<String, TwitchError> {
    if client_id.is_empty() {
        return Err(TwitchError::Precondition(
            "A client ID is required to build the login URL".to_string(),
        ));
    }

    let params = vec![
        ("client_id", client_id.to_string()),
        ("redirect_uri", REDIRECT_URI.to_string()),
        ("response_type", "token".to_string()),
        ("scope", SCOPES.to_string()),
    ];
    Ok(format!("{}?{}", AUTH_URL, encode_query(&params)))
}

/// Interactive login: open the authorization page in the operator's
/// browser (printing the URL when that fails), wait for the pasted
/// token on stdin, and store it on the session.
pub async fn authenticate(session: &mut Session) -> Result<(), TwitchError> {
    let url = authorization_url(session.client_id())?;

    println!("Opening the Twitch login page...");
    if let Err(e) = webbrowser::open(&url) {
        warn!("[Auth] Could not open a browser: {}", e);
        println!("Open this URL yourself:\n{}", url);
    }
    println!("Paste the access token from the redirect URL and press enter:");

    let mut line = String::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    reader
        .read_line(&mut line)
        .await
        .map_err(|e| TwitchError::Transport(format!("Failed to read token from stdin: {}", e)))?;

    let token = normalize_token(&line)?;
    session.set_oauth_token(token);
    info!("[Auth] Token captured");
    Ok(())
}

fn normalize_token(raw: &str) -> Result<String, TwitchError> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(TwitchError::Precondition(
            "Token must not be empty".to_string(),
        ));
    }
    Ok(token.to_string())
}
