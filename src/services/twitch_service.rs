use http::Method;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TwitchError;
use crate::models::channel::{Channel, SearchChannelRow};
use crate::models::game::GameRow;
use crate::models::settings::Session;
use crate::models::stream::{Stream, StreamRow};
use crate::models::user::UserRow;
use crate::models::ApiResponse;
use crate::services::transport::{CurlTransport, Transport};
use crate::utils::query::encode_query;

const HELIX_BASE: &str = "https://api.twitch.tv/helix";
const USER_AGENT: &str = concat!("twitch-scout/", env!("CARGO_PKG_VERSION"));
// Page size for the top-streams table, same as the search default
const TOP_STREAMS_PAGE: u32 = 20;

/// Helix client: owns the session configuration (credentials plus the
/// lazily resolved identity caches) and a transport to run requests on.
///
/// Calls are sequential; every query takes the service by `&mut` and the
/// caller awaits the full round trip, so there is no locking anywhere.
pub struct TwitchService<T: Transport = CurlTransport> {
    session: Session,
    transport: T,
}

impl TwitchService<CurlTransport> {
    /// Build a service around the curl binary named in the session.
    pub fn new(session: Session) -> Self {
        let transport = CurlTransport::new(session.curl_path());
        Self { session, transport }
    }
}

impl<T: Transport> TwitchService<T> {
    pub fn with_transport(session: Session, transport: T) -> Self {
        Self { session, transport }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Operator access to the configuration. Setters on [`Session`] keep
    /// the identity caches consistent with the names they belong to.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Issue one authenticated request against Helix and classify the
    /// response. `Ok(None)` means a 204/empty-body success.
    ///
    /// All current endpoints are GETs; the method parameter is the
    /// escape hatch for future write calls.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>, TwitchError> {
        if self.session.client_id().is_empty() {
            return Err(TwitchError::Config("client ID"));
        }
        if self.session.oauth_token().is_empty() {
            return Err(TwitchError::Config("OAuth token"));
        }

        let mut url = format!("{}{}", HELIX_BASE, path);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&encode_query(params));
        }

        let headers = vec![
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.session.oauth_token()),
            ),
            ("Client-Id".to_string(), self.session.client_id().to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];

        let response = self.transport.fetch(method, &url, &headers).await?;
        decode_body(response.status, &response.body)
    }

    async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>, TwitchError> {
        self.request(Method::GET, path, params).await
    }

    /// Resolve and memoize the numeric user ID for the configured
    /// username, or for the token's own account when no username is set.
    /// The cached ID is cleared by `Session::set_username` on change.
    pub async fn resolve_user_id(&mut self) -> Result<String, TwitchError> {
        if let Some(id) = self.session.cached_user_id() {
            return Ok(id.to_string());
        }

        // Bare /users resolves the bearer token's own account
        let params: Vec<(&str, String)> = match self.session.username() {
            Some(name) => vec![("login", name.to_string())],
            None => Vec::new(),
        };

        let value = self.get("/users", &params).await?;
        let rows: Vec<UserRow> = decode_rows(value)?;
        let user = rows.into_iter().next().ok_or_else(|| {
            TwitchError::Precondition(match self.session.username() {
                Some(name) => format!("No Twitch user named {:?}", name),
                None => "Token did not resolve to a user".to_string(),
            })
        })?;

        debug!("[Twitch] Resolved user {} to ID {}", user.login, user.id);
        self.session.set_username(&user.login);
        self.session.cache_user_id(&user.id);
        Ok(user.id)
    }

    /// Resolve the authenticated username, querying Helix when it is not
    /// configured yet. Used by the chat launcher for the IRC nickname.
    pub async fn resolve_username(&mut self) -> Result<String, TwitchError> {
        if let Some(name) = self.session.username() {
            return Ok(name.to_string());
        }
        // Resolution back-fills the username from the returned login
        self.resolve_user_id().await?;
        self.session
            .username()
            .map(str::to_string)
            .ok_or_else(|| TwitchError::Precondition("Token did not resolve to a user".to_string()))
    }

    /// Resolve the configured game filter to a category ID, memoized on
    /// the session. `Ok(None)` when no filter is set; an unknown name
    /// fails the calling query (fail-closed).
    async fn resolve_game_filter(&mut self) -> Result<Option<String>, TwitchError> {
        let game = match self.session.game_filter() {
            Some(game) => game.to_string(),
            None => return Ok(None),
        };
        if let Some(id) = self.session.cached_game_id() {
            return Ok(Some(id.to_string()));
        }

        let params = vec![("name", game.clone())];
        let value = self.get("/games", &params).await?;
        let rows: Vec<GameRow> = decode_rows(value)?;
        let row = rows.into_iter().next().ok_or_else(|| {
            TwitchError::Precondition(format!("No Twitch category named {:?}", game))
        })?;

        debug!("[Twitch] Resolved category {:?} to ID {}", game, row.id);
        self.session.cache_game_id(&row.id);
        Ok(Some(row.id))
    }

    /// Search currently-live channels by name. This endpoint reports no
    /// viewer counts, so they stay unset; titles get CR/LF stripped.
    /// Honors the configured game filter.
    pub async fn search_streams(
        &mut self,
        term: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Stream>, TwitchError> {
        if term.is_empty() {
            return Err(TwitchError::Precondition(
                "Search term must not be empty".to_string(),
            ));
        }
        validate_limit(limit)?;

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(game_id) = self.resolve_game_filter().await? {
            params.push(("game_id", game_id));
        }
        if let Some(limit) = limit {
            params.push(("first", limit.to_string()));
        }
        params.push(("query", term.to_string()));
        params.push(("live_only", "true".to_string()));

        let value = self.get("/search/channels", &params).await?;
        let rows: Vec<SearchChannelRow> = decode_rows(value)?;
        info!("[Twitch] Live search {:?}: {} results", term, rows.len());

        Ok(rows
            .into_iter()
            .map(|row| Stream::new(&row.broadcaster_login, None, &row.title, row.game_name))
            .collect())
    }

    /// Search channel profiles by name, live or not.
    pub async fn search_channels(
        &self,
        term: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Channel>, TwitchError> {
        if term.is_empty() {
            return Err(TwitchError::Precondition(
                "Search term must not be empty".to_string(),
            ));
        }
        validate_limit(limit)?;

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = limit {
            params.push(("first", limit.to_string()));
        }
        params.push(("query", term.to_string()));

        let value = self.get("/search/channels", &params).await?;
        let rows: Vec<SearchChannelRow> = decode_rows(value)?;
        info!("[Twitch] Channel search {:?}: {} results", term, rows.len());

        Ok(rows
            .into_iter()
            .map(|row| Channel::new(&row.display_name, &row.broadcaster_login, row.game_name))
            .collect())
    }

    /// Streams live right now among the accounts the viewer follows.
    /// Requires a token; resolves the viewer's own user ID first.
    pub async fn get_followed_streams(
        &mut self,
        limit: Option<u32>,
    ) -> Result<Vec<Stream>, TwitchError> {
        if self.session.oauth_token().is_empty() {
            return Err(TwitchError::Unauthorized);
        }
        validate_limit(limit)?;

        let user_id = self.resolve_user_id().await?;

        let mut params = vec![("user_id", user_id)];
        if let Some(limit) = limit {
            params.push(("first", limit.to_string()));
        }

        let value = self.get("/streams/followed", &params).await?;
        let rows: Vec<StreamRow> = decode_rows(value)?;
        info!("[Twitch] {} followed channels live", rows.len());

        Ok(rows.into_iter().map(stream_from_row).collect())
    }

    /// The listing the table view renders: most-viewed live streams,
    /// honoring the configured game filter.
    pub async fn list_top_streams(&mut self) -> Result<Vec<Stream>, TwitchError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(game_id) = self.resolve_game_filter().await? {
            params.push(("game_id", game_id));
        }
        params.push(("first", TOP_STREAMS_PAGE.to_string()));

        let value = self.get("/streams", &params).await?;
        let rows: Vec<StreamRow> = decode_rows(value)?;

        let mut streams: Vec<Stream> = rows.into_iter().map(stream_from_row).collect();
        // Table view wants viewer count descending
        streams.sort_by(|a, b| b.viewers.unwrap_or(0).cmp(&a.viewers.unwrap_or(0)));
        Ok(streams)
    }
}

fn stream_from_row(row: StreamRow) -> Stream {
    Stream::new(
        &row.user_login,
        Some(row.viewer_count),
        &row.title,
        row.game_name,
    )
}

fn validate_limit(limit: Option<u32>) -> Result<(), TwitchError> {
    if let Some(limit) = limit {
        if !(1..=100).contains(&limit) {
            return Err(TwitchError::Precondition(format!(
                "Result limit must be between 1 and 100, got {}",
                limit
            )));
        }
    }
    Ok(())
}

/// Classify a raw response. 204/empty bodies are successes and never get
/// JSON-parsed. A body carrying an `error` field is a platform error with
/// the body's own status (falling back to the HTTP status); anything else
/// is handed back for the per-endpoint typed decode.
fn decode_body(status: u16, body: &str) -> Result<Option<Value>, TwitchError> {
    if status == 204 || body.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(body)?;

    if value.get("error").is_some() {
        let reported = value
            .get("status")
            .and_then(Value::as_u64)
            .map(|s| s as u16)
            .unwrap_or(status);
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Err(TwitchError::Platform {
            status: reported,
            error,
            message,
        });
    }

    Ok(Some(value))
}

/// Typed decode of a list endpoint's `data` array. Missing or mismatched
/// required fields fail as decode errors rather than silently absent
/// values. A no-content response counts as an empty result set.
fn decode_rows<R: DeserializeOwned>(value: Option<Value>) -> Result<Vec<R>, TwitchError> {
    match value {
        Some(value) => {
            let response: ApiResponse<R> = serde_json::from_value(value)?;
            Ok(response.data)
        }
        None => Ok(Vec::new()),
    }
}
