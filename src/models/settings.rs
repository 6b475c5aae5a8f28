const DEFAULT_CURL_PATH: &str = "curl";

/// Mutable session configuration shared by every API call.
///
/// The resolved user/game IDs are lazy caches owned by this struct so the
/// setters can clear them in the same operation that changes the name they
/// were resolved from. A cached ID is either absent or belongs to the
/// current name; it is never served stale.
#[derive(Debug, Clone)]
pub struct Session {
    client_id: String,
    oauth_token: String,
    username: Option<String>,   // Whose data is queried; optional
    game_filter: Option<String>, // Restricts stream search; optional
    curl_path: String,
    user_id: Option<String>, // Cache, tied to username
    game_id: Option<String>, // Cache, tied to game_filter
}

impl Default for Session {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            oauth_token: String::new(),
            username: None,
            game_filter: None,
            curl_path: DEFAULT_CURL_PATH.to_string(),
            user_id: None,
            game_id: None,
        }
    }
}

impl Session {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn oauth_token(&self) -> &str {
        &self.oauth_token
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn game_filter(&self) -> Option<&str> {
        self.game_filter.as_deref()
    }

    pub fn curl_path(&self) -> &str {
        &self.curl_path
    }

    pub fn cached_user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn cached_game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    pub fn set_client_id(&mut self, client_id: impl Into<String>) {
        self.client_id = client_id.into();
    }

    pub fn set_oauth_token(&mut self, token: impl Into<String>) {
        self.oauth_token = token.into();
    }

    pub fn set_curl_path(&mut self, path: impl Into<String>) {
        self.curl_path = path.into();
    }

    /// Set the username whose data is queried. Clears the cached user ID
    /// when the value actually changes; setting the same name again (or
    /// setting it for the first time) leaves nothing to invalidate.
    pub fn set_username(&mut self, username: impl Into<String>) {
        let username = username.into();
        if self.username.as_deref() == Some(username.as_str()) {
            return;
        }
        self.username = Some(username);
        self.user_id = None;
    }

    /// Set the game filter for stream searches. Same invalidation rule as
    /// [`Session::set_username`], against the cached game ID.
    pub fn set_game_filter(&mut self, game: impl Into<String>) {
        let game = game.into();
        if self.game_filter.as_deref() == Some(game.as_str()) {
            return;
        }
        self.game_filter = Some(game);
        self.game_id = None;
    }

    pub fn clear_game_filter(&mut self) {
        self.game_filter = None;
        self.game_id = None;
    }

    pub(crate) fn cache_user_id(&mut self, id: impl Into<String>) {
        self.user_id = Some(id.into());
    }

    pub(crate) fn cache_game_id(&mut self, id: impl Into<String>) {
        self.game_id = Some(id.into());
    }
}
