use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::channel::channel_url;

/// One row of a `/streams` or `/streams/followed` response.
#[derive(Deserialize, Clone, Debug)]
pub struct StreamRow {
    pub user_login: String,
    pub title: String,
    pub viewer_count: u64,
    #[serde(default)]
    pub game_name: String,
}

/// A live broadcast, shaped for display and action dispatch.
///
/// `viewers` stays `None` when the source endpoint does not report live
/// viewer counts (the channel search endpoint never does); it is not
/// defaulted to zero.
#[derive(Serialize, Clone, Debug)]
pub struct Stream {
    pub name: String,
    pub viewers: Option<u64>,
    pub status: String,
    pub game: String,
    pub url: String,
}

impl Stream {
    pub fn new(login: &str, viewers: Option<u64>, title: &str, game: impl Into<String>) -> Self {
        Self {
            name: login.to_string(),
            viewers,
            status: sanitize_title(title),
            game: game.into(),
            url: channel_url(login),
        }
    }
}

/// Strip carriage returns and line feeds so one record renders as one line.
pub(crate) fn sanitize_title(title: &str) -> String {
    title.replace(['\r', '\n'], "")
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(viewers) = self.viewers {
            write!(f, " ({} viewers)", viewers)?;
        }
        if !self.game.is_empty() {
            write!(f, " [{}]", self.game)?;
        }
        if !self.status.is_empty() {
            write!(f, " {}", self.status)?;
        }
        Ok(())
    }
}
