use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of a `/search/channels` response. Feeds both channel search
/// (as a profile) and live-stream search (with `live_only=true`).
#[derive(Deserialize, Clone, Debug)]
pub struct SearchChannelRow {
    pub broadcaster_login: String,
    pub display_name: String,
    pub title: String,
    #[serde(default)]
    pub game_name: String,
}

/// A broadcaster's profile as returned by channel search.
///
/// `followers` is carried for the front ends but the search endpoint never
/// supplies a count, so it stays `None` rather than a fabricated zero.
#[derive(Serialize, Clone, Debug)]
pub struct Channel {
    pub name: String,
    pub followers: Option<u64>,
    pub game: String,
    pub url: String,
}

impl Channel {
    /// `login` drives the URL; `display_name` is what gets shown.
    pub fn new(display_name: &str, login: &str, game: impl Into<String>) -> Self {
        Self {
            name: display_name.to_string(),
            followers: None,
            game: game.into(),
            url: channel_url(login),
        }
    }
}

pub(crate) fn channel_url(login: &str) -> String {
    format!("https://www.twitch.tv/{}", login)
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.game.is_empty() {
            write!(f, " [{}]", self.game)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_comes_from_login_not_display_name() {
        let channel = Channel::new("CoolStreamer", "coolstreamer", "Chess");
        assert_eq!(channel.name, "CoolStreamer");
        assert_eq!(channel.url, "https://www.twitch.tv/coolstreamer");
        assert_eq!(channel.followers, None);
    }

    #[test]
    fn test_display_omits_empty_game() {
        let channel = Channel::new("Someone", "someone", "");
        assert_eq!(channel.to_string(), "Someone");
    }
}
