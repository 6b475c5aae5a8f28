//! Twitch Helix client for search/completion front ends: authenticated
//! queries decoded into typed records, lazy identity caching, and the
//! hook choreography for joining IRC chat once the connection is up.

pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{Result, TwitchError};
pub use models::channel::Channel;
pub use models::settings::Session;
pub use models::stream::Stream;
pub use services::auth_service;
pub use services::chat_service::{
    is_stub_greeting, open_chat, ChatConnector, ConnectParams, ConnectedEvent, LineFilter,
};
pub use services::transport::{CurlTransport, RawResponse, Transport};
pub use services::twitch_service::TwitchService;
