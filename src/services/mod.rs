pub mod auth_service;
pub mod chat_service;
pub mod transport;
pub mod twitch_service;
