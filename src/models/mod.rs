pub mod channel;
pub mod game;
pub mod settings;
pub mod stream;
pub mod user;

use serde::Deserialize;

/// Helix list endpoints wrap their rows in a `data` array.
#[derive(Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub data: Vec<T>,
}
