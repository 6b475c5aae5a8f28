use serde::Deserialize;

/// One row of a `/games?name=` response (exact-name category lookup).
#[derive(Deserialize, Clone, Debug)]
pub struct GameRow {
    pub id: String,
}
