use serde::Deserialize;

/// One row of a `/users` response. `/users` without parameters resolves
/// the bearer token's own account.
#[derive(Deserialize, Clone, Debug)]
pub struct UserRow {
    pub id: String,
    pub login: String,
}
