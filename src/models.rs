use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Client authentication
// ---------------------------------------------------------------------------

/// Body of `POST clientauthentication`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCredentials {
    pub client_id: String,
    pub secret: String,
}

/// Successful `clientauthentication` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientToken {
    pub client_token: String,
}
