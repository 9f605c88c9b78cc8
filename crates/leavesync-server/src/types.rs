use serde::{Deserialize, Serialize};

/// Query parameters shared by `GET /callback` and `POST /callback`.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub msg_signature: String,
    pub timestamp: String,
    pub nonce: String,
    #[serde(default)]
    pub echostr: String,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub outcome: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub enabled: bool,
}
