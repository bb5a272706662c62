use serde::{Deserialize, Serialize};

use crate::common::UserId;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: default_password(),
        }
    }
}

/// The bot's own presence. Voice-state updates for this user never trigger
/// a sound.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BotConfig {
    #[serde(default)]
    pub user_id: UserId,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2444
}

fn default_password() -> String {
    "youshallnotpass".to_string()
}
