use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub sounds: SoundsConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load() -> AnyResult<Self> {
        let config_path = if std::path::Path::new("config.toml").exists() {
            "config.toml"
        } else if std::path::Path::new("config.default.toml").exists() {
            "config.default.toml"
        } else {
            return Err("config.toml or config.default.toml not found".into());
        };

        // The logger is not up yet.
        println!("Loading configuration from: {}", config_path);

        let config_str = std::fs::read_to_string(config_path)?;
        Self::parse(&config_str).map_err(|e| format!("{}: {}", config_path, e).into())
    }

    pub fn parse(config_str: &str) -> AnyResult<Self> {
        if config_str.trim().is_empty() {
            return Err("configuration is empty".into());
        }
        Ok(toml::from_str(config_str)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_uses_defaults() {
        let config = Config::parse("[bot]\nuser_id = 1439452220700622878\n").unwrap();
        assert_eq!(config.bot.user_id.0, 1439452220700622878);
        assert_eq!(config.server.port, 2444);
        assert_eq!(config.encoder.bitrate, 128_000);
        assert!(config.encoder.inband_fec);
        assert_eq!(config.encoder.packet_loss_percent, 15);
        assert_eq!(config.sounds.default_weight, 1);
        assert_eq!(config.voice.trailing_silence_frames, 5);
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(Config::parse("  \n").is_err());
    }

    #[test]
    fn sections_override_defaults() {
        let text = r#"
            [sounds]
            root = "/srv/sounds"
            default_weight = 3

            [encoder]
            signal = "voice"
            packet_loss_percent = 5

            [voice]
            sink = "10.0.0.2:6000"

            [logging]
            level = "debug"
            [logging.file]
            path = "logs/chimebot.log"
        "#;
        let config = Config::parse(text).unwrap();
        assert_eq!(config.sounds.root, std::path::PathBuf::from("/srv/sounds"));
        assert_eq!(config.sounds.default_weight, 3);
        assert_eq!(config.encoder.signal, SignalKind::Voice);
        assert_eq!(config.encoder.packet_loss_percent, 5);
        assert_eq!(config.voice.sink.port(), 6000);
        let file = config.logging.file.unwrap();
        assert_eq!(file.path, "logs/chimebot.log");
        assert_eq!(file.max_lines, 10_000);
    }
}
