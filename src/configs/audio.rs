use std::{net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Where per-user clips live and how unweighted clips are treated.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SoundsConfig {
    #[serde(default = "default_sounds_root")]
    pub root: PathBuf,
    /// Weight used for a clip that carries no `weight` tag.
    #[serde(default = "default_weight")]
    pub default_weight: u32,
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            root: default_sounds_root(),
            default_weight: default_weight(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    #[default]
    Auto,
    Voice,
    Music,
}

/// Opus settings applied to every mix session's encoder.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EncoderConfig {
    #[serde(default = "default_bitrate")]
    pub bitrate: i32,
    #[serde(default = "default_true")]
    pub inband_fec: bool,
    #[serde(default = "default_packet_loss_percent")]
    pub packet_loss_percent: u8,
    #[serde(default)]
    pub signal: SignalKind,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            bitrate: default_bitrate(),
            inband_fec: true,
            packet_loss_percent: default_packet_loss_percent(),
            signal: SignalKind::Auto,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VoiceConfig {
    /// UDP endpoint Opus/RTP frames are delivered to.
    #[serde(default = "default_sink")]
    pub sink: SocketAddr,
    /// Opus silence frames sent after a mix drains, before completion fires.
    #[serde(default = "default_trailing_silence_frames")]
    pub trailing_silence_frames: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            sink: default_sink(),
            trailing_silence_frames: default_trailing_silence_frames(),
        }
    }
}

fn default_sounds_root() -> PathBuf {
    PathBuf::from("./sounds")
}

fn default_weight() -> u32 {
    1
}

fn default_bitrate() -> i32 {
    128_000
}

fn default_true() -> bool {
    true
}

fn default_packet_loss_percent() -> u8 {
    15
}

fn default_sink() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5004))
}

fn default_trailing_silence_frames() -> u32 {
    5
}
