use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::{net::UdpSocket, sync::Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{CompletionSignal, FramePump, RtpLink, VoiceTransport};
use crate::{
    audio::mix::FrameSource,
    common::{ChannelId, GuildId, Shared, TransportError},
    configs::VoiceConfig,
};

struct Connection {
    channel: ChannelId,
    link: Shared<RtpLink>,
    playback: Option<CancellationToken>,
}

/// Streams each guild's frames as RTP over UDP to a configured sink. One
/// socket and SSRC per guild, kept across channel moves.
pub struct UdpTransport {
    sink: SocketAddr,
    trailing_silence: u32,
    connections: DashMap<GuildId, Connection>,
    shutdown: CancellationToken,
}

impl UdpTransport {
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            sink: config.sink,
            trailing_silence: config.trailing_silence_frames,
            connections: DashMap::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn channel_of(&self, guild: GuildId) -> Option<ChannelId> {
        self.connections.get(&guild).map(|c| c.channel)
    }

    /// Stops every running pump without firing completions.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.connections.clear();
    }

    fn local_bind(&self) -> SocketAddr {
        match self.sink {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        }
    }
}

#[async_trait]
impl VoiceTransport for UdpTransport {
    async fn connect(&self, guild: GuildId, channel: ChannelId) -> Result<(), TransportError> {
        if let Some(mut existing) = self.connections.get_mut(&guild) {
            existing.channel = channel;
            return Ok(());
        }

        let socket = UdpSocket::bind(self.local_bind()).await?;
        let ssrc: u32 = rand::random();
        let link = RtpLink::new(Arc::new(socket), self.sink, ssrc);

        self.connections.insert(
            guild,
            Connection {
                channel,
                link: Arc::new(Mutex::new(link)),
                playback: None,
            },
        );
        info!(
            "Voice connected: guild {} channel {} (ssrc {}, sink {})",
            guild, channel, ssrc, self.sink
        );
        Ok(())
    }

    async fn move_to(&self, guild: GuildId, channel: ChannelId) -> Result<(), TransportError> {
        let mut conn = self
            .connections
            .get_mut(&guild)
            .ok_or(TransportError::NotConnected(guild))?;
        debug!("Voice moved: guild {} {} -> {}", guild, conn.channel, channel);
        conn.channel = channel;
        Ok(())
    }

    async fn play(
        &self,
        guild: GuildId,
        source: Arc<dyn FrameSource>,
        on_finished: CompletionSignal,
    ) -> Result<(), TransportError> {
        if !source.is_encoded() {
            return Err(TransportError::RawSource);
        }

        let (link, cancel) = {
            let mut conn = self
                .connections
                .get_mut(&guild)
                .ok_or(TransportError::NotConnected(guild))?;
            if let Some(previous) = conn.playback.take() {
                previous.cancel();
            }
            let cancel = self.shutdown.child_token();
            conn.playback = Some(cancel.clone());
            (conn.link.clone(), cancel)
        };

        let pump = FramePump::new(source, link, self.trailing_silence, cancel);
        tokio::spawn(async move {
            let outcome = pump.run(on_finished).await;
            debug!("Playback for guild {} ended: {:?}", guild, outcome);
        });
        Ok(())
    }

    async fn disconnect(&self, guild: GuildId) -> Result<(), TransportError> {
        if let Some((_, conn)) = self.connections.remove(&guild) {
            if let Some(playback) = conn.playback {
                playback.cancel();
            }
            info!("Voice disconnected: guild {} channel {}", guild, conn.channel);
        }
        Ok(())
    }
}
