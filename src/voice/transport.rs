use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::{
    audio::mix::FrameSource,
    common::{ChannelId, GuildId, TransportError},
};

/// Fired once by the transport after it has stopped pulling frames from a
/// drained source. Dropping it unfired means playback was aborted.
pub struct CompletionSignal {
    notify: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl CompletionSignal {
    pub fn new(notify: impl FnOnce() + Send + 'static) -> Self {
        Self {
            notify: Some(Box::new(notify)),
        }
    }

    /// A signal nobody listens to.
    pub fn noop() -> Self {
        Self { notify: None }
    }

    pub fn fire(mut self) {
        if let Some(notify) = self.notify.take() {
            notify();
        }
    }
}

impl fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("armed", &self.notify.is_some())
            .finish()
    }
}

/// The voice connection primitives the scheduler drives.
///
/// Implementations hold at most one connection per guild.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Joins `channel`. Resolves once the connection can carry audio.
    async fn connect(&self, guild: GuildId, channel: ChannelId) -> Result<(), TransportError>;

    /// Moves an existing connection to another channel of the same guild.
    async fn move_to(&self, guild: GuildId, channel: ChannelId) -> Result<(), TransportError>;

    /// Starts pulling frames from `source` every frame period. When the source
    /// yields an empty frame the transport stops polling it, then fires
    /// `on_finished`.
    async fn play(
        &self,
        guild: GuildId,
        source: Arc<dyn FrameSource>,
        on_finished: CompletionSignal,
    ) -> Result<(), TransportError>;

    /// Leaves the guild's voice channel. Does nothing if not connected.
    async fn disconnect(&self, guild: GuildId) -> Result<(), TransportError>;
}
