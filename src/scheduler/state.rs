use std::{collections::VecDeque, path::PathBuf, sync::Arc};

use serde::Serialize;

use crate::{
    audio::{FrameMixer, mix::FrameSource},
    common::{ChannelId, GuildId},
};

/// Sequence number of a mix session within one guild. Completion signals
/// carry it so a late signal from an earlier session is recognised.
pub type SessionId = u64;

/// The mixer bound to one active connection.
pub struct MixSession {
    pub id: SessionId,
    pub mixer: Arc<FrameMixer>,
}

impl MixSession {
    pub fn release(&self) {
        self.mixer.release();
    }

    /// Released while still installed: a relocation failed after the old
    /// stream drained, so nothing is feeding the connection.
    pub fn is_released(&self) -> bool {
        self.mixer.is_released()
    }
}

pub enum ConnectionState {
    Idle,
    Connected {
        channel: ChannelId,
        session: MixSession,
    },
}

impl ConnectionState {
    pub fn channel(&self) -> Option<ChannelId> {
        match self {
            Self::Idle => None,
            Self::Connected { channel, .. } => Some(*channel),
        }
    }
}

/// Arrivals waiting for the connection to move to their channel, oldest
/// channel first.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    entries: VecDeque<(ChannelId, Vec<PathBuf>)>,
}

impl DeferredQueue {
    pub fn push(&mut self, channel: ChannelId, asset: PathBuf) {
        match self.entries.iter_mut().find(|(c, _)| *c == channel) {
            Some((_, assets)) => assets.push(asset),
            None => self.entries.push_back((channel, vec![asset])),
        }
    }

    /// Removes the oldest pending channel together with all of its assets.
    pub fn pop(&mut self) -> Option<(ChannelId, Vec<PathBuf>)> {
        self.entries.pop_front()
    }

    /// Removes `channel`'s entry, if any.
    pub fn take(&mut self, channel: ChannelId) -> Option<Vec<PathBuf>> {
        let index = self.entries.iter().position(|(c, _)| *c == channel)?;
        self.entries.remove(index).map(|(_, assets)| assets)
    }

    pub fn get(&self, channel: ChannelId) -> Option<&[PathBuf]> {
        self.entries
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, assets)| assets.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn snapshot(&self) -> Vec<DeferredSnapshot> {
        self.entries
            .iter()
            .map(|(channel, assets)| DeferredSnapshot {
                channel: *channel,
                assets: assets.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeferredSnapshot {
    pub channel: ChannelId,
    pub assets: Vec<PathBuf>,
}

/// Point-in-time view of one guild's playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSnapshot {
    pub guild_id: GuildId,
    pub connected: bool,
    pub channel: Option<ChannelId>,
    pub session: Option<SessionId>,
    pub active_clips: usize,
    pub deferred: Vec<DeferredSnapshot>,
}

impl GroupSnapshot {
    pub fn idle(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            connected: false,
            channel: None,
            session: None,
            active_clips: 0,
            deferred: Vec::new(),
        }
    }

    pub fn capture(guild_id: GuildId, state: &ConnectionState, deferred: &DeferredQueue) -> Self {
        let mut snapshot = Self::idle(guild_id);
        snapshot.channel = state.channel();
        if let ConnectionState::Connected { session, .. } = state {
            snapshot.connected = true;
            snapshot.session = Some(session.id);
            snapshot.active_clips = session.mixer.active_clips();
        }
        snapshot.deferred = deferred.snapshot();
        snapshot
    }
}
