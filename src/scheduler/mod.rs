//! Per-guild playback decisions: start a mix, merge into it, defer an
//! arrival to another channel, or move on once a mix drains.

mod group;
pub mod state;

pub use state::{
    ConnectionState, DeferredQueue, DeferredSnapshot, GroupSnapshot, MixSession, SessionId,
};

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use group::{GroupActor, GroupEvent};
use crate::{
    audio::{ClipDecoder, EncoderFactory},
    common::{ChannelId, Guild, GuildId, Member, UserId},
    sounds::AssetLookup,
    voice::VoiceTransport,
};

/// The collaborators every guild actor shares.
pub struct Collaborators {
    pub lookup: Arc<dyn AssetLookup>,
    pub decoder: Arc<dyn ClipDecoder>,
    pub encoders: Arc<dyn EncoderFactory>,
    pub transport: Arc<dyn VoiceTransport>,
}

/// A member's voice presence changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceStateUpdate {
    pub guild: Guild,
    pub member: Member,
    /// Channel before the change, if any.
    #[serde(default)]
    pub before: Option<ChannelId>,
    /// Channel after the change; `None` means the member left voice.
    #[serde(default)]
    pub after: Option<ChannelId>,
}

pub struct PlaybackScheduler {
    deps: Arc<Collaborators>,
    bot_user: UserId,
    groups: DashMap<GuildId, flume::Sender<GroupEvent>>,
    shutdown: CancellationToken,
}

impl PlaybackScheduler {
    pub fn new(deps: Collaborators, bot_user: UserId) -> Self {
        Self {
            deps: Arc::new(deps),
            bot_user,
            groups: DashMap::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Mailbox of `guild`'s actor, spawning the actor on first use.
    fn mailbox(&self, guild: GuildId) -> flume::Sender<GroupEvent> {
        self.groups
            .entry(guild)
            .or_insert_with(|| {
                let (tx, rx) = flume::unbounded();
                let actor = GroupActor::new(guild, self.deps.clone(), tx.clone());
                tokio::spawn(actor.run(rx, self.shutdown.child_token()));
                debug!("[{}] Group actor started", guild);
                tx
            })
            .clone()
    }

    fn post(&self, guild: GuildId, event: GroupEvent) {
        if self.mailbox(guild).send(event).is_err() {
            warn!("[{}] Group actor is gone, event dropped", guild);
        }
    }

    /// `member` entered `channel`. The bot's own arrivals never trigger a
    /// sound.
    pub fn arrival(&self, member: Member, guild: Guild, channel: ChannelId) {
        if member.id == self.bot_user {
            debug!("[{}] Ignoring own arrival in channel {}", guild.id, channel);
            return;
        }
        let id = guild.id;
        self.post(
            id,
            GroupEvent::Arrival {
                member,
                guild,
                channel,
            },
        );
    }

    /// The transport finished playing `session` for `guild`.
    pub fn playback_finished(&self, guild: GuildId, session: SessionId) {
        self.post(guild, GroupEvent::PlaybackFinished { session });
    }

    /// Turns a presence change into an arrival when the member ends up in a
    /// different channel than before. Leaving voice is not acted on. Returns
    /// whether an arrival was posted.
    pub fn handle_voice_state(&self, update: VoiceStateUpdate) -> bool {
        let Some(after) = update.after else {
            return false;
        };
        if update.before == Some(after) {
            return false;
        }
        if update.member.id == self.bot_user {
            return false;
        }
        self.arrival(update.member, update.guild, after);
        true
    }

    /// Current state of `guild`, answered after every event posted before it.
    pub async fn snapshot(&self, guild: GuildId) -> GroupSnapshot {
        let Some(mailbox) = self.groups.get(&guild).map(|m| m.clone()) else {
            return GroupSnapshot::idle(guild);
        };
        let (tx, rx) = oneshot::channel();
        if mailbox.send(GroupEvent::Snapshot(tx)).is_err() {
            return GroupSnapshot::idle(guild);
        }
        rx.await.unwrap_or_else(|_| GroupSnapshot::idle(guild))
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    pub fn guild_count(&self) -> usize {
        self.groups.len()
    }

    /// Stops every guild actor, disconnecting active connections.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.groups.clear();
    }
}
