use std::{path::PathBuf, sync::Arc};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{
    Collaborators,
    state::{ConnectionState, DeferredQueue, GroupSnapshot, MixSession, SessionId},
};
use crate::{
    audio::FrameMixer,
    common::{AudioError, ChannelId, ClipHandle, Guild, GuildId, Member, SchedulerError},
    voice::CompletionSignal,
};

/// Everything a guild's actor reacts to. Posted from the HTTP path, the
/// scheduler API and the transport's completion signals.
pub enum GroupEvent {
    Arrival {
        member: Member,
        guild: Guild,
        channel: ChannelId,
    },
    PlaybackFinished {
        session: SessionId,
    },
    Snapshot(oneshot::Sender<GroupSnapshot>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrivalOutcome {
    NoSound,
    Started,
    Resumed,
    Merged,
    Deferred,
}

/// Owns one guild's connection state and deferred queue. All transitions
/// happen on this task, one event at a time.
pub(super) struct GroupActor {
    guild: GuildId,
    deps: Arc<Collaborators>,
    mailbox: flume::Sender<GroupEvent>,
    state: ConnectionState,
    deferred: DeferredQueue,
    last_session: SessionId,
}

impl GroupActor {
    pub fn new(
        guild: GuildId,
        deps: Arc<Collaborators>,
        mailbox: flume::Sender<GroupEvent>,
    ) -> Self {
        Self {
            guild,
            deps,
            mailbox,
            state: ConnectionState::Idle,
            deferred: DeferredQueue::default(),
            last_session: 0,
        }
    }

    pub async fn run(mut self, events: flume::Receiver<GroupEvent>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv_async() => match event {
                    Ok(event) => self.handle(event).await,
                    Err(_) => break,
                },
            }
        }
        self.teardown().await;
    }

    async fn handle(&mut self, event: GroupEvent) {
        match event {
            GroupEvent::Arrival {
                member,
                guild,
                channel,
            } => match self.on_arrival(&member, &guild, channel).await {
                Ok(outcome) => debug!(
                    "[{}] Arrival of {} in channel {}: {:?}",
                    self.guild, member.name, channel, outcome
                ),
                Err(e) => warn!(
                    "[{}] Arrival of {} in channel {} failed: {}",
                    self.guild, member.name, channel, e
                ),
            },
            GroupEvent::PlaybackFinished { session } => self.on_finished(session).await,
            GroupEvent::Snapshot(reply) => {
                let _ = reply.send(GroupSnapshot::capture(
                    self.guild,
                    &self.state,
                    &self.deferred,
                ));
            }
        }
    }

    async fn on_arrival(
        &mut self,
        member: &Member,
        guild: &Guild,
        channel: ChannelId,
    ) -> Result<ArrivalOutcome, SchedulerError> {
        let Some(asset) = self.deps.lookup.lookup(member, guild).await? else {
            return Ok(ArrivalOutcome::NoSound);
        };

        match &self.state {
            ConnectionState::Idle => {
                self.start(channel, asset.path).await?;
                Ok(ArrivalOutcome::Started)
            }
            ConnectionState::Connected {
                channel: current,
                session,
            } if session.is_released() => {
                let current = *current;
                self.resume(current, channel, asset.path).await?;
                Ok(ArrivalOutcome::Resumed)
            }
            ConnectionState::Connected {
                channel: current,
                session,
            } if *current == channel => {
                match add_clip(&session.mixer, asset.path.clone()).await {
                    Ok(_) => Ok(ArrivalOutcome::Merged),
                    // Drained but not yet reported finished: play it next.
                    Err(SchedulerError::Audio(AudioError::SessionEnded)) => {
                        self.deferred.push(channel, asset.path);
                        Ok(ArrivalOutcome::Deferred)
                    }
                    Err(e) => Err(e),
                }
            }
            ConnectionState::Connected { .. } => {
                self.deferred.push(channel, asset.path);
                Ok(ArrivalOutcome::Deferred)
            }
        }
    }

    /// Idle → Connected. The clip is decoded before connecting, so nothing
    /// changes if it turns out to be unreadable.
    async fn start(&mut self, channel: ChannelId, asset: PathBuf) -> Result<(), SchedulerError> {
        let session = self.open_session()?;
        add_clip(&session.mixer, asset).await?;

        if let Err(e) = self.deps.transport.connect(self.guild, channel).await {
            session.release();
            return Err(e.into());
        }
        if let Err(e) = self.play(&session).await {
            session.release();
            if let Err(e) = self.deps.transport.disconnect(self.guild).await {
                warn!("[{}] Disconnect after failed playback: {}", self.guild, e);
            }
            return Err(e);
        }

        info!(
            "[{}] Connected to channel {} (session {})",
            self.guild, channel, session.id
        );
        self.state = ConnectionState::Connected { channel, session };
        Ok(())
    }

    /// Restarts playback on a connection left without a stream by a failed
    /// move. The existing connection is reused, moving it first if the
    /// arrival is elsewhere, so nothing is queued behind a stream that will
    /// never finish.
    async fn resume(
        &mut self,
        current: ChannelId,
        channel: ChannelId,
        asset: PathBuf,
    ) -> Result<(), SchedulerError> {
        let session = self.open_session()?;
        add_clip(&session.mixer, asset).await?;

        if channel != current {
            if let Err(e) = self.deps.transport.move_to(self.guild, channel).await {
                session.release();
                return Err(e.into());
            }
            if let ConnectionState::Connected { channel: known, .. } = &mut self.state {
                *known = channel;
            }
        }
        if let Err(e) = self.play(&session).await {
            session.release();
            return Err(e);
        }

        info!(
            "[{}] Resumed in channel {} (session {})",
            self.guild, channel, session.id
        );
        self.state = ConnectionState::Connected { channel, session };
        Ok(())
    }

    async fn on_finished(&mut self, session_id: SessionId) {
        let is_current = matches!(
            &self.state,
            ConnectionState::Connected { session, .. } if session.id == session_id
        );
        if !is_current {
            debug!("[{}] Ignoring stale completion of session {}", self.guild, session_id);
            return;
        }

        let ConnectionState::Connected { channel, session } =
            std::mem::replace(&mut self.state, ConnectionState::Idle)
        else {
            return;
        };
        // The transport fires completion only after it stopped polling.
        session.release();

        let mut current = channel;
        while let Some((next, assets)) = self.next_deferred(current) {
            if next == current {
                debug!("[{}] Replaying clips queued while draining", self.guild);
            } else if let Err(e) = self.deps.transport.move_to(self.guild, next).await {
                error!(
                    "[{}] Could not move from channel {} to {}: {}",
                    self.guild, current, next, e
                );
                self.state = ConnectionState::Connected {
                    channel: current,
                    session,
                };
                return;
            }
            current = next;

            match self.relocated(next, assets).await {
                Ok(Some(session)) => {
                    info!(
                        "[{}] Moved to channel {} (session {}, {} clips)",
                        self.guild,
                        next,
                        session.id,
                        session.mixer.active_clips()
                    );
                    self.state = ConnectionState::Connected {
                        channel: next,
                        session,
                    };
                    return;
                }
                Ok(None) => warn!(
                    "[{}] Nothing playable for channel {}, moving on",
                    self.guild, next
                ),
                Err(e) => warn!("[{}] Playback in channel {} failed: {}", self.guild, next, e),
            }
        }

        match self.deps.transport.disconnect(self.guild).await {
            Ok(()) => info!("[{}] Playback finished, disconnected", self.guild),
            Err(e) => warn!("[{}] Disconnect failed: {}", self.guild, e),
        }
    }

    /// Clips queued for the channel the connection is already in come first,
    /// then the oldest pending channel.
    fn next_deferred(&mut self, current: ChannelId) -> Option<(ChannelId, Vec<PathBuf>)> {
        match self.deferred.take(current) {
            Some(assets) => Some((current, assets)),
            None => self.deferred.pop(),
        }
    }

    /// Seeds a new session with every asset queued for the channel the
    /// connection just moved to. Returns `None` if none of them decoded.
    async fn relocated(
        &mut self,
        channel: ChannelId,
        assets: Vec<PathBuf>,
    ) -> Result<Option<MixSession>, SchedulerError> {
        let session = self.open_session()?;
        for asset in assets {
            if let Err(e) = add_clip(&session.mixer, asset).await {
                warn!("[{}] Skipping deferred clip for channel {}: {}", self.guild, channel, e);
            }
        }
        if session.mixer.is_empty() {
            session.release();
            return Ok(None);
        }
        if let Err(e) = self.play(&session).await {
            session.release();
            return Err(e);
        }
        Ok(Some(session))
    }

    fn open_session(&mut self) -> Result<MixSession, SchedulerError> {
        let encoder = self.deps.encoders.create()?;
        self.last_session += 1;
        Ok(MixSession {
            id: self.last_session,
            mixer: Arc::new(FrameMixer::new(self.deps.decoder.clone(), encoder)),
        })
    }

    async fn play(&self, session: &MixSession) -> Result<(), SchedulerError> {
        let mailbox = self.mailbox.clone();
        let id = session.id;
        let on_finished = CompletionSignal::new(move || {
            let _ = mailbox.send(GroupEvent::PlaybackFinished { session: id });
        });
        self.deps
            .transport
            .play(self.guild, session.mixer.clone(), on_finished)
            .await?;
        Ok(())
    }

    async fn teardown(&mut self) {
        self.deferred.clear();
        if let ConnectionState::Connected { session, .. } =
            std::mem::replace(&mut self.state, ConnectionState::Idle)
        {
            if let Err(e) = self.deps.transport.disconnect(self.guild).await {
                warn!("[{}] Disconnect on shutdown failed: {}", self.guild, e);
            }
            // Disconnect cancels the pump first.
            session.release();
        }
        debug!("[{}] Group actor stopped", self.guild);
    }
}

/// Decodes off the async runtime, then inserts into the mix.
async fn add_clip(mixer: &Arc<FrameMixer>, asset: PathBuf) -> Result<ClipHandle, SchedulerError> {
    let mixer = mixer.clone();
    let handle = tokio::task::spawn_blocking(move || mixer.add_clip(&asset))
        .await
        .map_err(|e| SchedulerError::Join(e.to_string()))??;
    Ok(handle)
}
