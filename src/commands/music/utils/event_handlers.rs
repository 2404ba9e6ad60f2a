use std::sync::Arc;

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use songbird::events::context_data::{DisconnectKind, DisconnectReason};
use songbird::tracks::PlayMode;
use songbird::{Event, EventContext, Songbird};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::backend::BackendEvent;
use super::queue_manager::{ConnectionId, PlaybackId};

/// Hands an event to the `MusicManager` loop.
fn forward(events: &UnboundedSender<BackendEvent>, event: BackendEvent) {
    if let Err(err) = events.send(event) {
        warn!("Dropping backend event, listener is gone: {:?}", err.0);
    }
}

/// Event handler for when a song ends or fails
pub struct SongEndNotifier {
    pub guild_id: serenity::GuildId,
    pub playback: PlaybackId,
    pub events: UnboundedSender<BackendEvent>,
}

#[async_trait]
impl songbird::EventHandler for SongEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let EventContext::Track(tracks) = ctx else {
            return None;
        };

        let errored = tracks.iter().find_map(|(state, _)| match &state.playing {
            PlayMode::Errored(err) => Some(format!("{:?}", err)),
            _ => None,
        });

        let event = match errored {
            Some(reason) => {
                warn!(
                    "Stream {} in guild {} failed: {}",
                    self.playback, self.guild_id, reason
                );
                BackendEvent::TrackErrored {
                    guild_id: self.guild_id,
                    playback: self.playback,
                    reason,
                }
            }
            None => {
                info!("Track ended for guild {}", self.guild_id);
                BackendEvent::TrackEnded {
                    guild_id: self.guild_id,
                    playback: self.playback,
                }
            }
        };

        forward(&self.events, event);
        None
    }
}

/// Whether a driver disconnect means the bot is out of the call for good.
///
/// A failed connect or reconnect is final. A connection dropped at runtime
/// is retried by the driver as long as the gateway still lists us in a
/// channel. An attempt discarded for a newer one (a channel move) is not a
/// disconnect at all.
pub fn disconnect_is_final(
    kind: &DisconnectKind,
    reason: Option<&DisconnectReason>,
    in_channel: bool,
) -> bool {
    if matches!(reason, Some(DisconnectReason::AttemptDiscarded)) {
        return false;
    }

    match kind {
        DisconnectKind::Runtime => !in_channel,
        _ => true,
    }
}

/// Reports a disconnect once the driver has given up on the call.
pub struct DisconnectNotifier {
    pub guild_id: serenity::GuildId,
    pub connection: ConnectionId,
    pub songbird: Arc<Songbird>,
    pub events: UnboundedSender<BackendEvent>,
}

#[async_trait]
impl songbird::EventHandler for DisconnectNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let EventContext::DriverDisconnect(data) = ctx else {
            return None;
        };

        let in_channel = match self.songbird.get(self.guild_id) {
            Some(call) => call.lock().await.current_channel().is_some(),
            None => false,
        };

        if !disconnect_is_final(&data.kind, data.reason.as_ref(), in_channel) {
            debug!(
                "Driver dropped ({:?}, {:?}) for guild {}, waiting for it to reconnect",
                data.kind, data.reason, self.guild_id
            );
            return None;
        }

        info!(
            "Voice connection {} lost for guild {} ({:?}, {:?})",
            self.connection, self.guild_id, data.kind, data.reason
        );
        forward(
            &self.events,
            BackendEvent::Disconnected {
                guild_id: self.guild_id,
                connection: self.connection,
            },
        );
        Some(Event::Cancel)
    }
}

/// Leaves the voice channel once no human listener is left in it.
pub struct IdleChecker {
    pub guild_id: serenity::GuildId,
    pub connection: ConnectionId,
    pub songbird: Arc<Songbird>,
    pub cache: Arc<serenity::Cache>,
    pub events: UnboundedSender<BackendEvent>,
}

impl IdleChecker {
    /// Non-bot users sharing `channel_id` with us, or `None` if the guild
    /// is not cached yet.
    fn listeners(&self, channel_id: serenity::ChannelId) -> Option<usize> {
        let bot_id = self.cache.current_user().id;
        let guild = self.cache.guild(self.guild_id)?;

        let count = guild
            .voice_states
            .values()
            .filter(|state| state.channel_id == Some(channel_id))
            .filter(|state| state.user_id != bot_id)
            .filter(|state| !state.member.as_ref().is_some_and(|m| m.user.bot))
            .count();
        Some(count)
    }
}

#[async_trait]
impl songbird::EventHandler for IdleChecker {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        let call = self.songbird.get(self.guild_id)?;
        let channel = call.lock().await.current_channel();

        if let Some(channel) = channel {
            let channel_id = serenity::ChannelId::new(channel.0.get());
            // Try again next period if the cache can't tell yet.
            let listeners = self.listeners(channel_id)?;
            if listeners > 0 {
                debug!(
                    "{} listener(s) left in {} for guild {}",
                    listeners, channel_id, self.guild_id
                );
                return None;
            }
        }

        info!("Idle! Disconnecting from voice channel in guild {}", self.guild_id);
        if let Err(err) = self.songbird.remove(self.guild_id).await {
            warn!("Failed to leave idle call in guild {}: {}", self.guild_id, err);
        }

        forward(
            &self.events,
            BackendEvent::Disconnected {
                guild_id: self.guild_id,
                connection: self.connection,
            },
        );
        Some(Event::Cancel)
    }
}
