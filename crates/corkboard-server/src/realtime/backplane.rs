// SPDX-License-Identifier: Apache-2.0

//! Redis pub/sub backplane.
//!
//! With more than one server instance, a room's subscribers are spread
//! across processes. Publishing therefore goes to a Redis channel
//! (`<prefix>:<room>`) and every instance runs a relay that feeds inbound
//! backplane messages into its local rooms — including the instance that
//! published, which keeps a room's ordering anchored to the backplane
//! rather than to a per-instance interleaving. If Redis is unreachable the
//! publisher falls back to its local rooms so a single instance keeps
//! working; the failure is logged, not surfaced.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use tracing::{info, warn};

use corkboard_model::ServerEvent;

use super::{Broadcaster, RoomId, Rooms};

pub struct RedisBroadcaster {
    connection: redis::aio::MultiplexedConnection,
    prefix: String,
    rooms: Arc<Rooms>,
}

impl RedisBroadcaster {
    /// Connect the publishing side and start the relay task.
    pub async fn connect(
        url: &str,
        prefix: &str,
        rooms: Arc<Rooms>,
    ) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        tokio::spawn(relay_loop(client, prefix.to_string(), Arc::clone(&rooms)));
        info!(prefix, "redis backplane connected");
        Ok(Self {
            connection,
            prefix: prefix.to_string(),
            rooms,
        })
    }
}

#[async_trait]
impl Broadcaster for RedisBroadcaster {
    async fn publish(&self, room: &RoomId, event: &ServerEvent) {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(event = event.name(), error = %err, "failed to encode event");
                return;
            }
        };
        let channel = format!("{}:{}", self.prefix, room.channel());
        let mut connection = self.connection.clone();
        let outcome: Result<(), redis::RedisError> =
            connection.publish(channel.as_str(), frame.as_str()).await;
        if let Err(err) = outcome {
            // Degraded single-instance mode: local subscribers still see
            // the event; peers on other instances miss it until refetch.
            warn!(room = %channel, error = %err, "backplane publish failed, delivering locally");
            self.rooms.send(&room.channel(), frame.into());
        }
    }
}

async fn relay_loop(client: redis::Client, prefix: String, rooms: Arc<Rooms>) {
    let pattern = format!("{prefix}:*");
    loop {
        match client.get_async_pubsub().await {
            Ok(mut pubsub) => {
                if let Err(err) = pubsub.psubscribe(&pattern).await {
                    warn!(error = %err, "backplane psubscribe failed");
                } else {
                    info!(pattern = %pattern, "backplane relay subscribed");
                    let mut messages = pubsub.on_message();
                    while let Some(message) = messages.next().await {
                        let channel = message.get_channel_name().to_string();
                        let Some(room) = channel.strip_prefix(&format!("{prefix}:")) else {
                            continue;
                        };
                        match message.get_payload::<String>() {
                            Ok(frame) => {
                                rooms.send(room, frame.into());
                            }
                            Err(err) => {
                                warn!(room, error = %err, "backplane payload decode failed");
                            }
                        }
                    }
                    warn!("backplane relay stream ended");
                }
            }
            Err(err) => {
                warn!(error = %err, "backplane connection failed");
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
