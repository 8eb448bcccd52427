use crate::presence::backing::{PresenceBacking, StoreError};
use async_trait::async_trait;
use huddle_core::{Participant, ParticipantId, Role};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use tracing::warn;

/// Durable backing shared across server processes.
///
/// Schema: `room:{id}:order` is a list of participant ids in join order;
/// `user:{pid}` is a hash of the participant fields. The list (instead of a
/// set) keeps membership broadcasts deterministic.
#[derive(Clone)]
pub struct RedisBacking {
    conn: ConnectionManager,
}

impl RedisBacking {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(to_store)?;
        let conn = client.get_connection_manager().await.map_err(to_store)?;
        Ok(Self { conn })
    }

    fn order_key(room_id: &str) -> String {
        format!("room:{room_id}:order")
    }

    fn user_key(participant_id: &ParticipantId) -> String {
        format!("user:{participant_id}")
    }
}

#[async_trait]
impl PresenceBacking for RedisBacking {
    async fn join(&self, room_id: &str, participant: Participant) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let user_key = Self::user_key(&participant.id);
        let order_key = Self::order_key(room_id);
        let id = participant.id.to_string();

        let fields = [
            ("id", id.clone()),
            ("name", participant.name),
            ("role", role_to_wire(participant.role).to_string()),
            ("roomId", participant.room_id),
        ];
        let _: () = conn.hset_multiple(&user_key, &fields).await.map_err(to_store)?;

        // LREM before RPUSH keeps a re-join idempotent without disturbing
        // other members' order.
        let _: () = conn.lrem(&order_key, 0, &id).await.map_err(to_store)?;
        let _: () = conn.rpush(&order_key, &id).await.map_err(to_store)?;
        Ok(())
    }

    async fn leave(
        &self,
        room_id: &str,
        participant_id: &ParticipantId,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let id = participant_id.to_string();
        let _: () = conn
            .lrem(Self::order_key(room_id), 0, &id)
            .await
            .map_err(to_store)?;
        let _: () = conn
            .del(Self::user_key(participant_id))
            .await
            .map_err(to_store)?;
        Ok(())
    }

    async fn remove_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let room_id: Option<String> = conn
            .hget(Self::user_key(participant_id), "roomId")
            .await
            .map_err(to_store)?;
        let Some(room_id) = room_id else {
            return Ok(None);
        };
        self.leave(&room_id, participant_id).await?;
        Ok(Some(room_id))
    }

    async fn members(&self, room_id: &str) -> Result<Vec<Participant>, StoreError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn
            .lrange(Self::order_key(room_id), 0, -1)
            .await
            .map_err(to_store)?;

        let mut members = Vec::with_capacity(ids.len());
        for raw_id in ids {
            let Ok(id) = raw_id.parse::<ParticipantId>() else {
                warn!("Skipping malformed participant id in {room_id}: {raw_id}");
                continue;
            };
            let fields: HashMap<String, String> = conn
                .hgetall(Self::user_key(&id))
                .await
                .map_err(to_store)?;
            // A dangling order entry (user hash expired or half-removed) is
            // skipped rather than surfaced.
            if fields.is_empty() {
                continue;
            }
            members.push(Participant {
                id,
                name: fields.get("name").cloned().unwrap_or_default(),
                role: parse_role(fields.get("role").map(String::as_str).unwrap_or("")),
                room_id: fields
                    .get("roomId")
                    .cloned()
                    .unwrap_or_else(|| room_id.to_string()),
            });
        }
        Ok(members)
    }
}

fn role_to_wire(role: Role) -> &'static str {
    match role {
        Role::Host => "host",
        Role::Guest => "guest",
    }
}

fn parse_role(raw: &str) -> Role {
    match raw {
        "host" => Role::Host,
        _ => Role::Guest,
    }
}

fn to_store(err: redis::RedisError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}
