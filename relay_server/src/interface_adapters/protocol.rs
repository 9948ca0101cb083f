// Wire protocol DTOs and conversions for relay messages.
// Every message is a JSON object tagged by `type` with camelCase fields.

use crate::domain::{PlayerPatch, PlayerRecord, RelayedProjectile, SessionState};
use crate::use_cases::{ClientCommand, Notice};
use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::error;

/// Messages the relay sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    // Identity and role assigned on connect.
    Connected {
        client_id: String,
        player_id: String,
        is_host: bool,
        state: SessionStateDto,
        #[serde(skip_serializing_if = "Option::is_none")]
        server_address_hint: Option<String>,
    },
    // Full player table after any change.
    State { state: SessionStateDto },
    // Fire event relayed from the host.
    Projectile {
        player_id: String,
        projectile: ProjectileDto,
    },
    // Authority moved to another connection.
    HostChanged { new_host_id: String },
}

/// Messages clients send to the relay. Only the host's are acted upon.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    PlayerUpdate {
        player_id: String,
        player: PlayerPatchDto,
    },
    Projectile {
        player_id: String,
        projectile: ProjectileDto,
    },
    StartGame,
    Reset,
    LevelUp {
        player_id: String,
        level: u32,
    },
    GameOver,
}

impl From<ClientMessage> for ClientCommand {
    fn from(msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::PlayerUpdate { player_id, player } => ClientCommand::PlayerUpdate {
                player_id,
                patch: player.into(),
            },
            ClientMessage::Projectile {
                player_id,
                projectile,
            } => ClientCommand::Projectile {
                player_id,
                projectile: projectile.into(),
            },
            ClientMessage::StartGame => ClientCommand::StartGame,
            ClientMessage::Reset => ClientCommand::Reset,
            ClientMessage::LevelUp { player_id, level } => {
                ClientCommand::LevelUp { player_id, level }
            }
            ClientMessage::GameOver => ClientCommand::GameOver,
        }
    }
}

/// Shared session view broadcast to every connection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateDto {
    pub players: BTreeMap<String, PlayerStateDto>,
    pub started: bool,
    pub game_over: bool,
}

impl From<&SessionState> for SessionStateDto {
    fn from(state: &SessionState) -> Self {
        Self {
            players: state
                .players
                .iter()
                .map(|(id, player)| (id.clone(), PlayerStateDto::from(player)))
                .collect(),
            started: state.started,
            game_over: state.game_over,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub hp: f32,
    pub hp_max: f32,
    pub level: u32,
    pub damage: f32,
    pub fire_rate: f32,
    pub pierce: u32,
    pub pickup: f32,
    pub regen: f32,
    pub proj_size: f32,
    pub proj_count: u32,
    pub dash_cd: f32,
    pub dash_cd_max: f32,
    pub is_host: bool,
}

impl From<&PlayerRecord> for PlayerStateDto {
    fn from(p: &PlayerRecord) -> Self {
        Self {
            id: p.id.clone(),
            x: p.x,
            y: p.y,
            vx: p.vx,
            vy: p.vy,
            hp: p.hp,
            hp_max: p.hp_max,
            level: p.level,
            damage: p.damage,
            fire_rate: p.fire_rate,
            pierce: p.pierce,
            pickup: p.pickup,
            regen: p.regen,
            proj_size: p.proj_size,
            proj_count: p.proj_count,
            dash_cd: p.dash_cd,
            dash_cd_max: p.dash_cd_max,
            is_host: p.is_host,
        }
    }
}

/// Partial player stats from a host update; missing fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerPatchDto {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub vx: Option<f32>,
    pub vy: Option<f32>,
    pub hp: Option<f32>,
    pub hp_max: Option<f32>,
    pub level: Option<u32>,
    pub damage: Option<f32>,
    pub fire_rate: Option<f32>,
    pub pierce: Option<u32>,
    pub pickup: Option<f32>,
    pub regen: Option<f32>,
    pub proj_size: Option<f32>,
    pub proj_count: Option<u32>,
    pub dash_cd: Option<f32>,
    pub dash_cd_max: Option<f32>,
}

impl From<PlayerPatchDto> for PlayerPatch {
    fn from(dto: PlayerPatchDto) -> Self {
        Self {
            x: dto.x,
            y: dto.y,
            vx: dto.vx,
            vy: dto.vy,
            hp: dto.hp,
            hp_max: dto.hp_max,
            level: dto.level,
            damage: dto.damage,
            fire_rate: dto.fire_rate,
            pierce: dto.pierce,
            pickup: dto.pickup,
            regen: dto.regen,
            proj_size: dto.proj_size,
            proj_count: dto.proj_count,
            dash_cd: dto.dash_cd,
            dash_cd_max: dto.dash_cd_max,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectileDto {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub r: f32,
    pub life: f32,
    pub damage: f32,
    #[serde(default)]
    pub pierce: u32,
}

impl From<ProjectileDto> for RelayedProjectile {
    fn from(p: ProjectileDto) -> Self {
        Self {
            x: p.x,
            y: p.y,
            vx: p.vx,
            vy: p.vy,
            r: p.r,
            life: p.life,
            damage: p.damage,
            pierce: p.pierce,
        }
    }
}

impl From<RelayedProjectile> for ProjectileDto {
    fn from(p: RelayedProjectile) -> Self {
        Self {
            x: p.x,
            y: p.y,
            vx: p.vx,
            vy: p.vy,
            r: p.r,
            life: p.life,
            damage: p.damage,
            pierce: p.pierce,
        }
    }
}

impl From<&Notice> for ServerMessage {
    fn from(notice: &Notice) -> Self {
        match notice {
            Notice::Welcome {
                client_id,
                player_id,
                is_host,
                session,
                address_hint,
            } => ServerMessage::Connected {
                client_id: client_id.clone(),
                player_id: player_id.clone(),
                is_host: *is_host,
                state: SessionStateDto::from(session),
                server_address_hint: address_hint.clone(),
            },
            Notice::Session(session) => ServerMessage::State {
                state: SessionStateDto::from(session),
            },
            Notice::Projectile {
                player_id,
                projectile,
            } => ServerMessage::Projectile {
                player_id: player_id.clone(),
                projectile: ProjectileDto::from(*projectile),
            },
            Notice::HostChanged { new_host_id } => ServerMessage::HostChanged {
                new_host_id: new_host_id.clone(),
            },
        }
    }
}

/// Serializes a notice once so every recipient shares the same bytes.
pub fn encode_notice(notice: &Notice) -> Option<Utf8Bytes> {
    match serde_json::to_string(&ServerMessage::from(notice)) {
        Ok(txt) => Some(Utf8Bytes::from(txt)),
        Err(e) => {
            error!(error = ?e, "failed to serialize relay notice");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn when_host_change_is_encoded_then_fields_are_camel_case() {
        let bytes = encode_notice(&Notice::HostChanged {
            new_host_id: "abc".into(),
        })
        .unwrap();
        let value: Value = serde_json::from_str(bytes.as_str()).unwrap();
        assert_eq!(value, json!({"type": "hostChanged", "newHostId": "abc"}));
    }

    #[test]
    fn when_welcome_has_no_hint_then_field_is_omitted() {
        let mut session = SessionState::default();
        session
            .players
            .insert("P1".into(), PlayerRecord::spawn("P1", 0, true));
        let bytes = encode_notice(&Notice::Welcome {
            client_id: "c1".into(),
            player_id: "P1".into(),
            is_host: true,
            session,
            address_hint: None,
        })
        .unwrap();
        let value: Value = serde_json::from_str(bytes.as_str()).unwrap();

        assert_eq!(value["type"], "connected");
        assert_eq!(value["isHost"], true);
        assert!(value.get("serverAddressHint").is_none());
        assert_eq!(value["state"]["players"]["P1"]["hpMax"], 100.0);
        assert_eq!(value["state"]["players"]["P1"]["isHost"], true);
        assert_eq!(value["state"]["gameOver"], false);
    }

    #[test]
    fn when_player_update_is_partial_then_missing_fields_are_none() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"playerUpdate","playerId":"P1","player":{"x":3.5,"fireRate":4.0}}"#,
        )
        .unwrap();

        match ClientCommand::from(msg) {
            ClientCommand::PlayerUpdate { player_id, patch } => {
                assert_eq!(player_id, "P1");
                assert_eq!(patch.x, Some(3.5));
                assert_eq!(patch.fire_rate, Some(4.0));
                assert_eq!(patch.hp, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn when_unit_message_arrives_then_it_parses_without_payload() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"startGame"}"#).unwrap();
        assert!(matches!(
            ClientCommand::from(msg),
            ClientCommand::StartGame
        ));
    }

    #[test]
    fn when_type_is_unknown_then_parse_fails() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"teleport"}"#).is_err());
    }
}
