// Wire protocol DTOs for the relay, seen from the client side.
// Every message is a JSON object tagged by `type` with camelCase fields.

use crate::domain::{PlayerSnapshot, ProjectileShot, RemotePlayerState};
use crate::use_cases::{RelayInbound, RelayOutbound, SessionView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::error;

/// Messages the relay sends us.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Connected {
        client_id: String,
        player_id: String,
        is_host: bool,
        state: SessionStateDto,
        #[serde(default)]
        server_address_hint: Option<String>,
    },
    State {
        state: SessionStateDto,
    },
    Projectile {
        player_id: String,
        projectile: ProjectileDto,
    },
    HostChanged {
        new_host_id: String,
    },
}

/// Messages we send to the relay. Only meaningful while host.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    PlayerUpdate {
        player_id: String,
        player: PlayerStateDto,
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

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStateDto {
    pub players: BTreeMap<String, PlayerStateDto>,
    pub started: bool,
    pub game_over: bool,
}

/// One player's stats. Fields the relay omits decode as zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStateDto {
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
    #[serde(skip_serializing)]
    pub is_host: bool,
}

impl From<PlayerSnapshot> for PlayerStateDto {
    fn from(s: PlayerSnapshot) -> Self {
        Self {
            x: s.x,
            y: s.y,
            vx: s.vx,
            vy: s.vy,
            hp: s.hp,
            hp_max: s.hp_max,
            level: s.level,
            damage: s.damage,
            fire_rate: s.fire_rate,
            pierce: s.pierce,
            pickup: s.pickup,
            regen: s.regen,
            proj_size: s.proj_size,
            proj_count: s.proj_count,
            dash_cd: s.dash_cd,
            dash_cd_max: s.dash_cd_max,
            is_host: false,
        }
    }
}

impl From<PlayerStateDto> for PlayerSnapshot {
    fn from(d: PlayerStateDto) -> Self {
        Self {
            x: d.x,
            y: d.y,
            vx: d.vx,
            vy: d.vy,
            hp: d.hp,
            hp_max: d.hp_max,
            level: d.level,
            damage: d.damage,
            fire_rate: d.fire_rate,
            pierce: d.pierce,
            pickup: d.pickup,
            regen: d.regen,
            proj_size: d.proj_size,
            proj_count: d.proj_count,
            dash_cd: d.dash_cd,
            dash_cd_max: d.dash_cd_max,
        }
    }
}

impl From<SessionStateDto> for SessionView {
    fn from(dto: SessionStateDto) -> Self {
        Self {
            players: dto
                .players
                .into_iter()
                .map(|(id, p)| RemotePlayerState {
                    id,
                    is_host: p.is_host,
                    stats: p.into(),
                })
                .collect(),
            started: dto.started,
            game_over: dto.game_over,
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

impl From<ProjectileShot> for ProjectileDto {
    fn from(s: ProjectileShot) -> Self {
        Self {
            x: s.x,
            y: s.y,
            vx: s.vx,
            vy: s.vy,
            r: s.r,
            life: s.life,
            damage: s.damage,
            pierce: s.pierce,
        }
    }
}

impl From<ProjectileDto> for ProjectileShot {
    fn from(d: ProjectileDto) -> Self {
        Self {
            x: d.x,
            y: d.y,
            vx: d.vx,
            vy: d.vy,
            r: d.r,
            life: d.life,
            damage: d.damage,
            pierce: d.pierce,
        }
    }
}

impl From<ServerMessage> for RelayInbound {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::Connected {
                client_id,
                player_id,
                is_host,
                state,
                server_address_hint,
            } => RelayInbound::Connected {
                client_id,
                player_id,
                is_host,
                session: state.into(),
                address_hint: server_address_hint,
            },
            ServerMessage::State { state } => RelayInbound::State(state.into()),
            ServerMessage::Projectile {
                player_id,
                projectile,
            } => RelayInbound::Projectile {
                player_id,
                shot: projectile.into(),
            },
            ServerMessage::HostChanged { new_host_id } => RelayInbound::HostChanged { new_host_id },
        }
    }
}

impl From<RelayOutbound> for ClientMessage {
    fn from(out: RelayOutbound) -> Self {
        match out {
            RelayOutbound::PlayerUpdate {
                player_id,
                snapshot,
            } => ClientMessage::PlayerUpdate {
                player_id,
                player: snapshot.into(),
            },
            RelayOutbound::Projectile { player_id, shot } => ClientMessage::Projectile {
                player_id,
                projectile: shot.into(),
            },
            RelayOutbound::StartGame => ClientMessage::StartGame,
            RelayOutbound::Reset => ClientMessage::Reset,
            RelayOutbound::LevelUp { player_id, level } => {
                ClientMessage::LevelUp { player_id, level }
            }
            RelayOutbound::GameOver => ClientMessage::GameOver,
        }
    }
}

pub fn decode_inbound(text: &str) -> Result<RelayInbound, serde_json::Error> {
    serde_json::from_str::<ServerMessage>(text).map(RelayInbound::from)
}

pub fn encode_outbound(out: RelayOutbound) -> Option<String> {
    match serde_json::to_string(&ClientMessage::from(out)) {
        Ok(txt) => Some(txt),
        Err(e) => {
            error!(error = ?e, "failed to serialize relay message");
            None
        }
    }
}
