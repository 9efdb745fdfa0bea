use actix::Message;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::game::{Game, GameUpdate};

/// Message sent from client to server. The `type` tag selects the action,
/// matching the socket events of the original protocol.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Join {
        game_id: String,
        player_key: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Ready { game_id: String, player_key: String },
    #[serde(rename_all = "camelCase")]
    Move {
        game_id: String,
        player_key: String,
        piece_id: Uuid,
        to_row: i32,
        to_col: i32,
    },
    #[serde(rename_all = "camelCase")]
    Reset { game_id: String, player_key: String },
    #[serde(rename_all = "camelCase")]
    Leave { game_id: String },
}

/// Message sent from server to client. Every game-bearing variant carries a
/// complete snapshot; clients replace their held snapshot wholesale.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    JoinAck {
        game: Game,
        player: u8,
        /// Total expected game length, only known for replays.
        #[serde(skip_serializing_if = "Option::is_none")]
        ticks: Option<u64>,
    },
    #[serde(rename_all = "camelCase")]
    ReadyAck { game: Game },
    #[serde(rename_all = "camelCase")]
    MoveAck { game: Game, success: bool },
    #[serde(rename_all = "camelCase")]
    ResetAck { game: Game },
    #[serde(rename_all = "camelCase")]
    Update { game: Game, updates: Vec<GameUpdate> },
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

/// Raw text frame forwarded to a connection actor.
#[derive(Message)]
#[rtype(result = "()")]
pub struct SocketText(pub String);
