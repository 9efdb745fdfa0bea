use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use crate::models::game::Game;
use crate::models::messages::{ClientMessage, ServerMessage, SocketText};
use crate::models::AppState;
use crate::websocket::handler::GameSocket;

/// Send a message to every connection subscribed to a game.
pub fn broadcast_to_game(app_state: &AppState, game_id: &str, message: &ServerMessage) {
    let connection_ids;
    let sessions_copy;

    // Scope the locks to minimize lock time
    {
        let connections = app_state.connections.lock().unwrap();
        match connections.get(game_id) {
            Some(ids) => connection_ids = ids.clone(),
            None => return,
        }

        let sessions = app_state.sessions.lock().unwrap();
        sessions_copy = sessions.clone();
    }

    // Serialize the message once
    let msg_str = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            warn!("Error serializing broadcast: {}", e);
            return;
        }
    };

    for connection_id in &connection_ids {
        if let Some(addr) = sessions_copy.get(connection_id) {
            addr.do_send(SocketText(msg_str.clone()));
        } else {
            info!("Connection {} not found in sessions", connection_id);
        }
    }
}

impl GameSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMessage::Join {
                game_id,
                player_key,
            } => self.handle_join(game_id, player_key, ctx),
            ClientMessage::Ready {
                game_id,
                player_key,
            } => self.handle_ready(game_id, player_key),
            ClientMessage::Move {
                game_id,
                player_key,
                piece_id,
                to_row,
                to_col,
            } => self.handle_move(game_id, player_key, piece_id, to_row, to_col),
            ClientMessage::Reset {
                game_id,
                player_key,
            } => self.handle_reset(game_id, player_key),
            ClientMessage::Leave { game_id } => self.handle_leave(game_id),
        }
    }

    fn handle_join(
        &mut self,
        game_id: String,
        player_key: Option<String>,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        let games = self.app_state.games.lock().unwrap();
        let state = match games.get(&game_id) {
            Some(state) => state,
            None => {
                info!("Cannot join game: not found ({})", game_id);
                self.send_error(ctx, "Game not found");
                return;
            }
        };

        let player = state.auth_player(player_key.as_deref());
        let snapshot = state.game.snapshot();
        drop(games);

        {
            let mut connections = self.app_state.connections.lock().unwrap();
            let room = connections.entry(game_id.clone()).or_default();
            if !room.contains(&self.id) {
                room.push(self.id.clone());
            }
        }

        info!(
            "Connection {} joined game {} as player {}",
            self.id, game_id, player
        );
        self.game_id = game_id;
        self.player = player;

        let reply = ServerMessage::JoinAck {
            game: snapshot,
            player,
            ticks: None,
        };
        match serde_json::to_string(&reply) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Error serializing join ack: {}", e),
        }
    }

    fn handle_ready(&mut self, game_id: String, player_key: String) {
        let reply;
        {
            let mut games = self.app_state.games.lock().unwrap();
            let state = match games.get_mut(&game_id) {
                Some(state) => state,
                None => return,
            };

            // only authenticated players can ready up
            let player = state.auth_player(Some(&player_key));
            if player == 0 {
                return;
            }

            info!("Player {} ready in game {}", player, game_id);
            state.game.mark_ready(player);
            reply = ServerMessage::ReadyAck {
                game: state.game.snapshot(),
            };
        }

        broadcast_to_game(&self.app_state, &game_id, &reply);
    }

    fn handle_move(
        &mut self,
        game_id: String,
        player_key: String,
        piece_id: Uuid,
        to_row: i32,
        to_col: i32,
    ) {
        let reply;
        {
            let mut games = self.app_state.games.lock().unwrap();
            let state = match games.get_mut(&game_id) {
                Some(state) => state,
                None => return,
            };

            // only authenticated players can make moves
            let player = state.auth_player(Some(&player_key));
            if player == 0 {
                return;
            }

            let success = state.game.move_piece(piece_id, player, to_row, to_col);
            reply = ServerMessage::MoveAck {
                game: state.game.snapshot(),
                success,
            };
        }

        broadcast_to_game(&self.app_state, &game_id, &reply);
    }

    fn handle_reset(&mut self, game_id: String, player_key: String) {
        let reply;
        {
            let mut games = self.app_state.games.lock().unwrap();
            let state = match games.get_mut(&game_id) {
                Some(state) => state,
                None => return,
            };

            let player = state.auth_player(Some(&player_key));
            if player == 0 {
                return;
            }

            // an in-progress game cannot be thrown away
            if state.game.started && state.game.finished == 0 {
                return;
            }

            info!("Resetting game {}", game_id);
            let speed = state.game.speed;
            let players = state.game.players.clone();
            state.game = Game::new(speed, players);
            reply = ServerMessage::ResetAck {
                game: state.game.snapshot(),
            };
        }

        broadcast_to_game(&self.app_state, &game_id, &reply);
    }

    fn handle_leave(&mut self, game_id: String) {
        let mut connections = self.app_state.connections.lock().unwrap();
        if let Some(room) = connections.get_mut(&game_id) {
            room.retain(|id| id != &self.id);
        }
        drop(connections);

        if self.game_id == game_id {
            info!("Connection {} left game {}", self.id, game_id);
            self.game_id.clear();
            self.player = 0;
        }
    }
}
