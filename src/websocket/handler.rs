use actix::{Actor, ActorContext, AsyncContext, Handler, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use crate::models::messages::{ClientMessage, ServerMessage, SocketText};
use crate::models::AppState;

/// WebSocket handler for one connected client.
pub struct GameSocket {
    pub id: String,
    pub game_id: String,
    pub player: u8,
    pub app_state: web::Data<AppState>,
}

impl Actor for GameSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        // Register the actor with the application state
        let addr = ctx.address();
        self.app_state
            .sessions
            .lock()
            .unwrap()
            .insert(self.id.clone(), addr);

        let total_sessions = self.app_state.sessions.lock().unwrap().len();
        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", total_sessions);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        // Leave the game room; the game itself stays for reconnects and is
        // collected by the idle expiry in the tick loop
        if !self.game_id.is_empty() {
            let mut connections = self.app_state.connections.lock().unwrap();
            if let Some(connection_ids) = connections.get_mut(&self.game_id) {
                connection_ids.retain(|id| id != &self.id);
                if connection_ids.is_empty() {
                    connections.remove(&self.game_id);
                }
            }
        }

        self.app_state.sessions.lock().unwrap().remove(&self.id);
        info!("WebSocket connection closed: {}", self.id);

        Running::Stop
    }
}

impl Handler<SocketText> for GameSocket {
    type Result = ();

    fn handle(&mut self, msg: SocketText, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for GameSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                Ok(client_msg) => {
                    self.handle_message(client_msg, ctx);
                }
                Err(e) => {
                    warn!("Error parsing client message: {}", e);
                    self.send_error(ctx, &format!("Invalid message format: {}", e));
                }
            },
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send_error(ctx, "Binary messages are not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

impl GameSocket {
    pub(crate) fn send_error(&self, ctx: &mut ws::WebsocketContext<Self>, message: &str) {
        let reply = ServerMessage::Error {
            message: message.to_string(),
        };
        match serde_json::to_string(&reply) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Error serializing error reply: {}", e),
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4().to_string();
    info!("New WebSocket connection: {}", id);

    let socket = GameSocket {
        id,
        game_id: String::new(),
        player: 0,
        app_state,
    };

    ws::start(socket, &req, stream)
}
