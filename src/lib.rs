//! Kung Fu Chess: real-time chess without turns. Pieces move continuously,
//! every move takes travel time, and arrival triggers a cooldown. The
//! server side hosts games over websockets and advances them on a fixed
//! tick; the client side keeps a smoothly reconciled clock and validates
//! moves before they are sent.

pub mod client;
pub mod game;
pub mod models;
pub mod routes;
pub mod websocket;
