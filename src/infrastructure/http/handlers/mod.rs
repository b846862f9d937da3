//! HTTP Handlers

mod book;
mod ping;
mod reader;
mod voice;
mod websocket;

pub use book::*;
pub use ping::*;
pub use reader::*;
pub use voice::*;
pub use websocket::*;
