//! The persistent duplex event stream: inbound JSON events and the socket that carries them.

mod event;
mod socket;

pub use event::StreamEvent;
pub use socket::{StreamConnection, StreamSignal};
