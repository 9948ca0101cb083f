// Interface adapters layer: wire protocol and the WebSocket link to the relay.

pub mod net;
pub mod protocol;

pub use net::{LinkCapacity, LinkError, RelayLink, spawn_link};
