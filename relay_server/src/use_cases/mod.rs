// Use cases layer: connection bookkeeping and fan-out for the relay.

pub mod hub;
pub mod relay;
pub mod types;

pub use hub::{NoticeEncoder, relay_task};
pub use relay::RelayTable;
pub use types::{ClientCommand, Delivery, Notice, RelayEvent, RelayStatus, Target};
