// Use cases layer: the simulation engine, the relay protocol client and the frame driver.

pub mod driver;
pub mod relay_session;
pub mod simulation;
pub mod sync;
pub mod types;

pub use driver::{Driver, FrameObserver, InputSource, UpgradeChooser};
pub use relay_session::{Identity, LinkState, Reconnect, ReconnectPolicy, RelaySession};
pub use simulation::{SimConfig, Simulation};
pub use sync::{apply_inbound, host_outbound};
pub use types::{Received, RelayInbound, RelayOutbound, SessionView, SimEvent};
