// Domain layer: relay bookkeeping types.

pub mod state;

pub use state::{ConnectionRecord, PlayerPatch, PlayerRecord, RelayedProjectile, SessionState};
