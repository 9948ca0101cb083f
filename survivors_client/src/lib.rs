pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use frameworks::config::ClientSettings;
pub use frameworks::runtime::run;
pub use interface_adapters::{RelayLink, spawn_link};
pub use use_cases::{SimConfig, Simulation};
