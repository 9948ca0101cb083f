// Frameworks layer: environment configuration and the headless runtime.

pub mod config;
pub mod runtime;
