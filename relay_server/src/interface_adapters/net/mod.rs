// Network adapter modules split by client sockets vs plain HTTP routes.

pub mod client;
pub mod internal;

pub use client::ws_handler;
pub use internal::address_handler;
