//! # Gateway
//!
//! Framed-JSON TCP transport between chat clients and the reminder core.
//! This is the bot's stand-in for a real chat network: it produces the
//! logical events the core consumes and renders whatever the core returns
//! back to the connected user.

pub mod protocol;
pub mod server;

pub use protocol::{ClientEvent, ServerEvent};
pub use server::{GatewayNotifier, GatewayServer};
