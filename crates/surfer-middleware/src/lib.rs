//! `surfer-middleware` – the message-bus plumbing under the Surfer relay.
//!
//! Moves JSON payloads between the relay and a `rosbridge_server` without
//! caring about what they mean.
//!
//! # Modules
//!
//! - [`transport`] – [`BusConnector`] / [`BusTransport`]: the seam the relay
//!   talks to, so tests can swap in a recording double.
//! - [`protocol`] – [`RosbridgeOp`]: the rosbridge v2 JSON frames.
//! - [`rosbridge`] – [`RosbridgeClient`]: WebSocket implementation of the
//!   transport built on `tokio-tungstenite`.

pub mod protocol;
pub mod rosbridge;
pub mod transport;

pub use protocol::RosbridgeOp;
pub use rosbridge::{RosbridgeClient, RosbridgeConnector};
pub use transport::{BusConnector, BusTransport, MessageHandler};
