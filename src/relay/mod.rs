//! Draft-channel relay — a development stand-in for the backend's
//! publish/subscribe endpoint.
//!
//! | Module   | Responsibility                                      |
//! |----------|-----------------------------------------------------|
//! | `server` | `RelayConfig`, router, `start_relay()`              |
//! | `ws`     | handshake checks + per-connection fanout loop       |
//! | `rooms`  | broadcast channels keyed by proto id                |

pub mod rooms;
pub mod server;
pub mod ws;

pub use server::{RelayConfig, RelayState, build_router, start_relay};
