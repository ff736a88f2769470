//! Collaborative draft sync — live preview of in-progress comment rows.
//!
//! ## Overview
//!
//! Several reviewers can have the same proto's "add comments" form open at
//! once. Each session broadcasts its unsaved rows over a WebSocket channel
//! so peers see in-progress edits in near-real-time. The feature is
//! best-effort presence, not collaborative editing: no acks, no ordering,
//! no conflict resolution — the last snapshot received wins.
//!
//! ## Module map
//!
//! ```text
//! UI / CLI
//!    │ commands                      events / state
//!    v                                    │
//! session.rs  (DraftSession, one event loop per form)
//!    ├─ rows.rs        draft rows + trailing-blank invariant
//!    ├─ connection.rs  socket lifecycle, close-code policy
//!    ├─ publisher.rs   content filter, 2 s debounce payload, dedup
//!    ├─ merge.rs       inbound screening + revision-counter echo guard
//!    ├─ upload.rs      background media upload, immediate re-broadcast
//!    └─ envelope.rs    wire format (connected / draft_update)
//! ```
//!
//! ## Delivery properties
//!
//! | Property           | Mechanism                                        |
//! |--------------------|--------------------------------------------------|
//! | Coalesced sends    | 2 s debounce, newest snapshot only               |
//! | No duplicate sends | payload compared against last successful send    |
//! | No self-echo       | user-id filter inbound, revision clock outbound  |
//! | Scoping            | proto id checked on every inbound message        |
//! | Reconnect          | fixed 3 s delay, only after non-1000 closes      |

pub mod connection;
pub mod envelope;
pub mod merge;
pub mod publisher;
pub mod rows;
pub mod session;
pub mod upload;

pub use connection::ConnectionState;
pub use rows::{DraftRow, DraftRows, MediaKind, RowPatch};
pub use session::{DraftSession, DraftSessionHandle, SessionConfig, SessionEvent};
