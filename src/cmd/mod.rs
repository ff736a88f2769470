//! CLI command implementations.
//!
//! | Module    | Commands handled        |
//! |-----------|-------------------------|
//! | `watch`   | `Watch`                 |
//! | `upload`  | `Upload`                |
//! | `records` | `Cycles`, `Comments`    |
//! | `relay`   | `Relay`                 |

pub mod records;
pub mod relay;
pub mod upload;
pub mod watch;

pub use records::{cmd_comments, cmd_cycles};
pub use relay::cmd_relay;
pub use upload::cmd_upload;
pub use watch::cmd_watch;
