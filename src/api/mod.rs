//! Request/response glue to the tracker backend.
//!
//! | Module     | Responsibility                                         |
//! |------------|--------------------------------------------------------|
//! | `client`   | `ApiClient` — CRUD wrappers + `upload_media`           |
//! | `records`  | Shadow DTOs for the backend-owned entities             |
//! | `validate` | Submit gating and media size caps (before any network) |

pub mod client;
pub mod records;
pub mod validate;

pub use client::ApiClient;
