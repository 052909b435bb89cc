//! HTTP API module.
//!
//! The interactive uploader and the live log broadcaster used by every
//! pipeline step.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server, AppState};
pub use types::*;
