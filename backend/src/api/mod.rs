//! HTTP API module.
//!
//! This module provides the HTTP server, response types and the SSE log
//! stream used by the upload page.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{create_router, start_server, AppState};
pub use types::*;
