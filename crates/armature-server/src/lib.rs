//! HTTP layer for the armature framework.
//!
//! This crate provides:
//! - `AppState` - Resolver, build manager and HMR hub shared by handlers
//! - `create_router` - axum router for pages, artifacts and the HMR stream
//! - `PageShell` - Shell-first page markup
//! - `ApiError` - Handler errors rendered as HTML error pages
//! - `serve` - Bind, start HMR, and run until Ctrl-C
//!
//! # Request flow
//!
//! ```text
//! GET /users/42 ─► public file? ─► RouteResolver ─► BuildManager ─► shell chunks
//! GET /.armature/* ─► build dir
//! GET /__hmr_stream__ ─► HmrHub subscription (SSE)
//! ```

mod error;
pub mod handlers;
mod routes;
mod server;
mod shell;
mod state;

pub use error::*;
pub use routes::*;
pub use server::*;
pub use shell::*;
pub use state::*;
