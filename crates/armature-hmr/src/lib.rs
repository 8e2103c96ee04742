//! Hot module reload for the armature framework.
//!
//! This crate provides:
//! - `FileWatcher` - Recursive notify watcher feeding a tokio channel
//! - `Classifier` - Maps file changes to public URLs, route rebuilds, or reloads
//! - `HmrService` - Debounces changes, rebuilds affected routes, then broadcasts
//! - `HmrHub` - Fan-out of `ChangeEvent`s to connected event streams
//! - `ChangeKind` - Per-file client treatment, emitted into the script as `kindOf`
//! - `client_script` - The `hmr.js` the browser runs
//!
//! # Flow
//!
//! ```text
//! notify ─► FileWatcher ─► Debouncer ─► Classifier ─► BuildManager::rebuild
//!                                                          │
//!              browser ◄── /__hmr_stream__ ◄── HmrHub ◄────┘
//! ```

mod classify;
mod debounce;
mod error;
mod event;
mod hub;
mod script;
mod service;
mod watcher;

pub use classify::*;
pub use debounce::*;
pub use error::*;
pub use event::*;
pub use hub::*;
pub use script::*;
pub use service::*;
pub use watcher::*;
