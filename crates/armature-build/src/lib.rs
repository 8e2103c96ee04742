//! Route bundling for the armature framework.
//!
//! This crate provides:
//! - `Bundler` / `EsbuildBundler` - Compile an entry module to browser JavaScript
//! - `ComponentManifest` - Component name and id, plus the registration entry module
//! - `hydration_script` - Bootstrap that mounts a built route in the browser
//! - `js` - Typed JavaScript generation with escaping
//! - `BuildManager` - Cached, de-duplicated route builds
//!
//! # Build pipeline
//!
//! ```text
//! RouteInfo ─► registration entry ─► bundler ─► manifest check
//!                                                   │
//!          BuildResult ◄── append bootstrap ◄── CSS concat
//! ```

mod bootstrap;
mod bundler;
mod entry;
mod error;
pub mod js;
mod manager;

pub use bootstrap::*;
pub use bundler::*;
pub use entry::*;
pub use error::*;
pub use manager::*;
