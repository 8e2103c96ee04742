//! Core abstractions for the armature full-stack framework.
//!
//! This crate provides the fundamental types shared by every layer:
//! - `ArmatureConfig` - Project configuration
//! - `RouteInfo` - Result of resolving a URL path against the routes tree
//! - `BuildResult` - Compiled, hydration-ready output for a route
//! - `RequestId` / `RouteParams` - Request identity and parameters
//! - `TimingContext` / `LifecyclePhase` - Request lifecycle tracking

mod build;
mod config;
mod context;
mod lifecycle;
mod route;

pub use build::*;
pub use config::*;
pub use context::*;
pub use lifecycle::*;
pub use route::*;
