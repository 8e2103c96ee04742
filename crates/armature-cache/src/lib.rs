//! Caching infrastructure for the armature framework.
//!
//! This crate provides:
//! - `Clock` - Time source, swappable in tests
//! - `TtlCache` - Bounded TTL cache with insertion-order eviction
//! - `CacheManager` - Route-resolution and build caches
//! - `SingleFlight` - Per-key de-duplication of in-flight work
//! - `CacheStatus` - Hit/miss reporting
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use armature_cache::TtlCache;
//!
//! let mut cache = TtlCache::new(Duration::from_secs(300), 1000);
//! cache.insert("/about".to_string(), 1);
//! assert_eq!(cache.get("/about"), Some(1));
//! ```

mod clock;
mod flight;
mod manager;
mod status;
mod ttl;

pub use clock::*;
pub use flight::*;
pub use manager::*;
pub use status::*;
pub use ttl::*;
