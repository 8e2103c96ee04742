//! Route-resolution and build caches.

use std::sync::Arc;

use armature_core::{BuildKey, BuildResult, CacheConfig, RouteInfo};
use parking_lot::Mutex;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::ttl::TtlCache;

/// Entry counts for both caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Cached route resolutions.
    pub route_entries: usize,
    /// Cached builds.
    pub build_entries: usize,
}

/// Two independent TTL caches: route resolutions keyed by normalized URL
/// path, and builds keyed by source module.
///
/// Shared by reference between the route resolver, the build manager and the
/// HMR service.
pub struct CacheManager {
    routes: Mutex<TtlCache<String, RouteInfo>>,
    builds: Mutex<TtlCache<BuildKey, Arc<BuildResult>>>,
}

impl CacheManager {
    /// Create caches from config using the system clock.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create caches reading time from `clock`.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            routes: Mutex::new(TtlCache::with_clock(
                config.route_ttl(),
                config.max_entries,
                clock.clone(),
            )),
            builds: Mutex::new(TtlCache::with_clock(
                config.build_ttl(),
                config.max_entries,
                clock,
            )),
        }
    }

    /// Get a cached route resolution.
    pub fn get_route(&self, path: &str) -> Option<RouteInfo> {
        self.routes.lock().get(path)
    }

    /// Cache a route resolution.
    pub fn set_route(&self, path: impl Into<String>, info: RouteInfo) {
        self.routes.lock().insert(path.into(), info);
    }

    /// Drop every cached route resolution.
    pub fn clear_routes(&self) {
        self.routes.lock().clear();
    }

    /// Get a cached build.
    pub fn get_build(&self, key: &BuildKey) -> Option<Arc<BuildResult>> {
        self.builds.lock().get(key)
    }

    /// Cache a build.
    pub fn set_build(&self, key: BuildKey, result: Arc<BuildResult>) {
        self.builds.lock().insert(key, result);
    }

    /// Remove cached builds matching `pred` and return their keys.
    pub fn invalidate_builds(&self, mut pred: impl FnMut(&BuildKey) -> bool) -> Vec<BuildKey> {
        let mut builds = self.builds.lock();
        let doomed: Vec<BuildKey> = builds.keys().filter(|k| pred(k)).cloned().collect();
        for key in &doomed {
            builds.remove(key);
        }
        doomed
    }

    /// Remove expired entries from both caches. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let removed = self.routes.lock().sweep() + self.builds.lock().sweep();
        if removed > 0 {
            tracing::debug!(removed, "swept expired cache entries");
        }
        removed
    }

    /// Empty both caches.
    pub fn clear_all(&self) {
        self.routes.lock().clear();
        self.builds.lock().clear();
    }

    /// Current entry counts.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            route_entries: self.routes.lock().len(),
            build_entries: self.builds.lock().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::path::PathBuf;
    use std::time::Duration;

    fn manager() -> (CacheManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig {
            route_ttl_secs: 300,
            build_ttl_secs: 1800,
            max_entries: 3,
        };
        (CacheManager::with_clock(&config, clock.clone()), clock)
    }

    fn build(id: &str) -> Arc<BuildResult> {
        Arc::new(BuildResult {
            js_content: String::new(),
            css_content: String::new(),
            component_name: "Index".to_string(),
            component_id: id.to_string(),
            js_path: format!("/.armature/{}.js", id),
            css_path: None,
            build_path: PathBuf::from(format!("{}.js", id)),
        })
    }

    // === TTL Tests ===

    #[test]
    fn test_route_and_build_ttls_are_independent() {
        let (cache, clock) = manager();
        cache.set_route("/", RouteInfo::found("/r/index.tsx"));
        let key = BuildKey::new("/r/index.tsx", None);
        cache.set_build(key.clone(), build("a"));

        clock.advance(Duration::from_secs(300));
        assert!(cache.get_route("/").is_none());
        assert!(cache.get_build(&key).is_some());

        clock.advance(Duration::from_secs(1500));
        assert!(cache.get_build(&key).is_none());
    }

    #[test]
    fn test_sweep_expired_counts_both_caches() {
        let (cache, clock) = manager();
        cache.set_route("/a", RouteInfo::not_found());
        cache.set_route("/b", RouteInfo::not_found());
        cache.set_build(BuildKey::new("/r/a.tsx", None), build("a"));

        clock.advance(Duration::from_secs(301));
        assert_eq!(cache.sweep_expired(), 2);
        assert_eq!(
            cache.stats(),
            CacheStats {
                route_entries: 0,
                build_entries: 1
            }
        );
    }

    // === Invalidation Tests ===

    #[test]
    fn test_invalidate_builds_by_dependency() {
        let (cache, _clock) = manager();
        let layout = PathBuf::from("/r/layout.tsx");
        let a = BuildKey::new("/r/a.tsx", Some(layout.clone()));
        let b = BuildKey::new("/r/b.tsx", None);
        cache.set_build(a.clone(), build("a"));
        cache.set_build(b.clone(), build("b"));

        let removed = cache.invalidate_builds(|k| k.depends_on(&layout));
        assert_eq!(removed, vec![a.clone()]);
        assert!(cache.get_build(&a).is_none());
        assert!(cache.get_build(&b).is_some());
    }

    #[test]
    fn test_clear_all() {
        let (cache, _clock) = manager();
        cache.set_route("/", RouteInfo::not_found());
        cache.set_build(BuildKey::new("/r/a.tsx", None), build("a"));
        cache.clear_all();
        assert_eq!(cache.stats().route_entries, 0);
        assert_eq!(cache.stats().build_entries, 0);
    }

    #[test]
    fn test_capacity_applies_per_cache() {
        let (cache, _clock) = manager();
        for path in ["/1", "/2", "/3", "/4"] {
            cache.set_route(path, RouteInfo::not_found());
        }
        assert!(cache.get_route("/1").is_none());
        assert!(cache.get_route("/4").is_some());
        assert_eq!(cache.stats().route_entries, 3);
    }
}
