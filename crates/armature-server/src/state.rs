//! Application state shared across handlers.

use std::sync::Arc;

use armature_build::{BuildManager, Bundler};
use armature_cache::CacheManager;
use armature_core::ArmatureConfig;
use armature_hmr::{HmrHub, HmrService};
use armature_router::RouteResolver;

/// Shared state for the application.
#[derive(Clone)]
pub struct AppState {
    /// Project configuration.
    pub config: Arc<ArmatureConfig>,
    /// URL path resolution.
    pub resolver: Arc<RouteResolver>,
    /// Route builds.
    pub builds: Arc<BuildManager>,
    /// HMR broadcast.
    pub hub: HmrHub,
}

impl AppState {
    /// Wire up resolver, builds and hub around one shared cache.
    pub fn new(config: ArmatureConfig, bundler: Arc<dyn Bundler>) -> Self {
        let cache = Arc::new(CacheManager::new(&config.cache));
        let resolver = RouteResolver::new(config.routes_dir(), config.routes.clone(), cache.clone());
        let builds = BuildManager::new(&config, bundler, cache);
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            builds: Arc::new(builds),
            hub: HmrHub::default(),
        }
    }

    /// Route and build caches.
    pub fn cache(&self) -> &Arc<CacheManager> {
        self.builds.cache()
    }

    /// HMR service feeding this state's hub.
    pub fn hmr_service(&self) -> HmrService {
        HmrService::new(&self.config, self.builds.clone(), self.hub.clone())
    }
}
