//! Route compilation with caching and in-flight de-duplication.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use armature_cache::{CacheManager, CacheStatus, SingleFlight};
use armature_core::{ArmatureConfig, BuildConfig, BuildKey, BuildResult, RouteInfo};
use tokio::io::AsyncWriteExt;

use crate::bootstrap::hydration_script;
use crate::bundler::{BundleRequest, Bundler};
use crate::entry::{slash_path, ComponentManifest};
use crate::error::BuildError;

/// Directory under the build dir holding generated entry modules.
pub const ENTRIES_DIR: &str = ".entries";

type FlightResult = Result<Arc<BuildResult>, Arc<BuildError>>;

/// Compiles route modules into hydration-ready bundles.
///
/// Builds are cached by [`BuildKey`] (route module plus layout) in the shared
/// [`CacheManager`]. Route parameters are not part of the key: they are read
/// by the bootstrap from the page at runtime. Concurrent requests for the same
/// key share a single compile, including its failure.
pub struct BuildManager {
    project_root: PathBuf,
    routes_dir: PathBuf,
    build_dir: PathBuf,
    index_name: String,
    settings: BuildConfig,
    bundler: Arc<dyn Bundler>,
    cache: Arc<CacheManager>,
    flights: SingleFlight<BuildKey, FlightResult>,
}

impl BuildManager {
    /// Create a build manager for a project.
    pub fn new(config: &ArmatureConfig, bundler: Arc<dyn Bundler>, cache: Arc<CacheManager>) -> Self {
        Self {
            project_root: config.root().to_path_buf(),
            routes_dir: config.routes_dir(),
            build_dir: config.build_dir(),
            index_name: config.routes.index_name.clone(),
            settings: config.build.clone(),
            bundler,
            cache,
            flights: SingleFlight::new(),
        }
    }

    /// Build output directory.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Shared caches.
    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    /// Build the route a resolution points at.
    pub async fn build_route(
        &self,
        route: &RouteInfo,
    ) -> Result<(Arc<BuildResult>, CacheStatus), BuildError> {
        let file = route.file().ok_or(BuildError::NoRoute)?;
        self.build(&BuildKey::new(file, route.layout.clone())).await
    }

    /// Build `key`, serving from cache when possible.
    pub async fn build(&self, key: &BuildKey) -> Result<(Arc<BuildResult>, CacheStatus), BuildError> {
        if let Some(hit) = self.cache.get_build(key) {
            tracing::trace!(route = %key, "build cache hit");
            return Ok((hit, CacheStatus::Hit));
        }

        let result = self
            .flights
            .run(key.clone(), || async {
                // A flight that finished just before this one started may
                // already have filled the cache.
                if let Some(hit) = self.cache.get_build(key) {
                    return Ok(hit);
                }
                self.compile_and_cache(key).await.map_err(Arc::new)
            })
            .await;

        result
            .map(|build| (build, CacheStatus::Miss))
            .map_err(unshare)
    }

    /// Compile `key` afresh, ignoring and then replacing any cached build.
    ///
    /// Used after a source change so a stale bundle is never served. The
    /// compile runs as a flight, so page requests for `key` arriving meanwhile
    /// wait for it. A flight that was already running may have read the old
    /// sources, so joining one is followed by a compile of our own.
    pub async fn rebuild(&self, key: &BuildKey) -> Result<Arc<BuildResult>, BuildError> {
        let (result, led) = self.rebuild_flight(key).await;
        if led {
            return result.map_err(unshare);
        }
        tracing::debug!(route = %key, "rebuild joined an earlier build, compiling again");
        self.rebuild_flight(key).await.0.map_err(unshare)
    }

    async fn rebuild_flight(&self, key: &BuildKey) -> (FlightResult, bool) {
        let mut led = false;
        let result = self
            .flights
            .run(key.clone(), || {
                led = true;
                async { self.compile_and_cache(key).await.map_err(Arc::new) }
            })
            .await;
        (result, led)
    }

    /// Drop cached builds that use `source` as route or layout.
    pub fn invalidate(&self, source: &Path) -> Vec<BuildKey> {
        self.cache.invalidate_builds(|key| key.depends_on(source))
    }

    /// Drop every cached build.
    pub fn invalidate_all(&self) -> Vec<BuildKey> {
        self.cache.invalidate_builds(|_| true)
    }

    /// Public URL of a file under the build dir.
    pub fn public_path(&self, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(&self.build_dir).ok()?;
        Some(format!(
            "{}/{}",
            self.settings.public_prefix.trim_end_matches('/'),
            slash_path(relative)
        ))
    }

    async fn compile_and_cache(&self, key: &BuildKey) -> Result<Arc<BuildResult>, BuildError> {
        match self.compile(key).await {
            Ok(result) => {
                let result = Arc::new(result);
                self.cache.set_build(key.clone(), result.clone());
                Ok(result)
            }
            Err(e) => {
                match e.diagnostic() {
                    Some(diagnostic) => {
                        tracing::error!(route = %key, error = %e, %diagnostic, "build failed")
                    }
                    None => tracing::error!(route = %key, error = %e, "build failed"),
                }
                Err(e)
            }
        }
    }

    async fn compile(&self, key: &BuildKey) -> Result<BuildResult, BuildError> {
        let relative = key
            .route
            .strip_prefix(&self.routes_dir)
            .map_err(|_| {
                BuildError::Manifest(format!(
                    "route {} is outside {}",
                    key.route.display(),
                    self.routes_dir.display()
                ))
            })?
            .to_path_buf();

        let manifest = ComponentManifest::new(
            &key.route,
            key.layout.as_deref(),
            &self.project_root,
            &self.routes_dir,
            &self.index_name,
        );

        let entries_root = self.build_dir.join(ENTRIES_DIR);
        let entry = entries_root.join("routes").join(&relative).with_extension("js");
        write_file(&entry, manifest.entry_module().render().as_bytes()).await?;

        let request = BundleRequest {
            entry: entry.clone(),
            outdir: self.build_dir.clone(),
            outbase: entries_root,
            working_dir: self.project_root.clone(),
            minify: self.settings.minify,
            splitting: self.settings.splitting,
        };
        tracing::debug!(route = %key, entry = %entry.display(), "bundling route");
        let output = self.bundler.bundle(&request).await?;

        let entry_output = output
            .entry_for(&entry)
            .ok_or_else(|| BuildError::MissingEntry(entry.clone()))?;
        if !entry_output.exports.iter().any(|name| name == "default") {
            return Err(BuildError::MissingDefaultExport(key.route.clone()));
        }

        let mut css_content = String::new();
        let mut css_path = None;
        for css in output.css() {
            css_content.push_str(&read_file(&css.path).await?);
            if css_path.is_none() {
                css_path = self.public_path(&css.path);
            }
        }

        let mut bootstrap =
            hydration_script(&manifest.component_id, &self.settings.mount_selector).render();
        if self.settings.minify {
            bootstrap = self.bundler.minify(&bootstrap).await?;
        }
        append_file(&entry_output.path, bootstrap.as_bytes()).await?;
        let js_content = read_file(&entry_output.path).await?;

        let js_path = self.public_path(&entry_output.path).ok_or_else(|| {
            BuildError::Manifest(format!(
                "entry output {} is outside {}",
                entry_output.path.display(),
                self.build_dir.display()
            ))
        })?;

        tracing::info!(
            route = %key,
            component_id = %manifest.component_id,
            js_path = %js_path,
            "built route"
        );

        Ok(BuildResult {
            js_content,
            css_content,
            component_name: manifest.component_name,
            component_id: manifest.component_id,
            js_path,
            css_path,
            build_path: entry_output.path.clone(),
        })
    }
}

fn unshare(error: Arc<BuildError>) -> BuildError {
    Arc::try_unwrap(error).unwrap_or_else(BuildError::Shared)
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BuildError::io(parent, e))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| BuildError::io(path, e))
}

async fn append_file(path: &Path, contents: &[u8]) -> Result<(), BuildError> {
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .await
        .map_err(|e| BuildError::io(path, e))?;
    file.write_all(contents)
        .await
        .map_err(|e| BuildError::io(path, e))?;
    file.flush().await.map_err(|e| BuildError::io(path, e))
}

async fn read_file(path: &Path) -> Result<String, BuildError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| BuildError::io(path, e))
}
