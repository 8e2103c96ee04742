//! URL path to route module resolution.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use armature_cache::CacheManager;
use armature_core::{RouteInfo, RouteParams, RoutesConfig};

use crate::error::ResolveError;
use crate::segment::{dynamic_name, normalize_path, split_path};

/// Maps URL paths to route modules under a routes root.
///
/// Results, including misses, are memoized in the shared [`CacheManager`]
/// keyed by the normalized URL path.
pub struct RouteResolver {
    routes_dir: PathBuf,
    conventions: RoutesConfig,
    cache: Arc<CacheManager>,
}

impl RouteResolver {
    /// Create a resolver for `routes_dir`.
    pub fn new(
        routes_dir: impl Into<PathBuf>,
        conventions: RoutesConfig,
        cache: Arc<CacheManager>,
    ) -> Self {
        Self {
            routes_dir: routes_dir.into(),
            conventions,
            cache,
        }
    }

    /// Routes root directory.
    pub fn routes_dir(&self) -> &Path {
        &self.routes_dir
    }

    /// Resolve a URL path, consulting the cache first.
    ///
    /// A path with no matching module yields `RouteInfo { file_path: None, .. }`.
    /// Only file-system faults other than "not found" are errors.
    pub async fn resolve(&self, path: &str) -> Result<RouteInfo, ResolveError> {
        let key = normalize_path(path);
        if let Some(hit) = self.cache.get_route(&key) {
            tracing::trace!(path = %key, "route cache hit");
            return Ok(hit);
        }

        let info = self.resolve_uncached(&key).await?;
        tracing::debug!(
            path = %key,
            file = ?info.file_path,
            layout = ?info.layout,
            "resolved route"
        );
        self.cache.set_route(key, info.clone());
        Ok(info)
    }

    /// Resolve against the file system without touching the cache.
    pub async fn resolve_uncached(&self, path: &str) -> Result<RouteInfo, ResolveError> {
        let segments = split_path(path);
        if segments.iter().any(|s| *s == "." || *s == "..") {
            return Ok(RouteInfo::not_found());
        }

        if segments.is_empty() {
            let index = self
                .find_module(&self.routes_dir, &self.conventions.index_name)
                .await?;
            return self.finish(index, RouteParams::new()).await;
        }

        let mut dir = self.routes_dir.clone();
        let mut params = RouteParams::new();

        for (i, segment) in segments.iter().enumerate() {
            let is_last = i == segments.len() - 1;

            if is_last {
                if let Some(file) = self.final_module(&dir, segment).await? {
                    return self.finish(Some(file), params).await;
                }
            } else if is_dir(&dir.join(segment)).await? {
                dir.push(segment);
                continue;
            }

            // Segments that look like file names never bind a parameter.
            if segment.contains('.') {
                return Ok(RouteInfo::not_found());
            }

            let Some(dynamic) = self.dynamic_entry(&dir).await? else {
                return Ok(RouteInfo::not_found());
            };
            let Some(name) = dynamic_name(&dynamic) else {
                return Ok(RouteInfo::not_found());
            };
            params.insert(name.to_string(), segment.to_string());

            if is_last {
                let file = self.final_module(&dir, &dynamic).await?;
                return self.finish(file, params).await;
            }

            let next = dir.join(&dynamic);
            if !is_dir(&next).await? {
                return Ok(RouteInfo::not_found());
            }
            dir = next;
        }

        Ok(RouteInfo::not_found())
    }

    /// Nearest layout for a route module: the first `layout.<ext>` found
    /// walking from the module's directory up to the routes root.
    pub async fn nearest_layout(&self, file: &Path) -> Result<Option<PathBuf>, ResolveError> {
        let mut dir = file.parent().map(Path::to_path_buf);

        while let Some(current) = dir {
            if !current.starts_with(&self.routes_dir) {
                break;
            }
            if let Some(layout) = self
                .find_module(&current, &self.conventions.layout_name)
                .await?
            {
                return Ok(Some(layout));
            }
            if current == self.routes_dir {
                break;
            }
            dir = current.parent().map(Path::to_path_buf);
        }

        Ok(None)
    }

    async fn finish(
        &self,
        file: Option<PathBuf>,
        params: RouteParams,
    ) -> Result<RouteInfo, ResolveError> {
        let Some(file) = file else {
            return Ok(RouteInfo::not_found());
        };
        let layout = self.nearest_layout(&file).await?;
        Ok(RouteInfo::found(file).with_params(params).with_layout(layout))
    }

    /// Module for the final segment: `<name>.<ext>`, then `<name>/index.<ext>`.
    async fn final_module(&self, dir: &Path, name: &str) -> Result<Option<PathBuf>, ResolveError> {
        if name != self.conventions.layout_name {
            if let Some(file) = self.find_module(dir, name).await? {
                return Ok(Some(file));
            }
        }

        let nested = dir.join(name);
        if is_dir(&nested).await? {
            return self.find_module(&nested, &self.conventions.index_name).await;
        }
        Ok(None)
    }

    /// First `<stem>.<ext>` file in `dir`, probing extensions in configured order.
    async fn find_module(&self, dir: &Path, stem: &str) -> Result<Option<PathBuf>, ResolveError> {
        for ext in &self.conventions.extensions {
            let candidate = dir.join(format!("{}.{}", stem, ext));
            if is_file(&candidate).await? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// The bracketed entry (directory or route file stem) at this level.
    ///
    /// When several exist the lexicographically first wins.
    async fn dynamic_entry(&self, dir: &Path) -> Result<Option<String>, ResolveError> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ResolveError::io(dir, e)),
        };

        let mut candidates = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ResolveError::io(dir, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| ResolveError::io(entry.path(), e))?;

            let stem = if file_type.is_dir() {
                name
            } else {
                match name.rsplit_once('.') {
                    Some((stem, ext)) if self.conventions.is_route_extension(ext) => {
                        stem.to_string()
                    }
                    _ => continue,
                }
            };

            if dynamic_name(&stem).is_some() {
                candidates.push(stem);
            }
        }

        candidates.sort();
        if candidates.len() > 1 {
            tracing::warn!(
                dir = %dir.display(),
                candidates = ?candidates,
                "multiple dynamic segments at one level; using the first"
            );
        }
        Ok(candidates.into_iter().next())
    }
}

async fn is_file(path: &Path) -> Result<bool, ResolveError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ResolveError::io(path, e)),
    }
}

async fn is_dir(path: &Path) -> Result<bool, ResolveError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ResolveError::io(path, e)),
    }
}
