//! Route discovery and href generation.

use std::path::{Path, PathBuf};

use armature_core::{RouteParams, RoutesConfig};
use serde::Serialize;

use crate::error::ResolveError;
use crate::segment::Segment;

/// A route module discovered under the routes root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    /// URL pattern, e.g. `/users/:id`.
    pub pattern: String,
    /// Route module path.
    pub file: PathBuf,
    /// Pattern segments.
    pub segments: Vec<Segment>,
}

impl RouteEntry {
    /// Names of the parameters this route binds, in path order.
    pub fn params(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Dynamic(name) => Some(name.as_str()),
                Segment::Static(_) => None,
            })
            .collect()
    }

    /// Whether the route has no dynamic segments.
    pub fn is_static(&self) -> bool {
        !self.segments.iter().any(Segment::is_dynamic)
    }

    /// Build a concrete href by substituting parameters.
    pub fn href(&self, params: &RouteParams) -> Result<String, ResolveError> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Static(name) => parts.push(name.clone()),
                Segment::Dynamic(name) => {
                    let value = params.get(name).ok_or_else(|| ResolveError::MissingParam {
                        pattern: self.pattern.clone(),
                        name: name.clone(),
                    })?;
                    parts.push(value.clone());
                }
            }
        }
        Ok(format!("/{}", parts.join("/")))
    }
}

/// Every route module under a routes root, sorted by pattern.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteTree {
    routes: Vec<RouteEntry>,
}

impl RouteTree {
    /// Walk `routes_dir` and collect its route modules.
    ///
    /// Layout modules are skipped; `index` maps to its directory's path.
    pub fn scan(routes_dir: &Path, conventions: &RoutesConfig) -> Result<Self, ResolveError> {
        let mut routes = Vec::new();
        if routes_dir.is_dir() {
            scan_dir(routes_dir, &[], conventions, &mut routes)?;
        }
        routes.sort_by(|a, b| a.pattern.cmp(&b.pattern));
        Ok(Self { routes })
    }

    /// All routes.
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Find a route by pattern.
    pub fn get(&self, pattern: &str) -> Option<&RouteEntry> {
        self.routes.iter().find(|r| r.pattern == pattern)
    }

    /// Build an href for the route with `pattern`.
    pub fn href(&self, pattern: &str, params: &RouteParams) -> Result<String, ResolveError> {
        self.get(pattern)
            .ok_or_else(|| ResolveError::UnknownRoute(pattern.to_string()))?
            .href(params)
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes were found.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn scan_dir(
    dir: &Path,
    prefix: &[Segment],
    conventions: &RoutesConfig,
    out: &mut Vec<RouteEntry>,
) -> Result<(), ResolveError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ResolveError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| ResolveError::io(dir, e))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        if path.is_dir() {
            let mut nested = prefix.to_vec();
            nested.push(Segment::parse(&name));
            scan_dir(&path, &nested, conventions, out)?;
            continue;
        }

        let Some((stem, ext)) = name.rsplit_once('.') else {
            continue;
        };
        if !conventions.is_route_extension(ext) || stem == conventions.layout_name {
            continue;
        }

        let mut segments = prefix.to_vec();
        if stem != conventions.index_name {
            segments.push(Segment::parse(stem));
        }

        let pattern = format!(
            "/{}",
            segments
                .iter()
                .map(Segment::pattern)
                .collect::<Vec<_>>()
                .join("/")
        );

        // `about.tsx` and `about/index.tsx` share a pattern; the resolver
        // prefers the named file, so keep that one.
        if let Some(existing) = out.iter_mut().find(|r| r.pattern == pattern) {
            if stem != conventions.index_name {
                existing.file = path;
            }
            continue;
        }

        out.push(RouteEntry {
            pattern,
            file: path,
            segments,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn tree() -> (TempDir, RouteTree) {
        let dir = TempDir::new().unwrap();
        for rel in [
            "index.tsx",
            "layout.tsx",
            "about.tsx",
            "about/index.tsx",
            "users/index.tsx",
            "users/layout.tsx",
            "users/[id]/index.tsx",
            "posts/[slug].tsx",
            "styles.css",
            ".hidden/index.tsx",
        ] {
            touch(dir.path(), rel);
        }
        let tree = RouteTree::scan(dir.path(), &RoutesConfig::default()).unwrap();
        (dir, tree)
    }

    // === Scan Tests ===

    #[test]
    fn test_scan_patterns() {
        let (_dir, tree) = tree();
        let patterns: Vec<_> = tree.routes().iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(
            patterns,
            vec!["/", "/about", "/posts/:slug", "/users", "/users/:id"]
        );
    }

    #[test]
    fn test_named_file_beats_index_for_same_pattern() {
        let (dir, tree) = tree();
        assert_eq!(tree.get("/about").unwrap().file, dir.path().join("about.tsx"));
    }

    #[test]
    fn test_params_and_static() {
        let (_dir, tree) = tree();
        let user = tree.get("/users/:id").unwrap();
        assert_eq!(user.params(), vec!["id"]);
        assert!(!user.is_static());
        assert!(tree.get("/about").unwrap().is_static());
    }

    #[test]
    fn test_missing_routes_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let tree = RouteTree::scan(&dir.path().join("nope"), &RoutesConfig::default()).unwrap();
        assert!(tree.is_empty());
    }

    // === Href Tests ===

    #[test]
    fn test_href_substitutes_params() {
        let (_dir, tree) = tree();
        let mut params = RouteParams::new();
        params.insert("id".to_string(), "42".to_string());
        assert_eq!(tree.href("/users/:id", &params).unwrap(), "/users/42");
        assert_eq!(tree.href("/", &params).unwrap(), "/");
    }

    #[test]
    fn test_href_missing_param() {
        let (_dir, tree) = tree();
        let err = tree.href("/posts/:slug", &RouteParams::new()).unwrap_err();
        assert!(matches!(err, ResolveError::MissingParam { name, .. } if name == "slug"));
    }

    #[test]
    fn test_href_unknown_route() {
        let (_dir, tree) = tree();
        assert!(matches!(
            tree.href("/missing", &RouteParams::new()),
            Err(ResolveError::UnknownRoute(_))
        ));
    }
}
