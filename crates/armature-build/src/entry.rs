//! Registration entry modules and the component manifest.
//!
//! Each route is bundled from a generated entry module that imports the
//! route's default export (and its layout's) and registers both under the
//! component id in a global registry. The hydration bootstrap looks the
//! component up there, so nothing has to be recovered from bundler output.

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::js::{ident, AssignOp, Expr, Module, Stmt};

/// Global object property holding registered route components.
pub const REGISTRY_GLOBAL: &str = "__armature_components";

/// Length of a component id in hex characters.
const COMPONENT_ID_LEN: usize = 12;

/// Identity of a built route component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentManifest {
    /// Display name derived from the route file.
    pub component_name: String,
    /// Stable id derived from the route's project-relative path.
    pub component_id: String,
    /// Route module.
    pub entry: String,
    /// Layout module wrapping the route, if any.
    pub layout: Option<String>,
}

impl ComponentManifest {
    /// Describe the route at `route` (and optional `layout`).
    pub fn new(
        route: &Path,
        layout: Option<&Path>,
        project_root: &Path,
        routes_dir: &Path,
        index_name: &str,
    ) -> Self {
        let relative = route.strip_prefix(routes_dir).unwrap_or(route);
        Self {
            component_name: component_name(relative, index_name),
            component_id: component_id(route, project_root),
            entry: module_specifier(route),
            layout: layout.map(module_specifier),
        }
    }

    /// Generate the registration entry module.
    pub fn entry_module(&self) -> Module {
        let mut module = Module::new();
        module.push(Stmt::ImportDefault {
            local: ident("Component"),
            source: self.entry.clone(),
        });

        let layout = match &self.layout {
            Some(layout) => {
                module.push(Stmt::ImportDefault {
                    local: ident("Layout"),
                    source: layout.clone(),
                });
                Expr::from(ident("Layout"))
            }
            None => Expr::Null,
        };

        module.push(Stmt::Const(
            ident("registry"),
            Expr::from(ident("globalThis"))
                .member(ident(REGISTRY_GLOBAL))
                .assign(AssignOp::NullishAssign, Expr::Object(Vec::new())),
        ));
        module.push(Stmt::Expr(
            Expr::from(ident("registry"))
                .index(Expr::str(self.component_id.as_str()))
                .assign(
                    AssignOp::Assign,
                    Expr::Object(vec![
                        (ident("name"), Expr::str(self.component_name.as_str())),
                        (ident("render"), ident("Component").into()),
                        (ident("layout"), layout),
                    ]),
                ),
        ));
        module.push(Stmt::ExportDefault(ident("Component")));
        module
    }
}

/// Truncated SHA-256 of the route's path relative to `project_root`.
///
/// Separators are normalized to `/` so ids agree across platforms.
pub fn component_id(route: &Path, project_root: &Path) -> String {
    let relative = route.strip_prefix(project_root).unwrap_or(route);
    let normalized = slash_path(relative);
    let digest = Sha256::digest(normalized.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(COMPONENT_ID_LEN);
    id
}

/// PascalCase name for a route file, given its path relative to the routes root.
///
/// `index` files take their directory's name; brackets are dropped, so
/// `users/[id]/index.tsx` becomes `Id` and `blog-post.tsx` becomes `BlogPost`.
pub fn component_name(route: &Path, index_name: &str) -> String {
    let stem = route.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let base = if stem == index_name {
        route
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .unwrap_or(stem)
    } else {
        stem
    };

    let name: String = base
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Route{}", name)
    } else {
        name
    }
}

/// A path with `/` separators.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::RootDir => Some(String::new()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn module_specifier(path: &Path) -> String {
    slash_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_component_id_is_stable_and_relative() {
        let a = component_id(Path::new("/app/src/routes/index.tsx"), Path::new("/app"));
        let b = component_id(Path::new("/other/src/routes/index.tsx"), Path::new("/other"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

        let c = component_id(Path::new("/app/src/routes/about.tsx"), Path::new("/app"));
        assert_ne!(a, c);
    }

    #[test]
    fn test_component_id_matches_sha256_prefix() {
        // sha256("src/routes/index.tsx")
        let id = component_id(Path::new("/app/src/routes/index.tsx"), Path::new("/app"));
        let expected = hex::encode(Sha256::digest(b"src/routes/index.tsx"));
        assert_eq!(id, expected[..12]);
    }

    #[test]
    fn test_component_names() {
        assert_eq!(component_name(Path::new("index.tsx"), "index"), "Index");
        assert_eq!(component_name(Path::new("about.tsx"), "index"), "About");
        assert_eq!(component_name(Path::new("blog-post.tsx"), "index"), "BlogPost");
        assert_eq!(component_name(Path::new("users/[id]/index.tsx"), "index"), "Id");
        assert_eq!(component_name(Path::new("404.tsx"), "index"), "Route404");
    }

    #[test]
    fn test_slash_path() {
        let path: PathBuf = ["routes", "users", "[id]", "index.tsx"].iter().collect();
        assert_eq!(slash_path(&path), "routes/users/[id]/index.tsx");
        assert_eq!(slash_path(Path::new("/app/x.tsx")), "/app/x.tsx");
    }

    #[test]
    fn test_entry_module_with_layout() {
        let manifest = ComponentManifest::new(
            Path::new("/app/src/routes/about.tsx"),
            Some(Path::new("/app/src/routes/layout.tsx")),
            Path::new("/app"),
            Path::new("/app/src/routes"),
            "index",
        );
        let source = manifest.entry_module().render();
        let id = &manifest.component_id;

        assert_eq!(
            source,
            format!(
                "import Component from \"/app/src/routes/about.tsx\";\n\
                 import Layout from \"/app/src/routes/layout.tsx\";\n\
                 const registry = (globalThis.__armature_components ??= {{}});\n\
                 (registry[\"{id}\"] = {{name: \"About\", render: Component, layout: Layout}});\n\
                 export default Component;\n"
            )
        );
    }

    #[test]
    fn test_entry_module_without_layout() {
        let manifest = ComponentManifest::new(
            Path::new("/app/src/routes/index.tsx"),
            None,
            Path::new("/app"),
            Path::new("/app/src/routes"),
            "index",
        );
        let source = manifest.entry_module().render();
        assert!(!source.contains("import Layout"));
        assert!(source.contains("layout: null"));
    }
}
