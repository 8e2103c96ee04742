//! Mapping raw file changes to HMR actions.

use std::path::{Path, PathBuf};

use armature_build::slash_path;
use armature_core::{ArmatureConfig, RoutesConfig};

use crate::watcher::{is_hidden, FileChange};

/// What a file change means for the running app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeClass {
    /// A public asset; clients are told its URL.
    Public(String),
    /// A route or layout module.
    Route {
        /// Module path.
        path: PathBuf,
        /// The file appeared or disappeared.
        structural: bool,
    },
    /// A stylesheet under the source tree.
    Stylesheet(PathBuf),
    /// Any other source file, named relative to the source dir.
    Source(String),
    /// Not something clients care about.
    Ignored,
}

/// Classifies changes against a project's directory layout.
#[derive(Debug, Clone)]
pub struct Classifier {
    src_dir: PathBuf,
    routes_dir: PathBuf,
    public_dir: PathBuf,
    build_dir: PathBuf,
    conventions: RoutesConfig,
}

impl Classifier {
    /// Create a classifier for a project.
    pub fn new(config: &ArmatureConfig) -> Self {
        Self {
            src_dir: config.src_dir(),
            routes_dir: config.routes_dir(),
            public_dir: config.public_dir(),
            build_dir: config.build_dir(),
            conventions: config.routes.clone(),
        }
    }

    /// Directories the watcher should cover.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        vec![self.src_dir.clone(), self.public_dir.clone()]
    }

    /// Classify one change.
    pub fn classify(&self, change: &FileChange) -> ChangeClass {
        let path = change.path.as_path();
        if path.starts_with(&self.build_dir) {
            return ChangeClass::Ignored;
        }

        if let Ok(relative) = path.strip_prefix(&self.public_dir) {
            if is_hidden(relative) {
                return ChangeClass::Ignored;
            }
            return ChangeClass::Public(format!("/{}", slash_path(relative)));
        }

        let Ok(relative) = path.strip_prefix(&self.src_dir) else {
            return ChangeClass::Ignored;
        };
        if is_hidden(relative) {
            return ChangeClass::Ignored;
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if extension == "css" {
            return ChangeClass::Stylesheet(path.to_path_buf());
        }

        if path.starts_with(&self.routes_dir)
            && (self.conventions.is_route_extension(extension) || change.kind.is_structural())
        {
            return ChangeClass::Route {
                path: path.to_path_buf(),
                structural: change.kind.is_structural(),
            };
        }

        ChangeClass::Source(slash_path(relative))
    }

    /// `path` relative to the source dir, with `/` separators.
    pub fn source_name(&self, path: &Path) -> String {
        slash_path(path.strip_prefix(&self.src_dir).unwrap_or(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::FileChangeKind;

    fn classifier() -> (Classifier, ArmatureConfig) {
        let config = ArmatureConfig::with_root("/app");
        (Classifier::new(&config), config)
    }

    fn modified(path: &str) -> FileChange {
        FileChange::new(path, FileChangeKind::Modified)
    }

    // === Classification Tests ===

    #[test]
    fn test_public_files_use_url() {
        let (classifier, _) = classifier();
        assert_eq!(
            classifier.classify(&modified("/app/public/css/site.css")),
            ChangeClass::Public("/css/site.css".to_string())
        );
    }

    #[test]
    fn test_route_modules() {
        let (classifier, _) = classifier();
        assert_eq!(
            classifier.classify(&modified("/app/src/routes/users/[id]/index.tsx")),
            ChangeClass::Route {
                path: PathBuf::from("/app/src/routes/users/[id]/index.tsx"),
                structural: false,
            }
        );
        assert_eq!(
            classifier.classify(&FileChange::new("/app/src/routes/about.tsx", FileChangeKind::Created)),
            ChangeClass::Route {
                path: PathBuf::from("/app/src/routes/about.tsx"),
                structural: true,
            }
        );
    }

    #[test]
    fn test_new_route_directory_is_structural() {
        let (classifier, _) = classifier();
        assert!(matches!(
            classifier.classify(&FileChange::new("/app/src/routes/blog", FileChangeKind::Created)),
            ChangeClass::Route { structural: true, .. }
        ));
    }

    #[test]
    fn test_source_stylesheets() {
        let (classifier, _) = classifier();
        assert_eq!(
            classifier.classify(&modified("/app/src/styles/app.css")),
            ChangeClass::Stylesheet(PathBuf::from("/app/src/styles/app.css"))
        );
        assert!(matches!(
            classifier.classify(&modified("/app/src/routes/index.css")),
            ChangeClass::Stylesheet(_)
        ));
    }

    #[test]
    fn test_other_sources_use_relative_name() {
        let (classifier, _) = classifier();
        assert_eq!(
            classifier.classify(&modified("/app/src/components/button.tsx")),
            ChangeClass::Source("components/button.tsx".to_string())
        );
        assert_eq!(
            classifier.classify(&modified("/app/src/routes/notes.md")),
            ChangeClass::Source("routes/notes.md".to_string())
        );
    }

    #[test]
    fn test_ignored() {
        let (classifier, _) = classifier();
        assert_eq!(classifier.classify(&modified("/app/src/.index.tsx.swp")), ChangeClass::Ignored);
        assert_eq!(classifier.classify(&modified("/app/public/.DS_Store")), ChangeClass::Ignored);
        assert_eq!(classifier.classify(&modified("/app/README.md")), ChangeClass::Ignored);
        assert_eq!(
            classifier.classify(&modified("/app/.armature/routes/index.js")),
            ChangeClass::Ignored
        );
    }

    #[test]
    fn test_watch_dirs() {
        let (classifier, config) = classifier();
        assert_eq!(classifier.watch_dirs(), vec![config.src_dir(), config.public_dir()]);
        assert_eq!(classifier.source_name(Path::new("/app/src/a/b.ts")), "a/b.ts");
    }
}
