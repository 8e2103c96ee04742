//! Build outputs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identifies one compiled route: the route module plus the layout it is wrapped in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildKey {
    /// Route module source path.
    pub route: PathBuf,
    /// Layout module source path.
    pub layout: Option<PathBuf>,
}

impl BuildKey {
    /// Create a build key.
    pub fn new(route: impl Into<PathBuf>, layout: Option<PathBuf>) -> Self {
        Self {
            route: route.into(),
            layout,
        }
    }

    /// Whether this build depends on `source` as either route or layout.
    pub fn depends_on(&self, source: &Path) -> bool {
        self.route == source || self.layout.as_deref() == Some(source)
    }
}

impl std::fmt::Display for BuildKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.layout {
            Some(layout) => write!(f, "{} (layout {})", self.route.display(), layout.display()),
            None => write!(f, "{}", self.route.display()),
        }
    }
}

/// Compiled, hydration-ready output for a route.
///
/// Build failures are reported through `Result`, so a `BuildResult` always
/// describes a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    /// Entry JavaScript, including the appended hydration bootstrap.
    pub js_content: String,
    /// Concatenated CSS outputs.
    pub css_content: String,
    /// Human-readable component name taken from the route file.
    pub component_name: String,
    /// Stable identifier derived from the route's relative path.
    pub component_id: String,
    /// Public URL of the entry script.
    pub js_path: String,
    /// Public URL of the emitted stylesheet, if any CSS was produced.
    pub css_path: Option<String>,
    /// On-disk path of the entry script.
    pub build_path: PathBuf,
}

impl BuildResult {
    /// Whether the build produced any CSS.
    pub fn has_css(&self) -> bool {
        !self.css_content.is_empty()
    }
}
