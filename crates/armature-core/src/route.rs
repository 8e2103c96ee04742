//! Route resolution results.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::RouteParams;

/// The outcome of resolving a URL path against the routes tree.
///
/// A missing route is represented by `file_path: None` rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    /// Absolute path of the route module, if one matched.
    pub file_path: Option<PathBuf>,
    /// Values bound to dynamic segments.
    pub params: RouteParams,
    /// Nearest applicable layout module.
    pub layout: Option<PathBuf>,
}

impl RouteInfo {
    /// A resolution that found no route module.
    pub fn not_found() -> Self {
        Self::default()
    }

    /// A resolution that matched `file_path`.
    pub fn found(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(file_path.into()),
            ..Default::default()
        }
    }

    /// Attach bound parameters.
    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params = params;
        self
    }

    /// Attach a layout module.
    pub fn with_layout(mut self, layout: Option<PathBuf>) -> Self {
        self.layout = layout;
        self
    }

    /// Whether a route module matched.
    pub fn is_found(&self) -> bool {
        self.file_path.is_some()
    }

    /// Route module path, if one matched.
    pub fn file(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Get a bound parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }
}
