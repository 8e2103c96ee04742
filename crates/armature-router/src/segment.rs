//! Route segment parsing.

use serde::Serialize;

/// One path component of a route, as named on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Segment {
    /// Literal segment, e.g. `about`.
    Static(String),
    /// Bracketed segment binding a parameter, e.g. `[id]`.
    Dynamic(String),
}

impl Segment {
    /// Parse a file or directory stem.
    pub fn parse(name: &str) -> Self {
        match dynamic_name(name) {
            Some(param) => Self::Dynamic(param.to_string()),
            None => Self::Static(name.to_string()),
        }
    }

    /// Whether this segment binds a parameter.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    /// Render as a route pattern component (`about`, `:id`).
    pub fn pattern(&self) -> String {
        match self {
            Self::Static(name) => name.clone(),
            Self::Dynamic(name) => format!(":{}", name),
        }
    }
}

/// Parameter name of a bracketed stem, e.g. `id` for `[id]`.
pub fn dynamic_name(stem: &str) -> Option<&str> {
    let inner = stem.strip_prefix('[')?.strip_suffix(']')?;
    if inner.is_empty() || inner.contains(['[', ']', '/']) {
        return None;
    }
    Some(inner)
}

/// Split a URL path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Normalize a URL path for cache keys: `//a///b/` becomes `/a/b`.
pub fn normalize_path(path: &str) -> String {
    format!("/{}", split_path(path).join("/"))
}
