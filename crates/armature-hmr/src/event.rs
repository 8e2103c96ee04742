//! Change notifications pushed to clients.

use serde::{Deserialize, Serialize};

/// One change notification, sent as the `data` of an `hmr` event.
///
/// `file` is a public URL (`/.armature/routes/index.js`, `/styles.css`) or,
/// for sources with no public counterpart, the path relative to `src`.
/// `version` is a millisecond timestamp rendered as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Changed file.
    pub file: String,
    /// Version stamp.
    pub version: String,
}

impl ChangeEvent {
    /// Create an event with an explicit version.
    pub fn new(file: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            version: version.into(),
        }
    }

    /// Create an event stamped with the current time.
    pub fn now(file: impl Into<String>) -> Self {
        Self::new(file, current_version())
    }

    /// How a client should apply this change.
    pub fn kind(&self) -> ChangeKind {
        ChangeKind::of(&self.file)
    }

    /// JSON payload.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse a JSON payload.
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}

/// Client-side treatment of a change, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Swap the stylesheet in place.
    Stylesheet,
    /// Re-import the module and re-render the mounted route.
    Module,
    /// Reload the page.
    Reload,
}

impl ChangeKind {
    /// Suffix rules, checked in order; anything else reloads.
    ///
    /// The browser client's `kindOf` is generated from this table.
    pub const RULES: [(&'static str, ChangeKind); 2] =
        [(".css", ChangeKind::Stylesheet), (".js", ChangeKind::Module)];

    /// Classify a file name, ignoring any query or fragment.
    pub fn of(file: &str) -> Self {
        let path = file.split(['?', '#']).next().unwrap_or(file);
        Self::RULES
            .iter()
            .find(|(suffix, _)| path.ends_with(suffix))
            .map_or(Self::Reload, |(_, kind)| *kind)
    }

    /// Name used by the browser client.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stylesheet => "stylesheet",
            Self::Module => "module",
            Self::Reload => "reload",
        }
    }
}

/// Current time as a version stamp.
pub fn current_version() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}
