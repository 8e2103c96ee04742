//! File system watching.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::HmrError;

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    /// The file appeared.
    Created,
    /// The file's contents changed.
    Modified,
    /// The file went away.
    Removed,
}

impl FileChangeKind {
    /// Combine with a later change to the same file within one batch.
    ///
    /// Appearing or disappearing outranks a content change.
    pub fn merge(self, later: Self) -> Self {
        match (self, later) {
            (Self::Created, Self::Modified) => Self::Created,
            (Self::Created, Self::Removed) => Self::Removed,
            (_, later) => later,
        }
    }

    /// Whether the set of files changed.
    pub fn is_structural(self) -> bool {
        !matches!(self, Self::Modified)
    }
}

/// A raw change reported by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Absolute path.
    pub path: PathBuf,
    /// Change kind.
    pub kind: FileChangeKind,
}

impl FileChange {
    /// Create a change record.
    pub fn new(path: impl Into<PathBuf>, kind: FileChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Recursive watcher over a set of directories.
///
/// notify delivers events on its own thread; they are forwarded into a tokio
/// channel and read with [`FileWatcher::recv`].
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<FileChange>,
}

impl FileWatcher {
    /// Watch every existing directory in `dirs`.
    pub fn new(dirs: &[PathBuf]) -> Result<Self, HmrError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in changes_from(event) {
                    let _ = tx.send(change);
                }
            }
            Err(e) => tracing::warn!(error = %e, "file watcher error"),
        })?;

        for dir in dirs {
            if !dir.is_dir() {
                tracing::debug!(dir = %dir.display(), "skipping missing watch directory");
                continue;
            }
            watcher.watch(dir, RecursiveMode::Recursive)?;
            tracing::info!(dir = %dir.display(), "watching for changes");
        }

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Next change, or `None` once the watcher has shut down.
    pub async fn recv(&mut self) -> Option<FileChange> {
        self.rx.recv().await
    }
}

/// Translate a notify event, dropping access and metadata notifications.
pub fn changes_from(event: Event) -> Vec<FileChange> {
    use FileChangeKind::*;

    let kinds: Vec<FileChangeKind> = match event.kind {
        EventKind::Create(_) => vec![Created; event.paths.len()],
        EventKind::Remove(_) => vec![Removed; event.paths.len()],
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => vec![Removed],
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => vec![Created],
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => vec![Removed, Created],
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => vec![Modified; event.paths.len()],
        _ => Vec::new(),
    };

    event
        .paths
        .into_iter()
        .zip(kinds)
        .map(|(path, kind)| FileChange { path, kind })
        .collect()
}

/// Whether any component of `path` is a dotfile.
///
/// Pass a path relative to the watched root; temporary and home directories
/// above it often start with a dot themselves.
pub fn is_hidden(path: &Path) -> bool {
    path.components().any(|c| match c {
        std::path::Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
    }

    // === Translation Tests ===

    #[test]
    fn test_modify_and_create() {
        let changes = changes_from(event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/app/src/routes/index.tsx"],
        ));
        assert_eq!(
            changes,
            vec![FileChange::new("/app/src/routes/index.tsx", FileChangeKind::Modified)]
        );

        let changes = changes_from(event(EventKind::Create(CreateKind::File), &["/app/public/a.css"]));
        assert_eq!(changes[0].kind, FileChangeKind::Created);
    }

    #[test]
    fn test_rename_both_is_remove_then_create() {
        let changes = changes_from(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/app/src/old.tsx", "/app/src/new.tsx"],
        ));
        assert_eq!(
            changes,
            vec![
                FileChange::new("/app/src/old.tsx", FileChangeKind::Removed),
                FileChange::new("/app/src/new.tsx", FileChangeKind::Created),
            ]
        );
    }

    #[test]
    fn test_ignores_metadata() {
        let changes = changes_from(event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &["/app/src/index.tsx"],
        ));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new("components/.button.tsx.swp")));
        assert!(is_hidden(Path::new(".cache/x.css")));
        assert!(!is_hidden(Path::new("routes/users/[id]/index.tsx")));
    }

    // === Kind Tests ===

    #[test]
    fn test_merge() {
        use FileChangeKind::*;
        assert_eq!(Created.merge(Modified), Created);
        assert_eq!(Created.merge(Removed), Removed);
        assert_eq!(Modified.merge(Removed), Removed);
        assert_eq!(Removed.merge(Created), Created);
        assert_eq!(Modified.merge(Modified), Modified);
        assert!(Created.is_structural());
        assert!(!Modified.is_structural());
    }

    #[tokio::test]
    async fn test_watcher_skips_missing_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let watcher = FileWatcher::new(&[dir.path().to_path_buf(), dir.path().join("missing")]);
        assert!(watcher.is_ok());
    }
}
