//! Server side of hot reload: watch, rebuild, then broadcast.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use armature_build::BuildManager;
use armature_core::{ArmatureConfig, BuildKey};
use indexmap::{IndexMap, IndexSet};
use tokio::task::JoinHandle;

use crate::classify::{ChangeClass, Classifier};
use crate::debounce::Debouncer;
use crate::error::HmrError;
use crate::event::{current_version, ChangeEvent};
use crate::hub::HmrHub;
use crate::watcher::{FileChange, FileChangeKind, FileWatcher};

/// Why a cached build is being recompiled.
///
/// A build with neither flag set is only refreshed: the change that caused it
/// is announced under its own name.
#[derive(Debug, Clone, Copy, Default)]
struct Rebuild {
    module: bool,
    stylesheet: bool,
}

/// Turns file changes into fresh builds and change events.
///
/// Every affected build is recompiled before its event is sent, so a client
/// that re-fetches on notification never receives the old bundle. Builds only
/// record their route and layout modules, so a change to any other module
/// (a shared component, a helper next to a route) refreshes every cached
/// build.
pub struct HmrService {
    classifier: Classifier,
    builds: Arc<BuildManager>,
    hub: HmrHub,
    debounce: Duration,
}

impl HmrService {
    /// Create the service for a project.
    pub fn new(config: &ArmatureConfig, builds: Arc<BuildManager>, hub: HmrHub) -> Self {
        Self {
            classifier: Classifier::new(config),
            builds,
            hub,
            debounce: config.hmr.debounce(),
        }
    }

    /// Hub events are sent through.
    pub fn hub(&self) -> &HmrHub {
        &self.hub
    }

    /// Start watching and handle changes on a background task.
    pub fn spawn(self) -> Result<JoinHandle<()>, HmrError> {
        let watcher = FileWatcher::new(&self.classifier.watch_dirs())?;
        Ok(tokio::spawn(self.run(watcher)))
    }

    /// Handle changes from `watcher` until it shuts down.
    ///
    /// Bursts are coalesced per path over the debounce window.
    pub async fn run(self, mut watcher: FileWatcher) {
        let mut pending: Debouncer<PathBuf, FileChangeKind> = Debouncer::new(self.debounce);
        loop {
            let deadline = pending.deadline();
            let due = tokio::time::sleep_until(
                deadline.map_or_else(tokio::time::Instant::now, tokio::time::Instant::from_std),
            );

            tokio::select! {
                change = watcher.recv() => match change {
                    Some(change) => {
                        let kind = pending
                            .get(&change.path)
                            .map_or(change.kind, |earlier| earlier.merge(change.kind));
                        pending.push(change.path, kind, Instant::now());
                    }
                    None => break,
                },
                _ = due, if deadline.is_some() => {
                    let batch = pending
                        .flush()
                        .into_iter()
                        .map(|(path, kind)| FileChange::new(path, kind))
                        .collect();
                    self.apply(batch).await;
                }
            }
        }
        tracing::debug!("file watcher closed");
    }

    /// Apply one coalesced batch and broadcast the resulting events.
    pub async fn apply(&self, changes: Vec<FileChange>) -> Vec<ChangeEvent> {
        let mut files: IndexSet<String> = IndexSet::new();
        let mut rebuilds: IndexMap<BuildKey, Rebuild> = IndexMap::new();

        for change in &changes {
            match self.classifier.classify(change) {
                ChangeClass::Public(url) => {
                    files.insert(url);
                }
                ChangeClass::Route { path, structural } => {
                    if structural {
                        self.builds.cache().clear_routes();
                        tracing::debug!(path = %path.display(), "routes changed, cleared route cache");
                        files.insert(self.classifier.source_name(&path));
                    }
                    let direct = self.builds.invalidate(&path);
                    let keys = if direct.is_empty() && !structural {
                        tracing::debug!(path = %path.display(), "imported module changed, rebuilding all routes");
                        self.builds.invalidate_all()
                    } else {
                        direct
                    };
                    for key in keys {
                        rebuilds.entry(key).or_default().module = true;
                    }
                }
                ChangeClass::Stylesheet(path) => {
                    tracing::debug!(path = %path.display(), "stylesheet changed, rebuilding all routes");
                    for key in self.builds.invalidate_all() {
                        rebuilds.entry(key).or_default().stylesheet = true;
                    }
                }
                ChangeClass::Source(name) => {
                    tracing::debug!(file = %name, "source changed, rebuilding all routes");
                    for key in self.builds.invalidate_all() {
                        rebuilds.entry(key).or_default();
                    }
                    files.insert(name);
                }
                ChangeClass::Ignored => {}
            }
        }

        for (key, reason) in rebuilds {
            match self.builds.rebuild(&key).await {
                Ok(result) => {
                    if reason.module {
                        files.insert(result.js_path.clone());
                    }
                    if reason.stylesheet {
                        if let Some(css) = &result.css_path {
                            files.insert(css.clone());
                        }
                    }
                }
                Err(e) => tracing::warn!(route = %key, error = %e, "rebuild after change failed"),
            }
        }

        let version = current_version();
        files
            .into_iter()
            .map(|file| {
                let event = ChangeEvent::new(file, version.clone());
                self.hub.send(event.clone());
                event
            })
            .collect()
    }
}
