//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use armature_build::{Bundler, EsbuildBundler};
use armature_core::ArmatureConfig;

use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// Project configuration.
    pub config: ArmatureConfig,
    /// Config file the configuration was read from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from an explicit config file, a discovered one, or defaults.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config_path = match config_path {
            Some(path) => Some(resolve_path(&cwd, path)),
            None => ArmatureConfig::discover(&cwd),
        };

        let mut config = match &config_path {
            Some(path) => ArmatureConfig::load(path)?,
            None => ArmatureConfig::with_root(&cwd),
        };
        if config.project.root.is_relative() {
            config.project.root = cwd.join(&config.project.root);
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Bundler named by the config.
    pub fn bundler(&self) -> Arc<dyn Bundler> {
        Arc::new(EsbuildBundler::new(&self.config.build.bundler))
    }

    /// Path of a config file to create in the working directory.
    pub fn default_config_path(&self) -> PathBuf {
        self.cwd.join("armature.toml")
    }
}

/// Resolve a path relative to the working directory.
fn resolve_path(cwd: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        let cwd = Path::new("/work");
        assert_eq!(resolve_path(cwd, "app/armature.toml"), PathBuf::from("/work/app/armature.toml"));
        assert_eq!(resolve_path(cwd, "/etc/armature.toml"), PathBuf::from("/etc/armature.toml"));
    }
}
