//! Bundler abstraction and the esbuild implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::BuildError;

/// One bundler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    /// Entry module.
    pub entry: PathBuf,
    /// Output directory.
    pub outdir: PathBuf,
    /// Directory the output tree mirrors (entry paths are taken relative to it).
    pub outbase: PathBuf,
    /// Directory the bundler runs in; manifest paths are relative to it.
    pub working_dir: PathBuf,
    /// Minify the output.
    pub minify: bool,
    /// Split shared code into chunks.
    pub splitting: bool,
}

/// One emitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Entry module this output was produced for, if it is an entry output.
    pub entry_point: Option<PathBuf>,
    /// Names the output exports.
    pub exports: Vec<String>,
}

impl OutputFile {
    /// Whether this is a stylesheet.
    pub fn is_css(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext == "css")
    }
}

/// Manifest of one bundler invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleOutput {
    /// Emitted files.
    pub outputs: Vec<OutputFile>,
}

impl BundleOutput {
    /// The JavaScript output produced for `entry`.
    pub fn entry_for(&self, entry: &Path) -> Option<&OutputFile> {
        self.outputs
            .iter()
            .find(|o| !o.is_css() && o.entry_point.as_deref() == Some(entry))
    }

    /// Stylesheet outputs in manifest order.
    pub fn css(&self) -> impl Iterator<Item = &OutputFile> {
        self.outputs.iter().filter(|o| o.is_css())
    }
}

/// Compiles entry modules to browser JavaScript.
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Bundle `request.entry` and report what was written.
    async fn bundle(&self, request: &BundleRequest) -> Result<BundleOutput, BuildError>;

    /// Minify a standalone script.
    async fn minify(&self, source: &str) -> Result<String, BuildError>;
}

/// Runs the `esbuild` executable.
#[derive(Debug, Clone)]
pub struct EsbuildBundler {
    program: PathBuf,
}

impl EsbuildBundler {
    /// Use the esbuild executable at `program` (a bare name is looked up on `PATH`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(request: &BundleRequest, metafile: &Path) -> Vec<String> {
        let mut args = vec![
            request.entry.display().to_string(),
            "--bundle".to_string(),
            "--format=esm".to_string(),
            "--log-level=warning".to_string(),
            format!("--outdir={}", request.outdir.display()),
            format!("--outbase={}", request.outbase.display()),
            format!("--metafile={}", metafile.display()),
        ];
        if request.minify {
            args.push("--minify".to_string());
        }
        if request.splitting {
            args.push("--splitting".to_string());
        }
        args
    }
}

impl Default for EsbuildBundler {
    fn default() -> Self {
        Self::new("esbuild")
    }
}

#[derive(Debug, Deserialize)]
struct Metafile {
    #[serde(default)]
    outputs: BTreeMap<String, MetaOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaOutput {
    #[serde(default)]
    entry_point: Option<String>,
    #[serde(default)]
    exports: Vec<String>,
}

/// Parse an esbuild metafile, resolving its paths against `working_dir`.
pub fn parse_metafile(json: &str, working_dir: &Path) -> Result<BundleOutput, BuildError> {
    let metafile: Metafile =
        serde_json::from_str(json).map_err(|e| BuildError::Manifest(e.to_string()))?;

    let outputs = metafile
        .outputs
        .into_iter()
        .map(|(path, output)| OutputFile {
            path: working_dir.join(path),
            entry_point: output.entry_point.map(|entry| working_dir.join(entry)),
            exports: output.exports,
        })
        .collect();

    Ok(BundleOutput { outputs })
}

fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[async_trait]
impl Bundler for EsbuildBundler {
    async fn bundle(&self, request: &BundleRequest) -> Result<BundleOutput, BuildError> {
        let metafile = request.entry.with_extension("meta.json");
        let output = Command::new(&self.program)
            .args(Self::args(request, &metafile))
            .current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(BuildError::Spawn)?;

        if !output.status.success() {
            return Err(BuildError::Bundler {
                status: exit_code(output.status),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let json = tokio::fs::read_to_string(&metafile)
            .await
            .map_err(|e| BuildError::io(&metafile, e))?;
        parse_metafile(&json, &request.working_dir)
    }

    async fn minify(&self, source: &str) -> Result<String, BuildError> {
        let mut child = Command::new(&self.program)
            .args(["--minify", "--loader=js", "--log-level=warning"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(BuildError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .await
                .map_err(BuildError::Spawn)?;
        }

        let output = child.wait_with_output().await.map_err(BuildError::Spawn)?;
        if !output.status.success() {
            return Err(BuildError::Bundler {
                status: exit_code(output.status),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metafile() {
        let json = r#"{
            "inputs": {},
            "outputs": {
                ".armature/routes/index.js": {
                    "entryPoint": ".armature/.entries/routes/index.js",
                    "exports": ["default"],
                    "bytes": 120
                },
                ".armature/routes/index.css": { "bytes": 12 },
                ".armature/chunk-ABC.js": { "exports": ["a"] }
            }
        }"#;

        let output = parse_metafile(json, Path::new("/app")).unwrap();
        let entry = output
            .entry_for(Path::new("/app/.armature/.entries/routes/index.js"))
            .unwrap();
        assert_eq!(entry.path, PathBuf::from("/app/.armature/routes/index.js"));
        assert_eq!(entry.exports, vec!["default"]);

        let css: Vec<_> = output.css().map(|o| o.path.clone()).collect();
        assert_eq!(css, vec![PathBuf::from("/app/.armature/routes/index.css")]);
    }

    #[test]
    fn test_parse_metafile_rejects_garbage() {
        assert!(matches!(
            parse_metafile("not json", Path::new("/")),
            Err(BuildError::Manifest(_))
        ));
    }

    #[test]
    fn test_esbuild_args() {
        let request = BundleRequest {
            entry: PathBuf::from("/app/.armature/.entries/routes/index.js"),
            outdir: PathBuf::from("/app/.armature"),
            outbase: PathBuf::from("/app/.armature/.entries"),
            working_dir: PathBuf::from("/app"),
            minify: true,
            splitting: false,
        };
        let args = EsbuildBundler::args(&request, Path::new("/m.json"));
        assert!(args.contains(&"--bundle".to_string()));
        assert!(args.contains(&"--minify".to_string()));
        assert!(!args.contains(&"--splitting".to_string()));
        assert!(args.contains(&"--outbase=/app/.armature/.entries".to_string()));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let bundler = EsbuildBundler::new("/nonexistent/armature-esbuild");
        let result = bundler.minify("let a = 1;").await;
        assert!(matches!(result, Err(BuildError::Spawn(_))));
    }
}
