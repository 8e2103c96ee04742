//! Browser client script.

use std::path::{Path, PathBuf};

use armature_build::js::{ident, string_literal, Expr, Module, Stmt};
use armature_core::HmrConfig;

use crate::error::HmrError;
use crate::event::ChangeKind;

/// File name of the client script inside the build dir.
pub const CLIENT_SCRIPT: &str = "hmr.js";

/// `sessionStorage` key holding the applied version per file.
pub const VERSIONS_KEY: &str = "routeVersions";

const TEMPLATE: &str = r#"(() => {
  const endpoint = __ENDPOINT__;
  const eventName = __EVENT__;
  const storageKey = __STORAGE_KEY__;
  const pageVersion = String(Date.now());
  const pending = new Map();
  const applied = new Map();
  let source;
  let timer;

  const readVersions = () => {
    try {
      return JSON.parse(sessionStorage.getItem(storageKey) ?? "{}");
    } catch (_) {
      return {};
    }
  };
  const versions = readVersions();

  const newer = (a, b) => Number(a) > Number(b);

__KIND_OF__
  const updateCSS = (href, version) => {
    const link = document.querySelector(`link[rel="stylesheet"][href^="${href}"]`);
    if (link) {
      const next = link.cloneNode();
      next.href = `${href}?v=${version}`;
      next.onload = () => link.remove();
      link.after(next);
      return;
    }
    const style = document.querySelector(`style[data-armature-href="${href}"]`);
    if (style) {
      fetch(`${href}?v=${version}`).then((r) => r.text()).then((css) => {
        style.textContent = css;
      });
    }
  };

  const updateJS = (path, version) => {
    import(`${path}?v=${version}`).catch(() => location.reload());
  };

  const apply = () => {
    timer = undefined;
    let reload = false;
    for (const [file, version] of pending) {
      versions[file] = version;
      applied.set(file, version);
      const kind = kindOf(file);
      if (kind === __STYLESHEET__) {
        updateCSS(file, version);
      } else if (kind === __MODULE__) {
        updateJS(file, version);
      } else {
        reload = true;
      }
    }
    pending.clear();
    try {
      sessionStorage.setItem(storageKey, JSON.stringify(versions));
    } catch (_) {}
    if (reload) {
      location.reload();
    }
  };

  const receive = ({ file, version }) => {
    pending.delete(file);
    pending.set(file, version);
    clearTimeout(timer);
    timer = setTimeout(apply, __DEBOUNCE__);
  };

  const checkForUpdates = () => {
    const path = location.pathname;
    for (const [file, version] of Object.entries(readVersions())) {
      const relevant = file.includes(path) || kindOf(file) !== __RELOAD__;
      const seen = applied.has(file) && newer(applied.get(file), pageVersion) ? applied.get(file) : pageVersion;
      if (relevant && newer(version, seen)) {
        receive({ file, version });
      }
    }
  };

  window.addEventListener("load", () => {
    source = new EventSource(endpoint);
    source.addEventListener(eventName, (event) => {
      try {
        receive(JSON.parse(event.data));
      } catch (error) {
        console.error("hmr: malformed event", error);
      }
    });
    checkForUpdates();
  });
  window.addEventListener("popstate", checkForUpdates);
  window.addEventListener("pagehide", () => {
    clearTimeout(timer);
    pending.clear();
    source?.close();
  });
})();
"#;

/// `const kindOf = (file) => ...`, the browser's copy of [`ChangeKind::of`].
pub fn kind_dispatch() -> Module {
    let file = ident("file");
    let path = ident("path");
    let before = |value: Expr, separator: &str| {
        value
            .method(ident("split"), vec![Expr::str(separator)])
            .index(Expr::Int(0))
    };

    let mut body = vec![Stmt::Const(
        path.clone(),
        before(before(file.clone().into(), "?"), "#"),
    )];
    for (suffix, kind) in ChangeKind::RULES {
        body.push(Stmt::when(
            Expr::from(path.clone()).method(ident("endsWith"), vec![Expr::str(suffix)]),
            vec![Stmt::Return(Some(Expr::str(kind.as_str())))],
        ));
    }
    body.push(Stmt::Return(Some(Expr::str(ChangeKind::Reload.as_str()))));

    let mut module = Module::new();
    module.push(Stmt::Const(ident("kindOf"), Expr::Arrow(vec![file], body)));
    module
}

/// Generate the browser client for `config`.
pub fn client_script(config: &HmrConfig) -> String {
    let kind = |kind: ChangeKind| string_literal(kind.as_str());
    TEMPLATE
        .replace("__KIND_OF__", &kind_dispatch().render_at(1))
        .replace("__STYLESHEET__", &kind(ChangeKind::Stylesheet))
        .replace("__MODULE__", &kind(ChangeKind::Module))
        .replace("__RELOAD__", &kind(ChangeKind::Reload))
        .replace("__ENDPOINT__", &string_literal(&config.endpoint))
        .replace("__EVENT__", &string_literal(&config.event_name))
        .replace("__STORAGE_KEY__", &string_literal(VERSIONS_KEY))
        .replace("__DEBOUNCE__", &config.debounce_ms.to_string())
}

/// Write the client script into `build_dir`.
pub async fn write_client_script(config: &HmrConfig, build_dir: &Path) -> Result<PathBuf, HmrError> {
    tokio::fs::create_dir_all(build_dir)
        .await
        .map_err(|e| HmrError::io(build_dir, e))?;
    let path = build_dir.join(CLIENT_SCRIPT);
    tokio::fs::write(&path, client_script(config))
        .await
        .map_err(|e| HmrError::io(&path, e))?;
    tracing::debug!(path = %path.display(), "wrote hmr client");
    Ok(path)
}
