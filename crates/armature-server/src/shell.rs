//! Page shell markup.
//!
//! A page is sent as four chunks: the opening (doctype, head, route CSS and
//! the HMR client), the mount container carrying the route parameters, the
//! entry script, and the closing tags. The opening always goes first.

use armature_core::{ArmatureConfig, BuildResult, ConfigError, MountTarget, RouteParams};
use armature_hmr::CLIENT_SCRIPT;
use armature_runtime::{escape_attr, escape_html, fallback_html, render_boundary, Element, View, PARAMS_ATTR};
use axum::http::StatusCode;

/// Head content for a page.
#[derive(Debug, Clone, Default)]
pub struct HeadContent {
    /// Page title.
    pub title: String,
    /// Inline stylesheets as `(source href, css)`.
    pub styles: Vec<(Option<String>, String)>,
    /// Deferred classic scripts.
    pub scripts: Vec<String>,
}

impl HeadContent {
    /// Head with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Inline a stylesheet, tagged with the URL it was built to.
    pub fn with_style(mut self, href: Option<&str>, css: &str) -> Self {
        self.styles.push((href.map(str::to_string), css.to_string()));
        self
    }

    /// Add a deferred script.
    pub fn with_script(mut self, src: &str) -> Self {
        self.scripts.push(src.to_string());
        self
    }

    /// Render head content to HTML.
    pub fn render(&self) -> String {
        let mut html = String::from("<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", escape_html(&self.title)));

        for (href, css) in &self.styles {
            match href {
                Some(href) => html.push_str(&format!(
                    "<style data-armature-href=\"{}\">",
                    escape_attr(href)
                )),
                None => html.push_str("<style>"),
            }
            html.push_str(&css.replace("</style", "<\\/style"));
            html.push_str("</style>\n");
        }

        for src in &self.scripts {
            html.push_str(&format!("<script src=\"{}\" defer></script>\n", escape_attr(src)));
        }

        html
    }
}

/// Shell for one built route.
#[derive(Debug, Clone)]
pub struct PageShell {
    head: HeadContent,
    mount: MountTarget,
    entry: String,
}

impl PageShell {
    /// Shell for `build`, including the HMR client when enabled.
    ///
    /// Fails when the configured mount selector does not describe an element.
    pub fn new(config: &ArmatureConfig, build: &BuildResult) -> Result<Self, ConfigError> {
        let mut head = HeadContent::new(config.server.title.as_str());
        if build.has_css() {
            head = head.with_style(build.css_path.as_deref(), &build.css_content);
        }
        if config.hmr.enabled {
            let client = format!(
                "{}/{}",
                config.build.public_prefix.trim_end_matches('/'),
                CLIENT_SCRIPT
            );
            head = head.with_script(&client);
        }
        Ok(Self {
            head,
            mount: config.build.mount_target()?,
            entry: build.js_path.clone(),
        })
    }

    /// Doctype, head and opening body.
    pub fn render_opening(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n{}</head>\n<body>\n",
            self.head.render()
        )
    }

    /// Mount container with the route parameters as JSON.
    pub fn render_mount(&self, params: &RouteParams) -> serde_json::Result<String> {
        let json = serde_json::to_string(params)?;
        let mount = &self.mount;
        let mut html = format!("<{}", mount.tag);
        if let Some(attribute) = &mount.attribute {
            html.push(' ');
            html.push_str(attribute);
        }
        if let Some(id) = &mount.id {
            html.push_str(&format!(" id=\"{}\"", escape_attr(id)));
        }
        if let Some(class) = &mount.class {
            html.push_str(&format!(" class=\"{}\"", escape_attr(class)));
        }
        html.push_str(&format!(
            " {}=\"{}\"></{}>\n",
            PARAMS_ATTR,
            escape_attr(&json),
            mount.tag
        ));
        Ok(html)
    }

    /// Module script for the route bundle.
    pub fn render_entry(&self) -> String {
        format!(
            "<script type=\"module\" src=\"{}\"></script>\n",
            escape_attr(&self.entry)
        )
    }

    /// Closing tags.
    pub fn render_closing(&self) -> String {
        "</body>\n</html>\n".to_string()
    }
}

/// Full HTML document for an error status.
///
/// Not-found pages name the missing path; anything else shows the generic
/// fallback message.
pub fn error_page(status: StatusCode, detail: Option<&str>) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    let body = render_boundary(|| {
        let message: View = match detail {
            Some(detail) if status == StatusCode::NOT_FOUND => {
                Element::new("p").child(format!("Nothing lives at {}.", detail)).into_view()
            }
            _ => View::raw(fallback_html()),
        };
        Ok(Element::new("main")
            .child(Element::new("h1").child(format!("{} {}", status.as_u16(), reason)))
            .child(message)
            .into_view())
    })
    .unwrap_or_else(|_| fallback_html());

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(reason),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn build(css: &str) -> BuildResult {
        BuildResult {
            js_content: String::new(),
            css_content: css.to_string(),
            component_name: "Index".to_string(),
            component_id: "abc123def456".to_string(),
            js_path: "/.armature/routes/index.js".to_string(),
            css_path: (!css.is_empty()).then(|| "/.armature/routes/index.css".to_string()),
            build_path: PathBuf::from("/app/.armature/routes/index.js"),
        }
    }

    // === Shell Tests ===

    #[test]
    fn test_opening_has_styles_and_hmr_client() {
        let config = ArmatureConfig::default();
        let shell = PageShell::new(&config, &build("body{margin:0}")).unwrap();
        let opening = shell.render_opening();

        assert!(opening.starts_with("<!DOCTYPE html>\n<html>\n<head>\n"));
        assert!(opening.contains("<title>Armature</title>"));
        assert!(opening.contains(
            "<style data-armature-href=\"/.armature/routes/index.css\">body{margin:0}</style>"
        ));
        assert!(opening.contains("<script src=\"/.armature/hmr.js\" defer></script>"));
        assert!(opening.ends_with("<body>\n"));
    }

    #[test]
    fn test_opening_without_css_or_hmr() {
        let mut config = ArmatureConfig::default();
        config.hmr.enabled = false;
        let opening = PageShell::new(&config, &build("")).unwrap().render_opening();
        assert!(!opening.contains("<style"));
        assert!(!opening.contains("hmr.js"));
    }

    #[test]
    fn test_css_cannot_close_style_tag() {
        let head = HeadContent::new("t").with_style(None, "a{}</style><script>x</script>");
        let html = head.render();
        assert_eq!(html.matches("</style>").count(), 1);
    }

    #[test]
    fn test_mount_and_entry() {
        let shell = PageShell::new(&ArmatureConfig::default(), &build("")).unwrap();
        let mut params = RouteParams::new();
        params.insert("id".to_string(), "4\"2".to_string());

        assert_eq!(
            shell.render_mount(&params).unwrap(),
            "<div app data-params=\"{&quot;id&quot;:&quot;4\\&quot;2&quot;}\"></div>\n"
        );
        assert_eq!(
            shell.render_entry(),
            "<script type=\"module\" src=\"/.armature/routes/index.js\"></script>\n"
        );
        assert_eq!(shell.render_closing(), "</body>\n</html>\n");
    }

    #[test]
    fn test_mount_follows_configured_selector() {
        let mut config = ArmatureConfig::default();
        let params = RouteParams::new();

        config.build.mount_selector = "#root".to_string();
        let shell = PageShell::new(&config, &build("")).unwrap();
        assert_eq!(
            shell.render_mount(&params).unwrap(),
            "<div id=\"root\" data-params=\"{}\"></div>\n"
        );

        config.build.mount_selector = "main.page".to_string();
        let shell = PageShell::new(&config, &build("")).unwrap();
        assert_eq!(
            shell.render_mount(&params).unwrap(),
            "<main class=\"page\" data-params=\"{}\"></main>\n"
        );

        config.build.mount_selector = "div > .page".to_string();
        assert!(PageShell::new(&config, &build("")).is_err());
    }

    // === Error Page Tests ===

    #[test]
    fn test_not_found_page() {
        let html = error_page(StatusCode::NOT_FOUND, Some("/nope"));
        assert!(html.contains("<h1>404 Not Found</h1>"));
        assert!(html.contains("Nothing lives at /nope."));
    }

    #[test]
    fn test_server_error_page_uses_fallback() {
        let html = error_page(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert!(html.contains("500 Internal Server Error"));
        assert!(html.contains(&fallback_html()));
    }
}
