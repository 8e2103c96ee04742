//! Build every route ahead of time.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context as _, Result};
use armature_build::{BuildError, BuildManager};
use armature_cache::CacheManager;
use armature_core::BuildKey;
use armature_router::{RouteResolver, RouteTree};
use serde::Serialize;

use super::BuildArgs;
use crate::context::Context;
use crate::output::format_duration;

#[derive(Serialize)]
struct BuiltRoute {
    pattern: String,
    component: String,
    component_id: String,
    js: String,
    css: Option<String>,
}

/// Run the build command.
pub async fn run(args: BuildArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.clone();
    if args.no_minify {
        config.build.minify = false;
    }
    config.validate()?;

    let routes_dir = config.routes_dir();
    let tree = RouteTree::scan(&routes_dir, &config.routes)
        .with_context(|| format!("Failed to scan {}", routes_dir.display()))?;
    if tree.is_empty() {
        bail!("No routes found in {}", routes_dir.display());
    }

    let build_dir = config.build_dir();
    if args.clean && build_dir.exists() {
        ctx.output.debug(&format!("Removing {}", build_dir.display()));
        tokio::fs::remove_dir_all(&build_dir)
            .await
            .with_context(|| format!("Failed to remove {}", build_dir.display()))?;
    }

    ctx.output.header("Building routes");

    let cache = Arc::new(CacheManager::new(&config.cache));
    let resolver = RouteResolver::new(routes_dir.clone(), config.routes.clone(), cache.clone());
    let builds = BuildManager::new(&config, ctx.bundler(), cache);

    let started = Instant::now();
    let pb = ctx.output.progress(tree.len() as u64, "");
    let mut built = Vec::with_capacity(tree.len());

    for entry in tree.routes() {
        pb.set_message(entry.pattern.clone());

        let layout = resolver.nearest_layout(&entry.file).await?;
        let result = match builds.rebuild(&BuildKey::new(&entry.file, layout)).await {
            Ok(result) => result,
            Err(e) => {
                pb.finish_and_clear();
                print_diagnostic(&e);
                return Err(e).with_context(|| format!("Failed to build {}", entry.pattern));
            }
        };

        built.push(BuiltRoute {
            pattern: entry.pattern.clone(),
            component: result.component_name.clone(),
            component_id: result.component_id.clone(),
            js: result.js_path.clone(),
            css: result.css_path.clone(),
        });
        pb.inc(1);
    }
    pb.finish_and_clear();

    if ctx.output.is_json() {
        ctx.output.json(&built);
        return Ok(());
    }

    for route in &built {
        ctx.output.list_item(&format!("{} -> {}", route.pattern, route.js));
        if let Some(css) = &route.css {
            ctx.output.debug(&format!("{} css: {}", route.pattern, css));
        }
    }
    ctx.output.success(&format!(
        "Built {} route(s) in {}",
        built.len(),
        format_duration(started.elapsed())
    ));
    ctx.output.kv("Output", &build_dir.display().to_string());

    Ok(())
}

fn print_diagnostic(error: &BuildError) {
    if let Some(diagnostic) = error.diagnostic() {
        eprintln!("{}", diagnostic);
    }
}
